//! 시크릿 문서 (Secret Ledger)
//!
//! 디스크의 `secrets.json` 한 개가 [`SecretDocument`] 한 개에 대응합니다.
//!
//! 파일 포맷:
//! ```json
//! {
//!   "managed": { "api_key_openai": [{ "comment": "prod", "value": "sk-..." }] },
//!   "api_key_openai": "sk-...",
//!   "api_key_claude": "sk-ant-..."
//! }
//! ```
//! 최상위 문자열 필드는 레거시 단일 값(= 현재 활성 값)이고,
//! `managed`는 키별 로테이션 후보 목록입니다.

use crate::secrets::catalog::KeyCatalog;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 문서 안에서 관리 목록이 차지하는 필드 이름 (레거시 키로 사용 불가)
pub const MANAGED_FIELD: &str = "managed";

/// 관리 목록의 후보 값 하나
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagedEntry {
    /// 사람이 붙이는 라벨 (중복 허용)
    pub comment: String,
    /// 시크릿 원문
    pub value: String,
}

impl ManagedEntry {
    pub fn new(comment: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            comment: comment.into(),
            value: value.into(),
        }
    }
}

/// 변경 연산 결과
///
/// 구조적으로 할 일이 없던 경우(없는 키, 범위 밖 인덱스 등)는 에러가 아니라
/// `Unchanged`입니다. `Unchanged`면 저장소는 파일을 다시 쓰지 않습니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Mutation {
    Applied,
    Unchanged,
}

impl Mutation {
    pub fn is_applied(self) -> bool {
        self == Mutation::Applied
    }
}

/// 사용자 한 명의 시크릿 문서
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretDocument {
    /// 키별 로테이션 후보 목록 (삽입 순서 = 로테이션 순서)
    #[serde(default)]
    pub managed: BTreeMap<String, Vec<ManagedEntry>>,
    /// 키별 현재 활성 값
    #[serde(flatten)]
    pub flat: BTreeMap<String, String>,
}

impl SecretDocument {
    /// 활성 값 쓰기 (없으면 생성)
    pub fn write(&mut self, key: &str, value: &str) -> Mutation {
        if self.flat.get(key).map(String::as_str) == Some(value) {
            return Mutation::Unchanged;
        }
        self.flat.insert(key.to_string(), value.to_string());
        Mutation::Applied
    }

    /// 활성 값 삭제 (없으면 no-op)
    pub fn delete(&mut self, key: &str) -> Mutation {
        match self.flat.remove(key) {
            Some(_) => Mutation::Applied,
            None => Mutation::Unchanged,
        }
    }

    pub fn read(&self, key: &str) -> Option<&str> {
        self.flat.get(key).map(String::as_str)
    }

    /// 카탈로그의 각 키에 비어있지 않은 활성 값이 있는지
    pub fn flags(&self, catalog: &KeyCatalog) -> BTreeMap<String, bool> {
        catalog
            .known_keys()
            .iter()
            .map(|key| {
                let configured = self.read(key).is_some_and(|v| !v.is_empty());
                (key.clone(), configured)
            })
            .collect()
    }

    /// 키의 관리 목록 (없으면 빈 슬라이스)
    pub fn entries(&self, key: &str) -> &[ManagedEntry] {
        self.managed.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.flat.is_empty() && self.managed.is_empty()
    }
}

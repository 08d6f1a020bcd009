//! 관리형 로테이션 엔진
//!
//! 키마다 후보 목록 `L`(= `managed[key]`)과 활성 값 `A`(= `flat[key]`)가 있습니다.
//! 모든 연산은 [`SecretDocument`] 위의 순수 함수이며 I/O가 없습니다.
//!
//! 목록 편집(append/splice/rename)은 `A`를 절대 바꾸지 않습니다.
//! 활성 항목을 splice로 지우면 `probe`가 다시 `false`를 돌려주는
//! "비동기화" 상태가 되며, 이는 정상 상태로 취급합니다.

use crate::error::{SecretsError, SecretsResult};
use crate::secrets::document::{ManagedEntry, Mutation, SecretDocument};
use serde::{Serialize, Serializer};
use serde_json::Value;
use std::collections::BTreeMap;

/// `probe` 결과
///
/// 직렬화 시 `{"isManaged": bool, "index": int}`이며 일치 항목이 없으면 `index`는 -1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProbeResult {
    pub is_managed: bool,
    #[serde(serialize_with = "serialize_index")]
    pub index: Option<usize>,
}

impl ProbeResult {
    pub const UNMANAGED: ProbeResult = ProbeResult {
        is_managed: false,
        index: None,
    };

    fn at(index: usize) -> Self {
        Self {
            is_managed: true,
            index: Some(index),
        }
    }
}

fn serialize_index<S>(index: &Option<usize>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match index {
        Some(i) => serializer.serialize_u64(*i as u64),
        None => serializer.serialize_i64(-1),
    }
}

/// 로테이션 대상 선택 방식
///
/// 호출자의 느슨한 입력(숫자, 숫자 문자열, 코멘트)을 경계에서 한 번만 해석합니다.
/// 숫자로만 된 문자열은 `IndexOrComment`가 되어 범위 안이면 인덱스로 쓰이고,
/// 범위 밖이면 같은 텍스트로 코멘트 매칭을 시도합니다. 코멘트가 `"1"`이어도
/// 인덱스 1이 존재하면 인덱스 매칭이 우선합니다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RotationSearch {
    ByIndex(usize),
    IndexOrComment(usize, String),
    ByComment(String),
    Next,
}

impl RotationSearch {
    /// 문자열 입력 해석
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return RotationSearch::Next;
        }
        if !trimmed.bytes().all(|b| b.is_ascii_digit()) {
            return RotationSearch::ByComment(trimmed.to_string());
        }
        match trimmed.parse::<usize>() {
            Ok(index) => RotationSearch::IndexOrComment(index, trimmed.to_string()),
            Err(_) => RotationSearch::ByComment(trimmed.to_string()),
        }
    }

    /// JSON 입력 해석 (`null`/없음은 `Next`)
    pub fn from_json(raw: Option<&Value>) -> Self {
        match raw {
            Some(Value::Number(n)) => match n.as_u64() {
                Some(index) => usize::try_from(index)
                    .map(RotationSearch::ByIndex)
                    .unwrap_or(RotationSearch::Next),
                None => match n.as_f64() {
                    Some(f) if f >= 0.0 && f.fract() == 0.0 && f <= usize::MAX as f64 => {
                        RotationSearch::ByIndex(f as usize)
                    }
                    _ => RotationSearch::Next,
                },
            },
            Some(Value::String(s)) => RotationSearch::parse(s),
            _ => RotationSearch::Next,
        }
    }
}

impl From<usize> for RotationSearch {
    fn from(index: usize) -> Self {
        RotationSearch::ByIndex(index)
    }
}

/// 노출용 관리 상태의 한 칸 (원문 `value`는 절대 포함하지 않음)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManagerSlot {
    pub comment: String,
    pub selected: bool,
}

/// 키별 관리 상태 뷰
pub type ManagerView = BTreeMap<String, Vec<ManagerSlot>>;

fn comment_matches(comment: &str, search: &str) -> bool {
    comment.trim().to_lowercase() == search.trim().to_lowercase()
}

impl SecretDocument {
    /// 활성 값이 관리 목록의 몇 번째 항목인지
    pub fn probe(&self, key: &str) -> ProbeResult {
        let Some(active) = self.read(key) else {
            return ProbeResult::UNMANAGED;
        };
        self.entries(key)
            .iter()
            .position(|entry| entry.value == active)
            .map(ProbeResult::at)
            .unwrap_or(ProbeResult::UNMANAGED)
    }

    /// 목록 끝에 후보 추가 (목록이 없으면 생성)
    pub fn append(&mut self, key: &str, comment: &str, value: &str) -> Mutation {
        self.managed
            .entry(key.to_string())
            .or_default()
            .push(ManagedEntry::new(comment, value));
        Mutation::Applied
    }

    /// `index` 위치 항목 제거. 목록이 없거나 범위 밖이면 no-op
    pub fn splice(&mut self, key: &str, index: usize) -> Mutation {
        match self.managed.get_mut(key) {
            Some(list) if index < list.len() => {
                list.remove(index);
                Mutation::Applied
            }
            _ => Mutation::Unchanged,
        }
    }

    /// `index` 위치 항목의 코멘트 변경. 목록이 없거나 범위 밖이면 no-op
    pub fn rename(&mut self, key: &str, index: usize, comment: &str) -> Mutation {
        match self.managed.get_mut(key).and_then(|list| list.get_mut(index)) {
            Some(entry) if entry.comment != comment => {
                entry.comment = comment.to_string();
                Mutation::Applied
            }
            _ => Mutation::Unchanged,
        }
    }

    /// 로테이션 대상 인덱스 결정
    ///
    /// 1. 범위 안의 인덱스
    /// 2. 코멘트 일치 (대소문자 무시, 양끝 공백 무시, 첫 번째 항목)
    /// 3. 현재 활성 항목 다음 (끝이면 처음으로, 활성 항목이 없으면 0)
    pub fn rotation_target(&self, key: &str, search: &RotationSearch) -> Option<usize> {
        let list = self.entries(key);
        if list.is_empty() {
            return None;
        }

        let by_comment =
            |comment: &str| list.iter().position(|entry| comment_matches(&entry.comment, comment));
        let explicit = match search {
            RotationSearch::ByIndex(index) if *index < list.len() => Some(*index),
            RotationSearch::IndexOrComment(index, _) if *index < list.len() => Some(*index),
            RotationSearch::IndexOrComment(_, comment) => by_comment(comment),
            RotationSearch::ByComment(comment) => by_comment(comment),
            _ => None,
        };

        explicit.or_else(|| {
            let next = match self.probe(key).index {
                Some(current) => (current + 1) % list.len(),
                None => 0,
            };
            Some(next)
        })
    }

    /// 활성 값을 선택된 후보로 교체. 목록이 비어있으면 no-op
    pub fn rotate(&mut self, key: &str, search: &RotationSearch) -> Mutation {
        let Some(index) = self.rotation_target(key, search) else {
            return Mutation::Unchanged;
        };
        let value = self.entries(key)[index].value.clone();
        self.write(key, &value)
    }

    /// 현재 활성 값을 관리 목록으로 편입
    ///
    /// 이미 목록에 있으면 `Conflict`. 활성 값이 없거나 비어있으면 옮길 것이 없으므로 no-op.
    pub fn migrate(&mut self, key: &str, comment: &str) -> SecretsResult<Mutation> {
        if self.probe(key).is_managed {
            return Err(SecretsError::Conflict(key.to_string()));
        }
        let active = match self.read(key) {
            Some(value) if !value.is_empty() => value.to_string(),
            _ => return Ok(Mutation::Unchanged),
        };
        Ok(self.append(key, comment, &active))
    }

    /// 원문을 제외한 관리 상태 뷰
    pub fn manager_view(&self) -> ManagerView {
        self.managed
            .iter()
            .map(|(key, list)| {
                let active = self.read(key);
                let slots = list
                    .iter()
                    .map(|entry| ManagerSlot {
                        comment: entry.comment.clone(),
                        selected: active == Some(entry.value.as_str()),
                    })
                    .collect();
                (key.clone(), slots)
            })
            .collect()
    }
}

//! Secret Manager - 호출자용 연산 표면
//!
//! - 변경 연산은 모두 identity별 배타 락 안에서 load → 계산 → save
//! - 읽기 연산은 락 없이 최신 저장본을 읽음 (저장이 rename이라 찢어진 파일은 보이지 않음)
//! - 원문 노출 연산은 데이터 접근 전에 권한부터 확인

use crate::config::SecretsConfig;
use crate::error::{SecretsError, SecretsResult};
use crate::secrets::catalog::KeyCatalog;
use crate::secrets::coordinator::MutationCoordinator;
use crate::secrets::document::{Mutation, SecretDocument, MANAGED_FIELD};
use crate::secrets::rotation::{ManagerView, ProbeResult, RotationSearch};
use crate::secrets::store::{read_document, SecretStore, StoreIdentity};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

/// 키 이름 검증
///
/// `managed`는 문서의 관리 목록 필드와 충돌하므로 레거시 키로 쓸 수 없습니다.
pub fn validate_key(key: &str) -> SecretsResult<()> {
    if key.trim().is_empty() {
        return Err(SecretsError::InvalidKey("key must not be empty".to_string()));
    }
    if key == MANAGED_FIELD {
        return Err(SecretsError::InvalidKey(format!("'{MANAGED_FIELD}' is reserved")));
    }
    Ok(())
}

/// Secret Manager
///
/// 복제 비용이 낮으며, 복제본끼리 같은 락 테이블을 공유합니다.
#[derive(Debug, Clone)]
pub struct SecretManager {
    store: SecretStore,
    coordinator: Arc<MutationCoordinator>,
    catalog: Arc<KeyCatalog>,
    allow_keys_exposure: bool,
}

impl SecretManager {
    pub fn new(config: &SecretsConfig, catalog: Arc<KeyCatalog>) -> Self {
        Self {
            store: SecretStore::new(&config.data_root),
            coordinator: Arc::new(MutationCoordinator::new()),
            catalog,
            allow_keys_exposure: config.allow_keys_exposure,
        }
    }

    /// 기본 카탈로그로 생성
    pub fn from_config(config: &SecretsConfig) -> Self {
        Self::new(config, KeyCatalog::builtin())
    }

    pub fn store(&self) -> &SecretStore {
        &self.store
    }

    pub fn catalog(&self) -> &KeyCatalog {
        &self.catalog
    }

    /// 배타 락 안에서 load → `apply` → (변경 시) save
    async fn mutate<F>(
        &self,
        identity: &StoreIdentity,
        action: &'static str,
        key: &str,
        apply: F,
    ) -> SecretsResult<Mutation>
    where
        F: FnOnce(&mut SecretDocument) -> SecretsResult<Mutation>,
    {
        self.coordinator
            .with_exclusive(identity, move || async move {
                let mut document = self.store.load(identity)?;
                let outcome = apply(&mut document)?;
                if outcome.is_applied() {
                    self.store.save(identity, &document)?;
                    tracing::info!(identity = %identity, key, action, "secret updated");
                } else {
                    tracing::debug!(identity = %identity, key, action, "nothing to change");
                }
                Ok(outcome)
            })
            .await
    }

    // =====================================
    // 레거시 단일 값
    // =====================================

    /// 활성 값 저장
    pub async fn write_secret(
        &self,
        identity: &StoreIdentity,
        key: &str,
        value: &str,
    ) -> SecretsResult<Mutation> {
        validate_key(key)?;
        self.mutate(identity, "write", key, |doc| Ok(doc.write(key, value)))
            .await
    }

    /// 활성 값 삭제
    pub async fn delete_secret(
        &self,
        identity: &StoreIdentity,
        key: &str,
    ) -> SecretsResult<Mutation> {
        validate_key(key)?;
        self.mutate(identity, "delete", key, |doc| Ok(doc.delete(key)))
            .await
    }

    /// 카탈로그 키별 설정 여부 (원문 없음)
    pub async fn read_secret_flags(
        &self,
        identity: &StoreIdentity,
    ) -> SecretsResult<BTreeMap<String, bool>> {
        Ok(self.store.load(identity)?.flags(&self.catalog))
    }

    /// 단일 시크릿 원문 조회
    ///
    /// 노출 플래그가 켜져 있거나, 키가 민감하지 않은 허용 목록에 있을 때만 허용됩니다.
    pub async fn read_secret_value(
        &self,
        identity: &StoreIdentity,
        key: &str,
    ) -> SecretsResult<Option<String>> {
        if !self.allow_keys_exposure && !self.catalog.is_exportable(key) {
            tracing::warn!(identity = %identity, key, "raw secret read denied");
            return Err(SecretsError::Unauthorized(format!(
                "reading '{key}' requires keys exposure to be enabled"
            )));
        }
        Ok(self.store.load(identity)?.read(key).map(str::to_string))
    }

    /// 전체 문서 원문 조회 (노출 플래그 필수, 문서가 없으면 `None`)
    pub async fn view_all_secrets(
        &self,
        identity: &StoreIdentity,
    ) -> SecretsResult<Option<SecretDocument>> {
        if !self.allow_keys_exposure {
            tracing::warn!(identity = %identity, "raw secrets export denied");
            return Err(SecretsError::Unauthorized(
                "exporting secrets requires keys exposure to be enabled".to_string(),
            ));
        }
        self.store.load_existing(identity)
    }

    // =====================================
    // 관리형 로테이션
    // =====================================

    /// 원문을 제외한 관리 상태
    pub async fn manager_state(&self, identity: &StoreIdentity) -> SecretsResult<ManagerView> {
        Ok(self.store.load(identity)?.manager_view())
    }

    pub async fn manager_rotate(
        &self,
        identity: &StoreIdentity,
        key: &str,
        search: RotationSearch,
    ) -> SecretsResult<Mutation> {
        validate_key(key)?;
        self.mutate(identity, "rotate", key, |doc| Ok(doc.rotate(key, &search)))
            .await
    }

    pub async fn manager_append(
        &self,
        identity: &StoreIdentity,
        key: &str,
        comment: &str,
        value: &str,
    ) -> SecretsResult<Mutation> {
        validate_key(key)?;
        self.mutate(identity, "append", key, |doc| Ok(doc.append(key, comment, value)))
            .await
    }

    /// 범위 밖 인덱스는 에러 없이 `Unchanged`
    pub async fn manager_splice(
        &self,
        identity: &StoreIdentity,
        key: &str,
        index: usize,
    ) -> SecretsResult<Mutation> {
        validate_key(key)?;
        self.mutate(identity, "splice", key, |doc| Ok(doc.splice(key, index)))
            .await
    }

    /// 범위 밖 인덱스는 에러 없이 `Unchanged`
    pub async fn manager_rename(
        &self,
        identity: &StoreIdentity,
        key: &str,
        index: usize,
        comment: &str,
    ) -> SecretsResult<Mutation> {
        validate_key(key)?;
        self.mutate(identity, "rename", key, |doc| Ok(doc.rename(key, index, comment)))
            .await
    }

    pub async fn manager_probe(
        &self,
        identity: &StoreIdentity,
        key: &str,
    ) -> SecretsResult<ProbeResult> {
        Ok(self.store.load(identity)?.probe(key))
    }

    /// 이미 관리 중이면 `Conflict`
    pub async fn manager_migrate(
        &self,
        identity: &StoreIdentity,
        key: &str,
        comment: &str,
    ) -> SecretsResult<Mutation> {
        validate_key(key)?;
        self.mutate(identity, "migrate", key, |doc| doc.migrate(key, comment))
            .await
    }

    // =====================================
    // 마이그레이션 지원 (단일 사용자 시절 파일 → identity 저장소)
    // =====================================

    /// 레거시 시크릿 파일을 identity 저장소로 가져오기
    ///
    /// identity에 이미 문서가 있으면 아무것도 하지 않습니다. 레거시 파일은 건드리지 않습니다.
    pub async fn import_legacy_store(
        &self,
        identity: &StoreIdentity,
        legacy_path: &Path,
    ) -> SecretsResult<MigrationResult> {
        self.coordinator
            .with_exclusive(identity, move || async move {
                if self.store.exists(identity) {
                    tracing::debug!(
                        identity = %identity,
                        "secrets already present, skipping import"
                    );
                    return Ok(MigrationResult::default());
                }

                let Some(legacy) = read_document(legacy_path)? else {
                    return Ok(MigrationResult::default());
                };

                let mut result = MigrationResult::default();
                let mut imported = SecretDocument::default();

                for (key, value) in legacy.flat {
                    match validate_key(&key) {
                        Ok(()) => {
                            result.details.push(format!("✓ {key}"));
                            imported.flat.insert(key, value);
                            result.migrated += 1;
                        }
                        Err(e) => {
                            result.details.push(format!("✗ {key:?} skipped: {e}"));
                            result.skipped += 1;
                        }
                    }
                }
                for (key, list) in legacy.managed {
                    match validate_key(&key) {
                        Ok(()) => {
                            result
                                .details
                                .push(format!("✓ {key} ({} managed entries)", list.len()));
                            imported.managed.insert(key, list);
                        }
                        Err(e) => {
                            result.details.push(format!("✗ {key:?} skipped: {e}"));
                            result.skipped += 1;
                        }
                    }
                }

                self.store.save(identity, &imported)?;
                tracing::info!(
                    identity = %identity,
                    migrated = result.migrated,
                    skipped = result.skipped,
                    "legacy secrets imported"
                );
                Ok(result)
            })
            .await
    }
}

/// 마이그레이션 결과
#[derive(Debug, Clone, Default, Serialize)]
pub struct MigrationResult {
    pub migrated: usize,
    pub skipped: usize,
    pub details: Vec<String>,
}

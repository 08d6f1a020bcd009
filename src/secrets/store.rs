//! 시크릿 파일 I/O
//!
//! 사용자(= [`StoreIdentity`])마다 `<data_root>/<identity>/secrets.json` 파일 하나.
//!
//! - 파일이 없으면 빈 문서로 취급
//! - 파일이 있는데 파싱 실패하면 `Corrupted` (빈 문서로 덮어쓰지 않음)
//! - 저장은 임시 파일에 쓰고 fsync 후 rename (중간 상태가 보이지 않음)

use crate::error::{SecretsError, SecretsResult};
use crate::secrets::document::SecretDocument;
use std::fmt;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use zeroize::Zeroize;

/// 시크릿 파일 이름
pub const SECRETS_FILE: &str = "secrets.json";

/// 사용자별 시크릿 문서 식별자
///
/// 데이터 루트 아래 디렉토리 이름으로 그대로 쓰이므로 경로 구분자 등은 거부합니다.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StoreIdentity(String);

impl StoreIdentity {
    pub fn new(handle: &str) -> SecretsResult<Self> {
        let handle = handle.trim();
        if handle.is_empty() {
            return Err(SecretsError::InvalidIdentity("empty".to_string()));
        }
        if handle == "." || handle == ".." {
            return Err(SecretsError::InvalidIdentity(handle.to_string()));
        }
        let forbidden = |c: char| {
            matches!(c, '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|') || c.is_control()
        };
        if handle.chars().any(forbidden) {
            return Err(SecretsError::InvalidIdentity(handle.to_string()));
        }
        Ok(Self(handle.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StoreIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 파일 기반 시크릿 저장소
#[derive(Debug, Clone)]
pub struct SecretStore {
    data_root: PathBuf,
}

impl SecretStore {
    pub fn new(data_root: impl Into<PathBuf>) -> Self {
        Self {
            data_root: data_root.into(),
        }
    }

    pub fn data_root(&self) -> &Path {
        &self.data_root
    }

    /// identity 기반 시크릿 파일 경로
    pub fn path_for(&self, identity: &StoreIdentity) -> PathBuf {
        self.data_root.join(identity.as_str()).join(SECRETS_FILE)
    }

    /// 문서 로드 (파일이 없으면 빈 문서)
    pub fn load(&self, identity: &StoreIdentity) -> SecretsResult<SecretDocument> {
        Ok(self.load_existing(identity)?.unwrap_or_default())
    }

    /// 문서 로드 (파일이 없으면 `None`)
    pub fn load_existing(
        &self,
        identity: &StoreIdentity,
    ) -> SecretsResult<Option<SecretDocument>> {
        let document = read_document(&self.path_for(identity))?;
        tracing::debug!(identity = %identity, found = document.is_some(), "secrets file loaded");
        Ok(document)
    }

    pub fn exists(&self, identity: &StoreIdentity) -> bool {
        self.path_for(identity).is_file()
    }

    /// 문서 전체를 원자적으로 교체
    pub fn save(&self, identity: &StoreIdentity, document: &SecretDocument) -> SecretsResult<()> {
        let path = self.path_for(identity);
        write_document(&path, document)?;
        tracing::debug!(identity = %identity, "secrets file saved");
        Ok(())
    }
}

/// 경로의 문서를 읽고 파싱 (파일이 없으면 `None`)
pub fn read_document(path: &Path) -> SecretsResult<Option<SecretDocument>> {
    let mut raw = match fs::read(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    let parsed = serde_json::from_slice::<SecretDocument>(&raw);
    raw.zeroize();

    match parsed {
        Ok(document) => Ok(Some(document)),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "secrets file could not be parsed");
            Err(SecretsError::Corrupted {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })
        }
    }
}

/// 임시 파일에 쓰고 rename으로 교체
///
/// 같은 디렉토리에 임시 파일을 만들어야 rename이 원자적입니다.
pub fn write_document(path: &Path, document: &SecretDocument) -> SecretsResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut plaintext = serde_json::to_vec_pretty(document)?;

    let tmp_path = path.with_extension(format!("json.{}.tmp", uuid::Uuid::new_v4().simple()));
    let written = write_synced(&tmp_path, &plaintext);
    plaintext.zeroize();

    if let Err(e) = written.and_then(|()| fs::rename(&tmp_path, path)) {
        let _ = fs::remove_file(&tmp_path);
        return Err(e.into());
    }

    if let Some(parent) = path.parent() {
        sync_dir(parent)?;
    }
    Ok(())
}

/// rename 결과(디렉토리 엔트리)까지 디스크에 반영
#[cfg(unix)]
fn sync_dir(dir: &Path) -> std::io::Result<()> {
    fs::File::open(dir)?.sync_all()
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> std::io::Result<()> {
    Ok(())
}

fn write_synced(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = fs::File::create(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::secrets::document::ManagedEntry;
    use tempfile::tempdir;

    fn alice() -> StoreIdentity {
        StoreIdentity::new("alice").unwrap()
    }

    #[test]
    fn missing_file_loads_empty_document() {
        let dir = tempdir().unwrap();
        let store = SecretStore::new(dir.path());

        assert!(store.load(&alice()).unwrap().is_empty());
        assert!(store.load_existing(&alice()).unwrap().is_none());
        assert!(!store.exists(&alice()));
    }

    #[test]
    fn save_then_load_roundtrip() {
        let dir = tempdir().unwrap();
        let store = SecretStore::new(dir.path());

        let mut doc = SecretDocument::default();
        doc.write("api_key_openai", "sk-test123");
        doc.managed
            .insert("api_key_openai".into(), vec![ManagedEntry::new("prod", "sk-test123")]);

        store.save(&alice(), &doc).unwrap();
        assert!(store.exists(&alice()));
        assert_eq!(store.load(&alice()).unwrap(), doc);
    }

    #[test]
    fn save_leaves_no_temp_files_behind() {
        let dir = tempdir().unwrap();
        let store = SecretStore::new(dir.path());
        store.save(&alice(), &SecretDocument::default()).unwrap();
        store.save(&alice(), &SecretDocument::default()).unwrap();

        let names: Vec<_> = fs::read_dir(dir.path().join("alice"))
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(names, vec![SECRETS_FILE.to_string()]);
    }

    #[test]
    fn failed_rename_cleans_up_temp_file() {
        let dir = tempdir().unwrap();
        let store = SecretStore::new(dir.path());
        let path = store.path_for(&alice());

        // 대상 자리에 비어 있지 않은 디렉토리가 있으면 rename이 실패한다.
        fs::create_dir_all(&path).unwrap();
        fs::write(path.join("keep"), b"old").unwrap();

        let mut doc = SecretDocument::default();
        doc.write("api_key_openai", "sk-new");
        assert!(matches!(store.save(&alice(), &doc), Err(SecretsError::Io(_))));

        let names: Vec<_> = fs::read_dir(dir.path().join("alice"))
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(names, vec![SECRETS_FILE.to_string()]);
        assert_eq!(fs::read(path.join("keep")).unwrap(), b"old");
    }

    #[test]
    fn save_over_existing_file_replaces_whole_document() {
        let dir = tempdir().unwrap();
        let store = SecretStore::new(dir.path());

        let mut first = SecretDocument::default();
        first.write("api_key_openai", "sk-old");
        first.write("api_key_claude", "sk-claude");
        store.save(&alice(), &first).unwrap();

        let mut second = SecretDocument::default();
        second.write("api_key_openai", "sk-new");
        store.save(&alice(), &second).unwrap();

        assert_eq!(store.load(&alice()).unwrap(), second);
    }

    #[test]
    fn corrupted_file_is_reported_not_replaced() {
        let dir = tempdir().unwrap();
        let store = SecretStore::new(dir.path());
        let path = store.path_for(&alice());
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, b"{ not json").unwrap();

        let err = store.load(&alice()).unwrap_err();
        assert!(matches!(err, SecretsError::Corrupted { .. }));
        assert_eq!(fs::read(&path).unwrap(), b"{ not json");
    }

    #[test]
    fn wrong_shape_is_corrupted() {
        let dir = tempdir().unwrap();
        let store = SecretStore::new(dir.path());
        let path = store.path_for(&alice());
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, br#"{"managed": "oops"}"#).unwrap();

        assert!(matches!(store.load(&alice()), Err(SecretsError::Corrupted { .. })));
    }

    #[test]
    fn identity_rejects_path_tricks() {
        for bad in ["", "  ", ".", "..", "a/b", "a\\b", "c:", "a\tb"] {
            assert!(
                matches!(StoreIdentity::new(bad), Err(SecretsError::InvalidIdentity(_))),
                "{bad:?} should be rejected"
            );
        }
        assert_eq!(StoreIdentity::new(" bob ").unwrap().as_str(), "bob");
    }
}

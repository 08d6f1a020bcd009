//! 시크릿 저장소 설정
//!
//! `.env` 파일과 환경 변수에서 데이터 루트와 원문 노출 허용 여부를 읽습니다.

use std::path::PathBuf;

/// 데이터 루트 환경 변수
pub const DATA_ROOT_ENV: &str = "SECRETS_DATA_ROOT";
/// 원문 노출 허용 환경 변수
pub const ALLOW_EXPOSURE_ENV: &str = "SECRETS_ALLOW_KEYS_EXPOSURE";

const DEFAULT_DATA_ROOT: &str = "./data";

/// 저장소 설정
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretsConfig {
    /// 사용자별 시크릿 디렉토리가 생성되는 루트
    pub data_root: PathBuf,
    /// 시크릿 원문을 저장소 밖으로 내보낼 수 있는지 여부
    pub allow_keys_exposure: bool,
}

impl SecretsConfig {
    pub fn new(data_root: impl Into<PathBuf>) -> Self {
        Self {
            data_root: data_root.into(),
            allow_keys_exposure: false,
        }
    }

    pub fn with_keys_exposure(mut self, allow: bool) -> Self {
        self.allow_keys_exposure = allow;
        self
    }

    /// 환경 변수에서 설정 로드
    ///
    /// `.env`가 없어도 실패하지 않습니다. 이미 설정된 환경 변수가 우선합니다.
    pub fn from_env() -> Self {
        if let Err(err) = dotenvy::dotenv() {
            if !err.not_found() {
                tracing::warn!(error = %err, "failed to parse .env file, ignoring");
            }
        }

        let data_root = std::env::var(DATA_ROOT_ENV)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_ROOT));

        let allow_keys_exposure = std::env::var(ALLOW_EXPOSURE_ENV)
            .map(|v| parse_flag(&v))
            .unwrap_or(false);

        Self {
            data_root,
            allow_keys_exposure,
        }
    }
}

impl Default for SecretsConfig {
    fn default() -> Self {
        Self::new(DEFAULT_DATA_ROOT)
    }
}

fn parse_flag(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

//! Provider Secrets Error Types
//!
//! 시크릿 저장소 전역 에러 타입 정의

use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

/// 시크릿 저장소 에러
///
/// "할 일이 없어서 아무 변화가 없었음"은 에러가 아닙니다.
/// 그런 경우는 [`crate::secrets::Mutation::Unchanged`]로 돌려줍니다.
#[derive(Error, Debug)]
pub enum SecretsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// 파일은 있는데 문서 구조로 파싱할 수 없음 (빈 문서로 대체하지 않음)
    #[error("Secrets file is corrupted ({}): {reason}", .path.display())]
    Corrupted { path: PathBuf, reason: String },

    #[error("Secret is already managed: {0}")]
    Conflict(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid key: {0}")]
    InvalidKey(String),

    #[error("Invalid store identity: {0}")]
    InvalidIdentity(String),
}

impl SecretsError {
    /// 호출자에게 노출되는 안정적인 에러 코드
    pub fn code(&self) -> &'static str {
        match self {
            SecretsError::Io(_) => "IO_ERROR",
            SecretsError::Serialization(_) => "SERIALIZATION_ERROR",
            SecretsError::Corrupted { .. } => "CORRUPTED",
            SecretsError::Conflict(_) => "CONFLICT",
            SecretsError::Unauthorized(_) => "UNAUTHORIZED",
            SecretsError::NotFound(_) => "NOT_FOUND",
            SecretsError::InvalidKey(_) => "INVALID_KEY",
            SecretsError::InvalidIdentity(_) => "INVALID_IDENTITY",
        }
    }
}

pub type SecretsResult<T> = Result<T, SecretsError>;

/// 전송 계층 응답용 직렬화 가능한 에러
#[derive(Debug, Serialize)]
pub struct CommandError {
    pub code: String,
    pub message: String,
    pub details: Option<String>,
}

impl From<SecretsError> for CommandError {
    fn from(error: SecretsError) -> Self {
        let details = match &error {
            SecretsError::Corrupted { path, .. } => Some(path.display().to_string()),
            _ => None,
        };

        CommandError {
            code: error.code().to_string(),
            message: error.to_string(),
            details,
        }
    }
}

/// 전송 계층 결과 타입
pub type CommandResult<T> = Result<T, CommandError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflict_and_unauthorized_have_distinct_codes() {
        let conflict = CommandError::from(SecretsError::Conflict("api_key_openai".into()));
        let denied = CommandError::from(SecretsError::Unauthorized("exposure disabled".into()));

        assert_eq!(conflict.code, "CONFLICT");
        assert_eq!(denied.code, "UNAUTHORIZED");
        assert_ne!(conflict.code, denied.code);
        assert!(conflict.message.contains("api_key_openai"));
    }

    #[test]
    fn corrupted_error_carries_path_in_details() {
        let err = SecretsError::Corrupted {
            path: PathBuf::from("/tmp/alice/secrets.json"),
            reason: "expected value at line 1".into(),
        };
        let payload = CommandError::from(err);

        assert_eq!(payload.code, "CORRUPTED");
        assert_eq!(payload.details.as_deref(), Some("/tmp/alice/secrets.json"));

        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["code"], "CORRUPTED");
    }
}

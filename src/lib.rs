//! Provider Secrets
//!
//! 사용자별 프로바이더 API 키 저장소. 키 하나에 여러 후보 값을 두고
//! 활성 값을 순환시키는 관리형 로테이션을 제공합니다.
//!
//! ```no_run
//! use provider_secrets::{RotationSearch, SecretManager, SecretsConfig, StoreIdentity};
//!
//! # async fn demo() -> provider_secrets::SecretsResult<()> {
//! let secrets = SecretManager::from_config(&SecretsConfig::from_env());
//! let user = StoreIdentity::new("default-user")?;
//!
//! secrets.write_secret(&user, "api_key_openai", "sk-one").await?;
//! secrets.manager_migrate(&user, "api_key_openai", "primary").await?;
//! secrets.manager_append(&user, "api_key_openai", "backup", "sk-two").await?;
//! secrets.manager_rotate(&user, "api_key_openai", RotationSearch::Next).await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod secrets;

pub use config::SecretsConfig;
pub use error::{CommandError, CommandResult, SecretsError, SecretsResult};
pub use secrets::{
    KeyCatalog, ManagedEntry, ManagerSlot, ManagerView, MigrationResult, Mutation,
    MutationCoordinator, ProbeResult, RotationSearch, SecretDocument, SecretManager, SecretStore,
    StoreIdentity,
};

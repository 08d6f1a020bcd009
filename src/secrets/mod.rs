//! Secret 모듈
//!
//! 사용자별 JSON 파일 하나에 프로바이더 키를 저장하고, 키마다 여러 후보 값을 두고
//! 활성 값을 돌려 쓰는 관리형 로테이션을 지원합니다.
//!
//! - `document`: 문서 구조와 레거시 단일 값 연산
//! - `rotation`: 후보 목록 연산 (append/splice/probe/rotate/migrate)
//! - `store`: 파일 로드/원자적 저장
//! - `coordinator`: identity별 변경 연산 직렬화
//! - `manager`: 호출자용 연산 표면

pub mod catalog;
pub mod coordinator;
pub mod document;
pub mod manager;
pub mod rotation;
pub mod store;

pub use catalog::KeyCatalog;
pub use coordinator::MutationCoordinator;
pub use document::{ManagedEntry, Mutation, SecretDocument};
pub use manager::{MigrationResult, SecretManager};
pub use rotation::{ManagerSlot, ManagerView, ProbeResult, RotationSearch};
pub use store::{SecretStore, StoreIdentity};

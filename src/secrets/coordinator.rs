//! 변경 연산 직렬화
//!
//! 같은 [`StoreIdentity`]에 대한 load → 계산 → save 사이클은 한 번에 하나만 진행됩니다.
//! 대기자는 도착 순서대로(FIFO) 락을 얻습니다. 다른 identity끼리는 서로 막지 않습니다.
//!
//! 락은 identity별 `tokio::sync::Mutex`이며, 아무도 쓰지 않게 되면 맵에서 제거됩니다.

use crate::error::SecretsResult;
use crate::secrets::store::StoreIdentity;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use tokio::sync::Mutex as AsyncMutex;

type IdentityLock = Arc<AsyncMutex<()>>;

/// identity별 배타 락 관리자
#[derive(Debug, Default)]
pub struct MutationCoordinator {
    locks: Mutex<HashMap<StoreIdentity, IdentityLock>>,
}

impl MutationCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// identity의 락을 가져오거나 생성
    fn lock_for(&self, identity: &StoreIdentity) -> IdentityLock {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        Arc::clone(
            locks
                .entry(identity.clone())
                .or_insert_with(|| Arc::new(AsyncMutex::new(()))),
        )
    }

    /// 더 이상 대기자가 없는 락 정리
    ///
    /// 맵이 가진 참조와 호출자가 가진 참조 두 개만 남았으면 제거합니다.
    /// 맵 락을 잡은 동안에는 새 참조가 생기지 않으므로 카운트가 안정적입니다.
    fn release(&self, identity: &StoreIdentity, lock: IdentityLock) {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        if Arc::strong_count(&lock) == 2 {
            locks.remove(identity);
        }
    }

    /// 배타 락을 잡은 상태로 `op` 실행
    pub async fn with_exclusive<F, Fut, T>(
        &self,
        identity: &StoreIdentity,
        op: F,
    ) -> SecretsResult<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = SecretsResult<T>>,
    {
        let lock = self.lock_for(identity);
        let result = {
            let _guard = lock.lock().await;
            tracing::trace!(identity = %identity, "exclusive access acquired");
            op().await
        };
        self.release(identity, lock);
        result
    }

    /// 현재 추적 중인 identity 수
    pub fn tracked(&self) -> usize {
        self.locks.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

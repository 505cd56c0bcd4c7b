use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

/// Per-namespace mutexes serialising alias rebinds.
///
/// Cloning shares the underlying map, so the namespace service and the
/// document writer contend on the same lock for a given namespace. The locks
/// are not reentrant: code running under one must not take it again.
#[derive(Clone, Default)]
pub struct NamespaceLocks {
    locks: Arc<DashMap<Uuid, Arc<Mutex<()>>>>,
}

impl NamespaceLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_namespace(&self, id: Uuid) -> Arc<Mutex<()>> {
        self.locks
            .entry(id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_clones_share_locks() {
        let locks = NamespaceLocks::new();
        let shared = locks.clone();
        let id = Uuid::new_v4();

        let held = locks.for_namespace(id);
        let _guard = held.lock().await;
        assert!(shared.for_namespace(id).try_lock().is_err());
        assert!(shared.for_namespace(Uuid::new_v4()).try_lock().is_ok());
    }
}

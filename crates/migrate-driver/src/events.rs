//! Migration lifecycle observers

use async_trait::async_trait;

use crate::error::DriverError;

/// Listener for ledger lifecycle events
///
/// Every method has a no-op default; implement only what you need.
#[async_trait]
pub trait MigrationObserver: Send + Sync {
    async fn migration_applied(&self, _name: &str) {}

    async fn migration_reverted(&self, _name: &str) {}

    async fn migration_failed(&self, _name: &str, _error: &DriverError) {}
}

/// Ordered set of observers notified by the migrations ledger
#[derive(Default)]
pub struct ObserverRegistry {
    observers: Vec<Box<dyn MigrationObserver>>,
}

impl ObserverRegistry {
    pub fn new() -> Self {
        Self {
            observers: Vec::new(),
        }
    }

    pub fn register(&mut self, observer: Box<dyn MigrationObserver>) {
        self.observers.push(observer);
    }

    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    pub async fn trigger_applied(&self, name: &str) {
        for observer in &self.observers {
            observer.migration_applied(name).await;
        }
    }

    pub async fn trigger_reverted(&self, name: &str) {
        for observer in &self.observers {
            observer.migration_reverted(name).await;
        }
    }

    pub async fn trigger_failed(&self, name: &str, error: &DriverError) {
        for observer in &self.observers {
            observer.migration_failed(name, error).await;
        }
    }
}

impl std::fmt::Debug for ObserverRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObserverRegistry")
            .field("observers", &self.observers.len())
            .finish()
    }
}

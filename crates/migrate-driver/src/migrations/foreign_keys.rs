//! Deferred foreign keys
//!
//! Foreign keys declared on columns cannot be created until every table they
//! reference exists, so table and column builders hand them out as deferred
//! actions. [`ForeignKeyChain`] drains a batch of them strictly one at a time.

use std::future::Future;
use std::pin::Pin;

use crate::backends::Driver;
use crate::error::DriverResult;

use super::column::ForeignKeyOptions;

/// A unit of work that runs only when awaited
pub type DeferredAction<'a> = Pin<Box<dyn Future<Output = DriverResult<()>> + Send + 'a>>;

/// Bind a column's foreign key to the driver's `add_foreign_key` hook
pub fn bind_foreign_key<'a, D: Driver + ?Sized>(
    driver: &'a D,
    table_name: &str,
    column_name: &str,
    foreign_key: ForeignKeyOptions,
) -> DeferredAction<'a> {
    let table_name = table_name.to_string();
    let mapping = foreign_key.resolve_mapping(column_name);

    Box::pin(async move {
        driver
            .add_foreign_key(
                &table_name,
                &foreign_key.table,
                foreign_key.name.as_deref(),
                &mapping,
                &foreign_key.rules,
            )
            .await
    })
}

/// Sequential runner for deferred actions
///
/// Actions drain last-in-first-out. Each one completes before the next
/// starts, and the first failure stops the chain.
#[derive(Default)]
pub struct ForeignKeyChain<'a> {
    pending: Vec<DeferredAction<'a>>,
}

impl<'a> ForeignKeyChain<'a> {
    pub fn new() -> Self {
        Self {
            pending: Vec::new(),
        }
    }

    pub fn push(&mut self, action: DeferredAction<'a>) {
        self.pending.push(action);
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Run every pending action, most recently pushed first
    pub async fn run(mut self) -> DriverResult<()> {
        if self.pending.is_empty() {
            return Ok(());
        }

        tracing::debug!(count = self.pending.len(), "running deferred foreign keys");
        while let Some(action) = self.pending.pop() {
            action.await?;
        }
        Ok(())
    }
}

impl<'a> FromIterator<DeferredAction<'a>> for ForeignKeyChain<'a> {
    fn from_iter<I: IntoIterator<Item = DeferredAction<'a>>>(iter: I) -> Self {
        Self {
            pending: iter.into_iter().collect(),
        }
    }
}

impl std::fmt::Debug for ForeignKeyChain<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ForeignKeyChain")
            .field("pending", &self.pending.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DriverError;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    struct Probe {
        log: Arc<Mutex<Vec<&'static str>>>,
        in_flight: Arc<AtomicUsize>,
        max_in_flight: Arc<AtomicUsize>,
    }

    impl Probe {
        fn new() -> Self {
            Self {
                log: Arc::new(Mutex::new(Vec::new())),
                in_flight: Arc::new(AtomicUsize::new(0)),
                max_in_flight: Arc::new(AtomicUsize::new(0)),
            }
        }

        fn action(&self, label: &'static str, fail: bool) -> DeferredAction<'static> {
            let log = Arc::clone(&self.log);
            let in_flight = Arc::clone(&self.in_flight);
            let max_in_flight = Arc::clone(&self.max_in_flight);

            Box::pin(async move {
                let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                max_in_flight.fetch_max(now, Ordering::SeqCst);
                tokio::task::yield_now().await;
                log.lock().unwrap().push(label);
                in_flight.fetch_sub(1, Ordering::SeqCst);

                if fail {
                    Err(DriverError::execution(format!("{} failed", label)))
                } else {
                    Ok(())
                }
            })
        }

        fn log(&self) -> Vec<&'static str> {
            self.log.lock().unwrap().clone()
        }
    }

    #[tokio::test]
    async fn test_empty_chain_completes_immediately() {
        let chain = ForeignKeyChain::new();
        assert!(chain.is_empty());
        chain.run().await.unwrap();
    }

    #[tokio::test]
    async fn test_chain_drains_last_in_first_out() {
        let probe = Probe::new();
        let mut chain = ForeignKeyChain::new();
        chain.push(probe.action("A", false));
        chain.push(probe.action("B", false));
        chain.push(probe.action("C", false));
        assert_eq!(chain.len(), 3);

        chain.run().await.unwrap();

        assert_eq!(probe.log(), vec!["C", "B", "A"]);
        assert_eq!(probe.max_in_flight.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failure_stops_remaining_actions() {
        let probe = Probe::new();
        let chain: ForeignKeyChain<'_> = vec![
            probe.action("A", false),
            probe.action("B", true),
            probe.action("C", false),
        ]
        .into_iter()
        .collect();

        let err = chain.run().await.unwrap_err();

        assert_eq!(err.to_string(), "Execution error: B failed");
        assert_eq!(probe.log(), vec!["C", "B"]);
    }

    #[tokio::test]
    async fn test_actions_do_not_run_before_chain() {
        let probe = Probe::new();
        let mut chain = ForeignKeyChain::new();
        chain.push(probe.action("A", false));

        assert!(probe.log().is_empty());
        chain.run().await.unwrap();
        assert_eq!(probe.log(), vec!["A"]);
    }
}

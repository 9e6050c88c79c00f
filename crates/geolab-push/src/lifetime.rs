//! Worker lifetime extension
//!
//! The host may tear an idle worker down between events. A handler that
//! starts asynchronous work hands it to [`ExtendLifetime::wait_until`]; the
//! host keeps the worker alive until [`ExtendLifetime::settle`] completes.

use std::fmt;
use std::future::Future;
use std::pin::Pin;

type PendingWork<'a> = Pin<Box<dyn Future<Output = ()> + 'a>>;

/// Capability token given to each worker event handler
#[derive(Default)]
pub struct ExtendLifetime<'a> {
    pending: Vec<PendingWork<'a>>,
}

impl<'a> ExtendLifetime<'a> {
    pub fn new() -> Self {
        Self { pending: Vec::new() }
    }

    /// Keep the worker alive until `work` resolves
    pub fn wait_until<F>(&mut self, work: F)
    where
        F: Future<Output = ()> + 'a,
    {
        self.pending.push(Box::pin(work));
    }

    /// Number of registered, not yet settled futures
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    pub fn is_idle(&self) -> bool {
        self.pending.is_empty()
    }

    /// Drive every registered future to completion, in registration order
    pub async fn settle(self) {
        for work in self.pending {
            work.await;
        }
    }
}

impl fmt::Debug for ExtendLifetime<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtendLifetime")
            .field("pending", &self.pending.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_work_runs_on_settle() {
        let ran = Cell::new(0);
        let mut lifetime = ExtendLifetime::new();

        lifetime.wait_until(async { ran.set(ran.get() + 1) });
        lifetime.wait_until(async { ran.set(ran.get() + 10) });
        assert_eq!(lifetime.pending(), 2);
        assert_eq!(ran.get(), 0);

        smol::block_on(lifetime.settle());
        assert_eq!(ran.get(), 11);
    }

    #[test]
    fn test_idle() {
        let lifetime = ExtendLifetime::new();
        assert!(lifetime.is_idle());
        smol::block_on(lifetime.settle());
    }
}

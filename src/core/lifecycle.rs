/*!
 * Process Lifecycle
 * Reference count that decides whether the subsystem may be torn down
 */

use crate::memory::traits::ModuleRef;
use miette::Diagnostic;
use std::future::Future;
use std::io;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, warn};

#[derive(Error, Debug, Clone, PartialEq, Eq, Diagnostic)]
pub enum LifecycleError {
    #[error("Unload refused: {refs} reference(s) held")]
    #[diagnostic(
        code(lifecycle::busy),
        help("Memory has been handed to the system; the subsystem must keep running.")
    )]
    Busy { refs: usize },
}

/// Teardown reference count
///
/// `try_get` succeeds until unloading starts; `begin_unload` succeeds only
/// while nobody holds a reference.
#[derive(Debug, Default)]
pub struct Lifecycle {
    refs: AtomicUsize,
    unloading: AtomicBool,
}

impl Lifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn refs(&self) -> usize {
        self.refs.load(Ordering::SeqCst)
    }

    pub fn is_unloading(&self) -> bool {
        self.unloading.load(Ordering::SeqCst)
    }

    /// Start teardown
    pub fn begin_unload(&self) -> Result<(), LifecycleError> {
        if self.unloading.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        let refs = self.refs.load(Ordering::SeqCst);
        if refs > 0 {
            self.unloading.store(false, Ordering::SeqCst);
            return Err(LifecycleError::Busy { refs });
        }

        info!("Unloading");
        Ok(())
    }
}

impl ModuleRef for Lifecycle {
    fn try_get(&self) -> bool {
        if self.is_unloading() {
            return false;
        }
        self.refs.fetch_add(1, Ordering::SeqCst);

        // Lost the race against begin_unload.
        if self.is_unloading() {
            self.refs.fetch_sub(1, Ordering::SeqCst);
            return false;
        }
        true
    }
}

/// Resolve once an interrupt arrives while nothing pins `lifecycle`
///
/// Interrupts that arrive while pinned are refused. If `interrupt` fails,
/// the handler is gone and this never resolves.
pub async fn wait_for_unload<F, Fut>(lifecycle: Arc<Lifecycle>, mut interrupt: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = io::Result<()>>,
{
    loop {
        if let Err(e) = interrupt().await {
            error!(error = %e, "Failed to listen for interrupt, serving until killed");
            std::future::pending::<()>().await;
        }
        match lifecycle.begin_unload() {
            Ok(()) => return,
            Err(e) => warn!(error = %e, "Memory was handed over, refusing to unload"),
        }
    }
}

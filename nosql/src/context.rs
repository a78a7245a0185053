//! Execution context carrying cancellation and an optional deadline.
//!
//! Every operation that may touch a backend takes a [Context]. Backends call
//! [`Context::check`] before doing work and on every iterator advance, and
//! return `Cancelled` or `DeadlineExceeded` once the context is done.
//!
//! ```rust
//! use nosql::context::Context;
//! use std::time::Duration;
//!
//! let ctx = Context::background();
//! assert!(ctx.check().is_ok());
//!
//! let (child, cancel) = ctx.with_cancel();
//! let timed = child.with_timeout(Duration::from_secs(30));
//! cancel.cancel();
//! assert!(timed.check().unwrap_err().is_cancelled());
//! ```

use crate::errors::{ErrorKind, NosqlError, NosqlResult};
use std::fmt::{Debug, Formatter};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// A cheap, cloneable cancellation scope.
///
/// Contexts form a tree. A child is done when it is cancelled itself, when any
/// ancestor is cancelled, or when the earliest deadline on its chain passes.
#[derive(Clone)]
pub struct Context {
    inner: Arc<ContextInner>,
}

struct ContextInner {
    parent: Option<Context>,
    cancelled: AtomicBool,
    deadline: Option<Instant>,
}

/// Cancels the context returned alongside it by [`Context::with_cancel`].
#[derive(Clone)]
pub struct CancelHandle {
    context: Context,
}

impl CancelHandle {
    /// Cancels the context and every context derived from it.
    pub fn cancel(&self) {
        self.context.inner.cancelled.store(true, Ordering::Release);
    }
}

impl Context {
    /// The root context. It is never cancelled and has no deadline.
    pub fn background() -> Self {
        Context {
            inner: Arc::new(ContextInner {
                parent: None,
                cancelled: AtomicBool::new(false),
                deadline: None,
            }),
        }
    }

    fn child(&self, deadline: Option<Instant>) -> Self {
        // a child never outlives the parent deadline
        let deadline = match (deadline, self.deadline()) {
            (Some(own), Some(parent)) => Some(own.min(parent)),
            (own, parent) => own.or(parent),
        };

        Context {
            inner: Arc::new(ContextInner {
                parent: Some(self.clone()),
                cancelled: AtomicBool::new(false),
                deadline,
            }),
        }
    }

    /// Derives a context that is done once `timeout` has elapsed.
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        self.child(Instant::now().checked_add(timeout))
    }

    /// Derives a context that is done at `deadline`.
    pub fn with_deadline(&self, deadline: Instant) -> Self {
        self.child(Some(deadline))
    }

    /// Derives a cancellable context.
    pub fn with_cancel(&self) -> (Self, CancelHandle) {
        let context = self.child(None);
        let handle = CancelHandle {
            context: context.clone(),
        };
        (context, handle)
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.inner.deadline
    }

    /// Returns `true` if this context or one of its ancestors was cancelled.
    pub fn is_cancelled(&self) -> bool {
        let mut current = Some(self);
        while let Some(context) = current {
            if context.inner.cancelled.load(Ordering::Acquire) {
                return true;
            }
            current = context.inner.parent.as_ref();
        }
        false
    }

    pub fn is_expired(&self) -> bool {
        self.inner
            .deadline
            .map(|deadline| Instant::now() >= deadline)
            .unwrap_or(false)
    }

    pub fn is_done(&self) -> bool {
        self.is_cancelled() || self.is_expired()
    }

    /// Returns an error if the context is done.
    ///
    /// # Errors
    ///
    /// `Cancelled` when cancelled, `DeadlineExceeded` when the deadline passed.
    /// Cancellation wins when both hold.
    pub fn check(&self) -> NosqlResult<()> {
        if self.is_cancelled() {
            log::error!("Operation cancelled");
            return Err(NosqlError::new("context cancelled", ErrorKind::Cancelled));
        }

        if self.is_expired() {
            log::error!("Operation deadline exceeded");
            return Err(NosqlError::new(
                "context deadline exceeded",
                ErrorKind::DeadlineExceeded,
            ));
        }
        Ok(())
    }
}

impl Default for Context {
    fn default() -> Self {
        Context::background()
    }
}

impl Debug for Context {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("cancelled", &self.is_cancelled())
            .field("deadline", &self.inner.deadline)
            .finish()
    }
}

//! # Subordinate execution context.
//!
//! The subordinate is a second runtime the supervisor starts to run the
//! application's own logic. The supervisor only knows how to launch it and how
//! to talk to it over a [`SubordinatePort`].
//!
//! [`Subordinate::launch`] covers construction and the initial entrypoint. It
//! returns once the context is up; long-running work the context starts must
//! watch the [`CancellationToken`] it was given, which the supervisor cancels
//! on teardown.
//!
//! ## Launch outcome
//! ```text
//! create() ──► spawn(launch) ──► Ok(())            → SubordinateStatus::Ready   (channel live)
//!                            ──► Err(StartError)   → SubordinateStatus::Failed  (channel dead)
//!                            ──► panic             → SubordinateStatus::Failed(Panicked)
//! ```

use std::borrow::Cow;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::control::SubordinatePort;
use crate::error::StartError;

/// # Launchable subordinate execution context.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use tokio_util::sync::CancellationToken;
/// use agentvisor::{StartError, Subordinate, SubordinatePort};
///
/// struct Engine;
///
/// #[async_trait]
/// impl Subordinate for Engine {
///     fn name(&self) -> &str { "engine" }
///
///     async fn launch(&self, mut port: SubordinatePort, ctx: CancellationToken) -> Result<(), StartError> {
///         tokio::spawn(async move {
///             loop {
///                 tokio::select! {
///                     _ = ctx.cancelled() => break,
///                     msg = port.next_message() => if msg.is_none() { break },
///                 }
///             }
///         });
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Subordinate: Send + Sync + 'static {
    /// Returns a stable, human-readable name.
    fn name(&self) -> &str;

    /// Constructs the context and runs its initial entrypoint.
    async fn launch(&self, port: SubordinatePort, ctx: CancellationToken)
    -> Result<(), StartError>;
}

/// Shared handle to a subordinate launcher.
pub type SubordinateRef = Arc<dyn Subordinate>;

/// Observable launch status of the subordinate.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub enum SubordinateStatus {
    /// Nothing launched yet (or no subordinate configured).
    #[default]
    Idle,
    /// Launch in flight; messages to it are dropped.
    Starting,
    /// Up; the control channel is live.
    Ready,
    /// Launch failed; the control channel stays dead until the next `create`.
    Failed(StartError),
    /// Torn down.
    Stopped,
}

/// Function-backed subordinate.
///
/// Wraps a closure that creates a fresh launch future per call.
pub struct SubordinateFn<F> {
    name: Cow<'static, str>,
    f: F,
}

impl<F> SubordinateFn<F> {
    /// Creates a new function-backed subordinate.
    pub fn new(name: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }

    /// Creates the subordinate and returns it as a shared handle.
    ///
    /// ```rust
    /// use tokio_util::sync::CancellationToken;
    /// use agentvisor::{StartError, SubordinateFn, SubordinatePort, SubordinateRef};
    ///
    /// let s: SubordinateRef = SubordinateFn::arc("noop", |_port: SubordinatePort, _ctx: CancellationToken| async {
    ///     Ok::<_, StartError>(())
    /// });
    /// assert_eq!(s.name(), "noop");
    /// ```
    pub fn arc(name: impl Into<Cow<'static, str>>, f: F) -> Arc<Self> {
        Arc::new(Self::new(name, f))
    }
}

#[async_trait]
impl<F, Fut> Subordinate for SubordinateFn<F>
where
    F: Fn(SubordinatePort, CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), StartError>> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn launch(
        &self,
        port: SubordinatePort,
        ctx: CancellationToken,
    ) -> Result<(), StartError> {
        (self.f)(port, ctx).await
    }
}

//! Task spawning.

pub use tokio::task::{spawn_blocking, yield_now, JoinError, JoinHandle};

/// Spawns a background task on the current runtime.
///
/// # Panics
///
/// Panics when called outside of a runtime context, like Tokio's own `spawn`.
pub fn spawn<F>(future: F) -> JoinHandle<F::Output>
where
    F: std::future::Future + Send + 'static,
    F::Output: Send + 'static,
{
    tokio::task::spawn(future)
}

/// Result type for task joins.
pub type Result<T> = std::result::Result<T, JoinError>;

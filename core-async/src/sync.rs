//! Synchronization primitives.
//!
//! The harvester only shares one piece of state across tasks: the OAuth
//! callback result, which is written at most once through a [`oneshot`]
//! channel. The async [`Mutex`] guards the sender half so the HTTP handler can
//! take it exactly once.

pub use tokio::sync::{mpsc, oneshot, Mutex, MutexGuard, Notify};

//! Async runtime facade for the document harvester.
//!
//! Every other crate in the workspace goes through this crate for timers,
//! channels, task spawning and async I/O instead of naming Tokio directly.
//! Keeping the runtime behind one seam means the harvester can pin its
//! executor configuration in a single place (see [`runtime::build`]).
//!
//! # Modules
//!
//! - `task`: Task spawning for the OAuth callback listener
//! - `time`: Sleep, timeouts and retry backoff
//! - `sync`: One-shot channels and async mutexes
//! - `io`: Async read/write traits used for streaming downloads
//! - `net`: TCP listener for the callback server
//! - `runtime`: Runtime construction for binaries
//!
//! # Examples
//!
//! ```rust
//! use core_async::time::{backoff_delay, Duration};
//!
//! let base = Duration::from_secs(1);
//! assert_eq!(backoff_delay(base, 0), Duration::from_secs(1));
//! assert_eq!(backoff_delay(base, 2), Duration::from_secs(4));
//! ```

pub mod io;
pub mod net;
pub mod runtime;
pub mod sync;
pub mod task;
pub mod time;

pub use task::spawn;
pub use time::{sleep, Duration, Instant};

//! Runtime construction for binaries.
//!
//! Library crates never build runtimes themselves; the CLI builds one here and
//! drives its entry future with it.

pub use tokio::runtime::{Builder, Handle, Runtime};

/// Builds the multi-threaded runtime used by the harvester binary.
///
/// A small worker pool is plenty: document traffic is strictly sequential and
/// the only background task is the one-shot OAuth callback listener.
pub fn build() -> std::io::Result<Runtime> {
    Builder::new_multi_thread()
        .worker_threads(2)
        .thread_name("docharvest-worker")
        .enable_all()
        .build()
}

/// Runs `future` to completion on a fresh current-thread runtime.
pub fn block_on<F>(future: F) -> std::io::Result<F::Output>
where
    F: std::future::Future,
{
    let runtime = Builder::new_current_thread().enable_all().build()?;
    Ok(runtime.block_on(future))
}

//! # Desktop Bridge Implementations
//!
//! Native adapters for the `bridge-traits` seams:
//!
//! - [`ReqwestHttpClient`] - `HttpClient` over reqwest with rustls
//! - [`TokioFileSystem`] - `FileSystemAccess` over `tokio::fs`
//! - [`SystemBrowser`] - `BrowserLauncher` using the OS URL opener

mod browser;
mod filesystem;
mod http;

pub use browser::SystemBrowser;
pub use filesystem::TokioFileSystem;
pub use http::ReqwestHttpClient;

//! Browser Launch Abstraction
//!
//! The interactive sign-in needs the user's browser to visit the
//! authorization URL. Headless hosts and tests substitute their own launcher.

use async_trait::async_trait;

use crate::error::Result;

#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    /// Open `url` in the user's default browser.
    ///
    /// An error means the browser could not be started; callers are expected
    /// to fall back to showing the URL to the user.
    async fn open(&self, url: &str) -> Result<()>;
}

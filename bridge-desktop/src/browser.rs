//! Browser launcher backed by the platform's URL opener.

use async_trait::async_trait;
use bridge_traits::{
    browser::BrowserLauncher,
    error::{BridgeError, Result},
};
use std::process::{Command, Stdio};
use tracing::debug;

/// Opens URLs with `open` (macOS), `xdg-open` (Linux) or `start` (Windows).
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemBrowser;

impl SystemBrowser {
    pub fn new() -> Self {
        Self
    }

    fn command(url: &str) -> Command {
        #[cfg(target_os = "macos")]
        {
            let mut cmd = Command::new("open");
            cmd.arg(url);
            cmd
        }

        #[cfg(target_os = "windows")]
        {
            let mut cmd = Command::new("cmd");
            cmd.args(["/C", "start", "", url]);
            cmd
        }

        #[cfg(not(any(target_os = "macos", target_os = "windows")))]
        {
            let mut cmd = Command::new("xdg-open");
            cmd.arg(url);
            cmd
        }
    }
}

#[async_trait]
impl BrowserLauncher for SystemBrowser {
    async fn open(&self, url: &str) -> Result<()> {
        Self::command(url)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| BridgeError::NotAvailable(format!("Failed to launch browser: {}", e)))?;

        debug!("Launched system browser");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_carries_url() {
        let cmd = SystemBrowser::command("https://login.example.com/authorize?x=1");
        let args: Vec<_> = cmd.get_args().map(|a| a.to_string_lossy().into_owned()).collect();

        assert!(args.iter().any(|a| a == "https://login.example.com/authorize?x=1"));
    }
}

use anyhow::{Context, Result};
use std::process::{Command, Stdio};

/// Opens the served UI in whatever browser the machine offers.
pub struct BrowserOpener;

impl BrowserOpener {
    /// Try each launcher in turn until one succeeds.
    pub fn open_url(url: &str) -> Result<()> {
        let strategies: [fn(&str) -> Result<()>; 4] = [
            Self::try_system_handler,
            Self::try_wslview,
            Self::try_xdg_open,
            Self::try_browser_env,
        ];

        for strategy in &strategies {
            match strategy(url) {
                Ok(()) => return Ok(()),
                Err(err) => tracing::debug!(error = %err, "browser strategy failed"),
            }
        }

        Err(anyhow::anyhow!(
            "Could not open browser. Please manually open: {}",
            url
        ))
    }

    /// The platform default handler (`open`, `xdg-open`, `start`).
    fn try_system_handler(url: &str) -> Result<()> {
        open::that(url).context("System URL handler failed")
    }

    /// WSL2 hands URLs to the Windows side.
    fn try_wslview(url: &str) -> Result<()> {
        Self::run_launcher("wslview", url)
    }

    fn try_xdg_open(url: &str) -> Result<()> {
        Self::run_launcher("xdg-open", url)
    }

    fn try_browser_env(url: &str) -> Result<()> {
        let browser = std::env::var("BROWSER").context("BROWSER environment variable not set")?;
        Self::run_launcher(&browser, url)
    }

    fn run_launcher(program: &str, url: &str) -> Result<()> {
        which::which(program).with_context(|| format!("{program} not found"))?;

        let status = Command::new(program)
            .arg(url)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .with_context(|| format!("Failed to execute {program}"))?;

        if status.success() {
            Ok(())
        } else {
            Err(anyhow::anyhow!("{program} failed with exit code: {status}"))
        }
    }
}

//! Locating, downloading and launching the Chromium instance a run drives.

use anyhow::{Context, Result};
use chromiumoxide::browser::{Browser, BrowserConfigBuilder, HeadlessMode};
use chromiumoxide::fetcher::{BrowserFetcher, BrowserFetcherOptions};
use futures::StreamExt;
use std::path::PathBuf;
use std::process::Command;
use tokio::task::{self, JoinHandle};
use tracing::{error, info, trace, warn};

use crate::config::ScrapeConfig;
use crate::utils::constants::WINDOW_SIZE;

/// A launched browser plus everything needed to shut it down
pub struct LaunchedBrowser {
    pub browser: Browser,
    pub handler: JoinHandle<()>,
    pub user_data_dir: PathBuf,
    /// Whether the profile directory was created for this launch and should be
    /// removed with it
    pub owns_user_data_dir: bool,
}

/// Find a Chrome/Chromium executable.
///
/// Order: `CHROMIUM_PATH`, the platform's usual install locations, then
/// `which` on Unix.
pub async fn find_browser_executable() -> Result<PathBuf> {
    if let Ok(path) = std::env::var("CHROMIUM_PATH") {
        let path = PathBuf::from(path);
        if path.exists() {
            info!("Using browser from CHROMIUM_PATH: {}", path.display());
            return Ok(path);
        }
        warn!(
            "CHROMIUM_PATH points to non-existent file: {}",
            path.display()
        );
    }

    let candidates: &[&str] = if cfg!(target_os = "windows") {
        &[
            r"%PROGRAMFILES%\Google\Chrome\Application\chrome.exe",
            r"%PROGRAMFILES(X86)%\Google\Chrome\Application\chrome.exe",
            r"%LOCALAPPDATA%\Google\Chrome\Application\chrome.exe",
            r"%PROGRAMFILES%\Chromium\Application\chrome.exe",
        ]
    } else if cfg!(target_os = "macos") {
        &[
            "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
            "/Applications/Chromium.app/Contents/MacOS/Chromium",
            "~/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
            "~/Applications/Chromium.app/Contents/MacOS/Chromium",
            "/opt/homebrew/bin/chromium",
        ]
    } else {
        &[
            "/usr/bin/google-chrome",
            "/usr/bin/google-chrome-stable",
            "/usr/bin/chromium",
            "/usr/bin/chromium-browser",
            "/snap/bin/chromium",
            "/usr/local/bin/chromium",
        ]
    };

    for candidate in candidates {
        let path = if let Some(rest) = candidate.strip_prefix("~/") {
            match dirs::home_dir() {
                Some(home) => home.join(rest),
                None => continue,
            }
        } else if candidate.contains('%') {
            PathBuf::from(expand_windows_env_vars(candidate))
        } else {
            PathBuf::from(candidate)
        };

        if path.exists() {
            info!("Found browser at: {}", path.display());
            return Ok(path);
        }
    }

    if !cfg!(target_os = "windows") {
        for cmd in ["chromium", "chromium-browser", "google-chrome", "chrome"] {
            if let Ok(output) = Command::new("which").arg(cmd).output()
                && output.status.success()
            {
                let found = String::from_utf8_lossy(&output.stdout).trim().to_string();
                if !found.is_empty() {
                    info!("Found browser using 'which': {found}");
                    return Ok(PathBuf::from(found));
                }
            }
        }
    }

    warn!("No Chrome/Chromium executable found, falling back to the fetcher");
    Err(anyhow::anyhow!("Chrome/Chromium executable not found"))
}

/// Expand `%VAR%` tokens. Unknown variables and unterminated tokens are kept
/// verbatim; `%%` becomes a single `%`.
fn expand_windows_env_vars(path: &str) -> String {
    let mut result = String::with_capacity(path.len());
    let mut rest = path;

    while let Some(start) = rest.find('%') {
        result.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        match after.find('%') {
            Some(0) => {
                result.push('%');
                rest = &after[1..];
            }
            Some(end) => {
                let name = &after[..end];
                match std::env::var(name) {
                    Ok(value) => result.push_str(&value),
                    Err(_) => {
                        result.push('%');
                        result.push_str(name);
                        result.push('%');
                    }
                }
                rest = &after[end + 1..];
            }
            None => {
                result.push('%');
                result.push_str(after);
                rest = "";
            }
        }
    }
    result.push_str(rest);
    result
}

/// Download a managed Chromium into the user cache directory
pub async fn download_managed_browser() -> Result<PathBuf> {
    info!("Downloading managed Chromium browser...");

    let cache_dir = dirs::cache_dir()
        .unwrap_or_else(|| {
            let fallback = std::env::temp_dir();
            warn!(
                "Could not determine cache directory, using {}",
                fallback.display()
            );
            fallback
        })
        .join("tariffscrape")
        .join("chromium");

    tokio::fs::create_dir_all(&cache_dir)
        .await
        .context("Failed to create browser cache directory")?;

    let fetcher = BrowserFetcher::new(
        BrowserFetcherOptions::builder()
            .with_path(&cache_dir)
            .build()
            .context("Failed to build fetcher options")?,
    );

    let revision_info = fetcher.fetch().await.context("Failed to fetch browser")?;

    info!(
        "Downloaded Chromium to: {}",
        revision_info.folder_path.display()
    );

    Ok(revision_info.executable_path)
}

/// Find or download Chromium and launch it with an isolated profile.
///
/// The CDP handler runs on its own task; the caller owns the returned
/// `JoinHandle` and must abort it when the browser is released.
pub async fn launch_browser(config: &ScrapeConfig) -> Result<LaunchedBrowser> {
    let chrome_path = match find_browser_executable().await {
        Ok(path) => path,
        Err(_) => download_managed_browser().await?,
    };

    let (user_data_dir, owns_user_data_dir) = match config.chrome_data_dir() {
        Some(dir) => (dir.clone(), false),
        None => (
            std::env::temp_dir().join(format!(
                "tariffscrape_chrome_{}_{}",
                std::process::id(),
                chrono::Utc::now().timestamp_millis()
            )),
            true,
        ),
    };

    tokio::fs::create_dir_all(&user_data_dir)
        .await
        .context("Failed to create user data directory")?;

    let (width, height) = WINDOW_SIZE;
    let mut config_builder = BrowserConfigBuilder::default()
        .request_timeout(config.navigation_timeout())
        .window_size(width, height)
        .user_data_dir(user_data_dir.clone())
        .chrome_executable(chrome_path);

    if config.headless() {
        config_builder = config_builder.headless_mode(HeadlessMode::default());
    } else {
        config_builder = config_builder.with_head();
    }

    config_builder = config_builder
        .arg("--no-first-run")
        .arg("--no-default-browser-check")
        .arg("--disable-notifications")
        .arg("--disable-popup-blocking")
        .arg("--disable-extensions")
        .arg("--disable-background-networking")
        .arg("--password-store=basic")
        .arg("--hide-scrollbars")
        .arg("--mute-audio");

    let browser_config = config_builder
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to build browser config: {e}"))?;

    info!("Launching browser (headless: {})", config.headless());
    let (browser, mut handler) = Browser::launch(browser_config)
        .await
        .context("Failed to launch browser")?;

    let handler = task::spawn(async move {
        while let Some(event) = handler.next().await {
            if let Err(e) = event {
                let message = e.to_string();
                // chromiumoxide cannot decode every CDP event newer Chrome sends
                let benign = message.contains("data did not match any variant of untagged enum Message")
                    || message.contains("Failed to deserialize WS response");
                if benign {
                    trace!("Suppressed benign CDP serialization error: {message}");
                } else {
                    error!("Browser handler error: {e:?}");
                }
            }
        }
        info!("Browser handler task completed");
    });

    Ok(LaunchedBrowser {
        browser,
        handler,
        user_data_dir,
        owns_user_data_dir,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expands_known_and_keeps_unknown_variables() {
        // PATH is set in every test environment
        let path = std::env::var("PATH").unwrap_or_default();
        assert_eq!(expand_windows_env_vars("%PATH%\\x"), format!("{path}\\x"));
        assert_eq!(
            expand_windows_env_vars("%TARIFFSCRAPE_UNSET_VAR%\\chrome.exe"),
            "%TARIFFSCRAPE_UNSET_VAR%\\chrome.exe"
        );
        assert_eq!(expand_windows_env_vars("100%% sure"), "100% sure");
        assert_eq!(expand_windows_env_vars("broken %TOKEN"), "broken %TOKEN");
    }
}

//! `FormSession` over a Chromium instance driven through CDP.

use std::path::PathBuf;
use std::time::Duration;

use chromiumoxide::browser::Browser;
use chromiumoxide::cdp::browser_protocol::page::{
    CaptureScreenshotFormat, CaptureScreenshotParams,
};
use chromiumoxide::element::Element;
use chromiumoxide::page::Page;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::locator::{LocatorStrategy, Query};
use super::timeout::with_call_timeout;
use super::{FormSession, SessionError};
use crate::browser_setup::{LaunchedBrowser, launch_browser};
use crate::config::ScrapeConfig;

const INTERACTABLE_JS: &str = r"function() {
    if (!this.isConnected) return false;
    const style = window.getComputedStyle(this);
    if (style.display === 'none' || style.visibility === 'hidden') return false;
    const rect = this.getBoundingClientRect();
    if (rect.width === 0 && rect.height === 0) return false;
    return !this.disabled;
}";

const CLEAR_JS: &str = r"function() {
    this.focus();
    if ('value' in this) this.value = '';
    this.dispatchEvent(new Event('input', { bubbles: true }));
    return true;
}";

/// One browser with one page, released on `close` or drop.
///
/// Dropping without `close` still aborts the CDP handler task and removes an
/// owned profile directory; `Browser`'s own drop kills the process.
pub struct ChromiumSession {
    browser: Browser,
    handler: JoinHandle<()>,
    page: Page,
    /// Present only when the profile directory belongs to this session
    user_data_dir: Option<PathBuf>,
    navigation_timeout: Duration,
    call_timeout: Duration,
}

impl ChromiumSession {
    /// Launch a browser per `config` and open a blank page
    pub async fn open(config: &ScrapeConfig) -> Result<Self, SessionError> {
        let LaunchedBrowser {
            browser,
            handler,
            user_data_dir,
            owns_user_data_dir,
        } = launch_browser(config)
            .await
            .map_err(|e| SessionError::Launch(format!("{e:#}")))?;

        let call_timeout = config.action_timeout();
        let page = match with_call_timeout(
            async { Ok(browser.new_page("about:blank").await?) },
            call_timeout,
            "new_page",
        )
        .await
        {
            Ok(page) => page,
            Err(e) => {
                // Browser's drop kills the process
                handler.abort();
                if owns_user_data_dir {
                    let _ = std::fs::remove_dir_all(&user_data_dir);
                }
                return Err(e);
            }
        };

        Ok(Self {
            browser,
            handler,
            page,
            user_data_dir: owns_user_data_dir.then_some(user_data_dir),
            navigation_timeout: config.navigation_timeout(),
            call_timeout,
        })
    }

    async fn call_bool(&self, element: &Element, script: &str) -> Result<bool, SessionError> {
        let returns = with_call_timeout(
            async { Ok(element.call_js_fn(script, false).await?) },
            self.call_timeout,
            "call_js_fn",
        )
        .await?;
        Ok(returns
            .result
            .value
            .and_then(|value| value.as_bool())
            .unwrap_or(false))
    }

    fn remove_user_data_dir(&mut self) {
        if let Some(path) = self.user_data_dir.take() {
            debug!("Removing browser profile directory {}", path.display());
            if let Err(e) = std::fs::remove_dir_all(&path) {
                warn!(
                    "Failed to remove browser profile directory {}: {e}",
                    path.display()
                );
            }
        }
    }
}

impl FormSession for ChromiumSession {
    type Element = Element;

    async fn navigate(&self, url: &str) -> Result<(), SessionError> {
        with_call_timeout(
            async {
                self.page.goto(url).await?;
                self.page.wait_for_navigation().await?;
                Ok(())
            },
            self.navigation_timeout,
            "navigate",
        )
        .await
    }

    async fn locate(&self, strategy: &LocatorStrategy) -> Result<Vec<Element>, SessionError> {
        with_call_timeout(
            async {
                let found = match strategy.to_query() {
                    Query::Css(selector) => self.page.find_elements(selector).await?,
                    Query::XPath(expr) => self.page.find_xpaths(expr).await?,
                };
                Ok(found)
            },
            self.call_timeout,
            "locate",
        )
        .await
    }

    async fn is_interactable(&self, element: &Element) -> Result<bool, SessionError> {
        self.call_bool(element, INTERACTABLE_JS).await
    }

    async fn click(&self, element: &Element) -> Result<(), SessionError> {
        with_call_timeout(
            async {
                element.click().await?;
                Ok(())
            },
            self.call_timeout,
            "click",
        )
        .await
    }

    async fn clear(&self, element: &Element) -> Result<(), SessionError> {
        self.call_bool(element, CLEAR_JS).await.map(|_| ())
    }

    async fn type_text(&self, element: &Element, text: &str) -> Result<(), SessionError> {
        with_call_timeout(
            async {
                element.focus().await?;
                element.type_str(text).await?;
                Ok(())
            },
            self.call_timeout,
            "type_text",
        )
        .await
    }

    async fn press_key(&self, element: &Element, key: &str) -> Result<(), SessionError> {
        with_call_timeout(
            async {
                element.focus().await?;
                element.press_key(key).await?;
                Ok(())
            },
            self.call_timeout,
            "press_key",
        )
        .await
    }

    async fn select_index(&self, element: &Element, index: usize) -> Result<(), SessionError> {
        let script = format!(
            "function() {{
                if (!this.options || {index} >= this.options.length) return false;
                this.selectedIndex = {index};
                this.dispatchEvent(new Event('input', {{ bubbles: true }}));
                this.dispatchEvent(new Event('change', {{ bubbles: true }}));
                return true;
            }}"
        );
        if self.call_bool(element, &script).await? {
            Ok(())
        } else {
            Err(SessionError::Script(format!(
                "select has no option at index {index}"
            )))
        }
    }

    async fn select_text(&self, element: &Element, text: &str) -> Result<(), SessionError> {
        let needle = serde_json::to_string(text.trim())
            .map_err(|e| SessionError::Script(e.to_string()))?;
        let script = format!(
            "function() {{
                if (!this.options) return false;
                const i = Array.from(this.options).findIndex(o => o.text.trim() === {needle});
                if (i < 0) return false;
                this.selectedIndex = i;
                this.dispatchEvent(new Event('input', {{ bubbles: true }}));
                this.dispatchEvent(new Event('change', {{ bubbles: true }}));
                return true;
            }}"
        );
        if self.call_bool(element, &script).await? {
            Ok(())
        } else {
            Err(SessionError::Script(format!(
                "select has no option with text '{text}'"
            )))
        }
    }

    async fn screenshot(&self) -> Result<Vec<u8>, SessionError> {
        let params = CaptureScreenshotParams {
            format: Some(CaptureScreenshotFormat::Png),
            capture_beyond_viewport: Some(true),
            ..Default::default()
        };
        with_call_timeout(
            async { Ok(self.page.screenshot(params).await?) },
            self.call_timeout,
            "screenshot",
        )
        .await
    }

    async fn content(&self) -> Result<String, SessionError> {
        with_call_timeout(
            async { Ok(self.page.content().await?) },
            self.call_timeout,
            "content",
        )
        .await
    }

    async fn current_url(&self) -> Result<Option<String>, SessionError> {
        with_call_timeout(
            async { Ok(self.page.url().await?) },
            self.call_timeout,
            "current_url",
        )
        .await
    }

    async fn close(mut self) {
        info!("Closing browser session");
        if let Err(e) = self.page.clone().close().await {
            debug!("Page close failed: {e}");
        }
        match tokio::time::timeout(self.call_timeout, self.browser.close()).await {
            Ok(Ok(_)) => {
                if let Err(e) = self.browser.wait().await {
                    debug!("Waiting for browser exit failed: {e}");
                }
            }
            Ok(Err(e)) => warn!("Browser close failed: {e}"),
            Err(_) => warn!("Browser close timed out after {:?}", self.call_timeout),
        }
        self.handler.abort();
        self.remove_user_data_dir();
    }
}

impl Drop for ChromiumSession {
    fn drop(&mut self) {
        self.handler.abort();
        if self.user_data_dir.is_some() {
            warn!("ChromiumSession dropped without close, removing profile directory");
            self.remove_user_data_dir();
        }
    }
}

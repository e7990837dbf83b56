//! Browser session seam.
//!
//! Everything the engine does to a page goes through [`FormSession`]. The
//! production implementation is [`ChromiumSession`]; tests drive the engine
//! with an in-memory fake.

pub mod chromium;
pub mod locator;
pub mod timeout;

use std::future::Future;
use std::time::Duration;

use thiserror::Error;

pub use chromium::ChromiumSession;
pub use locator::{LocatorStrategy, Query};
pub use timeout::with_call_timeout;

#[derive(Debug, Error)]
pub enum SessionError {
    /// The browser rejected or failed a protocol call
    #[error("browser error: {0}")]
    Browser(String),

    #[error("{operation} timed out after {after:?}")]
    Timeout {
        operation: &'static str,
        after: Duration,
    },

    /// The browser could not be found, downloaded or started
    #[error("browser launch failed: {0}")]
    Launch(String),

    /// A script ran but returned something the session did not expect
    #[error("unexpected script result: {0}")]
    Script(String),
}

impl From<chromiumoxide::error::CdpError> for SessionError {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        Self::Browser(err.to_string())
    }
}

/// Capability set the form engine needs from a live page.
///
/// All methods take `&self`; a session is driven by one run at a time and
/// implementations serialise access internally where needed. `close` consumes
/// the session so it cannot be used after release.
pub trait FormSession: Send + Sync {
    /// Handle to a located DOM element
    type Element: Send + Sync;

    fn navigate(&self, url: &str) -> impl Future<Output = Result<(), SessionError>> + Send;

    /// All elements matching the strategy, in document order
    fn locate(
        &self,
        strategy: &LocatorStrategy,
    ) -> impl Future<Output = Result<Vec<Self::Element>, SessionError>> + Send;

    /// Visible, enabled and laid out
    fn is_interactable(
        &self,
        element: &Self::Element,
    ) -> impl Future<Output = Result<bool, SessionError>> + Send;

    fn click(&self, element: &Self::Element)
    -> impl Future<Output = Result<(), SessionError>> + Send;

    /// Empty a text input
    fn clear(&self, element: &Self::Element)
    -> impl Future<Output = Result<(), SessionError>> + Send;

    /// Send `text` as keystrokes to the element
    fn type_text(
        &self,
        element: &Self::Element,
        text: &str,
    ) -> impl Future<Output = Result<(), SessionError>> + Send;

    /// Press a named key such as `Enter` or `Tab`
    fn press_key(
        &self,
        element: &Self::Element,
        key: &str,
    ) -> impl Future<Output = Result<(), SessionError>> + Send;

    fn select_index(
        &self,
        element: &Self::Element,
        index: usize,
    ) -> impl Future<Output = Result<(), SessionError>> + Send;

    /// Select the option whose visible text equals `text` (whitespace-trimmed)
    fn select_text(
        &self,
        element: &Self::Element,
        text: &str,
    ) -> impl Future<Output = Result<(), SessionError>> + Send;

    /// PNG bytes of the current viewport
    fn screenshot(&self) -> impl Future<Output = Result<Vec<u8>, SessionError>> + Send;

    /// Serialised markup of the current document
    fn content(&self) -> impl Future<Output = Result<String, SessionError>> + Send;

    fn current_url(&self) -> impl Future<Output = Result<Option<String>, SessionError>> + Send;

    /// Release the browser; never fails, problems are logged
    fn close(self) -> impl Future<Output = ()> + Send
    where
        Self: Sized;
}

//! Shared test utilities: an in-memory `FormSession` and sample result markup

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tariffscrape::session::{FormSession, LocatorStrategy, SessionError};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// An element handed out by [`FakeSession::locate`]
#[derive(Debug, Clone)]
pub struct FakeElement {
    pub strategy: LocatorStrategy,
}

/// How one registered element behaves
#[derive(Debug, Clone, Default)]
pub struct Behavior {
    pub hidden: bool,
    /// Only locatable once this much (tokio) time has passed since the session opened
    pub appear_after: Option<Duration>,
    /// Every action on the element fails with a browser error
    pub fail_actions: bool,
    /// Clicking the element cancels this token
    pub cancel_on_click: Option<CancellationToken>,
}

impl Behavior {
    pub fn visible() -> Self {
        Self::default()
    }

    pub fn hidden() -> Self {
        Self {
            hidden: true,
            ..Self::default()
        }
    }

    pub fn appearing_after(delay: Duration) -> Self {
        Self {
            appear_after: Some(delay),
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail_actions: true,
            ..Self::default()
        }
    }

    pub fn cancelling(token: CancellationToken) -> Self {
        Self {
            cancel_on_click: Some(token),
            ..Self::default()
        }
    }
}

#[derive(Default)]
struct FakeState {
    elements: HashMap<LocatorStrategy, Behavior>,
    actions: Vec<String>,
    locate_calls: Vec<LocatorStrategy>,
    typed: HashMap<LocatorStrategy, String>,
    navigations: Vec<String>,
    content: String,
    navigate_error: Option<String>,
    screenshot_fails: bool,
    content_fails: bool,
    closed: bool,
}

/// In-memory page. Clones share state, so a test keeps a clone to inspect
/// the session after the engine consumed and closed it.
#[derive(Clone)]
pub struct FakeSession {
    state: Arc<Mutex<FakeState>>,
    opened: Instant,
}

impl Default for FakeSession {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeSession {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(FakeState {
                content: "<html><body><p>form</p></body></html>".to_string(),
                ..FakeState::default()
            })),
            opened: Instant::now(),
        }
    }

    fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().expect("fake session state poisoned")
    }

    pub fn with_element(self, strategy: LocatorStrategy, behavior: Behavior) -> Self {
        self.state().elements.insert(strategy, behavior);
        self
    }

    pub fn with_content(self, html: impl Into<String>) -> Self {
        self.state().content = html.into();
        self
    }

    pub fn with_failing_screenshots(self) -> Self {
        self.state().screenshot_fails = true;
        self
    }

    pub fn with_failing_content(self) -> Self {
        self.state().content_fails = true;
        self
    }

    pub fn with_navigation_error(self, message: impl Into<String>) -> Self {
        self.state().navigate_error = Some(message.into());
        self
    }

    pub fn actions(&self) -> Vec<String> {
        self.state().actions.clone()
    }

    pub fn locate_calls(&self) -> Vec<LocatorStrategy> {
        self.state().locate_calls.clone()
    }

    pub fn typed_into(&self, strategy: &LocatorStrategy) -> String {
        self.state().typed.get(strategy).cloned().unwrap_or_default()
    }

    pub fn navigations(&self) -> Vec<String> {
        self.state().navigations.clone()
    }

    pub fn is_closed(&self) -> bool {
        self.state().closed
    }

    fn act(&self, element: &FakeElement, action: String) -> Result<Behavior, SessionError> {
        let mut state = self.state();
        state.actions.push(action);
        let behavior = state
            .elements
            .get(&element.strategy)
            .cloned()
            .unwrap_or_default();
        if behavior.fail_actions {
            return Err(SessionError::Browser(format!(
                "element {} is detached",
                element.strategy
            )));
        }
        Ok(behavior)
    }
}

impl FormSession for FakeSession {
    type Element = FakeElement;

    async fn navigate(&self, url: &str) -> Result<(), SessionError> {
        let mut state = self.state();
        state.navigations.push(url.to_string());
        match &state.navigate_error {
            Some(message) => Err(SessionError::Browser(message.clone())),
            None => Ok(()),
        }
    }

    async fn locate(&self, strategy: &LocatorStrategy) -> Result<Vec<FakeElement>, SessionError> {
        let elapsed = self.opened.elapsed();
        let mut state = self.state();
        state.locate_calls.push(strategy.clone());
        let present = state
            .elements
            .get(strategy)
            .is_some_and(|b| b.appear_after.is_none_or(|after| elapsed >= after));
        Ok(if present {
            vec![FakeElement {
                strategy: strategy.clone(),
            }]
        } else {
            Vec::new()
        })
    }

    async fn is_interactable(&self, element: &FakeElement) -> Result<bool, SessionError> {
        Ok(self
            .state()
            .elements
            .get(&element.strategy)
            .is_some_and(|b| !b.hidden))
    }

    async fn click(&self, element: &FakeElement) -> Result<(), SessionError> {
        let behavior = self.act(element, format!("click {}", element.strategy))?;
        if let Some(token) = behavior.cancel_on_click {
            token.cancel();
        }
        Ok(())
    }

    async fn clear(&self, element: &FakeElement) -> Result<(), SessionError> {
        self.act(element, format!("clear {}", element.strategy))?;
        self.state().typed.remove(&element.strategy);
        Ok(())
    }

    async fn type_text(&self, element: &FakeElement, text: &str) -> Result<(), SessionError> {
        self.act(element, format!("type {} {text}", element.strategy))?;
        self.state()
            .typed
            .entry(element.strategy.clone())
            .or_default()
            .push_str(text);
        Ok(())
    }

    async fn press_key(&self, element: &FakeElement, key: &str) -> Result<(), SessionError> {
        self.act(element, format!("press {} {key}", element.strategy))
            .map(|_| ())
    }

    async fn select_index(&self, element: &FakeElement, index: usize) -> Result<(), SessionError> {
        self.act(element, format!("select_index {} {index}", element.strategy))
            .map(|_| ())
    }

    async fn select_text(&self, element: &FakeElement, text: &str) -> Result<(), SessionError> {
        self.act(element, format!("select_text {} {text}", element.strategy))
            .map(|_| ())
    }

    async fn screenshot(&self) -> Result<Vec<u8>, SessionError> {
        if self.state().screenshot_fails {
            return Err(SessionError::Browser("screenshot failed".to_string()));
        }
        Ok(b"\x89PNG\r\n\x1a\nfake".to_vec())
    }

    async fn content(&self) -> Result<String, SessionError> {
        let state = self.state();
        if state.content_fails {
            return Err(SessionError::Browser("page is gone".to_string()));
        }
        Ok(state.content.clone())
    }

    async fn current_url(&self) -> Result<Option<String>, SessionError> {
        Ok(self.state().navigations.last().cloned())
    }

    async fn close(self) {
        self.state().closed = true;
    }
}

/// Results page with a fixed and a variable dual-fuel offer
pub fn two_card_results() -> String {
    r#"<!DOCTYPE html>
<html>
<head><title>Your quotes</title></head>
<body>
  <p class="electricity-kwh">Electricity usage: 2,700 kWh</p>
  <p class="gas-kwh">Gas usage: 11,500 kWh</p>
  <div class="result-card">
    <h3 class="supplier-name">Octopus Energy</h3>
    <span class="tariff-name">Octopus 12M Fixed</span>
    <div class="rate-label">Fixed 12 months</div>
    <span class="decal">100% renewable electricity</span>
    <div class="detail-row"><span class="detail-label">Exit fee</span><span class="detail-value">£75.00</span></div>
    <div class="detail-row"><span class="detail-label">Valid from</span><span class="detail-value">01/10/2026</span></div>
    <div class="annual"><span class="detail-label">Current annual cost</span><span>£1,850.40</span></div>
    <div class="annual"><span class="detail-label">New annual cost</span><span>£1,612.10</span></div>
    <table class="rates">
      <thead><tr><th></th><th>Gas</th><th>Electricity</th></tr></thead>
      <tbody>
        <tr><td>Standing charge</td><td>31.43p</td><td>53.35p</td></tr>
        <tr><td>Unit rate</td><td>6.12p</td><td>24.50p</td></tr>
      </tbody>
    </table>
  </div>
  <div class="result-card">
    <h3 class="supplier-name">British Gas</h3>
    <span class="tariff-name">Standard Variable</span>
    <div class="rate-label">Variable</div>
    <table class="rates">
      <thead><tr><th></th><th>Electricity</th></tr></thead>
      <tbody>
        <tr><td>Standing charge</td><td>60.99p</td></tr>
        <tr><td>Unit rate</td><td>27.03p</td></tr>
      </tbody>
    </table>
  </div>
</body>
</html>"#
        .to_string()
}

/// A results page that loaded but holds no offers
pub fn empty_results() -> String {
    "<html><body><h2>No tariffs available for your postcode</h2></body></html>".to_string()
}

//! Step specifications and the executor that runs one step against a session.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::pacing::{Cancelled, Pacing, sleep_or_cancel};
use super::resolver::{ElementResolver, Resolution};
use crate::config::ScrapeConfig;
use crate::error::ErrorKind;
use crate::session::{FormSession, LocatorStrategy, SessionError};

/// What to do with a resolved element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Click,
    /// Clear the field, then type `value` one character at a time
    Type,
    /// `value` is a zero-based option index
    SelectByIndex,
    SelectByText,
    /// `value` is a key name such as `Enter`
    PressKey,
    /// Only wait for the target to become interactable
    Await,
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Click => "click",
            Self::Type => "type",
            Self::SelectByIndex => "select_by_index",
            Self::SelectByText => "select_by_text",
            Self::PressKey => "press_key",
            Self::Await => "await",
        };
        f.write_str(name)
    }
}

fn default_true() -> bool {
    true
}

/// One sub-action of a step: a target cascade, an action and its input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionSpec {
    pub targets: Vec<LocatorStrategy>,
    pub kind: ActionKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    /// A non-essential action that cannot be resolved or performed is skipped
    #[serde(default = "default_true")]
    pub essential: bool,
    /// Overrides the executor's resolve budget for this action
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_wait_ms: Option<u64>,
}

impl ActionSpec {
    fn new(kind: ActionKind, targets: Vec<LocatorStrategy>, value: Option<String>) -> Self {
        Self {
            targets,
            kind,
            value,
            essential: true,
            max_wait_ms: None,
        }
    }

    pub fn click(targets: Vec<LocatorStrategy>) -> Self {
        Self::new(ActionKind::Click, targets, None)
    }

    pub fn type_text(targets: Vec<LocatorStrategy>, text: impl Into<String>) -> Self {
        Self::new(ActionKind::Type, targets, Some(text.into()))
    }

    pub fn select_index(targets: Vec<LocatorStrategy>, index: usize) -> Self {
        Self::new(ActionKind::SelectByIndex, targets, Some(index.to_string()))
    }

    pub fn select_text(targets: Vec<LocatorStrategy>, text: impl Into<String>) -> Self {
        Self::new(ActionKind::SelectByText, targets, Some(text.into()))
    }

    pub fn press_key(targets: Vec<LocatorStrategy>, key: impl Into<String>) -> Self {
        Self::new(ActionKind::PressKey, targets, Some(key.into()))
    }

    pub fn await_visible(targets: Vec<LocatorStrategy>) -> Self {
        Self::new(ActionKind::Await, targets, None)
    }

    #[must_use]
    pub fn optional(mut self) -> Self {
        self.essential = false;
        self
    }

    #[must_use]
    pub fn max_wait_ms(mut self, ms: u64) -> Self {
        self.max_wait_ms = Some(ms);
        self
    }
}

/// Milliseconds on the wire for `Duration` fields
pub(crate) mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

/// One logical stage of the form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepSpec {
    pub name: String,
    pub actions: Vec<ActionSpec>,
    /// A failing required step aborts the run
    #[serde(default = "default_true")]
    pub required: bool,
    #[serde(default, rename = "post_step_delay_ms", with = "duration_ms")]
    pub post_step_delay: Duration,
}

impl StepSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            actions: Vec::new(),
            required: true,
            post_step_delay: Duration::ZERO,
        }
    }

    #[must_use]
    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    #[must_use]
    pub fn action(mut self, action: ActionSpec) -> Self {
        self.actions.push(action);
        self
    }

    #[must_use]
    pub fn post_step_delay(mut self, delay: Duration) -> Self {
        self.post_step_delay = delay;
        self
    }
}

/// Why a step failed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepFailure {
    pub kind: ErrorKind,
    /// Index of the failing action; `None` when the post-step delay was cut short
    pub action_index: Option<usize>,
    pub cause: Option<String>,
}

impl StepFailure {
    fn new(kind: ErrorKind, action_index: Option<usize>, cause: Option<String>) -> Self {
        Self {
            kind,
            action_index,
            cause,
        }
    }
}

impl fmt::Display for StepFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if let Some(index) = self.action_index {
            write!(f, " at action {index}")?;
        }
        if let Some(cause) = &self.cause {
            write!(f, ": {cause}")?;
        }
        Ok(())
    }
}

/// Outcome of executing one step, produced exactly once per execution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepResult {
    pub step_name: String,
    pub succeeded: bool,
    /// Strategy of the last action that resolved an element
    pub strategy_used: Option<LocatorStrategy>,
    pub error: Option<StepFailure>,
    #[serde(rename = "elapsed_ms", with = "duration_ms")]
    pub elapsed: Duration,
}

impl StepResult {
    #[must_use]
    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.error.as_ref().map(|failure| failure.kind)
    }
}

/// Parsed input of an action, validated before anything touches the page
enum ActionInput<'a> {
    None,
    Text(&'a str),
    Index(usize),
}

fn action_input(action: &ActionSpec) -> Result<ActionInput<'_>, String> {
    match action.kind {
        ActionKind::Click | ActionKind::Await => Ok(ActionInput::None),
        ActionKind::Type | ActionKind::SelectByText | ActionKind::PressKey => action
            .value
            .as_deref()
            .map(ActionInput::Text)
            .ok_or_else(|| format!("{} action has no value", action.kind)),
        ActionKind::SelectByIndex => {
            let raw = action
                .value
                .as_deref()
                .ok_or_else(|| "select_by_index action has no value".to_string())?;
            raw.trim()
                .parse::<usize>()
                .map(ActionInput::Index)
                .map_err(|_| format!("select_by_index value '{raw}' is not an index"))
        }
    }
}

enum PerformError {
    Session(SessionError),
    Cancelled,
}

impl From<SessionError> for PerformError {
    fn from(err: SessionError) -> Self {
        Self::Session(err)
    }
}

impl From<Cancelled> for PerformError {
    fn from(_: Cancelled) -> Self {
        Self::Cancelled
    }
}

/// Runs one `StepSpec`: resolve, act and pause for every action in order.
#[derive(Debug, Clone, Copy)]
pub struct StepExecutor {
    resolver: ElementResolver,
    pacing: Pacing,
    default_max_wait: Duration,
}

impl StepExecutor {
    #[must_use]
    pub fn new(resolver: ElementResolver, pacing: Pacing, default_max_wait: Duration) -> Self {
        Self {
            resolver,
            pacing,
            default_max_wait,
        }
    }

    #[must_use]
    pub fn from_config(config: &ScrapeConfig) -> Self {
        Self::new(
            ElementResolver::from_config(config),
            Pacing::from_config(config),
            config.resolve_max_wait(),
        )
    }

    pub async fn execute<S: FormSession>(
        &self,
        step: &StepSpec,
        session: &S,
        cancel: &CancellationToken,
    ) -> StepResult {
        let started = Instant::now();
        info!("Executing step '{}' ({} actions)", step.name, step.actions.len());

        let mut strategy_used = None;
        let mut failure = None;

        for (index, action) in step.actions.iter().enumerate() {
            match self.run_action(index, action, session, cancel).await {
                Ok(Some(strategy)) => strategy_used = Some(strategy),
                Ok(None) => {}
                Err(step_failure) => {
                    failure = Some(step_failure);
                    break;
                }
            }
        }

        if failure.is_none() && sleep_or_cancel(step.post_step_delay, cancel).await.is_err() {
            failure = Some(StepFailure::new(ErrorKind::Cancelled, None, None));
        }

        let elapsed = started.elapsed();
        match &failure {
            None => info!("Step '{}' succeeded in {elapsed:?}", step.name),
            Some(f) => warn!("Step '{}' failed after {elapsed:?}: {f}", step.name),
        }

        StepResult {
            step_name: step.name.clone(),
            succeeded: failure.is_none(),
            strategy_used,
            error: failure,
            elapsed,
        }
    }

    /// `Ok(Some(strategy))` when performed, `Ok(None)` when a non-essential
    /// action was skipped
    async fn run_action<S: FormSession>(
        &self,
        index: usize,
        action: &ActionSpec,
        session: &S,
        cancel: &CancellationToken,
    ) -> Result<Option<LocatorStrategy>, StepFailure> {
        let input = action_input(action)
            .map_err(|cause| StepFailure::new(ErrorKind::ActionFailed, Some(index), Some(cause)))?;

        let max_wait = action
            .max_wait_ms
            .map_or(self.default_max_wait, Duration::from_millis);

        let (element, strategy) = match self
            .resolver
            .resolve(session, &action.targets, max_wait, cancel)
            .await
        {
            Resolution::Found {
                element,
                strategy_used,
            } => (element, strategy_used),
            Resolution::Cancelled => {
                return Err(StepFailure::new(ErrorKind::Cancelled, Some(index), None));
            }
            Resolution::NotFound if action.essential => {
                let tried: Vec<String> = action.targets.iter().map(ToString::to_string).collect();
                return Err(StepFailure::new(
                    ErrorKind::ElementNotFound,
                    Some(index),
                    Some(format!("no candidate matched: {}", tried.join(", "))),
                ));
            }
            Resolution::NotFound => {
                warn!(
                    "Skipping optional {} action {index}: no candidate matched",
                    action.kind
                );
                return Ok(None);
            }
        };

        match self.perform(action.kind, &input, &element, session, cancel).await {
            Ok(()) => {}
            Err(PerformError::Cancelled) => {
                return Err(StepFailure::new(ErrorKind::Cancelled, Some(index), None));
            }
            Err(PerformError::Session(e)) if action.essential => {
                return Err(StepFailure::new(
                    ErrorKind::ActionFailed,
                    Some(index),
                    Some(e.to_string()),
                ));
            }
            Err(PerformError::Session(e)) => {
                warn!("Skipping optional {} action {index}: {e}", action.kind);
                return Ok(None);
            }
        }

        debug!("Performed {} via {strategy}", action.kind);
        self.pacing
            .after_action(cancel)
            .await
            .map_err(|_| StepFailure::new(ErrorKind::Cancelled, Some(index), None))?;
        Ok(Some(strategy))
    }

    async fn perform<S: FormSession>(
        &self,
        kind: ActionKind,
        input: &ActionInput<'_>,
        element: &S::Element,
        session: &S,
        cancel: &CancellationToken,
    ) -> Result<(), PerformError> {
        match (kind, input) {
            (ActionKind::Await, _) => {}
            (ActionKind::Click, _) => session.click(element).await?,
            (ActionKind::Type, ActionInput::Text(text)) => {
                session.clear(element).await?;
                for ch in text.chars() {
                    let mut buf = [0u8; 4];
                    session.type_text(element, ch.encode_utf8(&mut buf)).await?;
                    self.pacing.between_keystrokes(cancel).await?;
                }
            }
            (ActionKind::SelectByText, ActionInput::Text(text)) => {
                session.select_text(element, text).await?;
            }
            (ActionKind::PressKey, ActionInput::Text(key)) => {
                session.press_key(element, key).await?;
            }
            (ActionKind::SelectByIndex, ActionInput::Index(index)) => {
                session.select_index(element, *index).await?;
            }
            // action_input() guarantees the input matches the kind
            _ => {}
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_spec_parses_with_defaults() {
        let json = r#"{
            "name": "postcode",
            "actions": [
                {"targets": [{"by": "id", "value": "postcode"}], "kind": "type", "value": "SW1A 1AA"}
            ],
            "post_step_delay_ms": 1500
        }"#;
        let step: StepSpec = serde_json::from_str(json).expect("valid step");

        assert!(step.required);
        assert_eq!(step.post_step_delay, Duration::from_millis(1500));
        assert!(step.actions[0].essential);
        assert_eq!(step.actions[0].kind, ActionKind::Type);
    }

    #[test]
    fn missing_and_malformed_values_are_rejected() {
        let typed = ActionSpec {
            value: None,
            ..ActionSpec::type_text(vec![LocatorStrategy::id("x")], "")
        };
        assert!(action_input(&typed).is_err());

        let select = ActionSpec {
            value: Some("first".to_string()),
            ..ActionSpec::select_index(vec![LocatorStrategy::id("x")], 0)
        };
        assert!(action_input(&select).is_err());

        let click = ActionSpec::click(vec![LocatorStrategy::id("x")]);
        assert!(matches!(action_input(&click), Ok(ActionInput::None)));
    }

    #[test]
    fn failure_display_names_kind_action_and_cause() {
        let failure = StepFailure::new(
            ErrorKind::ElementNotFound,
            Some(2),
            Some("no candidate matched: id=email".to_string()),
        );
        assert_eq!(
            failure.to_string(),
            "element not found at action 2: no candidate matched: id=email"
        );
    }
}

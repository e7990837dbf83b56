//! Runs an ordered step plan against one session as an explicit state machine.
//!
//! `Pending -> Running(i) -> Running(i + 1) | Aborted | Completed`. Each step is
//! attempted exactly once. A failing step only stops the run when it is
//! required or when it failed because the run was cancelled.

use serde::Serialize;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::capture::FailureCapture;
use super::step::{StepExecutor, StepResult, StepSpec};
use crate::error::ErrorKind;
use crate::session::FormSession;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum RunState {
    Pending,
    Running(usize),
    Completed,
    Aborted {
        step_index: usize,
        step_name: String,
        kind: ErrorKind,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct SequenceOutcome {
    pub state: RunState,
    /// Steps executed and passed, including optional steps that failed
    pub completed_steps: usize,
    pub aborted_at: Option<String>,
    pub abort_kind: Option<ErrorKind>,
    /// Failure captures written when the run aborted
    pub artifacts: Vec<PathBuf>,
    pub step_results: Vec<StepResult>,
}

impl SequenceOutcome {
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.state == RunState::Completed
    }
}

pub struct NavigationSequencer {
    executor: StepExecutor,
    capture: Option<FailureCapture>,
}

impl NavigationSequencer {
    /// `capture` is `None` when failure captures are disabled
    #[must_use]
    pub fn new(executor: StepExecutor, capture: Option<FailureCapture>) -> Self {
        Self { executor, capture }
    }

    pub async fn run<S: FormSession>(
        &self,
        steps: &[StepSpec],
        session: &S,
        cancel: &CancellationToken,
    ) -> SequenceOutcome {
        let mut state = RunState::Pending;
        let mut step_results = Vec::with_capacity(steps.len());
        debug!("Sequencer {state:?} with {} steps", steps.len());

        for (index, step) in steps.iter().enumerate() {
            if cancel.is_cancelled() {
                info!("Run cancelled before step '{}'", step.name);
                return self
                    .abort(index, step, ErrorKind::Cancelled, step_results, session)
                    .await;
            }

            state = RunState::Running(index);
            debug!("Sequencer {state:?}: '{}'", step.name);

            let result = self.executor.execute(step, session, cancel).await;
            let succeeded = result.succeeded;
            let kind = result.error_kind();
            step_results.push(result);

            match kind {
                _ if succeeded => {}
                Some(ErrorKind::Cancelled) => {
                    return self
                        .abort(index, step, ErrorKind::Cancelled, step_results, session)
                        .await;
                }
                _ if !step.required => {
                    warn!("Optional step '{}' failed, continuing", step.name);
                }
                kind => {
                    return self
                        .abort(
                            index,
                            step,
                            kind.unwrap_or(ErrorKind::ActionFailed),
                            step_results,
                            session,
                        )
                        .await;
                }
            }
        }

        info!("All {} steps completed", steps.len());
        SequenceOutcome {
            state: RunState::Completed,
            completed_steps: step_results.len(),
            aborted_at: None,
            abort_kind: None,
            artifacts: Vec::new(),
            step_results,
        }
    }

    async fn abort<S: FormSession>(
        &self,
        step_index: usize,
        step: &StepSpec,
        kind: ErrorKind,
        step_results: Vec<StepResult>,
        session: &S,
    ) -> SequenceOutcome {
        warn!("Run aborted at step '{}': {kind}", step.name);

        let artifacts = match &self.capture {
            Some(capture) => {
                capture
                    .capture(session, &format!("{}_{kind}", step.name))
                    .await
                    .saved_artifacts
            }
            None => Vec::new(),
        };

        SequenceOutcome {
            state: RunState::Aborted {
                step_index,
                step_name: step.name.clone(),
                kind,
            },
            completed_steps: step_index,
            aborted_at: Some(step.name.clone()),
            abort_kind: Some(kind),
            artifacts,
            step_results,
        }
    }
}

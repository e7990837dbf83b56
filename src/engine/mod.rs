//! The form-navigation engine: element resolution, step execution, step
//! sequencing and failure capture.

pub mod backoff;
pub mod capture;
pub mod pacing;
pub mod plan;
pub mod resolver;
pub mod sequencer;
pub mod step;

pub use backoff::{ChallengeBackoff, ChallengeOutcome, looks_like_challenge, retry_with_backoff};
pub use capture::{CaptureResult, FailureCapture};
pub use pacing::{Cancelled, Pacing};
pub use plan::{PlanError, comparison_plan, load_plan, render_plan};
pub use resolver::{ElementResolver, Resolution};
pub use sequencer::{NavigationSequencer, RunState, SequenceOutcome};
pub use step::{ActionKind, ActionSpec, StepExecutor, StepFailure, StepResult, StepSpec};

use std::fmt;
use std::time::Duration;

use super::config::PopupId;

/// Why a popup was shown or hidden.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reason {
    /// The request forced this popup; rules were not consulted.
    Forced,
    /// The visitor dismissed this popup for good.
    Dismissed,
    /// No resolvable condition is attached, so nothing restricts the popup.
    Unrestricted,
    /// The attached conditions decided.
    Rules,
}

/// Outcome of one attached condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Passed,
    Failed,
    /// No registered handler declares the condition.
    Skipped,
    /// The condition's parameter could not be interpreted.
    Invalid,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Passed => write!(f, "passed"),
            Outcome::Failed => write!(f, "failed"),
            Outcome::Skipped => write!(f, "skipped"),
            Outcome::Invalid => write!(f, "invalid"),
        }
    }
}

/// Detailed evaluation report returned by
/// [`Engine::evaluate_detailed()`](crate::Engine::evaluate_detailed).
///
/// Contains the decision, the reason for it, the outcome of every attached
/// condition that was consulted (in config order), and the wall-clock
/// duration of the evaluation.
#[derive(Debug, Clone)]
#[must_use]
pub struct EvaluationReport {
    popup: PopupId,
    show: bool,
    reason: Reason,
    outcomes: Vec<(String, Outcome)>,
    duration: Duration,
}

impl EvaluationReport {
    pub(crate) fn new(
        popup: PopupId,
        show: bool,
        reason: Reason,
        outcomes: Vec<(String, Outcome)>,
        duration: Duration,
    ) -> Self {
        Self {
            popup,
            show,
            reason,
            outcomes,
            duration,
        }
    }

    #[must_use]
    pub fn popup(&self) -> PopupId {
        self.popup
    }

    /// The decision, same as [`Engine::should_show()`](crate::Engine::should_show).
    #[must_use]
    pub fn show(&self) -> bool {
        self.show
    }

    #[must_use]
    pub fn reason(&self) -> Reason {
        self.reason
    }

    /// Condition outcomes in config order. Empty when the decision was made
    /// before any condition was consulted.
    #[must_use]
    pub fn outcomes(&self) -> &[(String, Outcome)] {
        &self.outcomes
    }

    /// Outcome of one condition, if it was consulted.
    #[must_use]
    pub fn outcome(&self, condition: &str) -> Option<Outcome> {
        self.outcomes
            .iter()
            .find(|(id, _)| id == condition)
            .map(|(_, o)| *o)
    }

    /// Wall-clock duration of the evaluation.
    #[must_use]
    pub fn duration(&self) -> Duration {
        self.duration
    }
}

impl fmt::Display for EvaluationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "popup {}: {} ({:?})",
            self.popup,
            if self.show { "show" } else { "hide" },
            self.reason
        )?;
        let outcomes: Vec<String> = self
            .outcomes
            .iter()
            .map(|(id, o)| format!("{id}={o}"))
            .collect();
        write!(f, ", conditions: [{}]", outcomes.join(", "))?;
        write!(f, ", duration: {:?}", self.duration)?;
        Ok(())
    }
}

use std::fmt;
use std::sync::Arc;

use super::config::MatchMode;
use super::error::RuleError;
use super::handler::RuleHandler;
use super::param::Prepared;

/// A popup's rule configuration resolved against a registry: every attached
/// condition bound to its handler with its parameter already validated.
///
/// Produced by [`Engine::compile()`](crate::Engine::compile). Immutable and
/// reusable across requests; hosts that serve many requests may cache it
/// per popup instead of recompiling each time.
#[derive(Clone)]
pub struct CompiledRules {
    pub(crate) gates: Vec<Gate>,
    pub(crate) mode: MatchMode,
}

/// One attached condition after compilation.
#[derive(Clone)]
pub(crate) struct Gate {
    pub(crate) condition: String,
    pub(crate) check: Check,
}

#[derive(Clone)]
pub(crate) enum Check {
    /// Dispatched to its handler on every evaluation.
    Ready {
        handler: Arc<dyn RuleHandler>,
        param: Prepared,
    },
    /// The stored parameter was rejected; always fails.
    Invalid(RuleError),
    /// No registered handler declares the condition; always passes.
    Unresolved,
}

impl CompiledRules {
    #[must_use]
    pub fn mode(&self) -> MatchMode {
        self.mode
    }

    /// Number of attached conditions, including skipped and invalid ones.
    #[must_use]
    pub fn len(&self) -> usize {
        self.gates.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.gates.is_empty()
    }

    /// Conditions no registered handler declares, in config order.
    #[must_use]
    pub fn unresolved(&self) -> Vec<&str> {
        self.gates
            .iter()
            .filter(|g| matches!(g.check, Check::Unresolved))
            .map(|g| g.condition.as_str())
            .collect()
    }

    /// Conditions whose stored parameter was rejected, with the reason.
    #[must_use]
    pub fn invalid(&self) -> Vec<(&str, &RuleError)> {
        self.gates
            .iter()
            .filter_map(|g| match &g.check {
                Check::Invalid(err) => Some((g.condition.as_str(), err)),
                _ => None,
            })
            .collect()
    }
}

impl fmt::Debug for CompiledRules {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledRules")
            .field("mode", &self.mode)
            .field(
                "conditions",
                &self.gates.iter().map(|g| g.condition.as_str()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl fmt::Display for CompiledRules {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CompiledRules({} conditions, {} unresolved, {} invalid, match {})",
            self.gates.len(),
            self.unresolved().len(),
            self.invalid().len(),
            self.mode,
        )
    }
}

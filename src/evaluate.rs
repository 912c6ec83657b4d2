use tracing::warn;

use crate::types::{Check, Gate};
use crate::{CompiledRules, MatchMode, Outcome, PopupId, RequestContext, RuleError};

/// Combine the attached conditions. Unresolved conditions are skipped; with
/// nothing left to consult the popup is unrestricted.
pub(crate) fn evaluate(rules: &CompiledRules, ctx: &RequestContext, popup: PopupId) -> bool {
    let mut gates = rules
        .gates
        .iter()
        .filter(|g| !matches!(g.check, Check::Unresolved))
        .peekable();

    if gates.peek().is_none() {
        return true;
    }

    match rules.mode {
        MatchMode::All => gates.all(|g| check(g, ctx, popup)),
        MatchMode::Any => gates.any(|g| check(g, ctx, popup)),
    }
}

/// Like [`evaluate`] but consults every condition and records each outcome.
/// Returns `None` for the decision when no condition could be consulted.
pub(crate) fn evaluate_detailed(
    rules: &CompiledRules,
    ctx: &RequestContext,
    popup: PopupId,
) -> (Option<bool>, Vec<(String, Outcome)>) {
    let outcomes: Vec<(String, Outcome)> = rules
        .gates
        .iter()
        .map(|g| {
            let outcome = match g.check {
                Check::Unresolved => Outcome::Skipped,
                Check::Invalid(_) => Outcome::Invalid,
                Check::Ready { .. } if check(g, ctx, popup) => Outcome::Passed,
                Check::Ready { .. } => Outcome::Failed,
            };
            (g.condition.clone(), outcome)
        })
        .collect();

    let mut consulted = outcomes
        .iter()
        .map(|(_, o)| *o)
        .filter(|o| *o != Outcome::Skipped)
        .peekable();

    let decision = if consulted.peek().is_none() {
        None
    } else {
        Some(match rules.mode {
            MatchMode::All => consulted.all(|o| o == Outcome::Passed),
            MatchMode::Any => consulted.any(|o| o == Outcome::Passed),
        })
    };

    (decision, outcomes)
}

fn check(gate: &Gate, ctx: &RequestContext, popup: PopupId) -> bool {
    match &gate.check {
        Check::Ready { handler, param } => {
            match handler.evaluate(&gate.condition, param, ctx, popup) {
                Ok(result) => result,
                Err(err) => {
                    debug_assert!(
                        !matches!(err, RuleError::UnknownCondition { .. }),
                        "dispatched a condition its handler never declared: {err}"
                    );
                    warn!(
                        condition = %gate.condition,
                        handler = handler.type_key(),
                        %popup,
                        error = %err,
                        "condition evaluation failed"
                    );
                    false
                }
            }
        }
        Check::Invalid(_) => false,
        Check::Unresolved => true,
    }
}

use std::sync::Arc;

use tracing::{debug, warn};

use crate::types::{Check, Gate};
use crate::{CompiledRules, Param, PopupRuleConfig, RuleError, RuleRegistry};

pub(crate) fn compile(registry: &RuleRegistry, config: &PopupRuleConfig) -> CompiledRules {
    let gates = config
        .conditions()
        .iter()
        .map(|(condition, param)| Gate {
            condition: condition.clone(),
            check: resolve(registry, condition, param),
        })
        .collect();

    CompiledRules {
        gates,
        mode: config.mode(),
    }
}

fn resolve(registry: &RuleRegistry, condition: &str, param: &Param) -> Check {
    let Some(handler) = registry.find_handler_for(condition) else {
        // Handler disabled or removed since the popup was saved.
        debug!(condition, "no rule handler declares condition, skipping it");
        return Check::Unresolved;
    };

    match handler.prepare(condition, param) {
        Ok(param) => Check::Ready {
            handler: Arc::clone(handler),
            param,
        },
        Err(err) => {
            debug_assert!(
                !matches!(err, RuleError::UnknownCondition { .. }),
                "registry resolved a condition its handler rejects: {err}"
            );
            warn!(
                condition,
                handler = handler.type_key(),
                error = %err,
                "stored condition parameter rejected, condition will fail"
            );
            Check::Invalid(err)
        }
    }
}

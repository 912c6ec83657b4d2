use crate::{Param, PopupId, Prepared, RequestContext, RuleDefinition, RuleError, RuleHandler};

pub const TYPE_KEY: &str = "class-popup-rule-popup.php";

pub const COUNT: &str = "count";

/// Views allowed when `count` is saved without a number.
pub const DEFAULT_MAX_VIEWS: u32 = 3;

/// Conditions on the popup's own display history.
#[derive(Debug)]
pub struct PopupRules {
    definitions: Vec<RuleDefinition>,
}

impl PopupRules {
    #[must_use]
    pub fn new() -> Self {
        Self {
            definitions: vec![RuleDefinition::new(
                COUNT,
                "Popup shown less than x times",
                "Shows the Pop Up if the user has only seen it less than a specific \
                 number of times.",
            )
            .weight(30)],
        }
    }
}

impl Default for PopupRules {
    fn default() -> Self {
        Self::new()
    }
}

impl RuleHandler for PopupRules {
    fn type_key(&self) -> &str {
        TYPE_KEY
    }

    fn definitions(&self) -> &[RuleDefinition] {
        &self.definitions
    }

    fn prepare(&self, condition: &str, param: &Param) -> Result<Prepared, RuleError> {
        if condition != COUNT {
            return Err(self.unknown(condition));
        }
        let max = match param {
            Param::None => return Ok(Prepared::Threshold(DEFAULT_MAX_VIEWS)),
            Param::Str(s) if s.trim().is_empty() => return Ok(Prepared::Threshold(DEFAULT_MAX_VIEWS)),
            other => other
                .as_int()
                .ok_or_else(|| RuleError::invalid(condition, format!("expected a number, got {other}")))?,
        };
        u32::try_from(max)
            .map(Prepared::Threshold)
            .map_err(|_| RuleError::invalid(condition, format!("{max} is out of range")))
    }

    fn evaluate(
        &self,
        condition: &str,
        param: &Prepared,
        ctx: &RequestContext,
        popup: PopupId,
    ) -> Result<bool, RuleError> {
        if condition != COUNT {
            return Err(self.unknown(condition));
        }
        match param {
            Prepared::Threshold(max) => Ok(ctx.view_count(popup) < *max),
            _ => Err(RuleError::invalid(condition, "expected a view threshold")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const POPUP: PopupId = PopupId(5);

    #[test]
    fn threshold_is_exclusive() {
        let rules = PopupRules::new();
        let param = rules.prepare(COUNT, &Param::Int(2)).unwrap();
        for (views, expected) in [(0, true), (1, true), (2, false), (9, false)] {
            let ctx = RequestContext::builder().view_count(POPUP, views).build();
            assert_eq!(rules.evaluate(COUNT, &param, &ctx, POPUP).unwrap(), expected);
        }
    }

    #[test]
    fn counts_are_per_popup() {
        let rules = PopupRules::new();
        let param = rules.prepare(COUNT, &Param::Int(1)).unwrap();
        let ctx = RequestContext::builder().view_count(PopupId(6), 4).build();
        assert!(rules.evaluate(COUNT, &param, &ctx, POPUP).unwrap());
    }

    #[test]
    fn missing_number_defaults() {
        let rules = PopupRules::new();
        assert!(matches!(
            rules.prepare(COUNT, &Param::None),
            Ok(Prepared::Threshold(DEFAULT_MAX_VIEWS))
        ));
        assert!(matches!(
            rules.prepare(COUNT, &Param::from(" ")),
            Ok(Prepared::Threshold(DEFAULT_MAX_VIEWS))
        ));
        assert!(matches!(
            rules.prepare(COUNT, &Param::from("4")),
            Ok(Prepared::Threshold(4))
        ));
    }

    #[test]
    fn bad_numbers_rejected() {
        let rules = PopupRules::new();
        assert!(matches!(
            rules.prepare(COUNT, &Param::Int(-1)),
            Err(RuleError::InvalidParameter { .. })
        ));
        assert!(matches!(
            rules.prepare(COUNT, &Param::from("many")),
            Err(RuleError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn zero_never_shows() {
        let rules = PopupRules::new();
        let param = rules.prepare(COUNT, &Param::Int(0)).unwrap();
        let ctx = RequestContext::default();
        assert!(!rules.evaluate(COUNT, &param, &ctx, POPUP).unwrap());
    }
}

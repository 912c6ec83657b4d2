use regex::{Regex, RegexBuilder};

use super::strip_scheme;
use crate::{Param, PopupId, Prepared, RequestContext, RuleDefinition, RuleError, RuleHandler};

pub const TYPE_KEY: &str = "class-popup-rule-url.php";

pub const URL: &str = "url";
pub const NO_URL: &str = "no_url";

/// Conditions on the requested URL.
///
/// Each listed pattern is a regular expression matched against the whole
/// URL with its scheme removed. Matching is case-insensitive and a trailing
/// `/` is optional on both sides.
#[derive(Debug)]
pub struct UrlRules {
    definitions: Vec<RuleDefinition>,
}

impl UrlRules {
    #[must_use]
    pub fn new() -> Self {
        Self {
            definitions: vec![
                RuleDefinition::new(
                    URL,
                    "On specific URL",
                    "Shows the Pop Up if the user is on a certain URL.",
                )
                .exclusive_with(NO_URL)
                .weight(50),
                RuleDefinition::new(
                    NO_URL,
                    "Not on specific URL",
                    "Shows the Pop Up if the user is not on a certain URL.",
                )
                .exclusive_with(URL)
                .weight(50),
            ],
        }
    }
}

impl Default for UrlRules {
    fn default() -> Self {
        Self::new()
    }
}

fn compile_pattern(condition: &str, pattern: &str) -> Result<Regex, RuleError> {
    let body = strip_scheme(pattern);
    let body = body.strip_suffix('/').unwrap_or(body);
    RegexBuilder::new(&format!("^(?:{body})/?$"))
        .case_insensitive(true)
        .build()
        .map_err(|e| RuleError::invalid(condition, format!("pattern '{pattern}': {e}")))
}

impl RuleHandler for UrlRules {
    fn type_key(&self) -> &str {
        TYPE_KEY
    }

    fn definitions(&self) -> &[RuleDefinition] {
        &self.definitions
    }

    fn prepare(&self, condition: &str, param: &Param) -> Result<Prepared, RuleError> {
        if !self.declares(condition) {
            return Err(self.unknown(condition));
        }
        param
            .to_list()
            .iter()
            .map(|p| compile_pattern(condition, p))
            .collect::<Result<Vec<_>, _>>()
            .map(Prepared::Patterns)
    }

    fn evaluate(
        &self,
        condition: &str,
        param: &Prepared,
        ctx: &RequestContext,
        _popup: PopupId,
    ) -> Result<bool, RuleError> {
        let Prepared::Patterns(patterns) = param else {
            return Err(RuleError::invalid(condition, "expected url patterns"));
        };
        let on_listed = ctx.requested_url().is_some_and(|url| {
            let url = strip_scheme(url);
            patterns.iter().any(|p| p.is_match(url))
        });
        match condition {
            URL => Ok(on_listed),
            NO_URL => Ok(!on_listed),
            _ => Err(self.unknown(condition)),
        }
    }
}

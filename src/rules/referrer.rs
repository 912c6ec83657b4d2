use regex::RegexBuilder;

use super::host_of;
use crate::{Param, PopupId, Prepared, RequestContext, RuleDefinition, RuleError, RuleHandler};

pub const TYPE_KEY: &str = "class-popup-rule-referer.php";

pub const REFERRER: &str = "referrer";
pub const REFERRER_MATCH: &str = "referrer_match";
pub const SEARCHENGINE: &str = "searchengine";
pub const NO_INTERNAL: &str = "no_internal";

/// Fragments that identify a search engine results page in a referrer.
const SEARCH_ENGINES: &[&str] = &[
    "/search?",
    ".google.",
    "web.info.com",
    "search.",
    "del.icio.us/search",
    "soso.com",
    "/search/",
    ".yahoo.",
    ".bing.",
];

/// Conditions on where the visitor came from.
#[derive(Debug)]
pub struct ReferrerRules {
    definitions: Vec<RuleDefinition>,
}

impl ReferrerRules {
    #[must_use]
    pub fn new() -> Self {
        Self {
            definitions: vec![
                RuleDefinition::new(
                    REFERRER,
                    "From a specific referrer",
                    "Shows the Pop Up if the user arrived via a specific referrer.",
                )
                .weight(10),
                RuleDefinition::new(
                    REFERRER_MATCH,
                    "Referrer matches pattern",
                    "Shows the Pop Up if the referrer matches a regular expression.",
                )
                .weight(10),
                RuleDefinition::new(
                    SEARCHENGINE,
                    "From a search engine",
                    "Shows the Pop Up if the user arrived via a search engine.",
                )
                .weight(10),
                RuleDefinition::new(
                    NO_INTERNAL,
                    "Not from an internal link",
                    "Shows the Pop Up if the user did not arrive on this page via \
                     another page on your site.",
                )
                .weight(10),
            ],
        }
    }
}

impl Default for ReferrerRules {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) fn is_search_engine(referrer: &str) -> bool {
    let referrer = referrer.to_ascii_lowercase();
    SEARCH_ENGINES.iter().any(|needle| referrer.contains(needle))
}

impl RuleHandler for ReferrerRules {
    fn type_key(&self) -> &str {
        TYPE_KEY
    }

    fn definitions(&self) -> &[RuleDefinition] {
        &self.definitions
    }

    fn prepare(&self, condition: &str, param: &Param) -> Result<Prepared, RuleError> {
        match condition {
            REFERRER => Ok(Prepared::Needles(
                param.to_list().iter().map(|s| s.to_lowercase()).collect(),
            )),
            REFERRER_MATCH => {
                let pattern = param
                    .as_str()
                    .ok_or_else(|| RuleError::invalid(condition, format!("expected a pattern, got {param}")))?;
                RegexBuilder::new(pattern)
                    .case_insensitive(true)
                    .build()
                    .map(Prepared::Pattern)
                    .map_err(|e| RuleError::invalid(condition, e.to_string()))
            }
            SEARCHENGINE | NO_INTERNAL => Ok(Prepared::Flag),
            _ => Err(self.unknown(condition)),
        }
    }

    fn evaluate(
        &self,
        condition: &str,
        param: &Prepared,
        ctx: &RequestContext,
        _popup: PopupId,
    ) -> Result<bool, RuleError> {
        let referrer = ctx.referrer();
        match (condition, param) {
            (REFERRER, Prepared::Needles(needles)) => Ok(referrer.is_some_and(|r| {
                let r = r.to_lowercase();
                needles.iter().any(|n| r.contains(n.as_str()))
            })),
            (REFERRER_MATCH, Prepared::Pattern(pattern)) => {
                Ok(referrer.is_some_and(|r| pattern.is_match(r)))
            }
            (SEARCHENGINE, _) => Ok(referrer.is_some_and(is_search_engine)),
            (NO_INTERNAL, _) => {
                let Some(referrer) = referrer else {
                    return Ok(true);
                };
                Ok(host_of(referrer).as_deref() != ctx.site_host())
            }
            (REFERRER | REFERRER_MATCH, _) => {
                Err(RuleError::invalid(condition, "parameter was not prepared by this handler"))
            }
            _ => Err(self.unknown(condition)),
        }
    }
}

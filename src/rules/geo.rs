use crate::{Param, PopupId, Prepared, RequestContext, RuleDefinition, RuleError, RuleHandler};

pub const TYPE_KEY: &str = "class-popup-rule-geo.php";

pub const COUNTRY: &str = "country";
pub const NO_COUNTRY: &str = "no_country";

/// Conditions on the visitor's resolved country.
///
/// The country is resolved by the host before evaluation. When it could not
/// be resolved, `country` fails and `no_country` passes.
#[derive(Debug)]
pub struct GeoRules {
    definitions: Vec<RuleDefinition>,
}

impl GeoRules {
    #[must_use]
    pub fn new() -> Self {
        Self {
            definitions: vec![
                RuleDefinition::new(
                    COUNTRY,
                    "In a specific Country",
                    "Shows the Pop Up if the user is in a certain country.",
                )
                .exclusive_with(NO_COUNTRY)
                .weight(40),
                RuleDefinition::new(
                    NO_COUNTRY,
                    "Not in a specific Country",
                    "Shows the Pop Up if the user is not in a certain country.",
                )
                .exclusive_with(COUNTRY)
                .weight(40),
            ],
        }
    }
}

impl Default for GeoRules {
    fn default() -> Self {
        Self::new()
    }
}

impl RuleHandler for GeoRules {
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
        let codes = param
            .to_list()
            .into_iter()
            .map(|code| {
                if code.len() == 2 && code.bytes().all(|b| b.is_ascii_alphabetic()) {
                    Ok(code.to_ascii_uppercase())
                } else {
                    Err(RuleError::invalid(
                        condition,
                        format!("'{code}' is not a two-letter country code"),
                    ))
                }
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Prepared::Countries(codes))
    }

    fn evaluate(
        &self,
        condition: &str,
        param: &Prepared,
        ctx: &RequestContext,
        _popup: PopupId,
    ) -> Result<bool, RuleError> {
        let Prepared::Countries(codes) = param else {
            return Err(RuleError::invalid(condition, "expected country codes"));
        };
        let listed = ctx
            .country()
            .is_some_and(|country| codes.iter().any(|c| c == country));
        match condition {
            COUNTRY => Ok(listed),
            NO_COUNTRY => Ok(!listed),
            _ => Err(self.unknown(condition)),
        }
    }
}

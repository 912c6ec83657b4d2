use crate::{MatchMode, Param, PopupId, PopupRuleConfig};

use super::error::ParseError;

/// One `popup` block as the grammar saw it.
pub(crate) struct RawPopup {
    pub(crate) id: u64,
    pub(crate) mode: MatchMode,
    pub(crate) conditions: Vec<(String, Param)>,
    /// Input length left when the block started, for error locations.
    pub(crate) remaining: usize,
}

/// A popup declared in catalog text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedPopup {
    pub id: PopupId,
    pub config: PopupRuleConfig,
}

/// The result of parsing catalog text.
#[derive(Debug, Default)]
pub struct ParsedCatalog {
    pub popups: Vec<ParsedPopup>,
}

impl ParsedCatalog {
    pub(crate) fn build(input: &str, raw: Vec<RawPopup>) -> Result<Self, ParseError> {
        let mut popups = Vec::with_capacity(raw.len());
        for popup in raw {
            let mut config = PopupRuleConfig::new().with_mode(popup.mode);
            for (id, param) in popup.conditions {
                if config.param(&id).is_some() {
                    return Err(ParseError::at(
                        input,
                        input.len() - popup.remaining,
                        format!("condition '{id}' listed twice in popup {}", popup.id),
                    ));
                }
                config.push(&id, param);
            }
            popups.push(ParsedPopup {
                id: PopupId(popup.id),
                config,
            });
        }
        Ok(Self { popups })
    }
}

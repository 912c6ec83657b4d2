use std::fmt;
use std::sync::Arc;

use crate::{
    Param, PopupId, Prepared, ProTierProbe, RequestContext, RuleDefinition, RuleError,
    RuleHandler,
};

pub const TYPE_KEY: &str = "class-popup-rule-user.php";

pub const LOGIN: &str = "login";
pub const NO_LOGIN: &str = "no_login";
pub const COMMENT: &str = "comment";
pub const NO_COMMENT: &str = "no_comment";
pub const NO_PROSITE: &str = "no_prosite";

/// Login state, comment history, and pro-tier conditions.
pub struct UserRules {
    definitions: Vec<RuleDefinition>,
    pro_tier: Option<Arc<dyn ProTierProbe>>,
}

impl UserRules {
    /// `no_prosite` is declared only when the host supplies a pro-tier probe.
    #[must_use]
    pub fn new(pro_tier: Option<Arc<dyn ProTierProbe>>) -> Self {
        let mut definitions = vec![
            RuleDefinition::new(
                LOGIN,
                "Visitor is logged in",
                "Shows the Pop Up if the user is logged in to your site.",
            )
            .exclusive_with(NO_LOGIN)
            .weight(1),
            RuleDefinition::new(
                NO_LOGIN,
                "Visitor is not logged in",
                "Shows the Pop Up if the user is not logged in to your site.",
            )
            .exclusive_with(LOGIN)
            .weight(1),
            RuleDefinition::new(
                COMMENT,
                "Visitor has commented before",
                "Shows the Pop Up if the user has already left a comment. You may want to \
                 combine this condition with either \"Visitor is logged in\" or \"Visitor \
                 is not logged in\".",
            )
            .exclusive_with(NO_COMMENT)
            .weight(20),
            RuleDefinition::new(
                NO_COMMENT,
                "Visitor has never commented",
                "Shows the Pop Up if the user has never left a comment. You may want to \
                 combine this condition with either \"Visitor is logged in\" or \"Visitor \
                 is not logged in\".",
            )
            .exclusive_with(COMMENT)
            .weight(20),
        ];
        if pro_tier.is_some() {
            definitions.push(
                RuleDefinition::new(
                    NO_PROSITE,
                    "Site is not a Pro-Site",
                    "Shows the Pop Up if the site is not a Pro-Site.",
                )
                .weight(20),
            );
        }
        Self {
            definitions,
            pro_tier,
        }
    }
}

impl RuleHandler for UserRules {
    fn type_key(&self) -> &str {
        TYPE_KEY
    }

    fn definitions(&self) -> &[RuleDefinition] {
        &self.definitions
    }

    fn prepare(&self, condition: &str, _param: &Param) -> Result<Prepared, RuleError> {
        if !self.declares(condition) {
            return Err(self.unknown(condition));
        }
        Ok(Prepared::Flag)
    }

    fn evaluate(
        &self,
        condition: &str,
        _param: &Prepared,
        ctx: &RequestContext,
        _popup: PopupId,
    ) -> Result<bool, RuleError> {
        match (condition, &self.pro_tier) {
            (LOGIN, _) => Ok(ctx.is_logged_in()),
            (NO_LOGIN, _) => Ok(!ctx.is_logged_in()),
            (COMMENT, _) => Ok(ctx.comment_count() > 0),
            (NO_COMMENT, _) => Ok(ctx.comment_count() == 0),
            (NO_PROSITE, Some(probe)) => Ok(!probe.is_pro_tier_site()),
            _ => Err(self.unknown(condition)),
        }
    }
}

impl fmt::Debug for UserRules {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserRules")
            .field("conditions", &self.definitions.len())
            .field("pro_tier", &self.pro_tier.is_some())
            .finish()
    }
}

//! Display-rule engine deciding which popovers a site visitor should see.
//!
//! Popups carry a list of conditions. Each condition id is declared by a
//! [`RuleHandler`] registered in a [`RuleRegistry`]; an [`Engine`] resolves
//! every condition through the registry and combines the results for one
//! [`RequestContext`].

mod compile;
mod error;
mod evaluate;
mod types;

pub mod legacy;
pub mod parse;
pub mod rules;
#[cfg(feature = "binary-cache")]
pub mod serial;

pub use error::PopoverError;
pub use types::{
    Catalog, CatalogError, CommentStore, CompiledRules, ConditionListing, Engine,
    EvaluationReport, MatchMode, Outcome, Param, PopupId, PopupRuleConfig, PopupSource, Prepared,
    ProTierProbe, Reason, RequestContext, RequestContextBuilder, RequestFacts, RuleDefinition,
    RuleError, RuleHandler, RuleRegistry, Settings,
};

mod catalog;
mod config;
mod context;
mod definition;
mod engine;
mod error;
mod evaluation_report;
mod handler;
mod host;
mod param;
mod registry;
mod rule;
mod settings;

pub use catalog::Catalog;
pub use config::{MatchMode, PopupId, PopupRuleConfig};
pub use context::{RequestContext, RequestContextBuilder, RequestFacts};
pub use definition::{ConditionListing, RuleDefinition};
pub use engine::Engine;
pub use error::{CatalogError, RuleError};
pub use evaluation_report::{EvaluationReport, Outcome, Reason};
pub use handler::RuleHandler;
pub use host::{CommentStore, PopupSource, ProTierProbe};
pub use param::{Param, Prepared};
pub use registry::RuleRegistry;
pub use rule::CompiledRules;
pub use settings::Settings;

pub(crate) use rule::{Check, Gate};

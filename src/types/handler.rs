use super::config::PopupId;
use super::context::RequestContext;
use super::definition::RuleDefinition;
use super::error::RuleError;
use super::param::{Param, Prepared};

/// One family of related conditions (e.g. login state, referrer checks).
///
/// Handlers are built once at startup, registered into a
/// [`RuleRegistry`](crate::RuleRegistry), and shared read-only between
/// requests. Anything memoized during evaluation lives on the
/// [`RequestContext`], never on the handler.
pub trait RuleHandler: Send + Sync {
    /// Stable identifier persisted alongside popups that use this family.
    fn type_key(&self) -> &str;

    /// The conditions this handler declares, in declaration order.
    fn definitions(&self) -> &[RuleDefinition];

    /// Whether `condition` is one of this handler's conditions.
    fn declares(&self, condition: &str) -> bool {
        self.definitions().iter().any(|d| d.id == condition)
    }

    /// Validate a stored parameter once and convert it into the form
    /// [`evaluate`](Self::evaluate) consumes.
    ///
    /// The default accepts any parameter unchanged.
    ///
    /// # Errors
    ///
    /// [`RuleError::UnknownCondition`] for ids this handler never declared,
    /// [`RuleError::InvalidParameter`] for parameters it cannot interpret.
    fn prepare(&self, condition: &str, param: &Param) -> Result<Prepared, RuleError> {
        if !self.declares(condition) {
            return Err(self.unknown(condition));
        }
        Ok(Prepared::Raw(param.clone()))
    }

    /// Evaluate one condition for `popup` against the current request.
    ///
    /// Must be a pure function of its arguments; the only permitted side
    /// effect is memoization through `ctx`.
    ///
    /// # Errors
    ///
    /// [`RuleError::UnknownCondition`] for ids this handler never declared,
    /// [`RuleError::InvalidParameter`] if `param` has an unexpected shape.
    fn evaluate(
        &self,
        condition: &str,
        param: &Prepared,
        ctx: &RequestContext,
        popup: PopupId,
    ) -> Result<bool, RuleError>;

    /// Build the error for a condition id this handler does not declare.
    fn unknown(&self, condition: &str) -> RuleError {
        RuleError::UnknownCondition {
            handler: self.type_key().to_owned(),
            condition: condition.to_owned(),
        }
    }
}

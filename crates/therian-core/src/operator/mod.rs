//! Operators: pluggable strategies performing one kind of operation
//!
//! An [`Operator`] is statically bound to one operation type and declares the
//! shape of the operations it can handle through a [`Signature`]. The engine
//! only asks an operator about operations whose profile matches that
//! signature; `supports` then refines the decision with runtime knowledge.
//!
//! Copyright (c) 2025 Therian Team
//! Licensed under the Apache-2.0 license

pub mod registry;

pub use registry::OperatorRegistry;

use crate::context::EvaluationContext;
use crate::error::Phase;
use crate::operation::{Operation, OperationKind};
use crate::types::{Type, TypeBindings};
use crate::Result;
use serde::{Deserialize, Serialize};
use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

/// Type patterns an operator accepts, one per operation type argument
///
/// Patterns may use wildcards and type variables; a variable binds on first
/// use and must match consistently, so `Add<Collection<T>, T>` only accepts
/// elements of the collection's element type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Signature(Vec<Type>);

impl Signature {
    pub fn new(patterns: impl IntoIterator<Item = Type>) -> Self {
        Signature(patterns.into_iter().collect())
    }

    pub fn patterns(&self) -> &[Type] {
        &self.0
    }

    pub fn arity(&self) -> usize {
        self.0.len()
    }

    /// Bind against actual type arguments
    pub fn matches(&self, args: &[Type]) -> Option<TypeBindings> {
        if args.len() != self.0.len() {
            return None;
        }
        let mut bindings = TypeBindings::default();
        self.0
            .iter()
            .zip(args)
            .all(|(pattern, actual)| pattern.unify(actual, &mut bindings))
            .then_some(bindings)
    }

    /// Every pattern of `self` fits into the corresponding pattern of `other`
    pub fn is_within(&self, other: &Signature) -> bool {
        self.arity() == other.arity() && other.matches(&self.0).is_some()
    }

    /// Strictly narrower than `other`
    pub fn is_more_specific_than(&self, other: &Signature) -> bool {
        self.is_within(other) && !other.is_within(self)
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let patterns = self
            .0
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        write!(f, "<{}>", patterns)
    }
}

/// Which evaluation phases of an operator may be cached
///
/// A non-reusable evaluation phase makes the support check non-reusable too.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reusability {
    support_check: bool,
    evaluation: bool,
}

impl Reusability {
    pub const fn all() -> Self {
        Self {
            support_check: true,
            evaluation: true,
        }
    }

    pub const fn none() -> Self {
        Self {
            support_check: false,
            evaluation: false,
        }
    }

    /// All phases except `phase`
    pub fn excluding(phase: Phase) -> Self {
        match phase {
            Phase::SupportCheck => Self {
                support_check: false,
                evaluation: true,
            },
            Phase::Evaluation => Self::none(),
        }
    }

    pub fn is_reusable(self, phase: Phase) -> bool {
        match phase {
            Phase::SupportCheck => self.support_check && self.evaluation,
            Phase::Evaluation => self.evaluation,
        }
    }
}

impl Default for Reusability {
    fn default() -> Self {
        Self::all()
    }
}

impl fmt::Display for Reusability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let phases: Vec<String> = [Phase::SupportCheck, Phase::Evaluation]
            .into_iter()
            .filter(|phase| self.is_reusable(*phase))
            .map(|phase| phase.to_string())
            .collect();
        if phases.is_empty() {
            write!(f, "none")
        } else {
            write!(f, "{}", phases.join(", "))
        }
    }
}

/// A strategy performing one kind of operation
pub trait Operator: Send + Sync + 'static {
    type Operation: Operation;

    /// Shape of the operations this operator handles
    fn signature(&self) -> Signature;

    /// Whether this operator can perform `operation`; must not mutate it
    fn supports(&self, context: &mut EvaluationContext, operation: &Self::Operation) -> Result<bool>;

    /// Do the work; `Ok(false)` when the operation could not be completed
    fn perform(&self, context: &mut EvaluationContext, operation: &mut Self::Operation) -> Result<bool>;

    fn reusability(&self) -> Reusability {
        Reusability::default()
    }

    /// Names of operators this one delegates to
    fn depends_on(&self) -> Vec<&'static str> {
        Vec::new()
    }

    /// Registry name, the short type name by default
    ///
    /// Names must be unique within an engine: dependencies refer to them and
    /// the registry rejects two different operator types sharing one.
    /// Instances of a generic operator share the default name, so a generic
    /// operator registered at several instantiations overrides it.
    fn name(&self) -> &'static str {
        short_type_name::<Self>()
    }
}

/// `a::b::Name<T>` becomes `Name`
fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

trait ErasedOperator: Send + Sync {
    fn supports(&self, context: &mut EvaluationContext, operation: &dyn Any) -> Result<bool>;

    fn perform(&self, context: &mut EvaluationContext, operation: &mut dyn Any) -> Result<bool>;
}

struct Erased<O>(O);

impl<O: Operator> ErasedOperator for Erased<O> {
    fn supports(&self, context: &mut EvaluationContext, operation: &dyn Any) -> Result<bool> {
        match operation.downcast_ref::<O::Operation>() {
            Some(operation) => self.0.supports(context, operation),
            None => Ok(false),
        }
    }

    fn perform(&self, context: &mut EvaluationContext, operation: &mut dyn Any) -> Result<bool> {
        match operation.downcast_mut::<O::Operation>() {
            Some(operation) => self.0.perform(context, operation),
            None => Ok(false),
        }
    }
}

/// An operator as held by modules and the registry
#[derive(Clone)]
pub struct RegisteredOperator {
    name: String,
    type_id: TypeId,
    type_name: &'static str,
    kind: OperationKind,
    signature: Signature,
    reusability: Reusability,
    depends_on: Vec<String>,
    operator: Arc<dyn ErasedOperator>,
}

impl RegisteredOperator {
    pub fn new<O: Operator>(operator: O) -> Self {
        Self {
            name: operator.name().to_string(),
            type_id: TypeId::of::<O>(),
            type_name: std::any::type_name::<O>(),
            kind: <O::Operation as Operation>::KIND,
            signature: operator.signature(),
            reusability: operator.reusability(),
            depends_on: operator.depends_on().into_iter().map(String::from).collect(),
            operator: Arc::new(Erased(operator)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Identity of the implementing type
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn kind(&self) -> OperationKind {
        self.kind
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    pub fn reusability(&self) -> Reusability {
        self.reusability
    }

    pub fn depends_on(&self) -> &[String] {
        &self.depends_on
    }

    pub(crate) fn supports(&self, context: &mut EvaluationContext, operation: &dyn Any) -> Result<bool> {
        self.operator.supports(context, operation)
    }

    pub(crate) fn perform(&self, context: &mut EvaluationContext, operation: &mut dyn Any) -> Result<bool> {
        self.operator.perform(context, operation)
    }
}

impl fmt::Debug for RegisteredOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisteredOperator")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("signature", &self.signature.to_string())
            .finish()
    }
}

impl fmt::Display for RegisteredOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}{}", self.name, self.kind, self.signature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PrimitiveKind;

    #[test]
    fn test_signature_binds_variables() {
        let add = Signature::new([Type::collection(Type::var("T")), Type::var("T")]);
        assert!(add.matches(&[Type::list(Type::String), Type::String]).is_some());
        assert!(add
            .matches(&[Type::list(Type::String), Type::Boxed(PrimitiveKind::Int)])
            .is_none());
        assert!(add.matches(&[Type::list(Type::String)]).is_none());
    }

    #[test]
    fn test_specificity() {
        let arrays = Signature::new([Type::array(Type::any())]);
        let anything = Signature::new([Type::Object]);
        assert!(arrays.is_more_specific_than(&anything));
        assert!(!anything.is_more_specific_than(&arrays));
        assert!(!arrays.is_more_specific_than(&arrays));
    }

    #[test]
    fn test_reusability_implication() {
        let no_eval = Reusability::excluding(Phase::Evaluation);
        assert!(!no_eval.is_reusable(Phase::Evaluation));
        assert!(!no_eval.is_reusable(Phase::SupportCheck));

        let no_support = Reusability::excluding(Phase::SupportCheck);
        assert!(no_support.is_reusable(Phase::Evaluation));
        assert!(!no_support.is_reusable(Phase::SupportCheck));
        assert_eq!(Reusability::default().to_string(), "support-check, evaluation");
    }

    #[test]
    fn test_short_type_name() {
        assert_eq!(short_type_name::<Signature>(), "Signature");
        assert_eq!(short_type_name::<Vec<String>>(), "Vec");
    }
}

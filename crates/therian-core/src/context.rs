//! Evaluation context: the support-check-then-perform protocol
//!
//! A context is a short-lived session over an [`Engine`]. It caches support
//! verdicts and winning operators per operation key, keeps the stacks used to
//! detect re-entrant evaluation, and carries typed hints such as [`Caching`]
//! or the expression evaluator used by relative positions.
//!
//! Copyright (c) 2025 Therian Team
//! Licensed under the Apache-2.0 license

use crate::el::{ExpressionEvaluator, StandardResolver};
use crate::engine::{Caching, Engine};
use crate::error::Phase;
use crate::operation::{Operation, OperationKey, Status};
use crate::operator::RegisteredOperator;
use crate::{Error, Result};
use log::{debug, trace, warn};
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

enum Outcome {
    Unsupported,
    Performed(bool),
}

/// A single evaluation session
pub struct EvaluationContext {
    engine: Engine,
    verdicts: HashMap<(OperationKey, String), bool>,
    winners: HashMap<OperationKey, Arc<RegisteredOperator>>,
    performing: Vec<OperationKey>,
    checking: Vec<OperationKey>,
    hints: HashMap<TypeId, Box<dyn Any + Send>>,
}

impl EvaluationContext {
    pub(crate) fn new(engine: Engine) -> Self {
        Self {
            engine,
            verdicts: HashMap::new(),
            winners: HashMap::new(),
            performing: Vec::new(),
            checking: Vec::new(),
            hints: HashMap::new(),
        }
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Attach a typed hint, replacing any previous hint of the same type
    pub fn set_hint<T: Any + Send>(&mut self, hint: T) {
        self.hints.insert(TypeId::of::<T>(), Box::new(hint));
    }

    pub fn hint<T: Any + Send>(&self) -> Option<&T> {
        self.hints
            .get(&TypeId::of::<T>())
            .and_then(|hint| hint.downcast_ref::<T>())
    }

    pub fn remove_hint<T: Any + Send>(&mut self) -> Option<T> {
        self.hints
            .remove(&TypeId::of::<T>())
            .and_then(|hint| hint.downcast::<T>().ok())
            .map(|hint| *hint)
    }

    /// Effective caching: the context hint, else the engine default
    pub fn caching(&self) -> Caching {
        self.hint::<Caching>()
            .copied()
            .unwrap_or(self.engine.config().caching)
    }

    pub fn with_caching(mut self, caching: Caching) -> Self {
        self.set_hint(caching);
        self
    }

    /// Expression evaluator for relative positions created during evaluation
    pub fn evaluator(&self) -> Arc<dyn ExpressionEvaluator> {
        self.hint::<Arc<dyn ExpressionEvaluator>>()
            .cloned()
            .unwrap_or_else(|| Arc::new(StandardResolver))
    }

    pub fn with_evaluator(mut self, evaluator: Arc<dyn ExpressionEvaluator>) -> Self {
        self.set_hint(evaluator);
        self
    }

    /// Whether `operation` can be performed, by its short-circuit or by an operator
    pub fn supports<O: Operation>(&mut self, operation: &O) -> Result<bool> {
        if operation.shortcut_applies(self)? {
            return Ok(true);
        }
        Ok(self.find_operator(operation)?.is_some())
    }

    /// Evaluate and return the result
    ///
    /// Fails with `OperationUnsupported` when no operator applies and with
    /// `OperationFailed` when the chosen operator does not complete.
    pub fn eval<O: Operation>(&mut self, operation: &mut O) -> Result<O::Output> {
        match self.run(operation)? {
            Outcome::Unsupported => Err(Error::OperationUnsupported {
                operation: operation.describe(),
            }),
            Outcome::Performed(true) => operation.result(),
            Outcome::Performed(false) => Err(self.failed(operation)),
        }
    }

    /// Evaluate and report success; unsupported counts as unsuccessful
    pub fn eval_success<O: Operation>(&mut self, operation: &mut O) -> Result<bool> {
        match self.run(operation)? {
            Outcome::Unsupported => Ok(false),
            Outcome::Performed(successful) => Ok(successful),
        }
    }

    /// Evaluate when supported; `None` otherwise
    pub fn eval_if_supported<O: Operation>(&mut self, operation: &mut O) -> Result<Option<O::Output>> {
        match self.run(operation)? {
            Outcome::Unsupported => Ok(None),
            Outcome::Performed(true) => operation.result().map(Some),
            Outcome::Performed(false) => Err(self.failed(operation)),
        }
    }

    /// Perform without treating an incomplete operation as an error
    pub fn perform<O: Operation>(&mut self, operation: &mut O) -> Result<bool> {
        match self.run(operation)? {
            Outcome::Unsupported => Err(Error::OperationUnsupported {
                operation: operation.describe(),
            }),
            Outcome::Performed(successful) => Ok(successful),
        }
    }

    fn failed<O: Operation>(&self, operation: &O) -> Error {
        Error::OperationFailed {
            operation: operation.describe(),
            operator: operation.operator().unwrap_or("<none>").to_string(),
        }
    }

    fn run<O: Operation>(&mut self, operation: &mut O) -> Result<Outcome> {
        match operation.status() {
            Status::Succeeded => return Ok(Outcome::Performed(true)),
            Status::Failed => return Ok(Outcome::Performed(false)),
            Status::Unsupported => return Ok(Outcome::Unsupported),
            _ => {}
        }

        operation.set_status(Status::SupportChecking);
        if operation.shortcut_applies(self)? {
            operation.apply_shortcut(self)?;
            operation.set_successful(true);
            operation.set_status(Status::Succeeded);
            let profile = operation.profile();
            debug!("{} completed without an operator", profile);
            for listener in self.engine.clone().listeners() {
                listener.shortcut_taken(&profile);
            }
            return Ok(Outcome::Performed(true));
        }

        let Some(operator) = self.find_operator(&*operation)? else {
            operation.set_status(Status::Unsupported);
            debug!("No operator supports {}", operation.describe());
            return Ok(Outcome::Unsupported);
        };
        operation.set_status(Status::Supported);
        operation.set_operator(operator.name());

        let key = operation.key();
        if self.performing.contains(&key) {
            operation.set_status(Status::Failed);
            operation.set_successful(false);
            return Err(Error::Reentrancy {
                operation: operation.describe(),
            });
        }

        operation.set_status(Status::Performing);
        self.performing.push(key);
        let performed = operator.perform(self, &mut *operation as &mut dyn Any);
        self.performing.pop();

        let successful = match performed {
            Ok(successful) => successful,
            Err(err) => {
                operation.set_status(Status::Failed);
                operation.set_successful(false);
                return Err(err);
            }
        };
        operation.set_successful(successful);
        operation.set_status(if successful {
            Status::Succeeded
        } else {
            Status::Failed
        });
        debug!(
            "{} performed {}: {}",
            operator.name(),
            operation.profile(),
            if successful { "succeeded" } else { "failed" }
        );
        let profile = operation.profile();
        for listener in self.engine.clone().listeners() {
            listener.performed(&operator, &profile, successful);
        }
        Ok(Outcome::Performed(successful))
    }

    /// First supporting candidate, honoring the caches and the support stack
    fn find_operator<O: Operation>(&mut self, operation: &O) -> Result<Option<Arc<RegisteredOperator>>> {
        let key = operation.key();
        let caching = self.caching();
        if caching.context_level() {
            if let Some(winner) = self.winners.get(&key) {
                trace!("Reusing {} for {}", winner.name(), key);
                return Ok(Some(winner.clone()));
            }
        }
        if self.checking.contains(&key) {
            debug!("Re-entrant support check of {}, answering false", key);
            return Ok(None);
        }

        self.checking.push(key.clone());
        let found = self.search(operation, &key, caching);
        self.checking.pop();
        found
    }

    fn search<O: Operation>(
        &mut self,
        operation: &O,
        key: &OperationKey,
        caching: Caching,
    ) -> Result<Option<Arc<RegisteredOperator>>> {
        let engine = self.engine.clone();
        let profile = key.profile();
        let candidates = engine.candidates(profile, caching.engine_level());

        for operator in candidates.iter() {
            let cacheable = caching.context_level() && operator.reusability().is_reusable(Phase::SupportCheck);
            let verdict_key = (key.clone(), operator.name().to_string());
            let cached = if cacheable {
                self.verdicts.get(&verdict_key).copied()
            } else {
                None
            };

            let supported = match cached {
                Some(verdict) => verdict,
                None => {
                    trace!("Asking {} about {}", operator.name(), profile);
                    let verdict = match operator.supports(self, operation as &dyn Any) {
                        Ok(verdict) => verdict,
                        Err(err) => {
                            warn!(
                                "{} failed its support check for {}: {}",
                                operator.name(),
                                operation.describe(),
                                err
                            );
                            false
                        }
                    };
                    if cacheable {
                        self.verdicts.insert(verdict_key, verdict);
                    }
                    for listener in engine.listeners() {
                        listener.support_checked(operator, profile, verdict);
                    }
                    verdict
                }
            };

            if supported {
                debug!("{} supported by {}", profile, operator.name());
                if caching.context_level() && operator.reusability().is_reusable(Phase::Evaluation) {
                    self.winners.insert(key.clone(), operator.clone());
                }
                return Ok(Some(operator.clone()));
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::Module;
    use crate::operation::Size;
    use crate::operator::{Operator, Signature};
    use crate::position::Positions;
    use crate::types::Type;
    use crate::value::Value;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingSize {
        checks: Arc<AtomicUsize>,
    }

    impl Operator for CountingSize {
        type Operation = Size;

        fn signature(&self) -> Signature {
            Signature::new([Type::Object])
        }

        fn supports(&self, _: &mut EvaluationContext, _: &Size) -> Result<bool> {
            self.checks.fetch_add(1, Ordering::SeqCst);
            Ok(true)
        }

        fn perform(&self, _: &mut EvaluationContext, op: &mut Size) -> Result<bool> {
            op.set_result(7);
            Ok(true)
        }
    }

    fn engine(checks: Arc<AtomicUsize>) -> Engine {
        Engine::builder()
            .without_standard_operators()
            .module(Module::builder("counting").operator(CountingSize { checks }).build())
            .build()
            .unwrap()
    }

    #[test]
    fn test_verdicts_cached_per_context() {
        let checks = Arc::new(AtomicUsize::new(0));
        let engine = engine(checks.clone());
        let position = Positions::read_only_value(Value::Int(1));

        let mut context = engine.context();
        assert_eq!(context.eval(&mut Size::new(position.clone())).unwrap(), 7);
        assert_eq!(context.eval(&mut Size::new(position.clone())).unwrap(), 7);
        assert_eq!(checks.load(Ordering::SeqCst), 1);

        let mut fresh = engine.context();
        fresh.eval(&mut Size::new(position)).unwrap();
        assert_eq!(checks.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_caching_none_rechecks() {
        let checks = Arc::new(AtomicUsize::new(0));
        let engine = engine(checks.clone());
        let position = Positions::read_only_value(Value::Int(1));

        let mut context = engine.context().with_caching(Caching::None);
        context.eval(&mut Size::new(position.clone())).unwrap();
        context.eval(&mut Size::new(position)).unwrap();
        assert_eq!(checks.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_single_use() {
        let checks = Arc::new(AtomicUsize::new(0));
        let engine = engine(checks.clone());
        let mut context = engine.context();
        let mut op = Size::new(Positions::read_only_value(Value::Null));
        context.eval(&mut op).unwrap();
        assert_eq!(op.status(), Status::Succeeded);
        assert_eq!(context.eval(&mut op).unwrap(), 7);
        assert_eq!(checks.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_unsupported() {
        let engine = Engine::builder().without_standard_operators().build().unwrap();
        let mut context = engine.context();
        let mut op = Size::new(Positions::read_only_value(Value::Null));
        assert!(!context.supports(&op).unwrap());
        assert!(matches!(context.eval(&mut op), Err(Error::OperationUnsupported { .. })));
        assert_eq!(op.status(), Status::Unsupported);
    }

    #[test]
    fn test_hints() {
        let engine = Engine::builder().without_standard_operators().build().unwrap();
        let mut context = engine.context();
        assert_eq!(context.caching(), Caching::All);
        context.set_hint(Caching::Engine);
        assert_eq!(context.caching(), Caching::Engine);
        assert_eq!(context.remove_hint::<Caching>(), Some(Caching::Engine));
        assert!(context.hint::<Caching>().is_none());
    }
}

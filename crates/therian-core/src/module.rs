//! Modules: named bundles of operators and evaluation listeners
//!
//! Copyright (c) 2025 Therian Team
//! Licensed under the Apache-2.0 license

use crate::operation::Profile;
use crate::operator::{Operator, RegisteredOperator};
use std::fmt;
use std::sync::Arc;

/// Observer of dispatch decisions
///
/// All methods default to doing nothing.
pub trait EvaluationListener: Send + Sync {
    /// An operator answered a support check
    fn support_checked(&self, operator: &RegisteredOperator, profile: &Profile, supported: bool) {
        let _ = (operator, profile, supported);
    }

    /// An operator finished performing
    fn performed(&self, operator: &RegisteredOperator, profile: &Profile, successful: bool) {
        let _ = (operator, profile, successful);
    }

    /// An operation completed through its own short-circuit
    fn shortcut_taken(&self, profile: &Profile) {
        let _ = profile;
    }
}

/// A named, composable bundle of operators
#[derive(Clone)]
pub struct Module {
    name: String,
    operators: Vec<RegisteredOperator>,
    listeners: Vec<Arc<dyn EvaluationListener>>,
}

impl Module {
    pub fn builder(name: impl Into<String>) -> ModuleBuilder {
        ModuleBuilder {
            module: Module {
                name: name.into(),
                operators: Vec::new(),
                listeners: Vec::new(),
            },
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Operators in declaration order
    pub fn operators(&self) -> &[RegisteredOperator] {
        &self.operators
    }

    pub fn listeners(&self) -> &[Arc<dyn EvaluationListener>] {
        &self.listeners
    }
}

impl fmt::Debug for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Module")
            .field("name", &self.name)
            .field("operators", &self.operators.len())
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

/// Builder for [`Module`]
pub struct ModuleBuilder {
    module: Module,
}

impl ModuleBuilder {
    pub fn operator<O: Operator>(mut self, operator: O) -> Self {
        self.module.operators.push(RegisteredOperator::new(operator));
        self
    }

    pub fn listener<L: EvaluationListener + 'static>(mut self, listener: L) -> Self {
        self.module.listeners.push(Arc::new(listener));
        self
    }

    /// Register an already shared listener, e.g. one a test keeps a handle to
    pub fn shared_listener(mut self, listener: Arc<dyn EvaluationListener>) -> Self {
        self.module.listeners.push(listener);
        self
    }

    /// Include every operator and listener of another module
    pub fn include(mut self, other: &Module) -> Self {
        self.module.operators.extend(other.operators.iter().cloned());
        self.module.listeners.extend(other.listeners.iter().cloned());
        self
    }

    pub fn build(self) -> Module {
        self.module
    }
}

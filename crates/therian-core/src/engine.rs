//! The engine: validated operator registry shared by evaluation contexts
//!
//! An [`Engine`] is immutable once built and cheap to clone. It owns the
//! engine-level cache mapping operation profiles to their candidate
//! operators; everything else is cached per [`EvaluationContext`].
//!
//! Copyright (c) 2025 Therian Team
//! Licensed under the Apache-2.0 license

use crate::context::EvaluationContext;
use crate::module::{EvaluationListener, Module};
use crate::operation::Profile;
use crate::operator::{OperatorRegistry, RegisteredOperator};
use crate::operators;
use crate::Result;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

/// Caching levels, usable as engine default or per-context hint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Caching {
    /// Always re-resolve
    None,
    /// Verdicts and winners cached per context
    Context,
    /// Candidate lists cached per profile across contexts
    Engine,
    /// Both
    #[default]
    All,
}

impl Caching {
    pub fn context_level(self) -> bool {
        matches!(self, Caching::Context | Caching::All)
    }

    pub fn engine_level(self) -> bool {
        matches!(self, Caching::Engine | Caching::All)
    }
}

impl fmt::Display for Caching {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Caching::None => "none",
            Caching::Context => "context",
            Caching::Engine => "engine",
            Caching::All => "all",
        };
        f.write_str(name)
    }
}

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Default caching for new contexts
    pub caching: Caching,
    /// Include the standard operator module
    pub standard_operators: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            caching: Caching::All,
            standard_operators: true,
        }
    }
}

type CandidateList = Arc<[Arc<RegisteredOperator>]>;

struct EngineInner {
    config: EngineConfig,
    modules: Vec<Module>,
    registry: OperatorRegistry,
    listeners: Vec<Arc<dyn EvaluationListener>>,
    profiles: RwLock<HashMap<Profile, CandidateList>>,
}

/// A configured set of modules ready to evaluate operations
#[derive(Clone)]
pub struct Engine {
    inner: Arc<EngineInner>,
}

impl Engine {
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    /// Engine with only the standard operators
    pub fn standard() -> Result<Self> {
        Self::builder().build()
    }

    /// A new engine with this engine's modules followed by `modules`
    pub fn with_modules(&self, modules: impl IntoIterator<Item = Module>) -> Result<Self> {
        let config = EngineConfig {
            standard_operators: false,
            ..self.inner.config.clone()
        };
        Engine::builder()
            .config(config)
            .modules(self.inner.modules.iter().cloned())
            .modules(modules)
            .build()
    }

    /// Start a new evaluation session
    pub fn context(&self) -> EvaluationContext {
        EvaluationContext::new(self.clone())
    }

    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }

    pub fn modules(&self) -> &[Module] {
        &self.inner.modules
    }

    pub fn registry(&self) -> &OperatorRegistry {
        &self.inner.registry
    }

    pub(crate) fn listeners(&self) -> &[Arc<dyn EvaluationListener>] {
        &self.inner.listeners
    }

    /// Candidate operators for `profile`, through the profile cache when `cached`
    pub(crate) fn candidates(&self, profile: &Profile, cached: bool) -> CandidateList {
        if cached {
            let profiles = self.inner.profiles.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(hit) = profiles.get(profile) {
                return hit.clone();
            }
        }
        let found: CandidateList = self.inner.registry.candidates(profile).into();
        if cached {
            self.inner
                .profiles
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .insert(profile.clone(), found.clone());
        }
        found
    }
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.inner.config)
            .field("modules", &self.inner.modules)
            .field("operators", &self.inner.registry.len())
            .finish()
    }
}

/// Builder for [`Engine`]
#[derive(Default)]
pub struct EngineBuilder {
    config: EngineConfig,
    modules: Vec<Module>,
}

impl EngineBuilder {
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn caching(mut self, caching: Caching) -> Self {
        self.config.caching = caching;
        self
    }

    pub fn without_standard_operators(mut self) -> Self {
        self.config.standard_operators = false;
        self
    }

    pub fn module(mut self, module: Module) -> Self {
        self.modules.push(module);
        self
    }

    pub fn modules(mut self, modules: impl IntoIterator<Item = Module>) -> Self {
        self.modules.extend(modules);
        self
    }

    /// Validate signatures and dependencies and fix the dispatch order
    pub fn build(self) -> Result<Engine> {
        let mut modules: Vec<Module> = Vec::new();
        if self.config.standard_operators {
            modules.push(operators::standard_module());
        }
        for module in self.modules {
            if modules.iter().any(|m| m.name() == module.name()) {
                debug!("Module {} already present, skipping", module.name());
                continue;
            }
            modules.push(module);
        }

        let registry = OperatorRegistry::build(
            modules
                .iter()
                .flat_map(|m| m.operators().iter().cloned()),
        )?;
        let listeners = modules
            .iter()
            .flat_map(|m| m.listeners().iter().cloned())
            .collect();

        debug!(
            "Built engine with {} operator(s) from {} module(s)",
            registry.len(),
            modules.len()
        );

        Ok(Engine {
            inner: Arc::new(EngineInner {
                config: self.config,
                modules,
                registry,
                listeners,
                profiles: RwLock::new(HashMap::new()),
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults_and_serde() {
        let config: EngineConfig = serde_json::from_str(r#"{"caching": "context"}"#).unwrap();
        assert_eq!(config.caching, Caching::Context);
        assert!(config.standard_operators);
        assert_eq!(EngineConfig::default().caching, Caching::All);
    }

    #[test]
    fn test_caching_levels() {
        assert!(Caching::All.context_level() && Caching::All.engine_level());
        assert!(!Caching::None.context_level() && !Caching::None.engine_level());
        assert!(Caching::Engine.engine_level() && !Caching::Engine.context_level());
    }

    #[test]
    fn test_with_modules_keeps_existing() {
        let engine = Engine::standard().unwrap();
        let before = engine.registry().len();
        let extended = engine
            .with_modules([Module::builder("empty").build()])
            .unwrap();
        assert_eq!(extended.registry().len(), before);
        assert_eq!(extended.modules().len(), engine.modules().len() + 1);
    }

    #[test]
    fn test_without_standard_operators() {
        let engine = Engine::builder().without_standard_operators().build().unwrap();
        assert!(engine.registry().is_empty());
    }
}

//! Therian Core - Operator-dispatch engine for typed object transformation
//!
//! Copyright (c) 2025 Therian Team
//! Licensed under the Apache-2.0 license
//!
//! Given typed source and target positions, the engine decides whether an
//! operation (convert, copy, add, size, ...) is supported and performs it by
//! dispatching to the most specific applicable operator. Operators may
//! delegate sub-operations back through the same evaluation context.
//!
//! # Main Components
//!
//! - **Types and values**: semantic type descriptors and a dynamic value model
//! - **Positions**: typed, readable and/or writable value slots
//! - **Operations**: typed units of work with status and result
//! - **Operators**: strategies with a type signature, support check and perform step
//! - **Engine**: module composition, operator ordering and profile caching
//! - **Context**: per-session dispatch, caching and re-entrancy guards
//! - **Mappers**: explicit property-pair mapping contracts
//!
//! # Example
//!
//! ```no_run
//! use therian_core::{Engine, Positions, Result, Type, Value};
//! use therian_core::operation::Convert;
//!
//! fn example() -> Result<()> {
//!     let engine = Engine::standard()?;
//!     let mut context = engine.context();
//!     let mut convert = Convert::new(
//!         Positions::read_only(Type::String, Value::string("42")),
//!         Positions::read_write(Type::Boxed(therian_core::PrimitiveKind::Int)),
//!     );
//!     assert_eq!(context.eval(&mut convert)?, Value::Int(42));
//!     Ok(())
//! }
//! ```

pub mod context;
pub mod el;
pub mod engine;
pub mod error;
pub mod mapper;
pub mod module;
pub mod operation;
pub mod operator;
pub mod operators;
pub mod position;
pub mod types;
pub mod value;

// Re-export main types for convenience
pub use context::EvaluationContext;
pub use engine::{Caching, Engine, EngineBuilder, EngineConfig};
pub use error::{Error, Phase, Result};
pub use mapper::{Mapper, MapperContract, MapperMethod};
pub use module::{EvaluationListener, Module, ModuleBuilder};
pub use operation::{Operation, OperationKey, OperationKind, Profile, Status};
pub use operator::{Operator, OperatorRegistry, RegisteredOperator, Reusability, Signature};
pub use position::{Position, PositionKey, PositionRef, Positions};
pub use types::{BeanClass, EnumType, PrimitiveKind, Type};
pub use value::{CollectionKind, Value};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

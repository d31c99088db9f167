//! Standard operator library
//!
//! Copyright (c) 2025 Therian Team
//! Licensed under the Apache-2.0 license
//!
//! Every engine built with standard operators enabled starts with
//! [`standard_module`]. Operators are declared grouped by operation; the
//! registry reorders them by specificity.

mod add;
mod add_all;
mod convert;
mod copy;
mod element_type;
mod immutable;
mod size;

pub use add::{AddEntryToMap, AddToArray, AddToCollection};
pub use add_all::{AddAllToArray, GenericAddAll};
pub use convert::{
    DefaultCopyingConverter, ElCoercionConverter, EnumToNumber, ToArray, ToCollection, ToIterator,
};
pub use copy::{BeanCopier, ConvertingCopier, PropertyCopier};
pub use element_type::{
    GetArrayComponentType, GetIterableElementType, GetIteratorElementType, GetMapValueType,
};
pub use immutable::DefaultImmutableChecker;
pub use size::{
    DefaultSize, SizeOfArray, SizeOfCharSequence, SizeOfCollection, SizeOfIterable, SizeOfIterator,
    SizeOfMap,
};

use crate::context::EvaluationContext;
use crate::module::Module;
use crate::operation::GetElementType;
use crate::types::Type;
use log::debug;

pub const STANDARD_MODULE: &str = "therian-standard";

/// The element type of `ty`, or `Object` when nothing can tell
pub(crate) fn element_type_of(context: &mut EvaluationContext, ty: &Type) -> Type {
    match context.eval_if_supported(&mut GetElementType::new(ty.clone())) {
        Ok(Some(element)) => element,
        Ok(None) => Type::Object,
        Err(err) => {
            debug!("No element type for {}: {}", ty, err);
            Type::Object
        }
    }
}

pub fn standard_module() -> Module {
    Module::builder(STANDARD_MODULE)
        .operator(DefaultImmutableChecker)
        .operator(SizeOfArray)
        .operator(SizeOfCollection)
        .operator(SizeOfMap)
        .operator(SizeOfIterator)
        .operator(SizeOfCharSequence)
        .operator(SizeOfIterable)
        .operator(DefaultSize)
        .operator(GetArrayComponentType)
        .operator(GetIterableElementType)
        .operator(GetIteratorElementType)
        .operator(GetMapValueType)
        .operator(AddToCollection)
        .operator(AddToArray)
        .operator(AddEntryToMap)
        .operator(AddAllToArray)
        .operator(GenericAddAll)
        .operator(EnumToNumber)
        .operator(ToIterator)
        .operator(ToArray)
        .operator(ToCollection)
        .operator(DefaultCopyingConverter)
        .operator(ElCoercionConverter)
        .operator(BeanCopier)
        .operator(ConvertingCopier)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Engine;
    use crate::operation::OperationKind;

    #[test]
    fn test_standard_module_registers_every_operation_kind() {
        let module = standard_module();
        assert_eq!(module.name(), STANDARD_MODULE);
        for kind in OperationKind::ALL {
            assert!(
                module.operators().iter().any(|op| op.kind() == kind),
                "no operator for {}",
                kind
            );
        }
    }

    #[test]
    fn test_fallbacks_dispatch_last() {
        let engine = Engine::standard().unwrap();
        let registry = engine.registry();
        let position = |name: &str| {
            registry
                .operators()
                .iter()
                .position(|op| op.name() == name)
                .unwrap()
        };
        assert!(position("SizeOfArray") < position("DefaultSize"));
        assert!(position("ToIterator") < position("ElCoercionConverter"));
        assert!(position("AddAllToArray") < position("GenericAddAll"));
        assert!(position("BeanCopier") < position("ConvertingCopier"));
    }

    #[test]
    fn test_element_type_of_falls_back_to_object() {
        let engine = Engine::standard().unwrap();
        let mut context = engine.context();
        assert_eq!(
            element_type_of(&mut context, &Type::list(Type::String)),
            Type::String
        );
        assert_eq!(element_type_of(&mut context, &Type::String), Type::Object);
    }
}

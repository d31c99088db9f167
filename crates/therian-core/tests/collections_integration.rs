//! Integration tests for Size, GetElementType, Add and AddAll

mod test_support;

use test_support::*;
use therian_core::operation::{Add, AddAll, GetElementType, Size};
use therian_core::{BeanClass, Error, Operation, Positions, Type, Value};

fn size_of(value: Value, ty: Type) -> usize {
    let engine = standard_engine();
    let mut context = engine.context();
    context
        .eval(&mut Size::new(Positions::read_only(ty, value)))
        .unwrap()
}

#[test]
fn test_size_of_containers() {
    assert_eq!(size_of(Value::array(int(), ints(&[1, 2, 3])), Type::array(int())), 3);
    assert_eq!(size_of(Value::list(ints(&[1, 2])), Type::list(integer())), 2);
    assert_eq!(
        size_of(
            Value::map(vec![(Value::string("a"), Value::Int(1))]),
            Type::map(Type::String, integer())
        ),
        1
    );
    assert_eq!(size_of(Value::string("héllo"), Type::String), 5);
}

#[test]
fn test_size_of_null_and_scalars() {
    assert_eq!(size_of(Value::Null, Type::list(Type::String)), 0);
    assert_eq!(size_of(Value::Null, Type::Object), 0);
    assert_eq!(size_of(Value::Int(12), integer()), 1);
}

#[test]
fn test_size_uses_runtime_type_of_loosely_typed_value() {
    assert_eq!(size_of(Value::list(ints(&[1, 2, 3, 4])), Type::Object), 4);
    assert_eq!(size_of(Value::string("abc"), Type::Object), 3);
}

#[test]
fn test_size_of_iterator_consumes_it() {
    let iterator = Value::iterator(ints(&[1, 2]));
    assert_eq!(size_of(iterator.clone(), Type::iterator(integer())), 2);
    let Value::Iterator(drained) = iterator else {
        unreachable!()
    };
    assert!(drained.next_value().is_none());
}

#[test]
fn test_size_of_iterable_bean() {
    let bag = BeanClass::builder("Bag")
        .implements(Type::iterable(Type::String))
        .build();
    let engine = standard_engine();
    let mut context = engine.context();
    let mut size = Size::new(Positions::read_only(Type::bean(&bag), bag.new_instance().unwrap()));
    // a bean only declaring Iterable cannot be iterated, so it falls back to one
    assert_eq!(context.eval(&mut size).unwrap(), 1);
    assert_eq!(size.operator(), Some("DefaultSize"));
}

#[test]
fn test_element_types() {
    let engine = standard_engine();
    let mut context = engine.context();
    let mut element = |ty: Type| context.eval_if_supported(&mut GetElementType::new(ty)).unwrap();

    assert_eq!(element(Type::array(int())), Some(int()));
    assert_eq!(element(Type::list(Type::String)), Some(Type::String));
    assert_eq!(element(Type::set(Type::extends(Type::Number))), Some(Type::Number));
    assert_eq!(element(Type::iterator(integer())), Some(integer()));
    assert_eq!(element(Type::map(Type::String, integer())), Some(integer()));
    assert_eq!(element(Type::String), None);

    let tagged = BeanClass::builder("Tags")
        .implements(Type::collection(Type::String))
        .build();
    assert_eq!(element(Type::bean(&tagged)), Some(Type::String));
}

#[test]
fn test_add_to_list() {
    let engine = standard_engine();
    let mut context = engine.context();
    let list = Value::list(strings(&["a"]));
    let mut add = Add::new(
        Positions::read_only(Type::list(Type::String), list.clone()),
        Positions::read_only(Type::String, Value::string("b")),
    );
    assert!(context.eval(&mut add).unwrap());
    assert_eq!(list.elements().unwrap(), strings(&["a", "b"]));
}

#[test]
fn test_add_rejects_mismatched_element_type() {
    let engine = standard_engine();
    let mut context = engine.context();
    let add = Add::new(
        Positions::read_only(Type::list(Type::String), Value::list(vec![])),
        Positions::read_only(integer(), Value::Int(1)),
    );
    assert!(!context.supports(&add).unwrap());
}

#[test]
fn test_add_to_unmodifiable_list_is_unsupported() {
    let engine = standard_engine();
    let mut context = engine.context();
    let mut add = Add::new(
        Positions::read_only(Type::list(Type::String), Value::unmodifiable_list(vec![])),
        Positions::read_only(Type::String, Value::string("x")),
    );
    assert!(matches!(
        context.eval(&mut add),
        Err(Error::OperationUnsupported { .. })
    ));
}

#[test]
fn test_add_to_set_reports_change() {
    let engine = standard_engine();
    let mut context = engine.context();
    let set = Value::set(strings(&["a"]));
    let target = Positions::read_only(Type::set(Type::String), set.clone());
    let mut duplicate = Add::new(target.clone(), Positions::read_only(Type::String, Value::string("a")));
    assert!(!context.eval(&mut duplicate).unwrap());
    let mut fresh = Add::new(target, Positions::read_only(Type::String, Value::string("b")));
    assert!(context.eval(&mut fresh).unwrap());
    assert_eq!(set.elements().unwrap().len(), 2);
}

#[test]
fn test_add_to_array_replaces_value() {
    let engine = standard_engine();
    let mut context = engine.context();
    let original = Value::array(int(), ints(&[1]));
    let target = Positions::read_write_with(Type::array(int()), original.clone()).unwrap();
    let mut add = Add::new(target.clone(), Positions::read_only(int(), Value::Int(2)));
    assert!(context.eval(&mut add).unwrap());

    let grown = target.value().unwrap();
    assert_eq!(grown, Value::array(int(), ints(&[1, 2])));
    assert!(!grown.same(&original));
    assert_eq!(original, Value::array(int(), ints(&[1])));
}

#[test]
fn test_add_to_read_only_array_is_unsupported() {
    let engine = standard_engine();
    let mut context = engine.context();
    let add = Add::new(
        Positions::read_only(Type::array(int()), Value::array(int(), vec![])),
        Positions::read_only(int(), Value::Int(2)),
    );
    assert!(!context.supports(&add).unwrap());
}

#[test]
fn test_add_entry_to_map() {
    let engine = standard_engine();
    let mut context = engine.context();
    let map = Value::map(vec![]);
    let target = Positions::read_only(Type::map(Type::String, integer()), map.clone());
    let entry = Value::list(vec![Value::string("k"), Value::Int(1)]);

    let mut add = Add::new(target.clone(), Positions::read_only_value(entry.clone()));
    assert!(context.eval(&mut add).unwrap());
    let mut again = Add::new(target, Positions::read_only_value(entry));
    assert!(!context.eval(&mut again).unwrap());

    let Value::Map(map) = map else { unreachable!() };
    assert_eq!(map.get(&Value::string("k")), Some(Value::Int(1)));
}

#[test]
fn test_add_all_to_list() {
    let engine = standard_engine();
    let mut context = engine.context();
    let list = Value::list(ints(&[1]));
    let mut add_all = AddAll::new(
        Positions::read_only(Type::list(integer()), list.clone()),
        Positions::read_only(Type::array(int()), Value::array(int(), ints(&[2, 3]))),
    );
    assert!(context.eval(&mut add_all).unwrap());
    assert_eq!(list.elements().unwrap(), ints(&[1, 2, 3]));
}

#[test]
fn test_add_all_of_empty_source_changes_nothing() {
    let engine = standard_engine();
    let mut context = engine.context();
    let list = Value::list(ints(&[1]));
    let mut add_all = AddAll::new(
        Positions::read_only(Type::list(integer()), list.clone()),
        Positions::read_only(Type::list(integer()), Value::list(vec![])),
    );
    assert!(!context.eval(&mut add_all).unwrap());
    assert_eq!(list.elements().unwrap().len(), 1);
}

#[test]
fn test_add_all_to_array_concatenates() {
    let engine = standard_engine();
    let mut context = engine.context();
    let target = Positions::read_write_with(
        Type::array(Type::String),
        Value::array(Type::String, strings(&["a"])),
    )
    .unwrap();
    let mut add_all = AddAll::new(
        target.clone(),
        Positions::read_only(Type::list(Type::String), Value::list(strings(&["b", "c"]))),
    );
    assert!(context.eval(&mut add_all).unwrap());
    assert_eq!(
        target.value().unwrap(),
        Value::array(Type::String, strings(&["a", "b", "c"]))
    );
}

#[test]
fn test_add_all_boxed_into_primitive_array_is_unsupported() {
    let engine = standard_engine();
    let mut context = engine.context();
    let add_all = AddAll::new(
        Positions::read_write_with(Type::array(int()), Value::array(int(), vec![])).unwrap(),
        Positions::read_only(
            Type::array(integer()),
            Value::array(integer(), ints(&[1])),
        ),
    );
    assert!(!context.supports(&add_all).unwrap());
}

#[test]
fn test_add_all_of_null_source_is_unsupported() {
    let engine = standard_engine();
    let mut context = engine.context();
    let add_all = AddAll::new(
        Positions::read_only(Type::list(Type::String), Value::list(vec![])),
        Positions::read_only(Type::list(Type::String), Value::Null),
    );
    assert!(!context.supports(&add_all).unwrap());
}

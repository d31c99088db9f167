//! Property-based tests for container operations
//!
//! These tests verify size and AddAll laws that should hold for all
//! container contents.

mod test_support;

use proptest::prelude::*;
use test_support::*;
use therian_core::operation::{AddAll, Convert, Size};
use therian_core::{Positions, Type, Value};

fn int_values() -> impl Strategy<Value = Vec<i32>> {
    prop::collection::vec(any::<i32>(), 0..32)
}

proptest! {
    #[test]
    fn prop_size_matches_element_count(items in int_values()) {
        let engine = standard_engine();
        let mut context = engine.context();
        let values = ints(&items);

        let list = Positions::read_only(Type::list(integer()), Value::list(values.clone()));
        let array = Positions::read_only(Type::array(int()), Value::array(int(), values.clone()));
        let iterator = Positions::read_only(Type::iterator(integer()), Value::iterator(values));

        prop_assert_eq!(context.eval(&mut Size::new(list)).unwrap(), items.len());
        prop_assert_eq!(context.eval(&mut Size::new(array)).unwrap(), items.len());
        prop_assert_eq!(context.eval(&mut Size::new(iterator)).unwrap(), items.len());
    }

    #[test]
    fn prop_string_size_counts_chars(text in "\\PC{0,40}") {
        let engine = standard_engine();
        let mut context = engine.context();
        let position = Positions::read_only(Type::String, Value::string(&text));
        prop_assert_eq!(context.eval(&mut Size::new(position)).unwrap(), text.chars().count());
    }

    #[test]
    fn prop_add_all_to_list_appends(first in int_values(), second in int_values()) {
        let engine = standard_engine();
        let mut context = engine.context();
        let target = Value::list(ints(&first));
        let mut add_all = AddAll::new(
            Positions::read_only(Type::list(integer()), target.clone()),
            Positions::read_only(Type::array(int()), Value::array(int(), ints(&second))),
        );

        let changed = context.eval(&mut add_all).unwrap();
        prop_assert_eq!(changed, !second.is_empty());

        let mut expected = first.clone();
        expected.extend(&second);
        prop_assert_eq!(target.elements().unwrap(), ints(&expected));
    }

    #[test]
    fn prop_add_all_to_array_appends(first in int_values(), second in int_values()) {
        let engine = standard_engine();
        let mut context = engine.context();
        let target = Positions::read_write_with(Type::array(int()), Value::array(int(), ints(&first))).unwrap();
        let mut add_all = AddAll::new(
            target.clone(),
            Positions::read_only(Type::array(int()), Value::array(int(), ints(&second))),
        );

        context.eval(&mut add_all).unwrap();
        let mut size = Size::new(target);
        prop_assert_eq!(context.eval(&mut size).unwrap(), first.len() + second.len());
    }

    #[test]
    fn prop_numeric_strings_round_trip(n in any::<i32>()) {
        let engine = standard_engine();
        let mut context = engine.context();
        let mut to_int = Convert::new(
            Positions::read_only(Type::String, Value::string(n.to_string())),
            Positions::read_write(int()),
        );
        prop_assert_eq!(context.eval(&mut to_int).unwrap(), Value::Int(n));
    }
}

//! Integration tests for mapper contracts

mod test_support;

use test_support::*;
use therian_core::{BeanClass, Error, Mapper, MapperContract, MapperMethod, Type, Value};

fn stats_class() -> BeanClass {
    BeanClass::builder("Stats").property("count", int()).build()
}

fn person_mapper() -> Mapper {
    let person = Type::bean(&person_class());
    let contract = MapperContract::new("PersonMapper")
        .method(
            MapperMethod::new("to_view")
                .parameter(person.clone())
                .returns(Type::bean(&person_view_class()))
                .map("name", "name")
                .map("age", "age")
                .map("address.city", "city"),
        )
        .method(
            MapperMethod::new("to_stats")
                .parameter(person.clone())
                .returns(Type::bean(&stats_class()))
                .map("name", "count"),
        )
        .method(
            MapperMethod::new("copy_common")
                .parameter(person)
                .returns(Type::bean(&person_view_class())),
        );
    Mapper::new(&standard_engine(), contract).unwrap()
}

fn ada() -> Value {
    bean(
        &person_class(),
        &[
            ("name", Value::string("Ada")),
            ("age", Value::Int(36)),
            (
                "address",
                bean(&address_class(), &[("city", Value::string("London"))]),
            ),
        ],
    )
}

#[test]
fn test_maps_declared_pairs_including_nested_paths() {
    let mapper = person_mapper();
    let view = object(&mapper.invoke("to_view", ada()).unwrap());
    assert_eq!(view.get("name"), Some(Value::string("Ada")));
    assert_eq!(view.get("age"), Some(Value::string("36")));
    assert_eq!(view.get("city"), Some(Value::string("London")));
}

#[test]
fn test_each_invocation_returns_a_new_instance() {
    let mapper = person_mapper();
    let first = mapper.invoke("to_view", ada()).unwrap();
    let second = mapper.invoke("to_view", ada()).unwrap();
    assert!(!first.same(&second));
}

#[test]
fn test_failing_pair_is_named() {
    let mapper = person_mapper();
    match mapper.invoke("to_stats", ada()) {
        Err(Error::Mapping {
            contract,
            method,
            from,
            to,
            ..
        }) => {
            assert_eq!(contract, "PersonMapper");
            assert_eq!(method, "to_stats");
            assert_eq!(from, "name");
            assert_eq!(to, "count");
        }
        other => panic!("expected a mapping error, got {:?}", other.map(|v| v.to_string())),
    }
}

#[test]
fn test_unresolvable_nested_source_fails_the_pair() {
    let mapper = person_mapper();
    let homeless = bean(&person_class(), &[("name", Value::string("Diogenes"))]);
    let err = mapper.invoke("to_view", homeless).unwrap_err();
    assert!(err.to_string().contains("address.city"), "{}", err);
}

#[test]
fn test_method_without_pairs_copies_common_properties() {
    let mapper = person_mapper();
    let view = object(&mapper.invoke("copy_common", ada()).unwrap());
    assert_eq!(view.get("name"), Some(Value::string("Ada")));
    assert_eq!(view.get("age"), Some(Value::string("36")));
    assert_eq!(view.get("city"), Some(Value::Null));
}

#[test]
fn test_unknown_method_and_wrong_argument() {
    let mapper = person_mapper();
    assert!(matches!(
        mapper.invoke("to_json", ada()),
        Err(Error::MapperDefinition { .. })
    ));
    assert!(matches!(
        mapper.invoke("to_view", Value::string("not a person")),
        Err(Error::Coercion { .. })
    ));
}

#[test]
fn test_return_type_needs_default_constructor() {
    let sealed = BeanClass::builder("Sealed")
        .property("name", Type::String)
        .without_default_constructor()
        .build();
    let contract = MapperContract::new("SealedMapper").method(
        MapperMethod::new("seal")
            .parameter(Type::bean(&person_class()))
            .returns(Type::bean(&sealed))
            .map("name", "name"),
    );
    match Mapper::new(&standard_engine(), contract) {
        Err(Error::MapperDefinition { contract, method, .. }) => {
            assert_eq!(contract, "SealedMapper");
            assert_eq!(method, "seal");
        }
        _ => panic!("expected a definition error"),
    }
}

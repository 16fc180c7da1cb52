//! Common library module for integration tests
// See https://doc.rust-lang.org/book/ch11-03-test-organization.html#submodules-in-integration-tests

// Every test crate only uses some of the beans
#![allow(dead_code)]

use std::{collections::BTreeMap, sync::Arc};

use beanson::{
    bean::{
        subtype::{SubtypeDeserializer, SubtypeSerializer, TypeInfo},
        BeanDeserializer, BeanSerializer,
    },
    codec::{
        collection::{SequenceDeserializer, SequenceSerializer},
        key::StringKeyCodec,
        map::{MapDeserializer, MapSerializer},
        scalar::{BoolCodec, NumberDeserializer, NumberSerializer, StringCodec},
        LazyDeserializer, LazySerializer, OptionDeserializer, OptionSerializer, SharedDeserializer,
        SharedSerializer,
    },
    mapper::ObjectMapper,
};

pub type TestResult = Result<(), Box<dyn std::error::Error>>;

/// Parses both documents with `serde_json` and compares their structure
pub fn assert_same_json(expected: &str, actual: &str) {
    let expected_value: serde_json::Value = serde_json::from_str(expected).unwrap();
    let actual_value: serde_json::Value = serde_json::from_str(actual).unwrap();
    assert_eq!(expected_value, actual_value, "actual JSON: {actual}");
}

#[derive(Default, Clone, PartialEq, Debug)]
pub struct Person {
    pub name: String,
    pub age: u32,
    pub nickname: Option<String>,
    pub tags: Vec<String>,
    pub scores: BTreeMap<String, f64>,
}

pub fn person_serializer() -> BeanSerializer<Person> {
    let string: SharedSerializer<String> = Arc::new(StringCodec);
    let age: SharedSerializer<u32> = Arc::new(NumberSerializer);
    let nickname: SharedSerializer<Option<String>> = Arc::new(OptionSerializer::new(string.clone()));
    let tags: SharedSerializer<Vec<String>> =
        Arc::new(SequenceSerializer::<String, Vec<String>>::new(string.clone()));
    let score: SharedSerializer<f64> = Arc::new(NumberSerializer);
    let scores: SharedSerializer<BTreeMap<String, f64>> = Arc::new(
        MapSerializer::<String, f64, BTreeMap<String, f64>>::new(Arc::new(StringKeyCodec), score),
    );
    BeanSerializer::new("Person")
        .property("name", string, |p: &Person| &p.name)
        .property("age", age, |p: &Person| &p.age)
        .property("nickname", nickname, |p: &Person| &p.nickname)
        .property("tags", tags, |p: &Person| &p.tags)
        .property("scores", scores, |p: &Person| &p.scores)
}

pub fn person_deserializer() -> BeanDeserializer<Person> {
    let string: SharedDeserializer<String> = Arc::new(StringCodec);
    let age: SharedDeserializer<u32> = Arc::new(NumberDeserializer);
    let nickname: SharedDeserializer<Option<String>> = Arc::new(OptionDeserializer::new(string.clone()));
    let tags: SharedDeserializer<Vec<String>> =
        Arc::new(SequenceDeserializer::<String, Vec<String>>::new(string.clone()));
    let score: SharedDeserializer<f64> = Arc::new(NumberDeserializer);
    let scores: SharedDeserializer<BTreeMap<String, f64>> = Arc::new(
        MapDeserializer::<String, f64, BTreeMap<String, f64>>::new(Arc::new(StringKeyCodec), score),
    );
    BeanDeserializer::new("Person")
        .property("name", string, |p: &mut Person, v| p.name = v)
        .property("age", age, |p: &mut Person, v| p.age = v)
        .property("nickname", nickname, |p: &mut Person, v| p.nickname = v)
        .property("tags", tags, |p: &mut Person, v| p.tags = v)
        .property("scores", scores, |p: &mut Person, v| p.scores = v)
}

pub fn person_mapper() -> ObjectMapper<Person> {
    ObjectMapper::<Person>::new("person", Arc::new(person_serializer()), Arc::new(person_deserializer()))
}

pub fn sample_person() -> Person {
    Person {
        name: "Ann".to_owned(),
        age: 32,
        nickname: Some("annie".to_owned()),
        tags: vec!["admin".to_owned(), "dev".to_owned()],
        scores: BTreeMap::from([("chess".to_owned(), 1.5), ("go".to_owned(), -2.25)]),
    }
}

#[derive(Default, Clone, PartialEq, Debug)]
pub struct Dog {
    pub name: String,
    pub good: bool,
}

#[derive(Default, Clone, PartialEq, Debug)]
pub struct Cat {
    pub name: String,
    pub lives: u8,
}

#[derive(Clone, PartialEq, Debug)]
pub enum Animal {
    Dog(Dog),
    Cat(Cat),
}

pub fn animal_serializer(type_info: TypeInfo) -> SubtypeSerializer<Animal> {
    let string: SharedSerializer<String> = Arc::new(StringCodec);
    let good: SharedSerializer<bool> = Arc::new(BoolCodec);
    let lives: SharedSerializer<u8> = Arc::new(NumberSerializer);
    let dog = BeanSerializer::<Dog>::new("Dog")
        .property("name", string.clone(), |d: &Dog| &d.name)
        .property("good", good, |d: &Dog| &d.good);
    let cat = BeanSerializer::<Cat>::new("Cat")
        .property("name", string, |c: &Cat| &c.name)
        .property("lives", lives, |c: &Cat| &c.lives);
    SubtypeSerializer::<Animal>::new("Animal", type_info)
        .bean_subtype::<Dog>("Dog", Arc::new(dog), |a: &Animal| match a {
            Animal::Dog(d) => Some(d),
            _ => None,
        })
        .bean_subtype::<Cat>("Cat", Arc::new(cat), |a: &Animal| match a {
            Animal::Cat(c) => Some(c),
            _ => None,
        })
}

pub fn animal_deserializer(type_info: TypeInfo) -> SubtypeDeserializer<Animal> {
    let string: SharedDeserializer<String> = Arc::new(StringCodec);
    let good: SharedDeserializer<bool> = Arc::new(BoolCodec);
    let lives: SharedDeserializer<u8> = Arc::new(NumberDeserializer);
    let dog = BeanDeserializer::<Dog>::new("Dog")
        .property("name", string.clone(), |d: &mut Dog, v| d.name = v)
        .property("good", good, |d: &mut Dog, v| d.good = v);
    let cat = BeanDeserializer::<Cat>::new("Cat")
        .property("name", string, |c: &mut Cat, v| c.name = v)
        .property("lives", lives, |c: &mut Cat, v| c.lives = v);
    SubtypeDeserializer::<Animal>::new("Animal", type_info)
        .bean_subtype::<Dog>("Dog", Arc::new(dog), Animal::Dog)
        .bean_subtype::<Cat>("Cat", Arc::new(cat), Animal::Cat)
}

pub fn animal_mapper(type_info: TypeInfo) -> ObjectMapper<Animal> {
    ObjectMapper::<Animal>::new(
        "animal",
        Arc::new(animal_serializer(type_info.clone())),
        Arc::new(animal_deserializer(type_info)),
    )
}

/// Bean which contains itself
#[derive(Default, Clone, PartialEq, Debug)]
pub struct TreeNode {
    pub label: String,
    pub children: Vec<TreeNode>,
}

pub fn tree_serializer() -> SharedSerializer<TreeNode> {
    let string: SharedSerializer<String> = Arc::new(StringCodec);
    let node: SharedSerializer<TreeNode> = Arc::new(LazySerializer::new(tree_serializer));
    let children: SharedSerializer<Vec<TreeNode>> =
        Arc::new(SequenceSerializer::<TreeNode, Vec<TreeNode>>::new(node));
    Arc::new(
        BeanSerializer::<TreeNode>::new("TreeNode")
            .property("label", string, |n: &TreeNode| &n.label)
            .property("children", children, |n: &TreeNode| &n.children),
    )
}

pub fn tree_deserializer() -> SharedDeserializer<TreeNode> {
    let string: SharedDeserializer<String> = Arc::new(StringCodec);
    let node: SharedDeserializer<TreeNode> = Arc::new(LazyDeserializer::new(tree_deserializer));
    let children: SharedDeserializer<Vec<TreeNode>> =
        Arc::new(SequenceDeserializer::<TreeNode, Vec<TreeNode>>::new(node));
    Arc::new(
        BeanDeserializer::<TreeNode>::new("TreeNode")
            .property("label", string, |n: &mut TreeNode, v| n.label = v)
            .property("children", children, |n: &mut TreeNode, v| n.children = v),
    )
}

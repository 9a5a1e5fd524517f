//! Test fixtures: a small data model obeying the generated-code
//! conventions, the shape graph describing it, and compile helpers.

use std::collections::HashMap;

use waypath_core::{NumberKind, ShapeGraph, ShapeId};

use crate::traverse::{GeneratedTraversal, TraversalBindings, TraversalError};

// ---------------------------------------------------------------------------
// Data model, as the surrounding generator would have produced it.
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct Payload {
    pub primitives: Option<Primitives>,
    pub lists: Option<Lists>,
    pub maps: Option<Maps>,
}

#[derive(Debug, Default, Clone)]
pub struct Primitives {
    pub required_flag: bool,
    pub flag: Option<bool>,
    pub name: Option<String>,
    pub integer: Option<i32>,
    pub count: Option<i32>,
    pub long: Option<i64>,
    pub ratio: Option<f64>,
    pub state: Option<State>,
}

#[derive(Debug, Default)]
pub struct Lists {
    pub integers: Vec<i32>,
    pub names: Option<Vec<String>>,
    pub structs: Option<Vec<Item>>,
    pub nested: Option<Vec<Vec<i32>>>,
}

#[derive(Debug, Default)]
pub struct Maps {
    pub integers: Option<HashMap<String, i32>>,
    pub structs: Option<HashMap<String, Item>>,
}

#[derive(Debug, Default, Clone)]
pub struct Item {
    pub primitives: Option<Primitives>,
    pub integer: Option<i32>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Ready,
    Busy,
}

impl State {
    pub fn as_str(&self) -> &str {
        match self {
            State::Ready => "ready",
            State::Busy => "busy",
        }
    }
}

// ---------------------------------------------------------------------------
// Shape graph for the model above.
// ---------------------------------------------------------------------------

pub struct Fixture {
    pub graph: ShapeGraph,
    pub root: ShapeId,
}

pub fn fixture_graph() -> Fixture {
    let mut g = ShapeGraph::new();
    let boolean = g.add_boolean();
    let string = g.add_string();
    let int = g.add_number(NumberKind::I32);
    let long = g.add_number(NumberKind::I64);
    let double = g.add_number(NumberKind::F64);
    let state = g.add_enum("State", ["ready", "busy"]);
    let primitives = g.add_structure(
        "Primitives",
        [
            ("required_flag", boolean, true),
            ("flag", boolean, false),
            ("name", string, false),
            ("integer", int, false),
            ("count", int, false),
            ("long", long, false),
            ("ratio", double, false),
            ("state", state, false),
        ],
    );
    let item = g.add_structure(
        "Item",
        [
            ("primitives", primitives, false),
            ("integer", int, false),
            ("name", string, false),
        ],
    );
    let integers = g.add_list(int);
    let names = g.add_list(string);
    let items = g.add_list(item);
    let nested = g.add_list(integers);
    let lists = g.add_structure(
        "Lists",
        [
            ("integers", integers, true),
            ("names", names, false),
            ("structs", items, false),
            ("nested", nested, false),
        ],
    );
    let integer_map = g.add_map(string, int);
    let item_map = g.add_map(string, item);
    let maps = g.add_structure(
        "Maps",
        [("integers", integer_map, false), ("structs", item_map, false)],
    );
    let root = g.add_structure(
        "Payload",
        [
            ("primitives", primitives, false),
            ("lists", lists, false),
            ("maps", maps, false),
        ],
    );
    Fixture { graph: g, root }
}

// ---------------------------------------------------------------------------
// Compile helpers.
// ---------------------------------------------------------------------------

/// Compile `source` against the fixture graph with a single `_root` binding.
pub fn compile_fixture(source: &str) -> crate::Result<GeneratedTraversal> {
    let fixture = fixture_graph();
    let bindings = TraversalBindings::global("_root", fixture.root);
    crate::compile(source, &bindings, &fixture.graph)
}

/// Compile an expression that must succeed.
pub fn expect_fixture(source: &str) -> GeneratedTraversal {
    match compile_fixture(source) {
        Ok(traversal) => traversal,
        Err(err) => panic!("{source}: {err}"),
    }
}

/// Compile an expression that must fail with a traversal diagnostic.
pub fn expect_error(source: &str) -> TraversalError {
    match compile_fixture(source) {
        Ok(traversal) => panic!("{source}: expected an error, got `{}`", traversal.ident),
        Err(crate::Error::Traversal(err)) => err,
        Err(crate::Error::Parse(err)) => panic!("{source}: unexpected parse error: {err}"),
    }
}

/// A payload exercising both branches of most operations.
pub fn sample() -> Payload {
    Payload {
        primitives: Some(Primitives {
            required_flag: true,
            flag: Some(true),
            name: Some("alpha".to_string()),
            integer: Some(4),
            count: Some(4),
            long: Some(40),
            ratio: Some(2.5),
            state: Some(State::Ready),
        }),
        lists: Some(Lists {
            integers: vec![3, 4],
            names: Some(vec!["alpha".to_string(), "beta".to_string()]),
            structs: Some(vec![
                Item {
                    primitives: Some(Primitives {
                        required_flag: true,
                        integer: Some(4),
                        ..Primitives::default()
                    }),
                    integer: Some(1),
                    name: Some("first".to_string()),
                },
                Item {
                    primitives: Some(Primitives {
                        required_flag: false,
                        integer: Some(-2),
                        ..Primitives::default()
                    }),
                    integer: Some(2),
                    name: Some("second".to_string()),
                },
            ]),
            nested: Some(vec![vec![1, 2], vec![3]]),
        }),
        maps: Some(Maps {
            integers: Some(HashMap::from([
                ("foo".to_string(), 1),
                ("bar".to_string(), 2),
            ])),
            structs: Some(HashMap::from([
                (
                    "foo".to_string(),
                    Item {
                        integer: Some(5),
                        ..Item::default()
                    },
                ),
                (
                    "bar".to_string(),
                    Item {
                        integer: Some(7),
                        ..Item::default()
                    },
                ),
            ])),
        }),
    }
}

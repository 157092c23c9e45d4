//! Test utilities for loading hand-shaped trees from JSON fixtures.
//!
//! Fixtures spell out every node's value, color and children, so tests can
//! build exact shapes (including broken ones) without going through `add`.
use crate::arena::{Color, Node, NodeId};
use crate::raw::RawTree;
use serde::Deserialize;
use std::path::Path;

#[derive(Deserialize, Debug, Clone, Copy)]
#[serde(rename_all = "lowercase")]
enum FixtureColor {
	Red,
	Black,
}

impl From<FixtureColor> for Color {
	fn from(color: FixtureColor) -> Color {
		match color {
			FixtureColor::Red => Color::Red,
			FixtureColor::Black => Color::Black,
		}
	}
}

#[derive(Deserialize, Debug)]
struct FixtureNode {
	value: i64,
	color: FixtureColor,
	#[serde(default)]
	left: Option<Box<FixtureNode>>,
	#[serde(default)]
	right: Option<Box<FixtureNode>>,
}

#[derive(Deserialize, Debug)]
struct FixtureTree {
	root: Option<FixtureNode>,
}

fn translate_node(tree: &mut RawTree<i64>, node: FixtureNode, parent: Option<NodeId>) -> NodeId {
	let id = tree
		.arena
		.alloc(Node {
			value: node.value,
			color: node.color.into(),
			parent,
			left: None,
			right: None,
		})
		.expect("failed to allocate fixture node");

	let left = node.left.map(|child| translate_node(tree, *child, Some(id)));
	let right = node.right.map(|child| translate_node(tree, *child, Some(id)));
	tree.arena[id].left = left;
	tree.arena[id].right = right;
	id
}

/// Builds a tree with exactly the shape and colors described by the fixture
/// at `path`. No balancing or validation is applied.
pub fn tree_from_json<P: AsRef<Path>>(path: P) -> RawTree<i64> {
	let file = std::fs::File::open(path).expect("failed to find file");
	let fixture: FixtureTree = serde_json::from_reader(file).unwrap();
	let mut tree = RawTree::default();
	if let Some(root) = fixture.root {
		let root = translate_node(&mut tree, root, None);
		tree.root = Some(root);
	}
	tree
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::Error;

	fn fixture(name: &str) -> RawTree<i64> {
		tree_from_json(Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures").join(name))
	}

	#[test]
	fn valid_fixture_passes_validation() {
		let tree = fixture("valid.json");
		tree.assert_invariants();
		assert_eq!(tree.len(), 9);
		assert_eq!(tree.black_height(), 2);
		assert_eq!(tree.iter().copied().collect::<Vec<_>>(), (1..=9).collect::<Vec<_>>());
	}

	#[test]
	fn valid_fixture_supports_updates() {
		let mut tree = fixture("valid.json");
		assert_eq!(tree.remove(&3), Ok(3));
		tree.assert_invariants();
		assert_eq!(tree.add(3), Ok(()));
		assert_eq!(tree.add(3), Err(Error::AlreadyExists));
		for x in 1..=9 {
			tree.remove(&x).unwrap();
			tree.assert_invariants();
		}
		assert!(tree.is_empty());
	}

	#[test]
	#[should_panic(expected = "has red child")]
	fn red_red_fixture_is_rejected() {
		fixture("red_red.json").assert_invariants();
	}

	#[test]
	#[should_panic(expected = "Black height mismatch")]
	fn black_height_fixture_is_rejected() {
		fixture("black_height.json").assert_invariants();
	}

	#[test]
	#[should_panic(expected = "out of order")]
	fn unordered_fixture_is_rejected() {
		fixture("unordered.json").assert_invariants();
	}
}

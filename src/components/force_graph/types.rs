use std::collections::HashMap;
use std::sync::Arc;

pub const DEFAULT_WIDTH: f64 = 900.0;
pub const DEFAULT_HEIGHT: f64 = 540.0;
pub const MIN_HEIGHT: f64 = 540.0;

/// A person in the chart.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Node {
	pub id: String,
	pub display_name: String,
	pub group: String,
}

/// A typed relationship between two people. `id` is derived at build time as
/// `source|target|type|ordinal`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Link {
	pub id: String,
	pub source_id: String,
	pub target_id: String,
	pub kind: String,
}

/// Canonical graph produced by the model builder. Cheap to clone.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Graph {
	nodes: Arc<[Node]>,
	links: Arc<[Link]>,
	index: Arc<HashMap<String, usize>>,
}

impl Graph {
	/// Callers must pass nodes with unique ids; the builder guarantees it.
	pub(super) fn from_parts(nodes: Vec<Node>, links: Vec<Link>) -> Self {
		let index = nodes
			.iter()
			.enumerate()
			.map(|(i, node)| (node.id.clone(), i))
			.collect();
		Self {
			nodes: nodes.into(),
			links: links.into(),
			index: Arc::new(index),
		}
	}

	pub fn nodes(&self) -> &[Node] {
		&self.nodes
	}

	pub fn links(&self) -> &[Link] {
		&self.links
	}

	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty()
	}

	pub fn node(&self, id: &str) -> Option<&Node> {
		self.index.get(id).map(|&i| &self.nodes[i])
	}

	pub fn index_of(&self, id: &str) -> Option<usize> {
		self.index.get(id).copied()
	}

	pub(super) fn shared_index(&self) -> Arc<HashMap<String, usize>> {
		self.index.clone()
	}

	/// Distinct link types in first-appearance order.
	pub fn relationship_types(&self) -> Vec<String> {
		let mut seen: Vec<String> = Vec::new();
		for link in self.links.iter() {
			if !seen.iter().any(|t| t == &link.kind) {
				seen.push(link.kind.clone());
			}
		}
		seen
	}

	/// Distinct link types `id` takes part in, first-appearance order.
	pub fn relationships_of(&self, id: &str) -> Vec<String> {
		let mut seen: Vec<String> = Vec::new();
		for link in self.links.iter() {
			if (link.source_id == id || link.target_id == id) && !seen.contains(&link.kind) {
				seen.push(link.kind.clone());
			}
		}
		seen
	}
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
	pub x: f64,
	pub y: f64,
}

/// Bounds the simulation keeps nodes inside of.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
	pub width: f64,
	pub height: f64,
}

impl Default for Viewport {
	fn default() -> Self {
		Self {
			width: DEFAULT_WIDTH,
			height: DEFAULT_HEIGHT,
		}
	}
}

impl Viewport {
	/// Apply an observed container size. A zero width keeps the current width and
	/// the height never drops below [`MIN_HEIGHT`].
	pub fn observe(self, width: f64, height: f64) -> Self {
		let width = if width > 0.0 && width.is_finite() {
			width
		} else {
			self.width
		};
		let height = if height.is_finite() {
			height.max(MIN_HEIGHT)
		} else {
			self.height
		};
		Self { width, height }
	}

	pub fn center(&self) -> Point {
		Point {
			x: self.width / 2.0,
			y: self.height / 2.0,
		}
	}
}

const GROUP_COLORS: &[(&str, &str)] = &[
	("friend", "#38bdf8"),
	("ex", "#f87171"),
	("dating", "#c084fc"),
	("family", "#facc15"),
	("colleague", "#22d3ee"),
];

pub const FALLBACK_COLOR: &str = "#818cf8";

pub fn group_color(group: &str) -> &'static str {
	GROUP_COLORS
		.iter()
		.find(|(g, _)| *g == group)
		.map(|(_, c)| *c)
		.unwrap_or(FALLBACK_COLOR)
}

/// `"long-term-partner"` becomes `"Long Term Partner"`.
pub fn type_label(value: &str) -> String {
	value
		.split('-')
		.flat_map(|part| part.split(' '))
		.filter(|word| !word.is_empty())
		.map(|word| {
			let mut chars = word.chars();
			match chars.next() {
				Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
				None => String::new(),
			}
		})
		.collect::<Vec<_>>()
		.join(" ")
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn viewport_keeps_height_floor_and_previous_width() {
		let vp = Viewport::default().observe(1200.0, 300.0);
		assert_eq!(vp.width, 1200.0);
		assert_eq!(vp.height, MIN_HEIGHT);

		let vp = vp.observe(0.0, 800.0);
		assert_eq!(vp.width, 1200.0);
		assert_eq!(vp.height, 800.0);
	}

	#[test]
	fn group_colors_fall_back() {
		assert_eq!(group_color("family"), "#facc15");
		assert_eq!(group_color("nemesis"), FALLBACK_COLOR);
	}

	#[test]
	fn type_labels_are_title_cased() {
		assert_eq!(type_label("friend"), "Friend");
		assert_eq!(type_label("long-term-partner"), "Long Term Partner");
	}
}

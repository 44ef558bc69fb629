//! Tolerant ingestion of loosely-typed node and link records.
//!
//! Records arrive as JSON values from whatever loaded them. Numeric fields are
//! coerced to strings, string fields are trimmed, and any record missing a
//! required field is dropped. Nothing here fails: partial data is better than no
//! chart.

use std::collections::{HashMap, HashSet};

use log::info;
use serde_json::Value;

use super::types::{Graph, Link, Node};

const NODE_ID: &[&str] = &["id"];
const NODE_NAME: &[&str] = &["displayName", "display_name", "name"];
const NODE_GROUP: &[&str] = &["group", "group_type"];
const LINK_SOURCE: &[&str] = &["sourceId", "source_id", "source"];
const LINK_TARGET: &[&str] = &["targetId", "target_id", "target"];
const LINK_TYPE: &[&str] = &["type", "relationship_type"];

/// Counts of records the builder left out.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BuildReport {
	pub nodes_dropped: usize,
	pub duplicate_nodes: usize,
	pub links_dropped: usize,
}

/// Build the canonical graph from raw records.
pub fn build(raw_nodes: &[Value], raw_links: &[Value]) -> Graph {
	build_with_report(raw_nodes, raw_links).0
}

pub fn build_with_report(raw_nodes: &[Value], raw_links: &[Value]) -> (Graph, BuildReport) {
	let mut report = BuildReport::default();

	let mut seen = HashSet::new();
	let mut nodes = Vec::with_capacity(raw_nodes.len());
	for record in raw_nodes {
		let Some(node) = node_from(record) else {
			report.nodes_dropped += 1;
			continue;
		};
		// first occurrence wins
		if !seen.insert(node.id.clone()) {
			report.duplicate_nodes += 1;
			continue;
		}
		nodes.push(node);
	}

	let mut ordinals: HashMap<(String, String, String), usize> = HashMap::new();
	let mut links = Vec::with_capacity(raw_links.len());
	for record in raw_links {
		let Some((source_id, target_id, kind)) = link_fields(record) else {
			report.links_dropped += 1;
			continue;
		};
		let ordinal = ordinals
			.entry((source_id.clone(), target_id.clone(), kind.clone()))
			.or_insert(0);
		let id = format!("{}|{}|{}|{}", source_id, target_id, kind, ordinal);
		*ordinal += 1;
		links.push(Link {
			id,
			source_id,
			target_id,
			kind,
		});
	}

	info!(
		"Built graph: {} nodes, {} links ({} nodes dropped, {} duplicates, {} links dropped)",
		nodes.len(),
		links.len(),
		report.nodes_dropped,
		report.duplicate_nodes,
		report.links_dropped
	);

	(Graph::from_parts(nodes, links), report)
}

fn node_from(record: &Value) -> Option<Node> {
	Some(Node {
		id: field(record, NODE_ID)?,
		display_name: field(record, NODE_NAME)?,
		group: field(record, NODE_GROUP)?,
	})
}

fn link_fields(record: &Value) -> Option<(String, String, String)> {
	Some((
		field(record, LINK_SOURCE)?,
		field(record, LINK_TARGET)?,
		field(record, LINK_TYPE)?,
	))
}

/// First alias that normalizes to a usable value.
fn field(record: &Value, aliases: &[&str]) -> Option<String> {
	let object = record.as_object()?;
	aliases
		.iter()
		.filter_map(|key| object.get(*key))
		.find_map(normalize)
}

fn normalize(value: &Value) -> Option<String> {
	match value {
		Value::String(s) => {
			let trimmed = s.trim();
			(!trimmed.is_empty()).then(|| trimmed.to_string())
		}
		Value::Number(n) => Some(n.to_string()),
		_ => None,
	}
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	fn pair() -> (Vec<Value>, Vec<Value>) {
		(
			vec![
				json!({"id": "a", "displayName": "Alice", "group": "friend"}),
				json!({"id": "b", "displayName": "Bob", "group": "friend"}),
			],
			vec![json!({"sourceId": "a", "targetId": "b", "type": "friend"})],
		)
	}

	#[test]
	fn builds_two_people_and_one_link() {
		let (nodes, links) = pair();
		let graph = build(&nodes, &links);
		assert_eq!(graph.nodes().len(), 2);
		assert_eq!(graph.links().len(), 1);
		assert_eq!(graph.links()[0].id, "a|b|friend|0");
		assert_eq!(graph.node("a").map(|n| n.display_name.as_str()), Some("Alice"));
	}

	#[test]
	fn building_twice_gives_the_same_graph() {
		let (nodes, links) = pair();
		assert_eq!(build(&nodes, &links), build(&nodes, &links));
	}

	#[test]
	fn coerces_numbers_and_trims_strings() {
		let nodes = vec![json!({"id": 7, "name": "  Grace ", "group_type": " family "})];
		let links = vec![json!({"source": 7, "target": "8", "relationship_type": "family"})];
		let graph = build(&nodes, &links);
		let node = &graph.nodes()[0];
		assert_eq!(node.id, "7");
		assert_eq!(node.display_name, "Grace");
		assert_eq!(node.group, "family");
		assert_eq!(graph.links()[0].id, "7|8|family|0");
	}

	#[test]
	fn drops_records_missing_required_fields() {
		let nodes = vec![
			json!({"id": "a", "displayName": "Alice"}),
			json!({"id": "   ", "displayName": "Blank", "group": "friend"}),
			json!({"id": null, "displayName": "Null", "group": "friend"}),
			json!("not an object"),
			json!({"id": "c", "displayName": "Cara", "group": "ex"}),
		];
		let links = vec![
			json!({"sourceId": "a", "type": "friend"}),
			json!({"sourceId": "a", "targetId": "c", "type": true}),
			json!({"sourceId": "a", "targetId": "c", "type": "ex"}),
		];
		let (graph, report) = build_with_report(&nodes, &links);
		assert_eq!(graph.nodes().len(), 1);
		assert_eq!(graph.links().len(), 1);
		assert_eq!(report.nodes_dropped, 4);
		assert_eq!(report.links_dropped, 2);
	}

	#[test]
	fn first_duplicate_node_wins() {
		let nodes = vec![
			json!({"id": "a", "displayName": "Alice", "group": "friend"}),
			json!({"id": "a", "displayName": "Impostor", "group": "ex"}),
		];
		let (graph, report) = build_with_report(&nodes, &[]);
		assert_eq!(graph.nodes().len(), 1);
		assert_eq!(graph.nodes()[0].display_name, "Alice");
		assert_eq!(report.duplicate_nodes, 1);
	}

	#[test]
	fn parallel_links_get_distinct_ordinals() {
		let (nodes, _) = pair();
		let links = vec![
			json!({"sourceId": "a", "targetId": "b", "type": "friend"}),
			json!({"sourceId": "a", "targetId": "b", "type": "colleague"}),
			json!({"sourceId": "a", "targetId": "b", "type": "friend"}),
		];
		let graph = build(&nodes, &links);
		let ids: Vec<&str> = graph.links().iter().map(|l| l.id.as_str()).collect();
		assert_eq!(ids, ["a|b|friend|0", "a|b|colleague|0", "a|b|friend|1"]);
		assert_eq!(graph.relationship_types(), ["friend", "colleague"]);
	}

	#[test]
	fn keeps_links_to_missing_people() {
		let (nodes, mut links) = pair();
		links.push(json!({"sourceId": "a", "targetId": "c", "type": "ex"}));
		let graph = build(&nodes, &links);
		assert_eq!(graph.links().len(), 2);
		assert!(graph.node("c").is_none());
		assert_eq!(graph.relationships_of("a"), ["friend", "ex"]);
	}
}

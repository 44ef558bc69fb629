//! Selection, hover, filter and search state for a chart view, and the
//! highlight sets derived from it.
//!
//! Nothing in here knows about positions. Highlights are recomputed from
//! `(hovered, selected, filter, adjacency)` on every call.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use log::debug;

use super::simulation::FocusCommand;
use super::types::{Graph, Link};

/// Sentinel filter value that shows every relationship.
pub const ALL: &str = "all";

/// How long a search status message stays up.
pub const MESSAGE_TTL: Duration = Duration::from_secs(4);

pub const EMPTY_SEARCH_MESSAGE: &str = "Enter a name to search.";

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum RelationshipFilter {
	#[default]
	All,
	Only(String),
}

impl RelationshipFilter {
	pub fn parse(value: &str) -> Self {
		let value = value.trim();
		if value.is_empty() || value == ALL {
			Self::All
		} else {
			Self::Only(value.to_string())
		}
	}

	pub fn as_str(&self) -> &str {
		match self {
			Self::All => ALL,
			Self::Only(kind) => kind,
		}
	}

	pub fn admits(&self, kind: &str) -> bool {
		match self {
			Self::All => true,
			Self::Only(only) => only == kind,
		}
	}
}

/// One step from a node along a link, in either direction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Neighbor {
	pub node_id: String,
	pub kind: String,
	pub link_id: String,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct AdjacencyIndex(HashMap<String, Vec<Neighbor>>);

impl AdjacencyIndex {
	pub fn build(graph: &Graph) -> Self {
		let mut map: HashMap<String, Vec<Neighbor>> = HashMap::new();
		for link in graph.links() {
			map.entry(link.source_id.clone()).or_default().push(Neighbor {
				node_id: link.target_id.clone(),
				kind: link.kind.clone(),
				link_id: link.id.clone(),
			});
			map.entry(link.target_id.clone()).or_default().push(Neighbor {
				node_id: link.source_id.clone(),
				kind: link.kind.clone(),
				link_id: link.id.clone(),
			});
		}
		Self(map)
	}

	pub fn neighbors(&self, id: &str) -> &[Neighbor] {
		self.0.get(id).map(Vec::as_slice).unwrap_or(&[])
	}
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Highlight {
	pub nodes: HashSet<String>,
	pub links: HashSet<String>,
}

impl Highlight {
	pub fn has_node(&self, id: &str) -> bool {
		self.nodes.contains(id)
	}

	pub fn has_link(&self, id: &str) -> bool {
		self.links.contains(id)
	}
}

/// The hovered and selected nodes plus every neighbor reachable over a link the
/// filter admits.
pub fn highlight(
	adjacency: &AdjacencyIndex,
	hovered: Option<&str>,
	selected: Option<&str>,
	filter: &RelationshipFilter,
) -> Highlight {
	let mut out = Highlight::default();
	for id in [hovered, selected].into_iter().flatten() {
		if !out.nodes.insert(id.to_string()) {
			continue;
		}
		for neighbor in adjacency.neighbors(id) {
			if !filter.admits(&neighbor.kind) {
				continue;
			}
			out.nodes.insert(neighbor.node_id.clone());
			out.links.insert(neighbor.link_id.clone());
		}
	}
	out
}

/// Which nodes and links the active filter lets through.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Visibility {
	filter: RelationshipFilter,
	// None when every node is visible.
	nodes: Option<HashSet<String>>,
}

impl Visibility {
	pub fn compute(graph: &Graph, filter: &RelationshipFilter) -> Self {
		let nodes = match filter {
			RelationshipFilter::All => None,
			RelationshipFilter::Only(kind) => Some(
				graph
					.links()
					.iter()
					.filter(|link| &link.kind == kind)
					.flat_map(|link| [link.source_id.clone(), link.target_id.clone()])
					.collect(),
			),
		};
		Self {
			filter: filter.clone(),
			nodes,
		}
	}

	pub fn shows_node(&self, id: &str) -> bool {
		self.nodes.as_ref().is_none_or(|ids| ids.contains(id))
	}

	pub fn shows_link(&self, link: &Link) -> bool {
		self.filter.admits(&link.kind)
			&& self.shows_node(&link.source_id)
			&& self.shows_node(&link.target_id)
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct StatusMessage {
	pub text: String,
	pub issued_at: f64,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ViewState {
	pub filter: RelationshipFilter,
	pub selected: Option<String>,
	pub hovered: Option<String>,
	pub search_term: String,
	pub message: Option<StatusMessage>,
	pub focus: Option<FocusCommand>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SearchOutcome {
	Empty,
	NotFound(String),
	Found(String),
}

/// Owns the view state for one chart and keeps it consistent with the loaded
/// graph and the active filter.
#[derive(Clone, Debug, Default)]
pub struct InteractionEngine {
	graph: Graph,
	adjacency: AdjacencyIndex,
	visibility: Visibility,
	view: ViewState,
}

impl InteractionEngine {
	pub fn new(graph: Graph) -> Self {
		let mut engine = Self::default();
		engine.load(graph);
		engine
	}

	/// Swap in a freshly loaded graph, keeping whatever view state still applies.
	pub fn load(&mut self, graph: Graph) {
		self.adjacency = AdjacencyIndex::build(&graph);
		self.graph = graph;
		self.refresh_visibility();
		if self
			.view
			.focus
			.as_ref()
			.is_some_and(|f| self.graph.node(&f.node_id).is_none())
		{
			self.view.focus = None;
		}
	}

	pub fn graph(&self) -> &Graph {
		&self.graph
	}

	pub fn view(&self) -> &ViewState {
		&self.view
	}

	pub fn visibility(&self) -> &Visibility {
		&self.visibility
	}

	pub fn highlight(&self) -> Highlight {
		highlight(
			&self.adjacency,
			self.view.hovered.as_deref(),
			self.view.selected.as_deref(),
			&self.view.filter,
		)
	}

	pub fn set_filter(&mut self, filter: RelationshipFilter) {
		debug!("Relationship filter set to {:?}", filter.as_str());
		self.view.filter = filter;
		self.refresh_visibility();
	}

	pub fn hover(&mut self, id: Option<&str>) {
		self.view.hovered = id.filter(|id| self.is_visible(id)).map(str::to_string);
	}

	pub fn click(&mut self, id: &str, now: f64) {
		if !self.is_visible(id) {
			return;
		}
		self.view.message = None;
		self.select_and_focus(id, now);
	}

	pub fn background_click(&mut self) {
		self.view.selected = None;
	}

	/// Look a person up by id, then by display name, ignoring case.
	pub fn search(&mut self, term: &str, now: f64) -> SearchOutcome {
		self.view.search_term = term.to_string();
		let term = term.trim();
		if term.is_empty() {
			self.post_message(EMPTY_SEARCH_MESSAGE.to_string(), now);
			return SearchOutcome::Empty;
		}

		let needle = term.to_lowercase();
		let nodes = self.graph.nodes();
		let found = nodes
			.iter()
			.find(|n| n.id.to_lowercase() == needle)
			.or_else(|| nodes.iter().find(|n| n.display_name.to_lowercase() == needle))
			.map(|n| n.id.clone());

		let Some(id) = found else {
			self.post_message(format!("No person named \"{}\" found.", term), now);
			return SearchOutcome::NotFound(term.to_string());
		};

		self.view.message = None;
		if !self.visibility.shows_node(&id) {
			self.set_filter(RelationshipFilter::All);
		}
		self.select_and_focus(&id, now);
		SearchOutcome::Found(id)
	}

	pub fn set_search_term(&mut self, term: String) {
		self.view.search_term = term;
	}

	pub fn message(&self) -> Option<&str> {
		self.view.message.as_ref().map(|m| m.text.as_str())
	}

	/// Drop the status message once it has been up for [`MESSAGE_TTL`].
	pub fn expire_message(&mut self, now: f64) {
		let ttl = MESSAGE_TTL.as_millis() as f64;
		if self
			.view
			.message
			.as_ref()
			.is_some_and(|m| now - m.issued_at >= ttl)
		{
			self.view.message = None;
		}
	}

	/// Links touching `id`, one entry per link.
	pub fn connections(&self, id: &str) -> Vec<&Neighbor> {
		let mut seen = HashSet::new();
		self.adjacency
			.neighbors(id)
			.iter()
			.filter(|n| seen.insert(n.link_id.as_str()))
			.collect()
	}

	fn is_visible(&self, id: &str) -> bool {
		self.graph.node(id).is_some() && self.visibility.shows_node(id)
	}

	fn select_and_focus(&mut self, id: &str, now: f64) {
		self.view.selected = Some(id.to_string());
		self.view.focus = Some(FocusCommand {
			node_id: id.to_string(),
			issued_at: now,
		});
		debug!("Focus requested for {:?}", id);
	}

	fn post_message(&mut self, text: String, now: f64) {
		self.view.message = Some(StatusMessage {
			text,
			issued_at: now,
		});
	}

	fn refresh_visibility(&mut self) {
		self.visibility = Visibility::compute(&self.graph, &self.view.filter);
		let keep = |id: &Option<String>| id.as_deref().is_some_and(|id| self.is_visible(id));
		let (keep_selected, keep_hovered) = (keep(&self.view.selected), keep(&self.view.hovered));
		if !keep_selected {
			self.view.selected = None;
		}
		if !keep_hovered {
			self.view.hovered = None;
		}
	}
}

use std::collections::HashMap;
use std::f64::consts::PI;
use std::sync::Arc;

use log::debug;

use super::types::{Graph, Point, Viewport};

/// Tunables for the layout. Defaults are the values the chart ships with.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SimulationParameters {
	pub charge: f64,
	pub rest_length: f64,
	pub stiffness: f64,
	pub center_strength: f64,
	pub damping: f64,
	pub time_step: f64,
	pub frame_rate: f64,
	pub max_speed: f64,
	pub focus_strength: f64,
	pub focus_ticks: u32,
	pub margin: f64,
	pub initial_radius: f64,
	pub min_distance_sq: f64,
}

impl Default for SimulationParameters {
	fn default() -> Self {
		Self {
			charge: 1600.0,
			rest_length: 140.0,
			stiffness: 0.02,
			center_strength: 0.005,
			damping: 0.9,
			time_step: 0.02,
			frame_rate: 60.0,
			max_speed: 6.0,
			focus_strength: 0.08,
			focus_ticks: 120,
			margin: 24.0,
			initial_radius: 180.0,
			min_distance_sq: 0.001,
		}
	}
}

impl SimulationParameters {
	/// Grow `viewport` until both margins fit on each axis.
	fn bounded(&self, viewport: Viewport) -> Viewport {
		let floor = 2.0 * self.margin;
		Viewport {
			width: viewport.width.max(floor),
			height: viewport.height.max(floor),
		}
	}
}

/// Pull a node toward the middle of the viewport for a while.
#[derive(Clone, Debug, PartialEq)]
pub struct FocusCommand {
	pub node_id: String,
	/// Milliseconds since the epoch; distinguishes repeated requests for one node.
	pub issued_at: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
	Idle,
	Running,
}

#[derive(Clone, Copy, Debug, Default)]
struct Body {
	pos: Point,
	vx: f64,
	vy: f64,
	fx: f64,
	fy: f64,
}

#[derive(Clone, Copy, Debug)]
struct Focus {
	body: usize,
	remaining: u32,
}

/// Immutable copy of every node position at the end of a tick.
#[derive(Clone, Debug, Default)]
pub struct Snapshot {
	pub tick: u64,
	pub viewport: Viewport,
	points: Vec<Point>,
	index: Arc<HashMap<String, usize>>,
}

impl Snapshot {
	pub fn position(&self, id: &str) -> Option<Point> {
		self.index.get(id).and_then(|&i| self.points.get(i)).copied()
	}

	#[cfg(test)]
	pub(super) fn len(&self) -> usize {
		self.points.len()
	}

	#[cfg(test)]
	pub(super) fn is_empty(&self) -> bool {
		self.points.is_empty()
	}
}

/// Force-directed layout over an arena of bodies indexed like the graph's nodes.
pub struct Simulation {
	params: SimulationParameters,
	viewport: Viewport,
	bodies: Vec<Body>,
	springs: Vec<(usize, usize)>,
	index: Arc<HashMap<String, usize>>,
	focus: Option<Focus>,
	phase: Phase,
	tick: u64,
}

impl Simulation {
	pub fn new(params: SimulationParameters, viewport: Viewport) -> Self {
		Self {
			params,
			viewport: params.bounded(viewport),
			bodies: Vec::new(),
			springs: Vec::new(),
			index: Arc::default(),
			focus: None,
			phase: Phase::Idle,
			tick: 0,
		}
	}

	pub fn phase(&self) -> Phase {
		self.phase
	}

	#[cfg(test)]
	fn viewport(&self) -> Viewport {
		self.viewport
	}

	/// Replace whatever is loaded. Nodes start evenly spaced on a circle around
	/// the viewport center, in input order.
	pub fn load(&mut self, graph: &Graph) {
		self.clear();
		if graph.is_empty() {
			return;
		}

		let center = self.viewport.center();
		let count = graph.nodes().len();
		self.bodies = (0..count)
			.map(|i| {
				let angle = (i as f64) * 2.0 * PI / count as f64;
				Body {
					pos: Point {
						x: center.x + self.params.initial_radius * angle.cos(),
						y: center.y + self.params.initial_radius * angle.sin(),
					},
					..Body::default()
				}
			})
			.collect();

		// Links with a missing endpoint stay in the graph but get no spring.
		self.springs = graph
			.links()
			.iter()
			.filter_map(|link| {
				Some((graph.index_of(&link.source_id)?, graph.index_of(&link.target_id)?))
			})
			.collect();
		self.index = graph.shared_index();
		self.phase = Phase::Running;
		debug!(
			"Simulation running with {} bodies and {} springs",
			self.bodies.len(),
			self.springs.len()
		);
	}

	pub fn clear(&mut self) {
		self.bodies.clear();
		self.springs.clear();
		self.index = Arc::default();
		self.focus = None;
		self.phase = Phase::Idle;
		self.tick = 0;
	}

	pub fn resize(&mut self, width: f64, height: f64) {
		self.viewport = self.params.bounded(self.viewport.observe(width, height));
		debug!(
			"Simulation viewport {}x{}",
			self.viewport.width, self.viewport.height
		);
	}

	/// Start pulling `node_id` to the center. Unknown ids are ignored.
	pub fn focus(&mut self, node_id: &str) {
		if let Some(&body) = self.index.get(node_id) {
			self.focus = Some(Focus {
				body,
				remaining: self.params.focus_ticks,
			});
		}
	}

	#[cfg(test)]
	fn focused(&self) -> Option<usize> {
		self.focus.map(|f| f.body)
	}

	/// Advance one frame and return the resulting positions.
	pub fn tick(&mut self) -> Snapshot {
		if self.phase == Phase::Running {
			self.apply_repulsion();
			self.apply_springs();
			self.apply_focus();
			self.apply_centering();
			self.integrate();
			self.tick += 1;
		}
		self.snapshot()
	}

	pub fn snapshot(&self) -> Snapshot {
		Snapshot {
			tick: self.tick,
			viewport: self.viewport,
			points: self.bodies.iter().map(|b| b.pos).collect(),
			index: self.index.clone(),
		}
	}

	fn apply_repulsion(&mut self) {
		let p = self.params;
		let n = self.bodies.len();
		for i in 0..n {
			for j in (i + 1)..n {
				let (a, b) = (self.bodies[i].pos, self.bodies[j].pos);
				let (mut dx, mut dy) = (a.x - b.x, a.y - b.y);
				if dx == 0.0 && dy == 0.0 {
					// Coincident bodies have no direction; pick one from the pair.
					let angle = (i + j) as f64 * 2.399_963;
					dx = angle.cos() * p.min_distance_sq.sqrt();
					dy = angle.sin() * p.min_distance_sq.sqrt();
				}
				let dist_sq = (dx * dx + dy * dy).max(p.min_distance_sq);
				let dist = dist_sq.sqrt();
				let force = p.charge / dist_sq;
				let (fx, fy) = (dx / dist * force, dy / dist * force);
				self.bodies[i].fx += fx;
				self.bodies[i].fy += fy;
				self.bodies[j].fx -= fx;
				self.bodies[j].fy -= fy;
			}
		}
	}

	fn apply_springs(&mut self) {
		let p = self.params;
		for &(s, t) in &self.springs {
			if s == t {
				continue;
			}
			let (a, b) = (self.bodies[s].pos, self.bodies[t].pos);
			let (dx, dy) = (b.x - a.x, b.y - a.y);
			let dist = (dx * dx + dy * dy).sqrt().max(p.min_distance_sq.sqrt());
			let force = (dist - p.rest_length) * p.stiffness;
			let (fx, fy) = (dx / dist * force, dy / dist * force);
			self.bodies[s].fx += fx;
			self.bodies[s].fy += fy;
			self.bodies[t].fx -= fx;
			self.bodies[t].fy -= fy;
		}
	}

	fn apply_focus(&mut self) {
		let Some(Focus { body, remaining }) = self.focus else {
			return;
		};
		if remaining == 0 {
			self.focus = None;
			return;
		}
		let center = self.viewport.center();
		let strength = self.params.focus_strength;
		let target = &mut self.bodies[body];
		target.fx += (center.x - target.pos.x) * strength;
		target.fy += (center.y - target.pos.y) * strength;
		let remaining = remaining - 1;
		self.focus = (remaining > 0).then_some(Focus { body, remaining });
	}

	fn apply_centering(&mut self) {
		let center = self.viewport.center();
		let strength = self.params.center_strength;
		for body in &mut self.bodies {
			body.fx += (center.x - body.pos.x) * strength;
			body.fy += (center.y - body.pos.y) * strength;
		}
	}

	fn integrate(&mut self) {
		let p = self.params;
		let step = p.time_step * p.frame_rate;
		let (min_x, max_x) = (p.margin, self.viewport.width - p.margin);
		let (min_y, max_y) = (p.margin, self.viewport.height - p.margin);
		for body in &mut self.bodies {
			body.vx = ((body.vx + body.fx) * p.damping).clamp(-p.max_speed, p.max_speed);
			body.vy = ((body.vy + body.fy) * p.damping).clamp(-p.max_speed, p.max_speed);
			body.fx = 0.0;
			body.fy = 0.0;
			body.pos.x = (body.pos.x + body.vx * step).clamp(min_x, max_x);
			body.pos.y = (body.pos.y + body.vy * step).clamp(min_y, max_y);
		}
	}

	#[cfg(test)]
	fn velocities(&self) -> Vec<(f64, f64)> {
		self.bodies.iter().map(|b| (b.vx, b.vy)).collect()
	}
}

#[cfg(test)]
mod tests {
	use proptest::prelude::*;
	use serde_json::json;

	use super::super::model::build;
	use super::*;

	fn alice_and_bob(extra_links: &[serde_json::Value]) -> Graph {
		let nodes = vec![
			json!({"id": "a", "displayName": "Alice", "group": "friend"}),
			json!({"id": "b", "displayName": "Bob", "group": "friend"}),
		];
		let mut links = vec![json!({"sourceId": "a", "targetId": "b", "type": "friend"})];
		links.extend_from_slice(extra_links);
		build(&nodes, &links)
	}

	fn running(graph: &Graph) -> Simulation {
		let mut sim = Simulation::new(SimulationParameters::default(), Viewport::default());
		sim.load(graph);
		sim
	}

	fn in_bounds(snapshot: &Snapshot, graph: &Graph, margin: f64) -> bool {
		let vp = snapshot.viewport;
		graph.nodes().iter().all(|n| {
			snapshot.position(&n.id).is_some_and(|p| {
				p.x >= margin && p.x <= vp.width - margin && p.y >= margin && p.y <= vp.height - margin
			})
		})
	}

	#[test]
	fn idle_until_loaded() {
		let mut sim = Simulation::new(SimulationParameters::default(), Viewport::default());
		assert_eq!(sim.phase(), Phase::Idle);
		let snapshot = sim.tick();
		assert!(snapshot.is_empty());
		assert_eq!(snapshot.tick, 0);

		sim.load(&Graph::default());
		assert_eq!(sim.phase(), Phase::Idle);
	}

	#[test]
	fn places_nodes_on_a_circle() {
		let graph = alice_and_bob(&[]);
		let sim = running(&graph);
		let snapshot = sim.snapshot();
		let (a, b) = (
			snapshot.position("a").unwrap(),
			snapshot.position("b").unwrap(),
		);
		assert!((a.x - 630.0).abs() < 1e-9 && (a.y - 270.0).abs() < 1e-9);
		assert!((b.x - 270.0).abs() < 1e-9 && (b.y - 270.0).abs() < 1e-9);
	}

	#[test]
	fn one_tick_keeps_pair_in_bounds_and_pulls_it_together() {
		let graph = alice_and_bob(&[]);
		let mut sim = running(&graph);
		let before = sim.snapshot();
		let after = sim.tick();
		assert_eq!(sim.phase(), Phase::Running);
		assert_eq!(after.tick, 1);
		assert!(in_bounds(&after, &graph, 24.0));

		// 360 apart: the spring and centering outweigh repulsion.
		let gap = |s: &Snapshot| s.position("a").unwrap().x - s.position("b").unwrap().x;
		assert!(gap(&after) < gap(&before));
		let mid = |s: &Snapshot| (s.position("a").unwrap().x + s.position("b").unwrap().x) / 2.0;
		assert!((mid(&after) - 450.0).abs() < 1e-9);
	}

	#[test]
	fn dangling_link_adds_no_spring() {
		let with = alice_and_bob(&[json!({"sourceId": "a", "targetId": "c", "type": "ex"})]);
		let without = alice_and_bob(&[]);
		let (mut s1, mut s2) = (running(&with), running(&without));
		for _ in 0..25 {
			let (p1, p2) = (s1.tick(), s2.tick());
			assert_eq!(p1.position("a"), p2.position("a"));
			assert_eq!(p1.position("b"), p2.position("b"));
			assert_eq!(p1.position("c"), None);
		}
	}

	#[test]
	fn focus_expires_after_its_budget() {
		let graph = alice_and_bob(&[]);
		let mut sim = running(&graph);
		sim.focus("a");
		sim.focus("nobody");
		assert_eq!(sim.focused(), Some(0));
		for _ in 0..119 {
			sim.tick();
		}
		assert_eq!(sim.focused(), Some(0));
		sim.tick();
		assert_eq!(sim.focused(), None);
	}

	#[test]
	fn focus_pulls_node_toward_center() {
		let graph = alice_and_bob(&[]);
		let (mut plain, mut focused) = (running(&graph), running(&graph));
		focused.focus("a");
		for _ in 0..10 {
			plain.tick();
			focused.tick();
		}
		let dist = |s: &Simulation| {
			let p = s.snapshot().position("a").unwrap();
			let c = s.viewport().center();
			((p.x - c.x).powi(2) + (p.y - c.y).powi(2)).sqrt()
		};
		assert!(dist(&focused) < dist(&plain));
	}

	#[test]
	fn coincident_nodes_separate() {
		let graph = alice_and_bob(&[]);
		let mut sim = running(&graph);
		for body in &mut sim.bodies {
			body.pos = Point { x: 450.0, y: 270.0 };
		}
		let snapshot = sim.tick();
		assert_ne!(snapshot.position("a"), snapshot.position("b"));
	}

	#[test]
	fn reload_resets_state() {
		let graph = alice_and_bob(&[]);
		let mut sim = running(&graph);
		sim.focus("a");
		sim.tick();
		sim.load(&graph);
		assert_eq!(sim.snapshot().tick, 0);
		assert_eq!(sim.focused(), None);
		sim.clear();
		assert_eq!(sim.phase(), Phase::Idle);
		assert!(sim.snapshot().is_empty());
	}

	#[test]
	fn shrinking_viewport_keeps_room_for_both_margins() {
		let graph = alice_and_bob(&[]);
		let mut sim = running(&graph);
		sim.resize(30.0, 0.0);
		assert_eq!(sim.viewport().width, 48.0);
		let snapshot = sim.tick();
		assert_eq!(snapshot.viewport.width, 48.0);
		for node in graph.nodes() {
			let p = snapshot.position(&node.id).unwrap();
			assert!(p.x >= 24.0 && p.x <= snapshot.viewport.width - 24.0);
			assert!(p.y >= 24.0 && p.y <= snapshot.viewport.height - 24.0);
		}

		let narrow = Simulation::new(
			SimulationParameters::default(),
			Viewport {
				width: 10.0,
				height: 10.0,
			},
		);
		assert_eq!(narrow.viewport().width, 48.0);
		assert_eq!(narrow.viewport().height, 48.0);
	}

	fn arbitrary_graph() -> impl Strategy<Value = Graph> {
		(1usize..24, prop::collection::vec((0usize..24, 0usize..24), 0..40)).prop_map(
			|(count, pairs)| {
				let nodes: Vec<_> = (0..count)
					.map(|i| json!({"id": i, "displayName": format!("P{i}"), "group": "friend"}))
					.collect();
				let links: Vec<_> = pairs
					.into_iter()
					.map(|(s, t)| json!({"sourceId": s, "targetId": t, "type": "friend"}))
					.collect();
				build(&nodes, &links)
			},
		)
	}

	proptest! {
		#[test]
		fn positions_stay_inside_margins(
			graph in arbitrary_graph(),
			width in 100.0f64..2000.0,
			height in 0.0f64..1500.0,
			ticks in 1usize..60,
		) {
			let mut sim = Simulation::new(SimulationParameters::default(), Viewport::default());
			sim.resize(width, height);
			sim.load(&graph);
			for _ in 0..ticks {
				let snapshot = sim.tick();
				prop_assert!(in_bounds(&snapshot, &graph, 24.0));
			}
		}

		#[test]
		fn velocities_never_exceed_max_speed(graph in arbitrary_graph(), ticks in 1usize..60) {
			let mut sim = running(&graph);
			if let Some(first) = graph.nodes().first() {
				sim.focus(&first.id);
			}
			for _ in 0..ticks {
				sim.tick();
				for (vx, vy) in sim.velocities() {
					prop_assert!(vx.abs() <= 6.0 && vy.abs() <= 6.0);
				}
			}
		}
	}
}

use std::f64::consts::PI;

use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use super::interaction::{Highlight, Visibility};
use super::simulation::Snapshot;
use super::types::{Graph, Point, group_color};

pub const NODE_RADIUS: f64 = 6.0;
pub const HIGHLIGHT_RADIUS: f64 = 9.0;
pub const HIT_RADIUS: f64 = 12.0;
const LABEL_GAP: f64 = 4.0;
const BACKGROUND: &str = "#020617";

#[derive(Clone, Debug, PartialEq)]
pub struct LinkSegment {
	pub from: Point,
	pub to: Point,
	pub highlighted: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct NodeGlyph {
	pub id: String,
	pub label: String,
	pub at: Point,
	pub radius: f64,
	pub color: &'static str,
	pub highlighted: bool,
}

/// Everything one frame draws, in draw order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Scene {
	pub width: f64,
	pub height: f64,
	pub links: Vec<LinkSegment>,
	pub nodes: Vec<NodeGlyph>,
}

impl Scene {
	/// Lay the snapshot out for drawing. Links whose endpoints are missing from the
	/// snapshot or hidden by the filter are left out.
	pub fn compose(
		graph: &Graph,
		snapshot: &Snapshot,
		visibility: &Visibility,
		highlight: &Highlight,
	) -> Self {
		let links = graph
			.links()
			.iter()
			.filter(|link| visibility.shows_link(link))
			.filter_map(|link| {
				Some(LinkSegment {
					from: snapshot.position(&link.source_id)?,
					to: snapshot.position(&link.target_id)?,
					highlighted: highlight.has_link(&link.id),
				})
			})
			.collect();

		let nodes = graph
			.nodes()
			.iter()
			.filter(|node| visibility.shows_node(&node.id))
			.filter_map(|node| {
				let highlighted = highlight.has_node(&node.id);
				Some(NodeGlyph {
					id: node.id.clone(),
					label: node.display_name.clone(),
					at: snapshot.position(&node.id)?,
					radius: if highlighted {
						HIGHLIGHT_RADIUS
					} else {
						NODE_RADIUS
					},
					color: group_color(&node.group),
					highlighted,
				})
			})
			.collect();

		Self {
			width: snapshot.viewport.width,
			height: snapshot.viewport.height,
			links,
			nodes,
		}
	}

	/// Topmost node under the pointer.
	pub fn node_at(&self, x: f64, y: f64) -> Option<&str> {
		self.nodes
			.iter()
			.rev()
			.find(|node| {
				let (dx, dy) = (node.at.x - x, node.at.y - y);
				(dx * dx + dy * dy).sqrt() < HIT_RADIUS.max(node.radius)
			})
			.map(|node| node.id.as_str())
	}
}

pub fn context_2d(canvas: &HtmlCanvasElement) -> Result<CanvasRenderingContext2d, String> {
	canvas
		.get_context("2d")
		.map_err(|_| "canvas: get_context threw".to_string())?
		.ok_or("canvas: missing 2d context".to_string())?
		.dyn_into::<CanvasRenderingContext2d>()
		.map_err(|_| "canvas: context is not 2d".to_string())
}

pub fn paint(scene: &Scene, ctx: &CanvasRenderingContext2d) {
	ctx.set_fill_style_str(BACKGROUND);
	ctx.fill_rect(0.0, 0.0, scene.width, scene.height);
	draw_links(scene, ctx);
	draw_nodes(scene, ctx);
}

fn draw_links(scene: &Scene, ctx: &CanvasRenderingContext2d) {
	for link in &scene.links {
		let (stroke, alpha, width) = if link.highlighted {
			("#facc15", 0.95, 2.4)
		} else {
			("#475569", 0.5, 1.1)
		};
		ctx.set_global_alpha(alpha);
		ctx.set_stroke_style_str(stroke);
		ctx.set_line_width(width);
		ctx.begin_path();
		ctx.move_to(link.from.x, link.from.y);
		ctx.line_to(link.to.x, link.to.y);
		ctx.stroke();
	}
	ctx.set_global_alpha(1.0);
}

fn draw_nodes(scene: &Scene, ctx: &CanvasRenderingContext2d) {
	ctx.set_font("12px sans-serif");
	for node in &scene.nodes {
		let Point { x, y } = node.at;

		if node.highlighted {
			draw_glow(ctx, node);
		}

		ctx.set_global_alpha(if node.highlighted { 1.0 } else { 0.9 });
		ctx.begin_path();
		let _ = ctx.arc(x, y, node.radius, 0.0, 2.0 * PI);
		ctx.set_fill_style_str(node.color);
		ctx.fill();
		ctx.set_stroke_style_str(if node.highlighted { "#facc15" } else { "#0f172a" });
		ctx.set_line_width(if node.highlighted { 2.0 } else { 1.0 });
		ctx.stroke();
		ctx.set_global_alpha(1.0);

		ctx.set_fill_style_str("#cbd5f5");
		let _ = ctx.fill_text(&node.label, x + node.radius + LABEL_GAP, y + LABEL_GAP);
	}
}

fn draw_glow(ctx: &CanvasRenderingContext2d, node: &NodeGlyph) {
	let Point { x, y } = node.at;
	let outer = node.radius * 2.0;
	let Ok(gradient) = ctx.create_radial_gradient(x, y, node.radius * 0.5, x, y, outer) else {
		return;
	};
	let _ = gradient.add_color_stop(0.0, "rgba(250, 204, 21, 0.9)");
	let _ = gradient.add_color_stop(1.0, "rgba(250, 204, 21, 0)");
	ctx.begin_path();
	let _ = ctx.arc(x, y, outer, 0.0, 2.0 * PI);
	#[allow(deprecated)]
	ctx.set_fill_style(&gradient);
	ctx.fill();
}

use std::cell::RefCell;
use std::rc::Rc;

use leptos::prelude::*;
use log::warn;
use wasm_bindgen::prelude::*;
use web_sys::{Element, HtmlCanvasElement, MouseEvent, ResizeObserver, ResizeObserverEntry};

use super::interaction::{Highlight, Visibility};
use super::render::{self, Scene};
use super::scheduler::{BrowserScheduler, FrameLoop};
use super::simulation::{FocusCommand, Simulation, SimulationParameters, Snapshot};
use super::types::{Graph, MIN_HEIGHT, Viewport};

/// Browser resources behind one mounted canvas. Dropping it stops the frame
/// loop and disconnects the resize observer.
struct Surface {
	frame_loop: FrameLoop<BrowserScheduler>,
	scene: Rc<RefCell<Scene>>,
	observer: Option<(ResizeObserver, Closure<dyn FnMut(js_sys::Array)>)>,
}

impl Drop for Surface {
	fn drop(&mut self) {
		if let Some((observer, _)) = &self.observer {
			observer.disconnect();
		}
	}
}

#[component]
pub fn ForceGraphCanvas(
	#[prop(into)] graph: Signal<Graph>,
	#[prop(into)] visibility: Signal<Visibility>,
	#[prop(into)] highlight: Signal<Highlight>,
	#[prop(into)] focus: Signal<Option<FocusCommand>>,
	#[prop(into)] on_node_hover: Callback<Option<String>>,
	#[prop(into)] on_node_click: Callback<String>,
	#[prop(into)] on_background_click: Callback<()>,
	#[prop(optional)] params: Option<SimulationParameters>,
) -> impl IntoView {
	let container_ref = NodeRef::<leptos::html::Div>::new();
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let surface = StoredValue::new_local(None::<Surface>);
	let last_hover = StoredValue::new(None::<String>);
	let (pointing, set_pointing) = signal(false);

	Effect::new(move |_| {
		let (Some(container), Some(canvas)) = (container_ref.get(), canvas_ref.get()) else {
			return;
		};
		if surface.with_value(Option::is_some) {
			return;
		}
		let params = params.unwrap_or_default();
		match mount(&container, canvas, graph, visibility, highlight, params) {
			Ok(mounted) => surface.set_value(Some(mounted)),
			Err(err) => warn!("Chart surface unavailable: {}", err),
		}
	});

	Effect::new(move |_| {
		let graph = graph.get();
		surface.with_value(|s| {
			if let Some(s) = s {
				s.frame_loop.reload(&graph);
			}
		});
	});

	Effect::new(move |_| {
		let Some(command) = focus.get() else {
			return;
		};
		surface.with_value(|s| {
			if let Some(s) = s {
				s.frame_loop.simulation().borrow_mut().focus(&command.node_id);
			}
		});
	});

	on_cleanup(move || {
		let _ = surface.try_update_value(|s| s.take());
	});

	let hit = move |ev: &MouseEvent| -> Option<String> {
		let canvas = canvas_ref.get()?;
		let rect = canvas.get_bounding_client_rect();
		let (x, y) = (
			ev.client_x() as f64 - rect.left(),
			ev.client_y() as f64 - rect.top(),
		);
		surface.with_value(|s| {
			s.as_ref()
				.and_then(|s| s.scene.borrow().node_at(x, y).map(str::to_string))
		})
	};

	let set_hover = move |hovered: Option<String>| {
		if last_hover.with_value(|last| last == &hovered) {
			return;
		}
		set_pointing.set(hovered.is_some());
		last_hover.set_value(hovered.clone());
		on_node_hover.run(hovered);
	};

	let on_mousemove = move |ev: MouseEvent| set_hover(hit(&ev));
	let on_mouseleave = move |_: MouseEvent| set_hover(None);
	let on_click = move |ev: MouseEvent| match hit(&ev) {
		Some(id) => on_node_click.run(id),
		None => on_background_click.run(()),
	};

	view! {
		<div
			node_ref=container_ref
			class="force-graph-container"
			style=format!("width: 100%; min-height: {}px;", MIN_HEIGHT)
		>
			<canvas
				node_ref=canvas_ref
				class="force-graph-canvas"
				on:mousemove=on_mousemove
				on:mouseleave=on_mouseleave
				on:click=on_click
				style=move || {
					format!(
						"display: block; cursor: {};",
						if pointing.get() { "pointer" } else { "default" },
					)
				}
			/>
		</div>
	}
}

fn mount(
	container: &Element,
	canvas: HtmlCanvasElement,
	graph: Signal<Graph>,
	visibility: Signal<Visibility>,
	highlight: Signal<Highlight>,
	params: SimulationParameters,
) -> Result<Surface, String> {
	let ctx = render::context_2d(&canvas)?;
	let viewport = Viewport::default().observe(
		container.client_width() as f64,
		container.client_height() as f64,
	);
	canvas.set_width(viewport.width as u32);
	canvas.set_height(viewport.height as u32);

	let simulation = Rc::new(RefCell::new(Simulation::new(params, viewport)));
	let scene = Rc::new(RefCell::new(Scene::default()));

	let latest = scene.clone();
	let frame_loop = FrameLoop::new(
		BrowserScheduler::new(),
		simulation.clone(),
		move |snapshot: &Snapshot| {
			let next = graph.with_untracked(|g| {
				visibility.with_untracked(|v| {
					highlight.with_untracked(|h| Scene::compose(g, snapshot, v, h))
				})
			});
			// The canvas follows the simulation bounds, one frame behind a resize.
			let (w, h) = (next.width as u32, next.height as u32);
			if canvas.width() != w || canvas.height() != h {
				canvas.set_width(w);
				canvas.set_height(h);
			}
			render::paint(&next, &ctx);
			*latest.borrow_mut() = next;
		},
	);

	let observer = match observe_size(container, simulation) {
		Ok(observer) => Some(observer),
		Err(err) => {
			warn!("Chart will not follow its container: {}", err);
			None
		}
	};

	frame_loop.reload(&graph.get_untracked());

	Ok(Surface {
		frame_loop,
		scene,
		observer,
	})
}

fn observe_size(
	container: &Element,
	simulation: Rc<RefCell<Simulation>>,
) -> Result<(ResizeObserver, Closure<dyn FnMut(js_sys::Array)>), String> {
	let on_resize = Closure::<dyn FnMut(js_sys::Array)>::new(move |entries: js_sys::Array| {
		for entry in entries.iter() {
			let Ok(entry) = entry.dyn_into::<ResizeObserverEntry>() else {
				continue;
			};
			let rect = entry.content_rect();
			simulation.borrow_mut().resize(rect.width(), rect.height());
		}
	});
	let observer = ResizeObserver::new(on_resize.as_ref().unchecked_ref())
		.map_err(|err| format!("resize observer: {:?}", err))?;
	observer.observe(container);
	Ok((observer, on_resize))
}

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use log::{trace, warn};
use wasm_bindgen::prelude::*;

use super::simulation::{Phase, Simulation, Snapshot};
use super::types::Graph;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameHandle(pub i32);

/// Something that can run a callback on the next display frame.
pub trait FrameScheduler {
	/// `None` when the environment refused to schedule anything.
	fn request_frame(&self, callback: Rc<dyn Fn()>) -> Option<FrameHandle>;
	fn cancel_frame(&self, handle: FrameHandle);
}

/// `requestAnimationFrame` backed scheduler.
///
/// A single closure is handed to the browser for every request and dispatches to
/// whichever callback is pending, so no closure is ever dropped while running.
pub struct BrowserScheduler {
	pending: Rc<RefCell<Option<Rc<dyn Fn()>>>>,
	trampoline: Closure<dyn FnMut()>,
}

impl BrowserScheduler {
	pub fn new() -> Self {
		let pending: Rc<RefCell<Option<Rc<dyn Fn()>>>> = Rc::new(RefCell::new(None));
		let slot = pending.clone();
		let trampoline = Closure::new(move || {
			let callback = slot.borrow_mut().take();
			if let Some(callback) = callback {
				callback();
			}
		});
		Self {
			pending,
			trampoline,
		}
	}
}

impl Default for BrowserScheduler {
	fn default() -> Self {
		Self::new()
	}
}

impl FrameScheduler for BrowserScheduler {
	fn request_frame(&self, callback: Rc<dyn Fn()>) -> Option<FrameHandle> {
		let Some(window) = web_sys::window() else {
			warn!("No window; cannot schedule animation frames");
			return None;
		};
		*self.pending.borrow_mut() = Some(callback);
		match window.request_animation_frame(self.trampoline.as_ref().unchecked_ref()) {
			Ok(id) => Some(FrameHandle(id)),
			Err(err) => {
				warn!("requestAnimationFrame failed: {:?}", err);
				self.pending.borrow_mut().take();
				None
			}
		}
	}

	fn cancel_frame(&self, handle: FrameHandle) {
		self.pending.borrow_mut().take();
		if let Some(window) = web_sys::window() {
			let _ = window.cancel_animation_frame(handle.0);
		}
	}
}

struct LoopInner<S> {
	scheduler: S,
	simulation: Rc<RefCell<Simulation>>,
	on_frame: Box<dyn Fn(&Snapshot)>,
	pending: Cell<Option<FrameHandle>>,
	running: Cell<bool>,
}

/// Ticks a simulation once per frame. The next frame is requested only after the
/// current tick has produced its snapshot, so ticks never overlap or queue up.
pub struct FrameLoop<S: FrameScheduler + 'static> {
	inner: Rc<LoopInner<S>>,
}

impl<S: FrameScheduler + 'static> FrameLoop<S> {
	pub fn new(
		scheduler: S,
		simulation: Rc<RefCell<Simulation>>,
		on_frame: impl Fn(&Snapshot) + 'static,
	) -> Self {
		Self {
			inner: Rc::new(LoopInner {
				scheduler,
				simulation,
				on_frame: Box::new(on_frame),
				pending: Cell::new(None),
				running: Cell::new(false),
			}),
		}
	}

	pub fn simulation(&self) -> &Rc<RefCell<Simulation>> {
		&self.inner.simulation
	}

	#[cfg(test)]
	fn is_running(&self) -> bool {
		self.inner.running.get()
	}

	/// Begin ticking if a graph is loaded.
	pub fn start(&self) {
		if self.inner.running.get() || self.inner.simulation.borrow().phase() != Phase::Running {
			return;
		}
		self.inner.running.set(true);
		Self::schedule(&self.inner);
	}

	/// Cancel the pending tick, if any.
	pub fn stop(&self) {
		self.inner.running.set(false);
		if let Some(handle) = self.inner.pending.take() {
			self.inner.scheduler.cancel_frame(handle);
		}
	}

	/// Replace the graph. Nothing scheduled for the previous graph will run.
	pub fn reload(&self, graph: &Graph) {
		self.stop();
		self.inner.simulation.borrow_mut().load(graph);
		let snapshot = self.inner.simulation.borrow().snapshot();
		(self.inner.on_frame)(&snapshot);
		self.start();
	}

	fn schedule(inner: &Rc<LoopInner<S>>) {
		let weak: Weak<LoopInner<S>> = Rc::downgrade(inner);
		let callback: Rc<dyn Fn()> = Rc::new(move || {
			if let Some(inner) = weak.upgrade() {
				Self::step(&inner);
			}
		});
		let handle = inner.scheduler.request_frame(callback);
		if handle.is_none() {
			inner.running.set(false);
		}
		inner.pending.set(handle);
	}

	fn step(inner: &Rc<LoopInner<S>>) {
		inner.pending.set(None);
		if !inner.running.get() {
			return;
		}
		let snapshot = inner.simulation.borrow_mut().tick();
		trace!("Layout tick {}", snapshot.tick);
		(inner.on_frame)(&snapshot);
		if inner.running.get() {
			Self::schedule(inner);
		}
	}
}

impl<S: FrameScheduler + 'static> Drop for FrameLoop<S> {
	fn drop(&mut self) {
		self.stop();
	}
}

/// Runs frames only when told to.
#[cfg(test)]
#[derive(Clone, Default)]
pub struct ManualScheduler {
	queue: Rc<RefCell<Vec<(FrameHandle, Rc<dyn Fn()>)>>>,
	next: Rc<Cell<i32>>,
}

#[cfg(test)]
impl ManualScheduler {
	/// Run every callback queued before this call. Returns how many ran.
	pub fn advance(&self) -> usize {
		let due = std::mem::take(&mut *self.queue.borrow_mut());
		let count = due.len();
		for (_, callback) in due {
			callback();
		}
		count
	}

	pub fn queued(&self) -> usize {
		self.queue.borrow().len()
	}
}

#[cfg(test)]
impl FrameScheduler for ManualScheduler {
	fn request_frame(&self, callback: Rc<dyn Fn()>) -> Option<FrameHandle> {
		let handle = FrameHandle(self.next.get());
		self.next.set(handle.0 + 1);
		self.queue.borrow_mut().push((handle, callback));
		Some(handle)
	}

	fn cancel_frame(&self, handle: FrameHandle) {
		self.queue.borrow_mut().retain(|(h, _)| *h != handle);
	}
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::super::model::build;
	use super::super::simulation::SimulationParameters;
	use super::super::types::Viewport;
	use super::*;

	fn graph(ids: &[&str]) -> Graph {
		let nodes: Vec<_> = ids
			.iter()
			.map(|id| json!({"id": id, "displayName": id, "group": "friend"}))
			.collect();
		build(&nodes, &[])
	}

	fn harness() -> (ManualScheduler, FrameLoop<ManualScheduler>, Rc<RefCell<Vec<u64>>>) {
		let scheduler = ManualScheduler::default();
		let simulation = Rc::new(RefCell::new(Simulation::new(
			SimulationParameters::default(),
			Viewport::default(),
		)));
		let frames = Rc::new(RefCell::new(Vec::new()));
		let sink = frames.clone();
		let frame_loop = FrameLoop::new(scheduler.clone(), simulation, move |s: &Snapshot| {
			sink.borrow_mut().push(s.tick)
		});
		(scheduler, frame_loop, frames)
	}

	#[test]
	fn idle_loop_schedules_nothing() {
		let (scheduler, frame_loop, frames) = harness();
		frame_loop.start();
		assert!(!frame_loop.is_running());
		assert_eq!(scheduler.queued(), 0);
		assert!(frames.borrow().is_empty());
	}

	#[test]
	fn one_tick_per_frame_and_one_frame_pending() {
		let (scheduler, frame_loop, frames) = harness();
		frame_loop.reload(&graph(&["a", "b"]));
		assert_eq!(*frames.borrow(), [0]);
		for _ in 0..3 {
			assert_eq!(scheduler.queued(), 1);
			assert_eq!(scheduler.advance(), 1);
		}
		assert_eq!(*frames.borrow(), [0, 1, 2, 3]);
		assert_eq!(frame_loop.simulation().borrow().snapshot().tick, 3);
	}

	#[test]
	fn stop_cancels_the_pending_tick() {
		let (scheduler, frame_loop, frames) = harness();
		frame_loop.reload(&graph(&["a"]));
		scheduler.advance();
		frame_loop.stop();
		assert_eq!(scheduler.queued(), 0);
		assert_eq!(scheduler.advance(), 0);
		assert_eq!(*frames.borrow(), [0, 1]);
	}

	#[test]
	fn reload_replaces_the_pending_tick() {
		let (scheduler, frame_loop, frames) = harness();
		frame_loop.reload(&graph(&["a"]));
		scheduler.advance();
		frame_loop.reload(&graph(&["x", "y", "z"]));
		assert_eq!(scheduler.queued(), 1);
		scheduler.advance();
		assert_eq!(*frames.borrow(), [0, 1, 0, 1]);
		let sim = frame_loop.simulation().borrow();
		assert_eq!(sim.snapshot().len(), 3);
		assert!(sim.snapshot().position("a").is_none());
	}

	#[test]
	fn reloading_an_empty_graph_goes_idle() {
		let (scheduler, frame_loop, _) = harness();
		frame_loop.reload(&graph(&["a"]));
		frame_loop.reload(&Graph::default());
		assert!(!frame_loop.is_running());
		assert_eq!(scheduler.queued(), 0);
	}

	#[test]
	fn dropping_the_loop_cancels() {
		let (scheduler, frame_loop, _) = harness();
		frame_loop.reload(&graph(&["a"]));
		drop(frame_loop);
		assert_eq!(scheduler.queued(), 0);
	}
}

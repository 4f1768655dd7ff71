//! Render generation tracking and the mounted component set.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::component::{Component, ComponentFactory};

/// A mounted layout and what it was built from.
pub(crate) struct MountedLayout {
	pub(crate) factory: ComponentFactory,
	pub(crate) instance: Rc<dyn Component>,
	/// Markup the layout produced, reused when the instance is preserved.
	pub(crate) shell: String,
}

/// The mounted leaf and the innermost layout it renders inside.
pub(crate) struct MountedView {
	pub(crate) instance: Rc<dyn Component>,
	pub(crate) layout: Option<Rc<dyn Component>>,
}

/// Router-wide render bookkeeping.
///
/// Only the render pipeline mutates it; everything else reads it through the
/// router's accessors.
#[derive(Default)]
pub struct RenderState {
	render_id: u64,
	busy: bool,
	pub(crate) current_view: Option<MountedView>,
	pub(crate) current_layouts: Vec<MountedLayout>,
}

impl fmt::Debug for RenderState {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("RenderState")
			.field("render_id", &self.render_id)
			.field("busy", &self.busy)
			.field("has_view", &self.current_view.is_some())
			.field("layouts", &self.current_layouts.len())
			.finish()
	}
}

/// Shared handle to the render state.
pub(crate) type SharedRenderState = Rc<RefCell<RenderState>>;

impl RenderState {
	/// Id of the most recently started render.
	pub fn render_id(&self) -> u64 {
		self.render_id
	}

	/// Whether a render is in flight.
	pub fn is_busy(&self) -> bool {
		self.busy
	}

	/// The mounted leaf instance.
	pub fn current_view(&self) -> Option<Rc<dyn Component>> {
		self.current_view.as_ref().map(|v| v.instance.clone())
	}

	/// The innermost layout the mounted leaf is rendered inside.
	pub fn current_view_layout(&self) -> Option<Rc<dyn Component>> {
		self.current_view.as_ref().and_then(|v| v.layout.clone())
	}

	/// Mounted layouts, outermost first.
	pub fn current_layouts(&self) -> Vec<Rc<dyn Component>> {
		self.current_layouts.iter().map(|l| l.instance.clone()).collect()
	}

	pub(crate) fn innermost_layout(&self) -> Option<&MountedLayout> {
		self.current_layouts.last()
	}

	/// Starts a new render generation, superseding any render in flight.
	pub(crate) fn begin(state: &SharedRenderState) -> RenderToken {
		let mut inner = state.borrow_mut();
		inner.render_id += 1;
		inner.busy = true;
		RenderToken {
			id: inner.render_id,
			state: Rc::downgrade(state),
		}
	}
}

/// Identifies one render attempt.
///
/// Passed by value into every step of the pipeline; each step checks
/// [`is_stale`](Self::is_stale) after it resumes from an await and stops
/// without touching the DOM or the render state when a newer render started.
#[derive(Clone)]
pub struct RenderToken {
	id: u64,
	state: Weak<RefCell<RenderState>>,
}

impl fmt::Debug for RenderToken {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("RenderToken")
			.field("id", &self.id)
			.field("stale", &self.is_stale())
			.finish()
	}
}

impl RenderToken {
	/// The render id captured when this render started.
	pub fn id(&self) -> u64 {
		self.id
	}

	/// True once a newer render has started or the router is gone.
	pub fn is_stale(&self) -> bool {
		match self.state.upgrade() {
			Some(state) => state.borrow().render_id != self.id,
			None => true,
		}
	}

	/// Clears the busy flag if this render is still the current one.
	pub(crate) fn release(&self) {
		if let Some(state) = self.state.upgrade() {
			let mut inner = state.borrow_mut();
			if inner.render_id == self.id {
				inner.busy = false;
			}
		}
	}
}

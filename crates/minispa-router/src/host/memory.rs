//! In-memory host for native builds and tests.
//!
//! [`MemoryHost`] keeps a history stack, a set of [`MemoryElement`]s
//! registered by selector and a single-threaded executor. Nothing runs until
//! [`MemoryHost::run_until_stalled`] is called, which makes interleavings
//! between navigations deterministic.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use std::rc::{Rc, Weak};

use futures::FutureExt;
use futures::channel::oneshot;
use futures::executor::{LocalPool, LocalSpawner};
use futures::future::{self, LocalBoxFuture};
use futures::task::LocalSpawnExt;
use serde_json::Value;

use super::{ClickHandler, DomTarget, Host, Location, PopStateHandler, Subscription};
use crate::error::{Result, RouterError};
use crate::link::LinkClick;
use crate::warn_log;

/// An element living in memory.
///
/// Descendants are not parsed out of the markup: register them with
/// [`MemoryElement::insert_child`] to make [`DomTarget::query_selector`]
/// find them.
#[derive(Default)]
pub struct MemoryElement {
	html: RefCell<String>,
	attributes: RefCell<BTreeMap<String, String>>,
	classes: RefCell<Vec<String>>,
	children: RefCell<Vec<(String, Rc<MemoryElement>)>>,
	writes: Cell<usize>,
}

impl fmt::Debug for MemoryElement {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("MemoryElement")
			.field("html", &self.html.borrow())
			.field("attributes", &self.attributes.borrow())
			.field("classes", &self.classes.borrow())
			.finish()
	}
}

impl MemoryElement {
	/// Creates an empty element.
	pub fn new() -> Rc<Self> {
		Rc::new(Self::default())
	}

	/// Registers a descendant reachable through `selector`.
	pub fn insert_child(&self, selector: impl Into<String>, child: Rc<MemoryElement>) {
		self.children.borrow_mut().push((selector.into(), child));
	}

	/// Value of an attribute.
	pub fn attribute(&self, name: &str) -> Option<String> {
		self.attributes.borrow().get(name).cloned()
	}

	/// Whether the element carries `class`.
	pub fn has_class(&self, class: &str) -> bool {
		self.classes.borrow().iter().any(|c| c == class)
	}

	/// Number of `set_inner_html` calls so far.
	pub fn write_count(&self) -> usize {
		self.writes.get()
	}
}

impl DomTarget for MemoryElement {
	fn set_inner_html(&self, html: &str) {
		*self.html.borrow_mut() = html.to_string();
		self.writes.set(self.writes.get() + 1);
	}

	fn inner_html(&self) -> String {
		self.html.borrow().clone()
	}

	fn query_selector(&self, selector: &str) -> Option<Rc<dyn DomTarget>> {
		self.children
			.borrow()
			.iter()
			.find(|(s, _)| s == selector)
			.map(|(_, child)| child.clone() as Rc<dyn DomTarget>)
	}

	fn set_attribute(&self, name: &str, value: &str) {
		self.attributes.borrow_mut().insert(name.to_string(), value.to_string());
	}

	fn remove_attribute(&self, name: &str) {
		self.attributes.borrow_mut().remove(name);
	}

	fn add_class(&self, class: &str) {
		if !self.has_class(class) {
			self.classes.borrow_mut().push(class.to_string());
		}
	}

	fn remove_class(&self, class: &str) {
		self.classes.borrow_mut().retain(|c| c != class);
	}
}

#[derive(Debug, Clone)]
struct HistoryEntry {
	location: Location,
	state: Option<Value>,
}

type Listeners<T> = Rc<RefCell<Vec<(u64, T)>>>;

fn subscribe<T: 'static>(listeners: &Listeners<T>, id: u64, listener: T) -> Subscription {
	listeners.borrow_mut().push((id, listener));
	let weak: Weak<RefCell<Vec<(u64, T)>>> = Rc::downgrade(listeners);
	Subscription::new(move || {
		if let Some(listeners) = weak.upgrade() {
			listeners.borrow_mut().retain(|(other, _)| *other != id);
		}
	})
}

/// A browser stand-in.
pub struct MemoryHost {
	origin: String,
	history: RefCell<Vec<HistoryEntry>>,
	index: Cell<usize>,
	elements: RefCell<Vec<(String, Rc<MemoryElement>)>>,
	popstate: Listeners<PopStateHandler>,
	clicks: Listeners<(String, ClickHandler)>,
	next_listener: Cell<u64>,
	pool: RefCell<LocalPool>,
	spawner: LocalSpawner,
	slept_ms: Cell<u64>,
	timers_held: Cell<bool>,
	timers: RefCell<VecDeque<oneshot::Sender<()>>>,
}

impl fmt::Debug for MemoryHost {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("MemoryHost")
			.field("origin", &self.origin)
			.field("location", &self.location())
			.field("history_len", &self.history.borrow().len())
			.field("listeners", &self.listener_count())
			.finish()
	}
}

impl MemoryHost {
	/// Creates a host at `origin` whose only history entry is `href`.
	///
	/// # Errors
	///
	/// Returns [`RouterError::Host`] when `origin` or `href` is not a valid URL.
	pub fn new(origin: &str, href: &str) -> Result<Self> {
		let (_, location) = Location::resolve(origin, &Location::new("/", "", ""), href)?;
		let pool = LocalPool::new();
		let spawner = pool.spawner();
		Ok(Self {
			origin: origin.trim_end_matches('/').to_string(),
			history: RefCell::new(vec![HistoryEntry { location, state: None }]),
			index: Cell::new(0),
			elements: RefCell::new(Vec::new()),
			popstate: Rc::default(),
			clicks: Rc::default(),
			next_listener: Cell::new(0),
			pool: RefCell::new(pool),
			spawner,
			slept_ms: Cell::new(0),
			timers_held: Cell::new(false),
			timers: RefCell::new(VecDeque::new()),
		})
	}

	/// Registers an element reachable through `selector`.
	pub fn insert_element(&self, selector: impl Into<String>, element: Rc<MemoryElement>) {
		self.elements.borrow_mut().push((selector.into(), element));
	}

	/// Creates and registers an empty element.
	pub fn create_element(&self, selector: impl Into<String>) -> Rc<MemoryElement> {
		let element = MemoryElement::new();
		self.insert_element(selector, element.clone());
		element
	}

	/// Runs spawned tasks until none can make progress.
	pub fn run_until_stalled(&self) {
		self.pool.borrow_mut().run_until_stalled();
	}

	/// Goes one entry back and fires popstate. Returns false at the start.
	pub fn back(&self) -> bool {
		self.go(-1)
	}

	/// Goes one entry forward and fires popstate. Returns false at the end.
	pub fn forward(&self) -> bool {
		self.go(1)
	}

	fn go(&self, delta: isize) -> bool {
		let len = self.history.borrow().len();
		let Some(next) = self.index.get().checked_add_signed(delta).filter(|&i| i < len) else {
			return false;
		};
		self.index.set(next);
		let handlers: Vec<PopStateHandler> = self.popstate.borrow().iter().map(|(_, h)| h.clone()).collect();
		for handler in handlers {
			handler();
		}
		true
	}

	/// Dispatches a click to the delegated link handlers.
	///
	/// Returns true when a handler claimed it (the browser default would be
	/// prevented).
	pub fn click(&self, click: &LinkClick) -> bool {
		let handlers: Vec<ClickHandler> = self.clicks.borrow().iter().map(|(_, (_, h))| h.clone()).collect();
		handlers.iter().any(|handler| handler(click))
	}

	/// Locations in the history stack, oldest first.
	pub fn history(&self) -> Vec<Location> {
		self.history.borrow().iter().map(|e| e.location.clone()).collect()
	}

	/// Number of active popstate and click listeners.
	pub fn listener_count(&self) -> usize {
		self.popstate.borrow().len() + self.clicks.borrow().len()
	}

	/// Total milliseconds requested through [`Host::sleep`].
	pub fn slept_ms(&self) -> u64 {
		self.slept_ms.get()
	}

	/// Makes later [`Host::sleep`] calls wait for [`fire_next_timer`](Self::fire_next_timer)
	/// instead of resolving immediately.
	pub fn hold_timers(&self) {
		self.timers_held.set(true);
	}

	/// Number of held sleeps not fired yet.
	pub fn pending_timers(&self) -> usize {
		self.timers.borrow().len()
	}

	/// Resolves the oldest held sleep and runs spawned tasks until stalled.
	/// Returns false when no sleep is pending.
	pub fn fire_next_timer(&self) -> bool {
		let Some(timer) = self.timers.borrow_mut().pop_front() else {
			return false;
		};
		let _ = timer.send(());
		self.run_until_stalled();
		true
	}

	fn next_id(&self) -> u64 {
		let id = self.next_listener.get();
		self.next_listener.set(id + 1);
		id
	}

	fn entry_for(&self, url: &str, state: Option<&Value>) -> Result<HistoryEntry> {
		let (origin, location) =
			Location::resolve(&self.origin, &self.location(), url).map_err(|e| RouterError::History(e.to_string()))?;
		if origin != self.origin {
			return Err(RouterError::History(format!("cross-origin history entry `{}`", url)));
		}
		Ok(HistoryEntry {
			location,
			state: state.cloned(),
		})
	}
}

impl Host for MemoryHost {
	fn location(&self) -> Location {
		self.history.borrow()[self.index.get()].location.clone()
	}

	fn origin(&self) -> String {
		self.origin.clone()
	}

	fn history_state(&self) -> Option<Value> {
		self.history.borrow()[self.index.get()].state.clone()
	}

	fn push_state(&self, url: &str, state: Option<&Value>) -> Result<()> {
		let entry = self.entry_for(url, state)?;
		let mut history = self.history.borrow_mut();
		history.truncate(self.index.get() + 1);
		history.push(entry);
		self.index.set(history.len() - 1);
		Ok(())
	}

	fn replace_state(&self, url: &str, state: Option<&Value>) -> Result<()> {
		let entry = self.entry_for(url, state)?;
		self.history.borrow_mut()[self.index.get()] = entry;
		Ok(())
	}

	fn query_selector(&self, selector: &str) -> Option<Rc<dyn DomTarget>> {
		self.elements
			.borrow()
			.iter()
			.find(|(s, _)| s == selector)
			.map(|(_, element)| element.clone() as Rc<dyn DomTarget>)
	}

	fn on_popstate(&self, handler: PopStateHandler) -> Result<Subscription> {
		Ok(subscribe(&self.popstate, self.next_id(), handler))
	}

	fn on_link_click(&self, link_selector: &str, handler: ClickHandler) -> Result<Subscription> {
		Ok(subscribe(&self.clicks, self.next_id(), (link_selector.to_string(), handler)))
	}

	fn spawn(&self, task: LocalBoxFuture<'static, ()>) {
		if let Err(err) = self.spawner.spawn_local(task) {
			warn_log!("task dropped: {}", err);
		}
	}

	fn sleep(&self, ms: u32) -> LocalBoxFuture<'static, ()> {
		self.slept_ms.set(self.slept_ms.get() + u64::from(ms));
		if !self.timers_held.get() {
			return future::ready(()).boxed_local();
		}
		let (fire, fired) = oneshot::channel();
		self.timers.borrow_mut().push_back(fire);
		async move {
			let _ = fired.await;
		}
		.boxed_local()
	}
}

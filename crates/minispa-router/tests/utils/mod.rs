//! Shared test components and fixtures.
//!
//! [`Probe`] components write every lifecycle call into an [`EventLog`] so
//! tests can assert on render, mount and destroy order.

#![allow(dead_code)]

use std::cell::RefCell;
use std::future::Future;
use std::rc::Rc;

use async_trait::async_trait;
use futures::FutureExt;
use futures::channel::oneshot;
use minispa_router::{
	BoxError, Component, ComponentFactory, Host, LazyLoader, MemoryElement, MemoryHost, NavigationContext, Router,
	RouterOptions, SLOT_MARKER,
};
use rstest::fixture;

pub const ORIGIN: &str = "https://app.test";

/// Lifecycle calls in order, e.g. `render:home`, `mount:home`.
#[derive(Clone, Default)]
pub struct EventLog(Rc<RefCell<Vec<String>>>);

impl EventLog {
	pub fn push(&self, event: impl Into<String>) {
		self.0.borrow_mut().push(event.into());
	}

	pub fn events(&self) -> Vec<String> {
		self.0.borrow().clone()
	}

	pub fn count(&self, event: &str) -> usize {
		self.0.borrow().iter().filter(|e| *e == event).count()
	}

	pub fn contains(&self, event: &str) -> bool {
		self.count(event) > 0
	}

	pub fn clear(&self) {
		self.0.borrow_mut().clear();
	}
}

/// A component that records its lifecycle.
pub struct Probe {
	name: String,
	html: String,
	log: EventLog,
}

impl Probe {
	pub fn new(name: &str, html: &str, log: &EventLog) -> Self {
		Self {
			name: name.to_string(),
			html: html.to_string(),
			log: log.clone(),
		}
	}
}

#[async_trait(?Send)]
impl Component for Probe {
	async fn render(&self) -> Result<String, BoxError> {
		self.log.push(format!("render:{}", self.name));
		Ok(self.html.clone())
	}

	fn mount(&self) {
		self.log.push(format!("mount:{}", self.name));
	}

	fn destroy(&self) {
		self.log.push(format!("destroy:{}", self.name));
	}
}

/// A leaf view rendering `<p>{name}</p>`.
pub fn view(name: &str, log: &EventLog) -> ComponentFactory {
	let name = name.to_string();
	let log = log.clone();
	ComponentFactory::new(move |_| Probe {
		html: format!("<p>{}</p>", name),
		name: name.clone(),
		log: log.clone(),
	})
}

/// A layout rendering `<div class="{name}">` around the slot.
pub fn layout(name: &str, log: &EventLog) -> ComponentFactory {
	let name = name.to_string();
	let log = log.clone();
	ComponentFactory::new(move |_| Probe {
		html: format!("<div class=\"{}\">{}</div>", name, SLOT_MARKER),
		name: name.clone(),
		log: log.clone(),
	})
}

/// A view that keeps the context it was built with.
pub fn capturing_view(name: &str, seen: &Rc<RefCell<Option<NavigationContext>>>, log: &EventLog) -> ComponentFactory {
	let name = name.to_string();
	let seen = seen.clone();
	let log = log.clone();
	ComponentFactory::new(move |ctx: &NavigationContext| {
		*seen.borrow_mut() = Some(ctx.clone());
		Probe {
			html: format!("<p>{}</p>", name),
			name: name.clone(),
			log: log.clone(),
		}
	})
}

/// A lazy loader that waits until the returned sender fires.
pub fn suspended_loader() -> (LazyLoader, oneshot::Sender<ComponentFactory>) {
	let (tx, rx) = oneshot::channel::<ComponentFactory>();
	let rx = Rc::new(RefCell::new(Some(rx)));
	let loader = LazyLoader::new(move || {
		let rx = rx.borrow_mut().take();
		async move {
			let rx = rx.ok_or_else(|| BoxError::from("loader polled twice"))?;
			rx.await.map_err(|_| BoxError::from("loader cancelled"))
		}
	});
	(loader, tx)
}

/// In-memory browser with a `#app` mount point.
pub struct Browser {
	pub host: Rc<MemoryHost>,
	pub app: Rc<MemoryElement>,
}

impl Browser {
	pub fn at(href: &str) -> Self {
		let host = Rc::new(MemoryHost::new(ORIGIN, href).unwrap());
		let app = host.create_element("#app");
		Self { host, app }
	}

	pub fn router(&self, options: RouterOptions) -> Router {
		Router::new(options, self.host.clone() as Rc<dyn Host>).unwrap()
	}

	pub fn path(&self) -> String {
		self.host.location().pathname
	}

	/// Spawns `future` on the host executor and returns a slot for its output.
	pub fn spawn<T: 'static>(&self, future: impl Future<Output = T> + 'static) -> Rc<RefCell<Option<T>>> {
		let slot = Rc::new(RefCell::new(None));
		let out = slot.clone();
		self.host.spawn(
			async move {
				*out.borrow_mut() = Some(future.await);
			}
			.boxed_local(),
		);
		slot
	}
}

#[fixture]
pub fn log() -> EventLog {
	EventLog::default()
}

#[fixture]
pub fn browser() -> Browser {
	Browser::at("/")
}

//! View/layout contract and component resolution.
//!
//! Routes reference their view and layout through a [`ComponentRef`]: either
//! a [`ComponentFactory`] that can be called right away, or a [`LazyLoader`]
//! that produces one asynchronously (code-split chunks, remote templates).
//! The [`ComponentResolver`] turns either into a factory and memoizes lazy
//! results by loader identity.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::rc::{Rc, Weak};

use async_trait::async_trait;
use futures::FutureExt;
use futures::future::LocalBoxFuture;

use crate::context::NavigationContext;
use crate::debug_log;
use crate::error::{BoxError, Result, RouterError};

/// A view or layout instance.
///
/// Layout markup must contain the slot marker
/// [`SLOT_MARKER`](crate::commit::SLOT_MARKER) exactly once.
///
/// # Example
///
/// ```ignore
/// use minispa_router::{Component, ComponentFactory, NavigationContext};
///
/// struct PostView {
///     id: String,
/// }
///
/// #[async_trait::async_trait(?Send)]
/// impl Component for PostView {
///     async fn render(&self) -> Result<String, minispa_router::BoxError> {
///         Ok(format!("<h1>Post {}</h1>", self.id))
///     }
/// }
///
/// let post = ComponentFactory::new(|ctx: &NavigationContext| PostView {
///     id: ctx.param("id").unwrap_or_default().to_string(),
/// });
/// ```
#[async_trait(?Send)]
pub trait Component {
	/// Produces the component's markup.
	async fn render(&self) -> std::result::Result<String, BoxError>;

	/// Runs after the markup has been inserted into the document.
	fn mount(&self) {}

	/// Runs before the markup is removed from the document.
	fn destroy(&self) {}
}

type BuildFn = dyn Fn(&Rc<NavigationContext>) -> Rc<dyn Component>;

/// Builds a component instance from a navigation context.
///
/// Two factories are the same component type when they share the same
/// allocation; clone a factory instead of creating a new one when the
/// identity matters (layout reuse).
#[derive(Clone)]
pub struct ComponentFactory(Rc<BuildFn>);

impl ComponentFactory {
	/// Creates a factory from a constructor function.
	pub fn new<F, C>(build: F) -> Self
	where
		F: Fn(&NavigationContext) -> C + 'static,
		C: Component + 'static,
	{
		Self(Rc::new(move |ctx: &Rc<NavigationContext>| {
			Rc::new(build(&**ctx)) as Rc<dyn Component>
		}))
	}

	/// Creates a factory whose instances keep the shared context.
	pub fn with_shared_context<F, C>(build: F) -> Self
	where
		F: Fn(Rc<NavigationContext>) -> C + 'static,
		C: Component + 'static,
	{
		Self(Rc::new(move |ctx: &Rc<NavigationContext>| {
			Rc::new(build(ctx.clone())) as Rc<dyn Component>
		}))
	}

	/// Instantiates the component.
	pub fn build(&self, ctx: &Rc<NavigationContext>) -> Rc<dyn Component> {
		(self.0)(ctx)
	}

	/// Returns true when both factories are the same component type.
	pub fn same_as(&self, other: &ComponentFactory) -> bool {
		Rc::ptr_eq(&self.0, &other.0)
	}
}

impl fmt::Debug for ComponentFactory {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_tuple("ComponentFactory")
			.field(&Rc::as_ptr(&self.0).cast::<()>())
			.finish()
	}
}

type LoadFn = dyn Fn() -> LocalBoxFuture<'static, std::result::Result<ComponentFactory, BoxError>>;

/// Produces a [`ComponentFactory`] asynchronously.
///
/// Resolution is cached per loader allocation, so keep a single
/// `LazyLoader` (clones share identity) for each lazily loaded component.
#[derive(Clone)]
pub struct LazyLoader(Rc<LoadFn>);

impl LazyLoader {
	/// Creates a loader from an async function.
	pub fn new<F, Fut>(load: F) -> Self
	where
		F: Fn() -> Fut + 'static,
		Fut: Future<Output = std::result::Result<ComponentFactory, BoxError>> + 'static,
	{
		Self(Rc::new(move || load().boxed_local()))
	}

	fn load(&self) -> LocalBoxFuture<'static, std::result::Result<ComponentFactory, BoxError>> {
		(self.0)()
	}

	fn key(&self) -> usize {
		Rc::as_ptr(&self.0).cast::<()>() as usize
	}

	fn downgrade(&self) -> Weak<LoadFn> {
		Rc::downgrade(&self.0)
	}
}

impl fmt::Debug for LazyLoader {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_tuple("LazyLoader").field(&self.key()).finish()
	}
}

/// How a route refers to its view or layout.
#[derive(Debug, Clone)]
pub enum ComponentRef {
	/// Already constructed factory.
	Direct(ComponentFactory),
	/// Factory produced on first use.
	Lazy(LazyLoader),
}

impl From<ComponentFactory> for ComponentRef {
	fn from(factory: ComponentFactory) -> Self {
		Self::Direct(factory)
	}
}

impl From<LazyLoader> for ComponentRef {
	fn from(loader: LazyLoader) -> Self {
		Self::Lazy(loader)
	}
}

struct CacheEntry {
	loader: Weak<LoadFn>,
	factory: ComponentFactory,
}

/// Resolves [`ComponentRef`]s into factories, memoizing lazy loads.
#[derive(Default)]
pub struct ComponentResolver {
	cache: RefCell<HashMap<usize, CacheEntry>>,
}

impl fmt::Debug for ComponentResolver {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ComponentResolver")
			.field("cached", &self.cache.borrow().len())
			.finish()
	}
}

impl ComponentResolver {
	/// Creates an empty resolver.
	pub fn new() -> Self {
		Self::default()
	}

	/// Resolves a reference.
	///
	/// `route` is only used to label errors.
	///
	/// # Errors
	///
	/// Returns [`RouterError::Load`] when a lazy loader fails. Failures are
	/// not cached; the next navigation calls the loader again.
	pub async fn resolve(
		&self,
		reference: Option<&ComponentRef>,
		route: &str,
	) -> Result<Option<ComponentFactory>> {
		let loader = match reference {
			None => return Ok(None),
			Some(ComponentRef::Direct(factory)) => return Ok(Some(factory.clone())),
			Some(ComponentRef::Lazy(loader)) => loader,
		};

		if let Some(factory) = self.cached(loader) {
			return Ok(Some(factory));
		}

		debug_log!("loading component for {}", route);
		let factory = loader.load().await.map_err(|source| RouterError::Load {
			route: route.to_string(),
			source,
		})?;

		let mut cache = self.cache.borrow_mut();
		cache.retain(|_, entry| entry.loader.strong_count() > 0);
		cache.insert(
			loader.key(),
			CacheEntry {
				loader: loader.downgrade(),
				factory: factory.clone(),
			},
		);

		Ok(Some(factory))
	}

	/// Returns the number of live cached resolutions.
	pub fn cached_len(&self) -> usize {
		self.cache
			.borrow()
			.values()
			.filter(|entry| entry.loader.strong_count() > 0)
			.count()
	}

	fn cached(&self, loader: &LazyLoader) -> Option<ComponentFactory> {
		let cache = self.cache.borrow();
		let entry = cache.get(&loader.key())?;
		// A freed loader's address can be reused by a new allocation.
		let alive = entry.loader.upgrade()?;
		Rc::ptr_eq(&alive, &loader.0).then(|| entry.factory.clone())
	}
}

//! Layout composition, DOM swap and component lifecycle.
//!
//! A commit builds the leaf and its layouts, renders the leaf, wraps it
//! through the layouts from the innermost outwards by substituting
//! [`SLOT_MARKER`], writes the result into the target in a single mutation,
//! and then runs mount hooks: layouts outermost first, then the leaf.
//!
//! The innermost layout survives a navigation when the next route uses the
//! same layout factory. Its instance is kept and its previous markup is
//! reused, which keeps shared chrome (sidebars, headers) from flickering.

use std::rc::Rc;

use crate::component::{Component, ComponentFactory, ComponentResolver};
use crate::context::NavigationContext;
use crate::error::{Result, RouterError};
use crate::host::DomTarget;
use crate::route::CompiledRoute;
use crate::state::{MountedLayout, MountedView, RenderToken, SharedRenderState};
use crate::{debug_log, warn_log};

/// Marker a layout places where the inner content goes.
pub const SLOT_MARKER: &str = "<!-- router-slot -->";

/// Where and how a commit writes its markup.
#[derive(Clone, Default)]
pub struct CommitOptions {
	/// Element receiving the markup instead of the default target.
	pub target: Option<Rc<dyn DomTarget>>,
	/// Render only the leaf and keep the mounted layouts.
	pub leaf_only: bool,
}

impl CommitOptions {
	/// Full commit into the mount point.
	pub fn new() -> Self {
		Self::default()
	}

	/// Leaf-only commit.
	pub fn leaf_only() -> Self {
		Self {
			target: None,
			leaf_only: true,
		}
	}

	/// Writes into `target` instead of the default element.
	pub fn target(mut self, target: Rc<dyn DomTarget>) -> Self {
		self.target = Some(target);
		self
	}
}

impl std::fmt::Debug for CommitOptions {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("CommitOptions")
			.field("has_target", &self.target.is_some())
			.field("leaf_only", &self.leaf_only)
			.finish()
	}
}

/// How a commit ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
	/// The new content is in the DOM and mounted.
	Mounted,
	/// A newer render started; nothing was written.
	Stale,
}

/// Wraps `inner` through layout shells given innermost first.
///
/// # Errors
///
/// Returns [`RouterError::MissingSlot`] when a shell has no slot marker.
pub fn compose<'a>(inner: String, shells: impl IntoIterator<Item = &'a str>, route: &str) -> Result<String> {
	shells.into_iter().try_fold(inner, |html, shell| {
		match shell.matches(SLOT_MARKER).count() {
			0 => Err(RouterError::MissingSlot {
				route: route.to_string(),
				marker: SLOT_MARKER,
			}),
			1 => Ok(shell.replacen(SLOT_MARKER, &html, 1)),
			n => {
				warn_log!("layout for {} has {} slot markers; filling the first", route, n);
				Ok(shell.replacen(SLOT_MARKER, &html, 1))
			}
		}
	})
}

/// Everything a single render needs to touch the DOM and the render state.
pub(crate) struct CommitScope {
	pub(crate) token: RenderToken,
	pub(crate) state: SharedRenderState,
	pub(crate) resolver: Rc<ComponentResolver>,
	pub(crate) route: Rc<CompiledRoute>,
	pub(crate) ctx: Rc<NavigationContext>,
	pub(crate) mount_point: Rc<dyn DomTarget>,
	pub(crate) slot_selector: String,
	/// Innermost layout factory of the route being rendered.
	pub(crate) next_layout: Option<ComponentFactory>,
}

impl CommitScope {
	/// Whether the mounted innermost layout will be kept.
	pub(crate) fn same_layout(&self) -> bool {
		let Some(next) = &self.next_layout else {
			return false;
		};
		self.state
			.borrow()
			.innermost_layout()
			.is_some_and(|mounted| mounted.factory.same_as(next))
	}

	/// Destroys the mounted leaf and every layout that will not be reused.
	pub(crate) fn teardown(&self) {
		if self.token.is_stale() {
			return;
		}
		let keep_innermost = self.same_layout();
		let (view, layouts) = {
			let mut state = self.state.borrow_mut();
			let view = state.current_view.take();
			let split = state
				.current_layouts
				.len()
				.saturating_sub(usize::from(keep_innermost));
			let doomed: Vec<_> = state.current_layouts.drain(..split).collect();
			(view, doomed)
		};

		if let Some(view) = view {
			view.instance.destroy();
		}
		for layout in layouts.iter().rev() {
			layout.instance.destroy();
		}
		debug_log!("teardown for render {} (kept layout: {})", self.token.id(), keep_innermost);
	}

	/// Destroys only the mounted leaf.
	pub(crate) fn teardown_leaf(&self) {
		if self.token.is_stale() {
			return;
		}
		let view = self.state.borrow_mut().current_view.take();
		if let Some(view) = view {
			view.instance.destroy();
		}
	}

	/// Resolves, composes, swaps and mounts.
	pub(crate) async fn commit(&self, options: CommitOptions) -> Result<CommitOutcome> {
		if options.leaf_only {
			self.commit_leaf(options.target).await
		} else {
			self.commit_full(options.target).await
		}
	}

	async fn build_leaf(&self) -> Result<Option<Rc<dyn Component>>> {
		let factory = self
			.resolver
			.resolve(self.route.leaf(), self.route.full_path())
			.await?;
		Ok(factory.map(|f| f.build(&self.ctx)))
	}

	async fn render(&self, component: &dyn Component) -> Result<String> {
		component.render().await.map_err(|source| RouterError::Render {
			route: self.route.full_path().to_string(),
			source,
		})
	}

	async fn commit_full(&self, target: Option<Rc<dyn DomTarget>>) -> Result<CommitOutcome> {
		// Resolve layout factories outermost first.
		let mut factories = Vec::new();
		for (owner, layout) in self.route.layout_chain() {
			let factory = self.resolver.resolve(Some(layout), owner.full_path()).await?;
			if self.token.is_stale() {
				return Ok(CommitOutcome::Stale);
			}
			factories.extend(factory);
		}
		let leaf = self.build_leaf().await?;
		if self.token.is_stale() {
			return Ok(CommitOutcome::Stale);
		}

		// Preserve the mounted innermost layout when the factory is unchanged.
		let reused = {
			let state = self.state.borrow();
			match (state.innermost_layout(), factories.last()) {
				(Some(mounted), Some(next)) if mounted.factory.same_as(next) => {
					Some((mounted.instance.clone(), mounted.shell.clone()))
				}
				_ => None,
			}
		};
		let reused_index = reused.as_ref().map(|_| factories.len() - 1);

		let instances: Vec<Rc<dyn Component>> = factories
			.iter()
			.enumerate()
			.map(|(i, factory)| match (&reused, reused_index) {
				(Some((instance, _)), Some(idx)) if idx == i => instance.clone(),
				_ => factory.build(&self.ctx),
			})
			.collect();

		let mut html = match &leaf {
			Some(leaf) => {
				let html = self.render(leaf.as_ref()).await?;
				if self.token.is_stale() {
					return Ok(CommitOutcome::Stale);
				}
				html
			}
			None => String::new(),
		};

		let mut shells = vec![String::new(); instances.len()];
		for i in (0..instances.len()).rev() {
			let shell = match (&reused, reused_index) {
				(Some((_, shell)), Some(idx)) if idx == i => shell.clone(),
				_ => {
					let shell = self.render(instances[i].as_ref()).await?;
					if self.token.is_stale() {
						return Ok(CommitOutcome::Stale);
					}
					shell
				}
			};
			html = compose(html, [shell.as_str()], self.route.full_path())?;
			shells[i] = shell;
		}

		let target = target.unwrap_or_else(|| self.mount_point.clone());
		if self.token.is_stale() {
			return Ok(CommitOutcome::Stale);
		}
		target.set_inner_html(&html);

		let innermost = instances.last().cloned();
		let (old_view, leftovers) = {
			let mut state = self.state.borrow_mut();
			let old_view = state.current_view.take();
			let leftovers: Vec<MountedLayout> = state
				.current_layouts
				.drain(..)
				.filter(|mounted| {
					innermost
						.as_ref()
						.is_none_or(|kept| !(reused.is_some() && Rc::ptr_eq(&mounted.instance, kept)))
				})
				.collect();
			state.current_layouts = factories
				.into_iter()
				.zip(instances.iter().cloned())
				.zip(shells)
				.map(|((factory, instance), shell)| MountedLayout {
					factory,
					instance,
					shell,
				})
				.collect();
			state.current_view = leaf.clone().map(|instance| MountedView {
				instance,
				layout: innermost.clone(),
			});
			(old_view, leftovers)
		};

		// Hooks that skipped teardown still get their old components destroyed.
		if let Some(old) = old_view {
			old.instance.destroy();
		}
		for layout in leftovers.iter().rev() {
			layout.instance.destroy();
		}

		for layout in &instances {
			layout.mount();
		}
		if let Some(leaf) = &leaf {
			leaf.mount();
		}
		debug_log!(
			"render {} mounted {} with {} layout(s)",
			self.token.id(),
			self.ctx.path,
			instances.len()
		);
		Ok(CommitOutcome::Mounted)
	}

	async fn commit_leaf(&self, target: Option<Rc<dyn DomTarget>>) -> Result<CommitOutcome> {
		let leaf = self.build_leaf().await?;
		if self.token.is_stale() {
			return Ok(CommitOutcome::Stale);
		}
		let html = match &leaf {
			Some(leaf) => {
				let html = self.render(leaf.as_ref()).await?;
				if self.token.is_stale() {
					return Ok(CommitOutcome::Stale);
				}
				html
			}
			None => String::new(),
		};

		let target = target
			.or_else(|| self.mount_point.query_selector(&self.slot_selector))
			.unwrap_or_else(|| self.mount_point.clone());
		target.set_inner_html(&html);

		let old_view = {
			let mut state = self.state.borrow_mut();
			let layout = state.innermost_layout().map(|l| l.instance.clone());
			let old = state.current_view.take();
			state.current_view = leaf.clone().map(|instance| MountedView { instance, layout });
			old
		};
		if let Some(old) = old_view {
			old.instance.destroy();
		}
		if let Some(leaf) = &leaf {
			leaf.mount();
		}
		debug_log!("render {} swapped leaf for {}", self.token.id(), self.ctx.path);
		Ok(CommitOutcome::Mounted)
	}
}

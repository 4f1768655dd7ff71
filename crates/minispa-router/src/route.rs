//! Route definitions and the flattened route table.
//!
//! Applications describe routes as a tree of [`RouteDef`]s. The tree is
//! flattened once, at router construction, into [`CompiledRoute`]s that carry
//! their absolute path, their compiled matcher and the chain of ancestors
//! used for layout composition and guard chaining.

use std::fmt;
use std::rc::Rc;

use crate::component::ComponentRef;
use crate::error::Result;
use crate::guard::Guard;
use crate::hook::AnimationHook;
use crate::path::{CATCH_ALL, Params, PathPattern, normalize_path};
use crate::transition::{PhaseTransition, TransitionFn};

/// A node of the author-supplied route tree.
///
/// # Example
///
/// ```ignore
/// use minispa_router::RouteDef;
///
/// let routes = vec![
///     RouteDef::new("/").view(home),
///     RouteDef::new("/dash")
///         .layout(dashboard_layout)
///         .before_enter(require_login)
///         .child(RouteDef::new("stats").view(stats))
///         .child(RouteDef::new("posts/:id").view(post_lazy)),
///     RouteDef::new("*").view(not_found),
/// ];
/// ```
#[derive(Clone, Default)]
pub struct RouteDef {
	path: String,
	view: Option<ComponentRef>,
	component: Option<ComponentRef>,
	layout: Option<ComponentRef>,
	before_enter: Option<Guard>,
	children: Vec<RouteDef>,
	transition: Option<TransitionFn>,
	animation_hook: Option<Rc<dyn AnimationHook>>,
}

impl RouteDef {
	/// Creates a route for `path` (absolute when it starts with `/`).
	pub fn new(path: impl Into<String>) -> Self {
		Self {
			path: path.into(),
			..Self::default()
		}
	}

	/// Sets the view rendered when this route is the leaf.
	pub fn view(mut self, view: impl Into<ComponentRef>) -> Self {
		self.view = Some(view.into());
		self
	}

	/// Sets the component rendered when this route is the leaf.
	///
	/// Takes precedence over [`view`](Self::view).
	pub fn component(mut self, component: impl Into<ComponentRef>) -> Self {
		self.component = Some(component.into());
		self
	}

	/// Sets the layout wrapping this route's descendants.
	pub fn layout(mut self, layout: impl Into<ComponentRef>) -> Self {
		self.layout = Some(layout.into());
		self
	}

	/// Sets the guard run before entering this route or any descendant.
	pub fn before_enter(mut self, guard: Guard) -> Self {
		self.before_enter = Some(guard);
		self
	}

	/// Appends a child route.
	pub fn child(mut self, child: RouteDef) -> Self {
		self.children.push(child);
		self
	}

	/// Appends several child routes.
	pub fn children(mut self, children: impl IntoIterator<Item = RouteDef>) -> Self {
		self.children.extend(children);
		self
	}

	/// Sets a two-phase transition callback for this route.
	///
	/// Ignored when [`animation_hook`](Self::animation_hook) is also set.
	pub fn transition(mut self, transition: TransitionFn) -> Self {
		self.transition = Some(transition);
		self
	}

	/// Overrides the animation hook for this route and its descendants.
	pub fn animation_hook(mut self, hook: Rc<dyn AnimationHook>) -> Self {
		self.animation_hook = Some(hook);
		self
	}

	fn effective_hook(&self) -> Option<Rc<dyn AnimationHook>> {
		self.animation_hook.clone().or_else(|| {
			self.transition
				.clone()
				.map(|t| Rc::new(PhaseTransition::new(t)) as Rc<dyn AnimationHook>)
		})
	}
}

impl fmt::Debug for RouteDef {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("RouteDef")
			.field("path", &self.path)
			.field("has_view", &(self.view.is_some() || self.component.is_some()))
			.field("has_layout", &self.layout.is_some())
			.field("has_guard", &self.before_enter.is_some())
			.field("children", &self.children)
			.finish()
	}
}

/// A flattened route with its ancestor chain.
pub struct CompiledRoute {
	path: String,
	full_path: String,
	pattern: PathPattern,
	view: Option<ComponentRef>,
	component: Option<ComponentRef>,
	layout: Option<ComponentRef>,
	before_enter: Option<Guard>,
	animation_hook: Option<Rc<dyn AnimationHook>>,
	parents: Rc<[Rc<CompiledRoute>]>,
}

impl fmt::Debug for CompiledRoute {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("CompiledRoute")
			.field("path", &self.path)
			.field("full_path", &self.full_path)
			.field("catch_all", &self.is_catch_all())
			.field(
				"parents",
				&self.parents.iter().map(|p| p.full_path.as_str()).collect::<Vec<_>>(),
			)
			.finish()
	}
}

impl CompiledRoute {
	/// Local path as written in the definition.
	pub fn path(&self) -> &str {
		&self.path
	}

	/// Absolute, trailing-slash-normalized path.
	pub fn full_path(&self) -> &str {
		&self.full_path
	}

	/// Compiled matcher.
	pub fn pattern(&self) -> &PathPattern {
		&self.pattern
	}

	/// Returns true for the catch-all route.
	pub fn is_catch_all(&self) -> bool {
		self.pattern.is_catch_all()
	}

	/// The component rendered as leaf (`component` wins over `view`).
	pub fn leaf(&self) -> Option<&ComponentRef> {
		self.component.as_ref().or(self.view.as_ref())
	}

	/// Returns true when the route renders something as a leaf.
	pub fn has_view(&self) -> bool {
		self.leaf().is_some()
	}

	/// Layout wrapping this route's descendants.
	pub fn layout(&self) -> Option<&ComponentRef> {
		self.layout.as_ref()
	}

	/// Guard run before entering this route.
	pub fn before_enter(&self) -> Option<&Guard> {
		self.before_enter.as_ref()
	}

	/// Animation hook declared on this route itself.
	pub fn animation_hook(&self) -> Option<&Rc<dyn AnimationHook>> {
		self.animation_hook.as_ref()
	}

	/// Ancestors, outermost first; the last one is the immediate parent.
	pub fn parents(&self) -> &[Rc<CompiledRoute>] {
		&self.parents
	}

	/// Layout references of the ancestors, outermost first.
	pub fn layout_chain(&self) -> impl Iterator<Item = (&CompiledRoute, &ComponentRef)> {
		self.parents
			.iter()
			.filter_map(|p| p.layout.as_ref().map(|layout| (p.as_ref(), layout)))
	}

	/// Nearest animation hook: this route, then ancestors innermost first.
	pub fn nearest_animation_hook(&self) -> Option<Rc<dyn AnimationHook>> {
		self.animation_hook
			.clone()
			.or_else(|| self.parents.iter().rev().find_map(|p| p.animation_hook.clone()))
	}
}

fn join_path(base: &str, path: &str) -> String {
	if path.starts_with('/') {
		path.to_string()
	} else if base == "/" {
		format!("/{}", path)
	} else {
		format!("{}/{}", base, path)
	}
}

/// Flattens a route tree depth-first (each parent before its children).
///
/// Relative paths are joined onto the parent's absolute path; absolute paths
/// are kept as written. Every entry receives the chain of its ancestors.
///
/// # Errors
///
/// Returns [`RouterError::InvalidPattern`](crate::RouterError::InvalidPattern)
/// when a path cannot be compiled.
pub fn flatten(tree: &[RouteDef], base_path: &str) -> Result<Vec<Rc<CompiledRoute>>> {
	let mut out = Vec::new();
	flatten_into(tree, base_path, &Rc::from(Vec::new()), &mut out)?;
	Ok(out)
}

fn flatten_into(
	tree: &[RouteDef],
	base: &str,
	parents: &Rc<[Rc<CompiledRoute>]>,
	out: &mut Vec<Rc<CompiledRoute>>,
) -> Result<()> {
	for def in tree {
		let full_path = normalize_path(&join_path(base, &def.path));
		let pattern = if def.path == CATCH_ALL {
			PathPattern::compile(CATCH_ALL)?
		} else {
			PathPattern::compile(&full_path)?
		};

		let entry = Rc::new(CompiledRoute {
			path: def.path.clone(),
			full_path: full_path.clone(),
			pattern,
			view: def.view.clone(),
			component: def.component.clone(),
			layout: def.layout.clone(),
			before_enter: def.before_enter.clone(),
			animation_hook: def.effective_hook(),
			parents: parents.clone(),
		});
		out.push(entry.clone());

		if !def.children.is_empty() {
			let chain: Rc<[Rc<CompiledRoute>]> = parents.iter().cloned().chain(std::iter::once(entry)).collect();
			flatten_into(&def.children, &full_path, &chain, out)?;
		}
	}
	Ok(())
}

/// A successful route lookup.
#[derive(Debug, Clone)]
pub struct RouteMatch {
	/// The matched route.
	pub route: Rc<CompiledRoute>,
	/// Extracted path parameters.
	pub params: Params,
}

/// The flattened, compiled route table.
#[derive(Debug)]
pub struct RouteTable {
	routes: Vec<Rc<CompiledRoute>>,
	not_found: Option<Rc<CompiledRoute>>,
}

impl RouteTable {
	/// Compiles a route tree.
	///
	/// The not-found route is the first catch-all, or else the route whose
	/// absolute or local path equals `not_found_path`.
	pub fn build(tree: &[RouteDef], not_found_path: Option<&str>) -> Result<Self> {
		let routes = flatten(tree, "/")?;
		let not_found = routes.iter().find(|r| r.is_catch_all()).cloned().or_else(|| {
			let wanted = not_found_path?;
			routes
				.iter()
				.find(|r| r.full_path == wanted || r.path == wanted)
				.cloned()
		});

		Ok(Self { routes, not_found })
	}

	/// All compiled routes in flattening order.
	pub fn routes(&self) -> &[Rc<CompiledRoute>] {
		&self.routes
	}

	/// Route rendered when nothing matches.
	pub fn not_found(&self) -> Option<&Rc<CompiledRoute>> {
		self.not_found.as_ref()
	}

	/// Finds the best route for a normalized pathname.
	///
	/// Among all matching routes, a specific route always beats the catch-all,
	/// then routes with a view beat view-less ones, then longer absolute paths
	/// win, then deeper nesting. Remaining ties keep table order.
	pub fn match_path(&self, pathname: &str) -> Option<RouteMatch> {
		self.routes
			.iter()
			.filter_map(|route| {
				route.pattern.matches(pathname).map(|params| RouteMatch {
					route: route.clone(),
					params,
				})
			})
			.min_by(|a, b| {
				let key = |m: &RouteMatch| {
					(
						m.route.is_catch_all(),
						!m.route.has_view(),
						std::cmp::Reverse(m.route.full_path.len()),
						std::cmp::Reverse(m.route.parents.len()),
					)
				};
				key(a).cmp(&key(b))
			})
	}

	/// Resolves a pathname to a route, falling back to the not-found route.
	pub fn resolve(&self, pathname: &str) -> Option<RouteMatch> {
		self.match_path(pathname).or_else(|| {
			self.not_found.clone().map(|route| RouteMatch {
				route,
				params: Params::new(),
			})
		})
	}
}

//! Client-side router for single-page applications.
//!
//! The router matches the browser location against a nested route table,
//! runs `before_enter` guards from the outermost route inwards, resolves
//! (possibly lazily loaded) views and layouts, composes their markup through
//! the [`SLOT_MARKER`] and swaps it into the mount point. How and when the
//! swap happens is left to a pluggable [`AnimationHook`].
//!
//! ## Architecture
//!
//! - [`path`]: pattern compilation and URL helpers
//! - [`route`]: route tree flattening and ranking
//! - [`context`]: per-navigation context
//! - [`guard`]: guard chain runner
//! - [`component`]: component contract and lazy resolution
//! - [`commit`]: layout composition and the DOM swap
//! - [`hook`]: animation hook protocol
//! - [`render`]: the render pipeline
//! - [`router`]: public navigation API
//! - [`host`]: browser abstraction (`web-sys` on wasm32, in-memory elsewhere)
//!
//! Everything is single-threaded. Overlapping navigations are resolved by a
//! monotonic render id: a render that resumes after a newer one started stops
//! without touching the DOM.
//!
//! ## Example
//!
//! ```ignore
//! use std::rc::Rc;
//! use minispa_router::*;
//!
//! let dashboard = ComponentFactory::new(|_| DashboardLayout);
//! let post = LazyLoader::new(|| async { Ok(ComponentFactory::new(PostView::from_context)) });
//!
//! let router = Router::new(
//!     RouterOptions::new([
//!         RouteDef::new("/").view(ComponentFactory::new(|_| Home)),
//!         RouteDef::new("/dash")
//!             .layout(dashboard)
//!             .before_enter(guards::require_auth(session, Default::default()))
//!             .child(RouteDef::new("posts/:id").view(post)),
//!         RouteDef::new("*").view(ComponentFactory::new(|_| NotFound)),
//!     ])
//!     .animation_hook(Rc::new(ClassTransition::new("fade"))),
//!     Rc::new(BrowserHost::new()?),
//! )?;
//! router.start()?;
//! ```

pub mod logging;

pub mod commit;
pub mod component;
pub mod config;
pub mod context;
pub mod error;
pub mod guard;
pub mod guards;
pub mod hook;
pub mod host;
pub mod link;
pub mod path;
pub mod render;
pub mod route;
pub mod router;
pub mod state;
pub mod transition;

pub use commit::{CommitOptions, CommitOutcome, SLOT_MARKER, compose};
pub use component::{Component, ComponentFactory, ComponentRef, ComponentResolver, LazyLoader};
pub use config::{BeforeNavigate, RouterOptions, RouterSettings};
pub use context::{NavigationContext, build_context};
pub use error::{BoxError, Result, RouterError};
pub use guard::{Guard, GuardDecision, GuardOutcome, run_guards};
pub use hook::{AnimationHook, HardSwap, RenderContext, RenderHelpers};
pub use host::memory::{MemoryElement, MemoryHost};
#[cfg(target_arch = "wasm32")]
pub use host::web::{BrowserElement, BrowserHost};
pub use host::{DomTarget, Host, Location, Subscription};
pub use link::{LinkClick, LinkTarget};
pub use path::{Params, PathPattern, Query};
pub use render::{NOT_FOUND_HTML, RenderOutcome};
pub use route::{CompiledRoute, RouteDef, RouteMatch, RouteTable, flatten};
pub use router::{NavigateOptions, NavigateOutcome, Router, SkipReason};
pub use state::{RenderState, RenderToken};
pub use transition::{ClassTransition, Phase, PhaseTransition, PreserveLayoutSwap, TransitionFn};

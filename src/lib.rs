//! # minispa
//!
//! A client-side router for single-page applications compiled to WebAssembly.
//!
//! minispa maps `history` URLs onto a tree of routes, runs navigation guards,
//! resolves (optionally lazy) views and nested layouts, and commits the result
//! to a mount element through a pluggable animation hook. Every await in the
//! render pipeline is cancellation-aware: a newer navigation always wins.
//!
//! ## Feature Flags
//!
//! - `debug-hooks` - Trace-level logging of each render pipeline step
//!
//! ## Quick Example
//!
//! ```rust,ignore
//! use minispa::prelude::*;
//! use std::rc::Rc;
//!
//! struct Home;
//!
//! #[async_trait(?Send)]
//! impl Component for Home {
//!     async fn render(&self) -> Result<String, BoxError> {
//!         Ok("<h1>Home</h1>".to_string())
//!     }
//! }
//!
//! let routes = [
//!     RouteDef::new("/").view(ComponentFactory::new(|_| Home)),
//!     RouteDef::new("/dash")
//!         .layout(dashboard_layout)
//!         .children([
//!             RouteDef::new("stats").view(stats_view),
//!             RouteDef::new("settings").view(LazyLoader::new(load_settings)),
//!         ]),
//! ];
//!
//! let router = Router::new(
//!     RouterOptions::new(routes).animation_hook(Rc::new(ClassTransition::new("fade"))),
//!     Rc::new(BrowserHost::new()?),
//! )?;
//! router.start()?;
//! ```
//!
//! ## Testing without a browser
//!
//! [`MemoryHost`] keeps history and elements in memory and drives spawned
//! renders on a local executor, so routers can be tested natively.

pub use minispa_router::*;

/// Common imports for applications.
pub mod prelude {
	pub use minispa_router::{
		AnimationHook, BoxError, ClassTransition, CommitOptions, Component, ComponentFactory, Guard, GuardOutcome,
		HardSwap, Host, LazyLoader, MemoryHost, NavigateOptions, NavigationContext, PreserveLayoutSwap,
		RenderContext, RenderHelpers, RouteDef, Router, RouterError, RouterOptions,
	};

	#[cfg(target_arch = "wasm32")]
	pub use minispa_router::BrowserHost;

	// External
	pub use async_trait::async_trait;
}

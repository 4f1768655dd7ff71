//! Integration tests for the navigation controller
//!
//! These tests drive a [`Router`] against the in-memory host:
//! 1. End-to-end rendering of a parameterized route
//! 2. Not-found handling
//! 3. `navigate_to` skip rules (busy, same location, interceptor)
//! 4. Guards: block, redirect, redirect loops
//! 5. Event wiring: start/stop, popstate, link clicks, error reporting

mod utils;

use std::cell::RefCell;
use std::rc::Rc;

use async_trait::async_trait;
use futures::channel::oneshot;
use futures::executor::block_on;
use minispa_router::{
	BeforeNavigate, BoxError, Component, ComponentFactory, DomTarget, Guard, GuardOutcome, Host, LinkClick, LinkTarget,
	NOT_FOUND_HTML, NavigateOptions, NavigateOutcome, NavigationContext, RenderOutcome, RouteDef, RouterError,
	RouterOptions, SkipReason,
};
use rstest::rstest;
use serde_json::json;
use utils::{Browser, EventLog, browser, capturing_view, log, suspended_loader, view};

fn rendered(outcome: RenderOutcome) -> NavigateOutcome {
	NavigateOutcome::Rendered(outcome)
}

/// An interceptor that parks every check until its gate is opened, in the
/// order the checks started.
#[derive(Clone, Default)]
struct GatedInterceptor {
	gates: Rc<RefCell<Vec<oneshot::Sender<()>>>>,
}

impl GatedInterceptor {
	fn check(&self) -> BeforeNavigate {
		let gates = self.gates.clone();
		BeforeNavigate::future(move |_to: String| {
			let (open, opened) = oneshot::channel::<()>();
			gates.borrow_mut().push(open);
			async move { opened.await.is_ok() }
		})
	}

	fn waiting(&self) -> usize {
		self.gates.borrow().len()
	}

	fn open(&self, index: usize) {
		let gate = self.gates.borrow_mut().remove(index);
		gate.send(()).unwrap();
	}
}

/// A post page rendering its id, `tab` query parameter and fragment.
struct PostView {
	ctx: NavigationContext,
}

#[async_trait(?Send)]
impl Component for PostView {
	async fn render(&self) -> Result<String, BoxError> {
		Ok(format!(
			"<article id=\"{}\" tab=\"{}\" hash=\"{}\"></article>",
			self.ctx.param("id").unwrap_or_default(),
			self.ctx.query_param("tab").unwrap_or_default(),
			self.ctx.hash
		))
	}
}

struct Broken;

#[async_trait(?Send)]
impl Component for Broken {
	async fn render(&self) -> Result<String, BoxError> {
		Err("template exploded".into())
	}
}

// ============================================================================
// Rendering
// ============================================================================

#[rstest]
fn test_post_route_end_to_end(browser: Browser, log: EventLog) {
	let seen = Rc::new(RefCell::new(None));
	let router = browser.router(RouterOptions::new([
		RouteDef::new("/").view(view("home", &log)),
		RouteDef::new("/posts/:id").view(ComponentFactory::new({
			let seen = seen.clone();
			move |ctx: &NavigationContext| {
				*seen.borrow_mut() = Some(ctx.clone());
				PostView { ctx: ctx.clone() }
			}
		})),
	]));

	let outcome = block_on(router.navigate_to("/posts/42?tab=x#c", NavigateOptions::default())).unwrap();

	assert_eq!(outcome, rendered(RenderOutcome::Mounted));
	assert_eq!(browser.app.inner_html(), "<article id=\"42\" tab=\"x\" hash=\"c\"></article>");
	let ctx = seen.borrow().clone().unwrap();
	assert_eq!(ctx.path, "/posts/42");
	assert_eq!(ctx.param("id"), Some("42"));
	assert_eq!(ctx.query_param("tab"), Some("x"));
	assert_eq!(ctx.hash, "c");
	assert_eq!(ctx.state, None);
	assert!(!router.is_busy());
	assert_eq!(router.current_path(), "/posts/42");
}

#[rstest]
fn test_percent_encoded_param_is_decoded(browser: Browser, log: EventLog) {
	let seen = Rc::new(RefCell::new(None));
	let router = browser.router(RouterOptions::new([
		RouteDef::new("/tags/:tag").view(capturing_view("tag", &seen, &log)),
	]));

	block_on(router.navigate_to("/tags/rust%20lang", NavigateOptions::default())).unwrap();

	assert_eq!(seen.borrow().as_ref().unwrap().param("tag"), Some("rust lang"));
}

#[rstest]
fn test_not_found_placeholder_releases_busy(log: EventLog) {
	let browser = Browser::at("/nowhere");
	let router = browser.router(RouterOptions::new([RouteDef::new("/").view(view("home", &log))]));

	router.start().unwrap();
	browser.host.run_until_stalled();

	assert_eq!(browser.app.inner_html(), NOT_FOUND_HTML);
	assert!(!router.is_busy());
	assert_eq!(router.render_id(), 1);
}

#[rstest]
fn test_not_found_unmounts_previous_view(browser: Browser, log: EventLog) {
	let router = browser.router(RouterOptions::new([RouteDef::new("/a").view(view("a", &log))]));

	block_on(router.navigate_to("/a", NavigateOptions::default())).unwrap();
	let outcome = block_on(router.navigate_to("/missing", NavigateOptions::default())).unwrap();

	assert_eq!(outcome, rendered(RenderOutcome::NotFound));
	assert!(log.contains("destroy:a"));
	assert!(router.with_state(|s| s.current_view().is_none()));
}

#[rstest]
fn test_catch_all_renders_for_unknown_paths(browser: Browser, log: EventLog) {
	let router = browser.router(RouterOptions::new([
		RouteDef::new("/").view(view("home", &log)),
		RouteDef::new("*").view(view("fallback", &log)),
	]));

	block_on(router.navigate_to("/deep/unknown/path", NavigateOptions::default())).unwrap();
	assert_eq!(browser.app.inner_html(), "<p>fallback</p>");

	block_on(router.navigate_to("/", NavigateOptions::default())).unwrap();
	assert_eq!(browser.app.inner_html(), "<p>home</p>");
}

#[rstest]
fn test_explicit_not_found_path(browser: Browser, log: EventLog) {
	let router = browser.router(
		RouterOptions::new([
			RouteDef::new("/").view(view("home", &log)),
			RouteDef::new("/404").view(view("missing", &log)),
		])
		.not_found_path("/404"),
	);

	block_on(router.navigate_to("/nope", NavigateOptions::default())).unwrap();

	assert_eq!(browser.app.inner_html(), "<p>missing</p>");
	assert_eq!(browser.path(), "/nope");
}

// ============================================================================
// navigate_to skip rules
// ============================================================================

#[rstest]
fn test_navigate_to_current_location_is_noop(browser: Browser, log: EventLog) {
	let router = browser.router(RouterOptions::new([RouteDef::new("/a").view(view("a", &log))]));
	block_on(router.navigate_to("/a", NavigateOptions::default())).unwrap();
	let history_len = browser.host.history().len();
	let render_id = router.render_id();
	log.clear();

	let outcome = block_on(router.navigate_to("/a", NavigateOptions::default())).unwrap();

	assert_eq!(outcome, NavigateOutcome::Skipped(SkipReason::SameLocation));
	assert_eq!(browser.host.history().len(), history_len);
	assert_eq!(router.render_id(), render_id);
	assert!(log.events().is_empty());
}

#[rstest]
#[case::replace(NavigateOptions::replace())]
#[case::force(NavigateOptions::push().forced())]
fn test_same_location_renders_when_replaced_or_forced(
	browser: Browser,
	log: EventLog,
	#[case] options: NavigateOptions,
) {
	let router = browser.router(RouterOptions::new([RouteDef::new("/a").view(view("a", &log))]));
	block_on(router.navigate_to("/a", NavigateOptions::default())).unwrap();

	let outcome = block_on(router.navigate_to("/a", options)).unwrap();

	assert_eq!(outcome, rendered(RenderOutcome::Mounted));
	assert_eq!(log.count("render:a"), 2);
}

#[rstest]
fn test_busy_router_skips_unforced_navigation(browser: Browser, log: EventLog) {
	let (loader, release) = suspended_loader();
	let router = browser.router(RouterOptions::new([
		RouteDef::new("/slow").view(loader),
		RouteDef::new("/b").view(view("b", &log)),
	]));

	let slow = browser.spawn({
		let router = router.clone();
		async move { router.navigate_to("/slow", NavigateOptions::default()).await }
	});
	browser.host.run_until_stalled();
	assert!(router.is_busy());

	let skipped = block_on(router.navigate_to("/b", NavigateOptions::default())).unwrap();
	assert_eq!(skipped, NavigateOutcome::Skipped(SkipReason::Busy));
	assert_eq!(browser.path(), "/slow");

	let forced = block_on(router.navigate_to("/b", NavigateOptions::push().forced())).unwrap();
	assert_eq!(forced, rendered(RenderOutcome::Mounted));

	release.send(view("slow", &log)).ok().unwrap();
	browser.host.run_until_stalled();

	let slow = slow.borrow_mut().take().unwrap().unwrap();
	assert_eq!(slow, rendered(RenderOutcome::Stale));
	assert_eq!(browser.app.inner_html(), "<p>b</p>");
	assert!(!router.is_busy());
}

#[rstest]
fn test_pending_interceptor_keeps_router_busy(browser: Browser, log: EventLog) {
	let interceptor = GatedInterceptor::default();
	let router = browser.router(
		RouterOptions::new([
			RouteDef::new("/a").view(view("a", &log)),
			RouteDef::new("/b").view(view("b", &log)),
		])
		.on_before_navigate(interceptor.check()),
	);

	let first = browser.spawn({
		let router = router.clone();
		async move { router.navigate_to("/a", NavigateOptions::default()).await }
	});
	browser.host.run_until_stalled();
	assert!(router.is_busy());
	assert_eq!(router.render_id(), 1);

	let second = browser.spawn({
		let router = router.clone();
		async move { router.navigate_to("/b", NavigateOptions::default()).await }
	});
	browser.host.run_until_stalled();
	assert_eq!(
		second.borrow_mut().take().unwrap().unwrap(),
		NavigateOutcome::Skipped(SkipReason::Busy)
	);
	assert_eq!(interceptor.waiting(), 1);

	interceptor.open(0);
	browser.host.run_until_stalled();

	assert_eq!(first.borrow_mut().take().unwrap().unwrap(), rendered(RenderOutcome::Mounted));
	let paths: Vec<String> = browser.host.history().into_iter().map(|l| l.pathname).collect();
	assert_eq!(paths, ["/", "/a"]);
	assert_eq!(browser.app.inner_html(), "<p>a</p>");
	assert!(!router.is_busy());
}

#[rstest]
fn test_forced_navigation_wins_over_pending_interceptor(browser: Browser, log: EventLog) {
	let interceptor = GatedInterceptor::default();
	let router = browser.router(
		RouterOptions::new([
			RouteDef::new("/a").view(view("a", &log)),
			RouteDef::new("/b").view(view("b", &log)),
		])
		.on_before_navigate(interceptor.check()),
	);

	let first = browser.spawn({
		let router = router.clone();
		async move { router.navigate_to("/a", NavigateOptions::default()).await }
	});
	browser.host.run_until_stalled();
	let second = browser.spawn({
		let router = router.clone();
		async move { router.navigate_to("/b", NavigateOptions::push().forced()).await }
	});
	browser.host.run_until_stalled();
	assert_eq!(interceptor.waiting(), 2);

	interceptor.open(1);
	browser.host.run_until_stalled();
	interceptor.open(0);
	browser.host.run_until_stalled();

	assert_eq!(second.borrow_mut().take().unwrap().unwrap(), rendered(RenderOutcome::Mounted));
	assert_eq!(first.borrow_mut().take().unwrap().unwrap(), rendered(RenderOutcome::Stale));
	let paths: Vec<String> = browser.host.history().into_iter().map(|l| l.pathname).collect();
	assert_eq!(paths, ["/", "/b"]);
	assert_eq!(browser.app.inner_html(), "<p>b</p>");
	assert!(!log.contains("render:a"));
	assert!(!router.is_busy());
}

#[rstest]
fn test_default_interceptor_rejects_api_urls(browser: Browser, log: EventLog) {
	let router = browser.router(RouterOptions::new([RouteDef::new("/").view(view("home", &log))]));

	let outcome = block_on(router.navigate_to("/api/users", NavigateOptions::default())).unwrap();

	assert_eq!(outcome, NavigateOutcome::Skipped(SkipReason::Intercepted));
	assert_eq!(browser.host.history().len(), 1);
}

#[rstest]
fn test_custom_async_interceptor(browser: Browser, log: EventLog) {
	let router = browser.router(
		RouterOptions::new([
			RouteDef::new("/").view(view("home", &log)),
			RouteDef::new("/admin").view(view("admin", &log)),
		])
		.on_before_navigate(BeforeNavigate::future(|to| async move { to != "/admin" })),
	);

	let outcome = block_on(router.navigate_to("/admin", NavigateOptions::default())).unwrap();
	assert_eq!(outcome, NavigateOutcome::Skipped(SkipReason::Intercepted));

	let router = browser.router(
		RouterOptions::new([RouteDef::new("/api/ok").view(view("api", &log))]).without_before_navigate(),
	);
	let outcome = block_on(router.navigate_to("/api/ok", NavigateOptions::default())).unwrap();
	assert_eq!(outcome, rendered(RenderOutcome::Mounted));
}

#[rstest]
fn test_cross_origin_navigation_is_an_error(browser: Browser, log: EventLog) {
	let router = browser.router(RouterOptions::new([RouteDef::new("/").view(view("home", &log))]));

	let err = block_on(router.navigate_to("https://elsewhere.test/", NavigateOptions::default())).unwrap_err();

	assert!(matches!(err, RouterError::History(_)));
}

// ============================================================================
// Guards
// ============================================================================

#[rstest]
fn test_blocking_guard_keeps_current_content(browser: Browser, log: EventLog) {
	let router = browser.router(RouterOptions::new([
		RouteDef::new("/a").view(view("a", &log)),
		RouteDef::new("/locked").before_enter(Guard::new(|_| false)).view(view("locked", &log)),
	]));
	block_on(router.navigate_to("/a", NavigateOptions::default())).unwrap();

	let outcome = block_on(router.navigate_to("/locked", NavigateOptions::default())).unwrap();

	assert_eq!(outcome, rendered(RenderOutcome::Blocked));
	assert_eq!(browser.app.inner_html(), "<p>a</p>");
	assert!(!log.contains("destroy:a"));
	assert!(!router.is_busy());
}

#[rstest]
fn test_redirect_replaces_history_entry(browser: Browser, log: EventLog) {
	let router = browser.router(RouterOptions::new([
		RouteDef::new("/").view(view("home", &log)),
		RouteDef::new("/login").view(view("login", &log)),
		RouteDef::new("/private")
			.before_enter(Guard::new(|_| GuardOutcome::Redirect("/login".into())))
			.view(view("private", &log)),
	]));

	let outcome = block_on(router.navigate_to("/private", NavigateOptions::default())).unwrap();

	assert_eq!(outcome, rendered(RenderOutcome::Redirected("/login".to_string())));
	assert_eq!(browser.path(), "/login");
	assert_eq!(browser.host.history().len(), 2);
	assert_eq!(browser.app.inner_html(), "<p>login</p>");
	assert!(!log.contains("render:private"));
}

#[rstest]
fn test_refused_redirect_blocks_navigation(browser: Browser, log: EventLog) {
	let router = browser.router(RouterOptions::new([
		RouteDef::new("/").view(view("home", &log)),
		RouteDef::new("/p")
			.before_enter(Guard::new(|_| "/api/login"))
			.view(view("p", &log)),
	]));

	let outcome = block_on(router.navigate_to("/p", NavigateOptions::default())).unwrap();

	assert_eq!(outcome, rendered(RenderOutcome::Blocked));
	assert_eq!(browser.path(), "/p");
	assert_eq!(browser.app.write_count(), 0);
	assert!(!log.contains("render:p"));
	assert!(!router.is_busy());
}

#[rstest]
fn test_redirect_loop_is_bounded(browser: Browser, log: EventLog) {
	let router = browser.router(
		RouterOptions::new([
			RouteDef::new("/ping").before_enter(Guard::new(|_| "/pong")).view(view("ping", &log)),
			RouteDef::new("/pong").before_enter(Guard::new(|_| "/ping")).view(view("pong", &log)),
		])
		.max_redirects(3),
	);

	let err = block_on(router.navigate_to("/ping", NavigateOptions::default())).unwrap_err();

	assert!(matches!(err, RouterError::RedirectLoop { limit: 3, .. }));
	assert!(!router.is_busy());
}

#[rstest]
fn test_failing_guard_aborts_render(browser: Browser, log: EventLog) {
	let router = browser.router(RouterOptions::new([RouteDef::new("/g")
		.before_enter(Guard::try_new(|_| Err::<bool, BoxError>("session store down".into())))
		.view(view("g", &log))]));

	let err = block_on(router.navigate_to("/g", NavigateOptions::default())).unwrap_err();

	assert!(matches!(err, RouterError::Guard { ref route, .. } if route == "/g"));
	assert!(log.events().is_empty());
}

// ============================================================================
// Events
// ============================================================================

#[rstest]
fn test_start_and_stop_are_idempotent(browser: Browser, log: EventLog) {
	let router = browser.router(RouterOptions::new([RouteDef::new("/").view(view("home", &log))]));

	router.start().unwrap();
	router.start().unwrap();
	assert!(router.is_started());
	assert_eq!(browser.host.listener_count(), 2);
	browser.host.run_until_stalled();
	assert_eq!(log.count("mount:home"), 1);

	router.stop();
	router.stop();
	assert!(!router.is_started());
	assert_eq!(browser.host.listener_count(), 0);
}

#[rstest]
fn test_popstate_renders_entry_with_its_state(browser: Browser, log: EventLog) {
	let seen = Rc::new(RefCell::new(None));
	let router = browser.router(RouterOptions::new([
		RouteDef::new("/").view(view("home", &log)),
		RouteDef::new("/a").view(capturing_view("a", &seen, &log)),
		RouteDef::new("/b").view(view("b", &log)),
	]));
	router.start().unwrap();
	browser.host.run_until_stalled();

	block_on(router.navigate_to("/a", NavigateOptions::push().with_state(json!({ "from": "test" })))).unwrap();
	block_on(router.navigate_to("/b", NavigateOptions::default())).unwrap();
	seen.borrow_mut().take();

	assert!(browser.host.back());
	browser.host.run_until_stalled();

	assert_eq!(browser.app.inner_html(), "<p>a</p>");
	assert_eq!(seen.borrow().as_ref().unwrap().state, Some(json!({ "from": "test" })));
}

#[rstest]
fn test_link_clicks_are_intercepted(browser: Browser, log: EventLog) {
	let router = browser.router(RouterOptions::new([
		RouteDef::new("/").view(view("home", &log)),
		RouteDef::new("/about").view(view("about", &log)),
	]));
	router.start().unwrap();
	browser.host.run_until_stalled();

	assert!(browser.host.click(&LinkClick::on(LinkTarget::new("/about"))));
	browser.host.run_until_stalled();
	assert_eq!(browser.app.inner_html(), "<p>about</p>");
	assert_eq!(browser.path(), "/about");

	let modified = LinkClick {
		ctrl_key: true,
		..LinkClick::on(LinkTarget::new("/"))
	};
	assert!(!browser.host.click(&modified));
	assert!(!browser.host.click(&LinkClick::on(LinkTarget::new("/api/export"))));

	router.stop();
	assert!(!browser.host.click(&LinkClick::on(LinkTarget::new("/"))));
}

#[rstest]
fn test_event_driven_failures_reach_error_callback(log: EventLog) {
	let browser = Browser::at("/broken");
	let errors = Rc::new(RefCell::new(Vec::new()));
	let router = browser.router(
		RouterOptions::new([
			RouteDef::new("/").view(view("home", &log)),
			RouteDef::new("/broken").view(ComponentFactory::new(|_| Broken)),
		])
		.on_render_error({
			let errors = errors.clone();
			move |err: &RouterError| errors.borrow_mut().push(err.to_string())
		}),
	);

	router.start().unwrap();
	browser.host.run_until_stalled();

	assert_eq!(*errors.borrow(), ["Failed to render component for `/broken`"]);
	assert!(!router.is_busy());
}

#[rstest]
fn test_router_rejects_bad_configuration(browser: Browser, log: EventLog) {
	let err = minispa_router::Router::new(RouterOptions::new(Vec::<RouteDef>::new()), browser.host.clone() as Rc<dyn Host>).unwrap_err();
	assert!(matches!(err, RouterError::EmptyRoutes));

	let err = minispa_router::Router::new(
		RouterOptions::new([RouteDef::new("/").view(view("home", &log))]).mount_selector("#missing"),
		browser.host.clone() as Rc<dyn Host>,
	)
	.unwrap_err();
	assert!(matches!(err, RouterError::MountPointNotFound(ref s) if s == "#missing"));
}

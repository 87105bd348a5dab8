//! Route registration and ranking through the router API

use rstest::*;
use wayfinder_router::{MatcherError, RouteRecordRaw, Router, RouterOptions};

fn paths(router: &Router) -> Vec<String> {
	router.get_routes().iter().map(|r| r.path.clone()).collect()
}

#[rstest]
fn test_routes_sorted_by_specificity() {
	let router = Router::new([
		RouteRecordRaw::new("/:path(.*)*").name("not-found").component("NotFound"),
		RouteRecordRaw::new("/users/:id").name("user").component("User"),
		RouteRecordRaw::new("/users/new").name("new-user").component("NewUser"),
		RouteRecordRaw::new("/users/:id(\\d+)").name("user-by-number").component("User"),
		RouteRecordRaw::new("/").name("home").component("Home"),
	])
	.unwrap();

	assert_eq!(
		paths(&router),
		vec!["/users/new", "/users/:id(\\d+)", "/users/:id", "/", "/:path(.*)*"]
	);
	assert_eq!(router.resolve("/users/12").unwrap().name.as_deref(), Some("user-by-number"));
	assert_eq!(router.resolve("/users/ab").unwrap().name.as_deref(), Some("user"));

	let fallback = router.resolve("/a/b/c").unwrap();
	assert_eq!(fallback.name.as_deref(), Some("not-found"));
	assert_eq!(
		fallback.params["path"].as_slice(),
		["a".to_string(), "b".to_string(), "c".to_string()]
	);
}

#[rstest]
fn test_duplicate_name_then_reregister() {
	let router = Router::new([RouteRecordRaw::new("/a").name("page").component("A")]).unwrap();

	let err = router
		.add_route(RouteRecordRaw::new("/b").name("page").component("B"))
		.unwrap_err();
	assert_eq!(err, MatcherError::DuplicateName("page".to_string()));

	assert!(router.remove_route("page"));
	router
		.add_route(RouteRecordRaw::new("/b").name("page").component("B"))
		.unwrap();
	assert_eq!(router.resolve("/b").unwrap().name.as_deref(), Some("page"));
	assert!(router.resolve("/a").unwrap().is_not_found());
}

#[rstest]
fn test_child_route_added_by_parent_name() {
	let router = Router::new([RouteRecordRaw::new("/admin").name("admin").component("Admin")]).unwrap();
	let handle = router
		.add_child_route("admin", RouteRecordRaw::new("users").name("admin-users").component("Users"))
		.unwrap();

	let location = router.resolve("/admin/users").unwrap();
	assert_eq!(location.matched.len(), 2);

	handle.unregister();
	assert!(!router.has_route("admin-users"));
	assert!(router.has_route("admin"));
}

#[rstest]
#[case(false, true)]
#[case(true, false)]
fn test_strict_option(#[case] strict: bool, #[case] trailing_slash_matches: bool) {
	let options = RouterOptions::builder().strict(strict).build().unwrap();
	let router = Router::builder()
		.options(options)
		.route(RouteRecordRaw::new("/about").name("about").component("About"))
		.build()
		.unwrap();
	assert_eq!(!router.resolve("/about/").unwrap().is_not_found(), trailing_slash_matches);
}

#[rstest]
fn test_record_override_beats_options() {
	let router = Router::new([RouteRecordRaw::new("/About")
		.name("about")
		.component("About")
		.sensitive(true)])
	.unwrap();
	assert!(router.resolve("/about").unwrap().is_not_found());
	assert!(!router.resolve("/About").unwrap().is_not_found());
}

#[rstest]
fn test_invalid_pattern_rejected_at_build() {
	let err = Router::new([RouteRecordRaw::new("/:id(\\d+").name("broken")]).unwrap_err();
	assert!(matches!(err, MatcherError::Pattern { .. }));
}

#[rstest]
fn test_trailing_escape_reported_to_caller() {
	let router = Router::new([RouteRecordRaw::new("/a").name("a").component("A")]).unwrap();

	let err = router
		.add_route(RouteRecordRaw::new("/a\\").name("x").component("X"))
		.unwrap_err();

	assert!(matches!(err, MatcherError::Pattern { ref path, .. } if path == "/a\\"));
	assert!(!router.has_route("x"));
	assert!(Router::new([RouteRecordRaw::new("/b\\").name("b")]).is_err());
}

#[rstest]
fn test_clear_routes() {
	let router = Router::new([RouteRecordRaw::new("/a").name("a")]).unwrap();
	router.clear_routes();
	assert!(router.get_routes().is_empty());
}

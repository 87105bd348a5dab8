//! Navigations triggered by the history backend

use std::sync::Arc;
use std::time::Duration;

use rstest::*;
use tokio::sync::mpsc;
use wayfinder_history::{MemoryHistory, RouterHistory};
use wayfinder_router::{NavigationFailureKind, RouteRecordRaw, Router};

type Events = mpsc::UnboundedReceiver<(String, Option<NavigationFailureKind>)>;

#[fixture]
fn history() -> Arc<MemoryHistory> {
	Arc::new(MemoryHistory::new(None))
}

fn router_with(history: &Arc<MemoryHistory>) -> Router {
	Router::builder()
		.routes([
			RouteRecordRaw::new("/").name("home").component("Home"),
			RouteRecordRaw::new("/about").name("about").component("About"),
			RouteRecordRaw::new("/users/:id").name("user").component("User"),
			RouteRecordRaw::new("/old").redirect("/about"),
		])
		.shared_history(history.clone())
		.build()
		.unwrap()
}

fn events(router: &Router) -> Events {
	let (sender, receiver) = mpsc::unbounded_channel();
	let _after = router.after_each(move |to, _from, failure| {
		let _ = sender.send((to.full_path.clone(), failure.map(|f| f.kind)));
	});
	receiver
}

async fn next_event(events: &mut Events) -> (String, Option<NavigationFailureKind>) {
	tokio::time::timeout(Duration::from_secs(5), events.recv())
		.await
		.expect("no navigation within 5 seconds")
		.expect("router dropped")
}

#[rstest]
#[tokio::test]
async fn test_back_navigates_without_new_entry(history: Arc<MemoryHistory>) {
	let router = router_with(&history);
	router.push("/about").await.unwrap();
	router.push("/users/1").await.unwrap();
	let mut events = events(&router);

	router.back();

	assert_eq!(next_event(&mut events).await, ("/about".to_string(), None));
	assert_eq!(router.current_route().name.as_deref(), Some("about"));
	assert_eq!(history.location(), "/about");
	assert_eq!(history.len(), 2);

	router.forward();
	assert_eq!(next_event(&mut events).await, ("/users/1".to_string(), None));
	assert_eq!(router.current_route().param("id"), Some("1"));
}

#[rstest]
#[tokio::test]
async fn test_aborted_pop_restores_history(history: Arc<MemoryHistory>) {
	let router = router_with(&history);
	router.push("/about").await.unwrap();
	router.push("/users/1").await.unwrap();
	let _guard = router.before_each(|to, _from| async move { to.path != "/about" });
	let mut events = events(&router);

	router.back();

	assert_eq!(
		next_event(&mut events).await,
		("/about".to_string(), Some(NavigationFailureKind::Aborted))
	);
	assert_eq!(history.location(), "/users/1");
	assert_eq!(router.current_route().path, "/users/1");
}

#[rstest]
#[tokio::test]
async fn test_pop_into_redirect_record_replaces_entry(history: Arc<MemoryHistory>) {
	let router = router_with(&history);
	router.push("/").await.unwrap();
	history.push("/old", None).await.unwrap();
	history.push("/users/2", None).await.unwrap();
	let mut events = events(&router);

	history.go(-1, true);

	assert_eq!(next_event(&mut events).await, ("/about".to_string(), None));
	assert_eq!(history.location(), "/about");
	// replacing drops the forward entries
	assert_eq!(history.len(), 2);
	let current = router.current_route();
	assert_eq!(current.name.as_deref(), Some("about"));
	assert_eq!(
		current.redirected_from.as_ref().map(|from| from.path.as_str()),
		Some("/old")
	);
}

#[rstest]
#[tokio::test]
async fn test_history_ignored_while_not_listening(history: Arc<MemoryHistory>) {
	let router = router_with(&history);
	router.push("/about").await.unwrap();
	router.push("/users/1").await.unwrap();

	router.set_listening(false);
	router.back();
	tokio::task::yield_now().await;

	assert_eq!(history.location(), "/about");
	assert_eq!(router.current_route().path, "/users/1");
}

#[rstest]
#[tokio::test]
async fn test_no_listener_before_first_commit(history: Arc<MemoryHistory>) {
	let router = router_with(&history);
	history.push("/about", None).await.unwrap();
	history.go(-1, true);
	tokio::task::yield_now().await;
	assert!(router.current_route().is_start());
}

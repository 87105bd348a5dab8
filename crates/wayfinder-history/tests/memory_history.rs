//! MemoryHistory integration tests

use std::sync::Arc;

use parking_lot::Mutex;
use rstest::*;
use wayfinder_history::{
	HistoryState, MemoryHistory, NavigationDirection, NavigationInformation, NavigationType,
	RouterHistory, START,
};

type Calls = Arc<Mutex<Vec<(String, String, NavigationInformation)>>>;

fn recording(history: &MemoryHistory) -> Calls {
	let calls: Calls = Arc::new(Mutex::new(Vec::new()));
	let sink = calls.clone();
	history.listen(Arc::new(move |to: &str, from: &str, info: NavigationInformation| {
		sink.lock().push((to.to_string(), from.to_string(), info));
	}));
	calls
}

#[fixture]
fn history() -> MemoryHistory {
	MemoryHistory::new(None)
}

#[rstest]
#[tokio::test]
async fn test_starts_at_start_location(history: MemoryHistory) {
	assert_eq!(history.location(), START);
	assert_eq!(history.len(), 1);
	assert_eq!(history.position(), 0);
	assert!(history.state().is_empty());
}

#[rstest]
#[tokio::test]
async fn test_push_truncates_forward_entries(history: MemoryHistory) {
	history.push("/a", None).await.unwrap();
	history.push("/b", None).await.unwrap();
	history.push("/c", None).await.unwrap();
	history.go(-2, false);
	assert_eq!(history.location(), "/a");

	history.push("/d", None).await.unwrap();
	assert_eq!(history.location(), "/d");
	assert_eq!(history.len(), 3);
	history.go(1, false);
	assert_eq!(history.location(), "/d");
}

#[rstest]
#[tokio::test]
async fn test_replace_swaps_current_entry(history: MemoryHistory) {
	history.replace("/first", None).await.unwrap();
	assert_eq!(history.len(), 1);
	history.push("/a", None).await.unwrap();
	history
		.replace("/b", Some(HistoryState::new().with("k", "v")))
		.await
		.unwrap();
	assert_eq!(history.len(), 2);
	assert_eq!(history.position(), 1);
	assert_eq!(history.location(), "/b");
	assert_eq!(history.state().get("k").and_then(|v| v.as_str()), Some("v"));
	history.go(-1, false);
	assert_eq!(history.location(), "/first");
}

#[rstest]
#[tokio::test]
async fn test_go_clamps_to_bounds(history: MemoryHistory) {
	history.push("/a", None).await.unwrap();
	history.go(-10, false);
	assert_eq!(history.position(), 0);
	history.go(10, false);
	assert_eq!(history.position(), 1);
}

#[rstest]
#[tokio::test]
async fn test_listeners_only_triggered_by_go(history: MemoryHistory) {
	let calls = recording(&history);
	history.push("/a", None).await.unwrap();
	history.push("/b", None).await.unwrap();
	assert!(calls.lock().is_empty());

	history.go(-1, true);
	history.go(1, false);
	let calls = calls.lock();
	assert_eq!(calls.len(), 1);
	let (to, from, info) = &calls[0];
	assert_eq!(to, "/a");
	assert_eq!(from, "/b");
	assert_eq!(info.kind, NavigationType::Pop);
	assert_eq!(info.direction, NavigationDirection::Back);
	assert_eq!(info.delta, -1);
}

#[rstest]
#[tokio::test]
async fn test_unlisten_and_destroy(history: MemoryHistory) {
	let calls: Calls = Arc::new(Mutex::new(Vec::new()));
	let sink = calls.clone();
	let id = history.listen(Arc::new(move |to: &str, from: &str, info: NavigationInformation| {
		sink.lock().push((to.to_string(), from.to_string(), info));
	}));
	history.push("/a", None).await.unwrap();
	history.unlisten(id);
	history.go(-1, true);
	assert!(calls.lock().is_empty());

	let after_destroy = recording(&history);
	history.destroy();
	assert_eq!(history.location(), START);
	history.go(0, true);
	assert!(after_destroy.lock().is_empty());
}

#[rstest]
fn test_create_href_uses_base() {
	let history = MemoryHistory::new(Some("/app/"));
	assert_eq!(history.base(), "/app");
	assert_eq!(history.create_href("/users?x=1"), "/app/users?x=1");
}

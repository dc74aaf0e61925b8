// crates.io
use httpmock::prelude::*;
use serde_json::json;
// self
use meta_ads_sync::{_preludet::*, auth::ConnectionId, http::ApiRequest};

fn page_body(ids: &[&str], after: &str, next: Option<&str>) -> String {
	let mut body = json!({
		"data": ids.iter().map(|id| json!({ "id": id })).collect::<Vec<_>>(),
		"paging": { "cursors": { "before": "start", "after": after } }
	});

	if let Some(next) = next {
		body["paging"]["next"] = json!(next);
	}

	body.to_string()
}

#[tokio::test]
async fn three_page_walk_follows_after_cursors() {
	let server = MockServer::start_async().await;
	let (client, store) = build_reqwest_test_client(&test_config(&server.base_url()));
	let connection = long_lived_connection("conn-paging", "EAAB-paging");
	let id: ConnectionId = connection.id.clone();

	store.insert(connection);

	let first = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/v19.0/act_9/campaigns")
				.query_param("limit", "25")
				.query_param_missing("after");
			then.status(200)
				.header("content-type", "application/json")
				.body(page_body(&["1", "2"], "c1", Some("https://graph.example/p2")));
		})
		.await;
	let second = server
		.mock_async(|when, then| {
			when.method(GET).path("/v19.0/act_9/campaigns").query_param("after", "c1");
			then.status(200)
				.header("content-type", "application/json")
				.body(page_body(&[], "c2", Some("https://graph.example/p3")));
		})
		.await;
	let third = server
		.mock_async(|when, then| {
			when.method(GET).path("/v19.0/act_9/campaigns").query_param("after", "c2");
			then.status(200)
				.header("content-type", "application/json")
				.body(page_body(&["3"], "c3", None));
		})
		.await;
	let mut paginator = client.paginate(&id, ApiRequest::get("act_9/campaigns"));
	let mut batches = Vec::new();

	while let Some(batch) = paginator.next_batch().await.expect("Every page should load.") {
		batches.push(batch.len());
	}

	first.assert_calls_async(1).await;
	second.assert_calls_async(1).await;
	third.assert_calls_async(1).await;

	assert_eq!(batches, vec![2, 0, 1], "The empty middle page must not end the walk.");
	assert_eq!(paginator.pages_fetched(), 3);
	assert!(matches!(paginator.next_batch().await, Ok(None)));
}

#[tokio::test]
async fn throttle_mid_walk_keeps_yielded_batches() {
	let server = MockServer::start_async().await;
	let (client, store) = build_reqwest_test_client(&test_config(&server.base_url()));
	let connection = long_lived_connection("conn-paging-throttle", "EAAB-paging");
	let id = connection.id.clone();

	store.insert(connection);
	server
		.mock_async(|when, then| {
			when.method(GET).path("/v19.0/act_9/ads").query_param_missing("after");
			then.status(200)
				.header("content-type", "application/json")
				.body(page_body(&["1"], "c1", Some("https://graph.example/p2")));
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(GET).path("/v19.0/act_9/ads").query_param("after", "c1");
			then.status(429).header("Retry-After", "12");
		})
		.await;

	let mut paginator = client.paginate(&id, ApiRequest::get("act_9/ads"));
	let first = paginator
		.next_batch()
		.await
		.expect("First page should load.")
		.expect("First page should yield a batch.");
	let err = paginator.next_batch().await.expect_err("Second page should be throttled.");

	assert_eq!(first.len(), 1);
	assert_eq!(err.retry_after(), Some(Duration::seconds(12)));
	assert!(paginator.is_finished());
}

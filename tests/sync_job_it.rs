// crates.io
use httpmock::prelude::*;
use serde_json::json;
// self
use meta_ads_sync::{
	_preludet::*,
	auth::{AccountId, ConnectionId},
	http::ReqwestTransport,
	job::{Attempt, JobEnvelope, JobState, MemoryQueue, SyncJob},
	resource::SyncResource,
	sink::MemorySink,
	sync::{SyncReport, SyncWorker},
};

struct Harness {
	worker: SyncWorker<ReqwestTransport>,
	envelope: JobEnvelope,
	queue: Arc<MemoryQueue>,
	sink: Arc<MemorySink>,
	job: SyncJob,
}

fn harness(server: &MockServer, resource: SyncResource) -> Harness {
	let (client, store) = build_reqwest_test_client(&test_config(&server.base_url()));
	let connection = long_lived_connection("conn-sync", "EAAB-sync");
	let job = SyncJob::new(connection.id.clone(), resource);

	store.insert(connection);

	let queue = Arc::new(MemoryQueue::new());
	let sink = Arc::new(MemorySink::default());

	Harness {
		worker: SyncWorker::new(Arc::new(client), sink.clone()),
		envelope: JobEnvelope::new(queue.clone()),
		queue,
		sink,
		job,
	}
}

fn campaigns() -> SyncResource {
	let account = AccountId::new("55").expect("Account fixture should be valid.");

	SyncResource::Campaigns { account }
}

#[tokio::test]
async fn successful_sync_upserts_every_page() {
	let server = MockServer::start_async().await;
	let harness = harness(&server, campaigns());

	server
		.mock_async(|when, then| {
			when.method(GET).path("/v19.0/act_55/campaigns").query_param_missing("after");
			then.status(200).header("content-type", "application/json").body(
				json!({
					"data": [{ "id": "c-1" }, { "id": "c-2" }],
					"paging": { "cursors": { "after": "n1" }, "next": "https://graph.example/n1" }
				})
				.to_string(),
			);
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(GET).path("/v19.0/act_55/campaigns").query_param("after", "n1");
			then.status(200)
				.header("content-type", "application/json")
				.body(json!({ "data": [{ "id": "c-3" }], "paging": {} }).to_string());
		})
		.await;

	let attempt = harness
		.worker
		.process(&harness.envelope, harness.job.clone())
		.await
		.expect("Sync should complete.");

	assert_eq!(attempt.state(), JobState::Succeeded);
	assert_eq!(attempt.into_output(), Some(SyncReport { pages: 2, items: 3 }));
	assert_eq!(harness.sink.len(&harness.job.resource), 3);
	assert!(harness.queue.is_empty());
}

#[tokio::test]
async fn throttled_sync_requeues_the_identical_job() {
	let server = MockServer::start_async().await;
	let harness = harness(&server, campaigns());
	let started = OffsetDateTime::now_utc();

	server
		.mock_async(|when, then| {
			when.method(GET).path("/v19.0/act_55/campaigns");
			then.status(400)
				.header("x-ad-account-usage", "{\"reset_time_duration\":90}")
				.header("content-type", "application/json")
				.body("{\"error\":{\"code\":80000,\"message\":\"There have been too many calls\"}}");
		})
		.await;

	let attempt = harness
		.worker
		.process(&harness.envelope, harness.job.clone())
		.await
		.expect("A throttle must not fail the job.");

	assert!(matches!(attempt, Attempt::Requeued { delay } if delay == Duration::seconds(90)));
	assert_eq!(attempt.state(), JobState::ThrottledRequeued { delay_secs: 90 });

	let pending = harness.queue.pending();

	assert_eq!(pending.len(), 1);
	assert_eq!(pending[0].job, harness.job);
	assert!(pending[0].not_before >= started + Duration::seconds(90));
	assert!(harness.queue.pop_ready().is_none(), "The job must wait for its retry-after.");
	assert_eq!(harness.sink.len(&harness.job.resource), 0);
}

#[tokio::test]
async fn expired_credentials_fail_without_requeue() {
	let server = MockServer::start_async().await;
	let mut harness = harness(&server, SyncResource::AdAccounts);

	harness.job = SyncJob::new(
		ConnectionId::new("conn-unknown").expect("Connection fixture id should be valid."),
		SyncResource::AdAccounts,
	);

	let err = harness
		.worker
		.process(&harness.envelope, harness.job.clone())
		.await
		.expect_err("An unknown connection must fail the job.");

	assert!(matches!(err, Error::CredentialExpired { .. }));
	assert!(harness.queue.is_empty());
	assert_eq!(harness.envelope.metrics.failed(), 1);
}

//! Mirrors the campaigns of one ad account against a mock Graph API, showing a throttled
//! attempt being re-enqueued and the identical job succeeding once its retry-after elapses.

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use time::{Duration, OffsetDateTime};
// self
use meta_ads_sync::{
	auth::{AccountId, Connection, ConnectionId},
	client::GraphClient,
	config::ClientConfig,
	job::{Attempt, DedupStore, JobEnvelope, MemoryDedup, MemoryQueue, SyncJob, SyncScheduler},
	resource::SyncResource,
	sink::MemorySink,
	store::MemoryConnectionStore,
	sync::SyncWorker,
	url::Url,
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let mut throttle = Some(
		server
			.mock_async(|when, then| {
				when.method(GET).path("/v19.0/act_1001/campaigns");
				then.status(429).header("Retry-After", "1");
			})
			.await,
	);
	let config = ClientConfig::builder()
		.base_url(Url::parse(&server.base_url())?)
		.app_credentials("demo-app", "demo-secret")
		.build()?;
	let store = Arc::new(MemoryConnectionStore::default());
	let connection = ConnectionId::new("demo-connection")?;

	store.insert(
		Connection::new(connection.clone())
			.with_access_token("EAAB-demo")
			.with_expires_at(OffsetDateTime::now_utc() + Duration::days(45)),
	);

	let client = Arc::new(GraphClient::connect(&config, store)?);
	let sink = Arc::new(MemorySink::default());
	let queue = Arc::new(MemoryQueue::new());
	let dedup: Arc<dyn DedupStore> = Arc::new(MemoryDedup::new());
	let scheduler = SyncScheduler::new(queue.clone(), dedup, Duration::hours(1));
	let envelope = JobEnvelope::new(queue.clone());
	let worker = SyncWorker::new(client, sink.clone());
	let resource = SyncResource::Campaigns { account: AccountId::parse_node("act_1001")? };

	scheduler.schedule(SyncJob::new(connection, resource.clone())).await?;

	while !queue.is_empty() {
		let Some(job) = queue.pop_ready() else {
			tokio::time::sleep(std::time::Duration::from_millis(100)).await;

			continue;
		};

		match worker.process(&envelope, job.clone()).await? {
			Attempt::Succeeded(report) => {
				println!("Synced {} campaigns across {} pages.", report.items, report.pages);
				scheduler.complete(&job).await?;
			},
			Attempt::Requeued { delay } => {
				println!("Throttled; retrying in {}s.", delay.whole_seconds());

				if let Some(mut mock) = throttle.take() {
					mock.delete_async().await;
					server
						.mock_async(|when, then| {
							when.method(GET).path("/v19.0/act_1001/campaigns");
							then.status(200).header("content-type", "application/json").body(
								"{\"data\":[{\"id\":\"1\"},{\"id\":\"2\"}],\"paging\":{}}",
							);
						})
						.await;
				}
			},
		}
	}

	let again = SyncJob::new(ConnectionId::new("demo-connection")?, resource.clone());
	let skipped = !scheduler.schedule(again).await?;

	println!("Stored {} campaigns; immediate re-sync skipped: {skipped}.", sink.len(&resource));

	Ok(())
}

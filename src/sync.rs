//! Sync worker: mirrors one resource into the persistence sink.

// self
use crate::{
	_prelude::*,
	client::GraphClient,
	http::ApiTransport,
	job::{Attempt, JobEnvelope, SyncJob},
	obs::{self, OpKind, OpOutcome, OpSpan},
	sink::PersistenceSink,
};

/// Totals of one completed sync run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncReport {
	/// Pages fetched.
	pub pages: usize,
	/// Items handed to the sink.
	pub items: usize,
}

/// Walks a job's collection page by page and upserts every batch.
pub struct SyncWorker<T>
where
	T: ?Sized + ApiTransport,
{
	client: Arc<GraphClient<T>>,
	sink: Arc<dyn PersistenceSink>,
}
impl<T> SyncWorker<T>
where
	T: ?Sized + ApiTransport,
{
	/// Creates a worker that reads through `client` and writes into `sink`.
	pub fn new(client: Arc<GraphClient<T>>, sink: Arc<dyn PersistenceSink>) -> Self {
		Self { client, sink }
	}

	/// Mirrors `job`'s collection from the first page to exhaustion.
	///
	/// A throttle aborts the walk with [`Error::Throttled`]; batches upserted before it stay in
	/// the sink.
	pub async fn run(&self, job: &SyncJob) -> Result<SyncReport> {
		const KIND: OpKind = OpKind::Pagination;

		let span = OpSpan::new(KIND, job.resource.label());

		obs::record_op_outcome(KIND, OpOutcome::Attempt);

		let result = span
			.instrument(async {
				let mut paginator = self.client.paginate(&job.connection, job.resource.request());
				let mut items = 0;

				while let Some(batch) = paginator.next_batch().await? {
					items += batch.len();

					if !batch.is_empty() {
						self.sink.upsert(&job.resource, batch).await?;
					}
				}

				Ok::<_, Error>(SyncReport { pages: paginator.pages_fetched(), items })
			})
			.await;

		obs::record_op_outcome(KIND, OpOutcome::of(&result));

		result
	}

	/// Runs `job` inside `envelope`, so throttles re-enqueue it instead of failing it.
	pub async fn process(
		&self,
		envelope: &JobEnvelope,
		job: SyncJob,
	) -> Result<Attempt<SyncReport>> {
		envelope.run(job, |job| async move { self.run(&job).await }).await
	}
}
impl<T> Debug for SyncWorker<T>
where
	T: ?Sized + ApiTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("SyncWorker").field("client", &self.client).finish()
	}
}

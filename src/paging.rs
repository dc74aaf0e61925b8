//! Cursor pagination over Graph API collection edges.
//!
//! Graph responses nest paging metadata as `paging.cursors.after` and `paging.next`. A
//! [`Paginator`] walks those cursors lazily: each [`Paginator::next_batch`] call issues exactly
//! one request carrying the previous page's `after` cursor, and the walk ends only when a
//! response has no `paging.next` marker. Empty pages with a `next` marker do not end the walk.

// self
use crate::{
	_prelude::*,
	http::{ApiRequest, ApiResponse},
};

/// Default page size sent as `limit`.
pub const DEFAULT_PAGE_SIZE: u32 = 25;

/// Boxed future returned by [`PageFetcher::fetch`].
pub type PageFuture<'a> = Pin<Box<dyn Future<Output = Result<ApiResponse>> + 'a + Send>>;

/// Executes one page request; throttles surface as [`Error::Throttled`].
pub trait PageFetcher
where
	Self: Send + Sync,
{
	/// Fetches the page described by `request`.
	fn fetch(&self, request: ApiRequest) -> PageFuture<'_>;
}

/// Position in a cursor chain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageCursor {
	/// Opaque `after` token; `None` before the first page.
	pub after: Option<String>,
	/// Page-size limit sent with every request.
	pub limit: u32,
}
impl PageCursor {
	/// Cursor for the first page.
	pub fn first(limit: u32) -> Self {
		Self { after: None, limit }
	}

	/// Request for this cursor position derived from the collection's base request.
	pub fn apply(&self, base: &ApiRequest) -> ApiRequest {
		let mut request = base.clone();

		request.set_query("limit", self.limit.to_string());

		match &self.after {
			Some(after) => request.set_query("after", after.clone()),
			None => request.remove_query("after"),
		}

		request
	}
}
impl Default for PageCursor {
	fn default() -> Self {
		Self::first(DEFAULT_PAGE_SIZE)
	}
}

/// One parsed page.
#[derive(Clone, Debug, PartialEq)]
pub struct Page {
	/// Raw items in server order.
	pub items: Vec<JsonValue>,
	/// Cursor for the following page; `None` when the collection is exhausted.
	pub next: Option<PageCursor>,
}
impl Page {
	/// Parses the `data` array and paging metadata of a collection response.
	pub fn parse(body: &JsonValue, limit: u32) -> Result<Self> {
		let items = body
			.get("data")
			.and_then(JsonValue::as_array)
			.cloned()
			.ok_or_else(|| Error::malformed("collection response has no `data` array"))?;
		let has_next = body.pointer("/paging/next").is_some_and(|next| !next.is_null());
		let next = if has_next {
			let after = body
				.pointer("/paging/cursors/after")
				.and_then(JsonValue::as_str)
				.filter(|after| !after.is_empty())
				.ok_or_else(|| {
					Error::malformed("`paging.next` is present without `paging.cursors.after`")
				})?;

			Some(PageCursor { after: Some(after.to_owned()), limit })
		} else {
			None
		};

		Ok(Self { items, next })
	}
}

#[derive(Clone, Debug)]
enum CursorState {
	Ready(PageCursor),
	Finished,
}

/// Lazy, finite, non-restartable sequence of item batches.
///
/// After exhaustion or after any error the paginator is fused and yields `None`. Batches
/// already handed out are never retracted; consumers re-process idempotently on retry.
#[derive(Debug)]
pub struct Paginator<F> {
	fetcher: F,
	base: ApiRequest,
	state: CursorState,
	pages: usize,
}
impl<F> Paginator<F>
where
	F: PageFetcher,
{
	/// Creates a paginator over `base` (without cursor parameters) using `limit` items per page.
	pub fn new(fetcher: F, base: ApiRequest, limit: u32) -> Self {
		Self { fetcher, base, state: CursorState::Ready(PageCursor::first(limit)), pages: 0 }
	}

	/// Number of pages fetched so far.
	pub fn pages_fetched(&self) -> usize {
		self.pages
	}

	/// Returns `true` once no more batches will be produced.
	pub fn is_finished(&self) -> bool {
		matches!(self.state, CursorState::Finished)
	}

	/// Fetches the next batch; `Ok(None)` once the collection is exhausted.
	pub async fn next_batch(&mut self) -> Result<Option<Vec<JsonValue>>> {
		let cursor = match std::mem::replace(&mut self.state, CursorState::Finished) {
			CursorState::Ready(cursor) => cursor,
			CursorState::Finished => return Ok(None),
		};
		let response = self.fetcher.fetch(cursor.apply(&self.base)).await?;
		let page = Page::parse(&response.body, cursor.limit)?;

		self.pages += 1;

		if let Some(next) = page.next {
			self.state = CursorState::Ready(next);
		}

		Ok(Some(page.items))
	}

	/// Drains the remaining batches into one list.
	pub async fn collect_all(mut self) -> Result<Vec<JsonValue>> {
		let mut all = Vec::new();

		while let Some(batch) = self.next_batch().await? {
			all.extend(batch);
		}

		Ok(all)
	}
}

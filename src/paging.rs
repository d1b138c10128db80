//! Lazy iteration over paginated results.
//!
//! The declared `total` of a paginated response is not reliable, so the end of
//! the data is inferred from the page size instead: the first page holding
//! fewer than [`FULL_PAGE_SIZE`] items is the last one.

use crate::client::FetchEngine;
use crate::request::RequestSpec;
use crate::Result;
use futures::stream::{self, Stream, TryStreamExt};
use serde::Serialize;
use tracing::info;

/// Items in a full page of a paginated endpoint.
pub const FULL_PAGE_SIZE: usize = 100;

/// One page of results.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Advisory item count across all pages, as declared by the server.
    pub total: u32,
    /// 1-based page index, as echoed by the server.
    pub page: u32,
}

/// Responses that are one page of a larger result set.
pub trait Paged {
    type Item;

    fn item_count(&self) -> usize;
    fn declared_total(&self) -> u32;
    fn into_items(self) -> Vec<Self::Item>;
}

impl<T> Paged for Page<T> {
    type Item = T;

    fn item_count(&self) -> usize {
        self.items.len()
    }

    fn declared_total(&self) -> u32 {
        self.total
    }

    fn into_items(self) -> Vec<T> {
        self.items
    }
}

/// Pages 1, 2, 3, … of a query, fetched one at a time on demand.
///
/// Ends after the first short page, or after yielding an error.
pub struct PageSequence<'a, R, F> {
    engine: &'a FetchEngine,
    factory: F,
    next_page: u32,
    page_size: usize,
    done: bool,
    total: Option<u32>,
    estimated_pages: Option<u32>,
    _request: std::marker::PhantomData<fn() -> R>,
}

impl<'a, R, F> PageSequence<'a, R, F>
where
    R: RequestSpec,
    R::Output: Paged,
    F: FnMut(u32) -> R,
{
    pub fn new(engine: &'a FetchEngine, factory: F) -> Self {
        Self {
            engine,
            factory,
            next_page: 1,
            page_size: FULL_PAGE_SIZE,
            done: false,
            total: None,
            estimated_pages: None,
            _request: std::marker::PhantomData,
        }
    }

    /// Override the full-page size used for end-of-data detection.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Total declared by the first page.
    pub fn declared_total(&self) -> Option<u32> {
        self.total
    }

    /// `ceil(total / page_size)` from the first page; for progress reporting only.
    pub fn estimated_pages(&self) -> Option<u32> {
        self.estimated_pages
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Fetch the next page, or `None` once the sequence has ended.
    pub async fn next_page(&mut self) -> Option<Result<R::Output>> {
        if self.done {
            return None;
        }
        let page = self.next_page;
        let spec = (self.factory)(page);

        match self.engine.fetch(&spec).await {
            Ok(output) => {
                if self.total.is_none() {
                    let total = output.declared_total();
                    self.total = Some(total);
                    self.estimated_pages =
                        Some((total as usize).div_ceil(self.page_size) as u32);
                }
                let count = output.item_count();
                info!(
                    resource_class = spec.resource_class(),
                    page,
                    estimated_pages = self.estimated_pages,
                    items = count,
                    "page fetched"
                );
                self.next_page += 1;
                if count < self.page_size {
                    self.done = true;
                }
                Some(Ok(output))
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }

    /// The remaining pages as a lazy stream.
    pub fn into_stream(self) -> impl Stream<Item = Result<R::Output>> + 'a
    where
        R: 'a,
        F: 'a,
    {
        stream::unfold(self, |mut seq| async move {
            let page = seq.next_page().await?;
            Some((page, seq))
        })
    }

    /// Items across all remaining pages in server order. The next page is
    /// fetched only once the current page's items have been consumed.
    pub fn flatten(self) -> impl Stream<Item = Result<<R::Output as Paged>::Item>> + 'a
    where
        R: 'a,
        F: 'a,
    {
        self.into_stream()
            .map_ok(|page| stream::iter(page.into_items().into_iter().map(Ok)))
            .try_flatten()
    }

    /// Drain every page into one vector, stopping at the first error.
    pub async fn collect_items(self) -> Result<Vec<<R::Output as Paged>::Item>>
    where
        R: 'a,
        F: 'a,
    {
        self.flatten().try_collect().await
    }
}

impl<'a, R, F> std::fmt::Debug for PageSequence<'a, R, F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageSequence")
            .field("next_page", &self.next_page)
            .field("page_size", &self.page_size)
            .field("done", &self.done)
            .field("total", &self.total)
            .finish_non_exhaustive()
    }
}

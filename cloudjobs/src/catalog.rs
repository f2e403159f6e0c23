use std::future::Future;
use std::sync::Arc;

use tracing::Instrument;

use crate::error::{CatalogError, ServiceError};
use crate::job::{Execution, JobName, Page, Scope};
use crate::service::RemoteJobService;
use crate::telemetry;

/// Read-only view of the job definitions and executions in a scope.
///
/// Every call re-reads from the provider; nothing is cached.
pub struct JobCatalog<S: RemoteJobService + ?Sized> {
    service: Arc<S>,
    max_pages: Option<u32>,
}

impl<S: RemoteJobService + ?Sized> Clone for JobCatalog<S> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
            max_pages: self.max_pages,
        }
    }
}

impl<S: RemoteJobService + ?Sized> JobCatalog<S> {
    pub fn new(service: Arc<S>) -> Self {
        Self {
            service,
            max_pages: None,
        }
    }

    /// Abort listings that are still returning page tokens after `pages`.
    pub fn with_max_pages(mut self, pages: Option<u32>) -> Self {
        self.max_pages = pages;
        self
    }

    /// Drain every page of job definitions in `scope`, in listing order.
    pub async fn try_list_jobs(&self, scope: &Scope) -> Result<Vec<JobName>, CatalogError> {
        let service = &*self.service;
        drain_pages("jobs", self.max_pages, move |token| {
            service.list_jobs_page(scope, token)
        })
        .instrument(telemetry::list_span("jobs", scope.parent()))
        .await
    }

    /// List job definitions in `scope`.
    ///
    /// A failed page read is logged and turns the whole result into an empty
    /// list, so callers cannot tell "no jobs" apart from "listing failed".
    /// Use [`JobCatalog::try_list_jobs`] when the difference matters.
    pub async fn list_jobs(&self, scope: &Scope) -> Vec<JobName> {
        match self.try_list_jobs(scope).await {
            Ok(jobs) => jobs,
            Err(err) => {
                telemetry::record_listing_failure("jobs", scope.parent(), &err);
                Vec::new()
            }
        }
    }

    /// Drain every page of executions of `job` and keep the active ones.
    pub async fn try_list_active_executions(
        &self,
        job: &JobName,
    ) -> Result<Vec<Execution>, CatalogError> {
        let service = &*self.service;
        let executions = drain_pages("executions", self.max_pages, move |token| {
            service.list_executions_page(job, token)
        })
        .instrument(telemetry::list_span("executions", job.as_str()))
        .await?;

        Ok(executions
            .into_iter()
            .filter(Execution::is_active)
            .collect())
    }

    /// Active executions of `job`; empty on any failure, like
    /// [`JobCatalog::list_jobs`].
    pub async fn list_active_executions(&self, job: &JobName) -> Vec<Execution> {
        match self.try_list_active_executions(job).await {
            Ok(executions) => executions,
            Err(err) => {
                telemetry::record_listing_failure("executions", job.as_str(), &err);
                Vec::new()
            }
        }
    }
}

/// Follow page tokens until the provider stops returning one.
///
/// An empty token is treated as the end of the listing.
pub(crate) async fn drain_pages<T, F, Fut>(
    listing: &str,
    max_pages: Option<u32>,
    mut fetch: F,
) -> Result<Vec<T>, CatalogError>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<Page<T>, ServiceError>>,
{
    let mut items = Vec::new();
    let mut token = None;
    let mut page = 0u32;

    loop {
        if let Some(max) = max_pages.filter(|max| page >= *max) {
            return Err(CatalogError::PageLimit {
                listing: listing.to_string(),
                max_pages: max,
            });
        }

        let fetched = fetch(token.take()).await.map_err(|source| {
            CatalogError::Page {
                listing: listing.to_string(),
                page,
                source,
            }
        })?;
        page += 1;

        tracing::debug!(listing, page, items = fetched.items.len(), "page read");
        items.extend(fetched.items);

        match fetched.next_page_token {
            Some(next) if !next.is_empty() => token = Some(next),
            _ => break,
        }
    }

    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pages(
        script: Vec<Result<Page<u32>, ServiceError>>,
    ) -> impl FnMut(Option<String>) -> std::future::Ready<Result<Page<u32>, ServiceError>>
    {
        let mut script = script.into_iter();
        move |_token| {
            std::future::ready(
                script
                    .next()
                    .unwrap_or_else(|| Err(ServiceError::unavailable("script exhausted"))),
            )
        }
    }

    #[tokio::test]
    async fn drains_all_pages_in_order() {
        let fetch = pages(vec![
            Ok(Page::with_next(vec![1, 2], "t1")),
            Ok(Page::with_next(vec![3], "t2")),
            Ok(Page::last(vec![4])),
        ]);
        let items = drain_pages("numbers", None, fetch).await.unwrap();
        assert_eq!(items, vec![1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn empty_token_ends_listing() {
        let fetch = pages(vec![Ok(Page::with_next(vec![1], ""))]);
        let items = drain_pages("numbers", None, fetch).await.unwrap();
        assert_eq!(items, vec![1]);
    }

    #[tokio::test]
    async fn failed_page_discards_earlier_pages() {
        let fetch = pages(vec![
            Ok(Page::with_next(vec![1, 2], "t1")),
            Err(ServiceError::unavailable("flaky")),
        ]);
        let err = drain_pages("numbers", None, fetch).await.unwrap_err();
        match err {
            CatalogError::Page { page, source, .. } => {
                assert_eq!(page, 1);
                assert_eq!(source, ServiceError::unavailable("flaky"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn page_limit_stops_endless_listing() {
        let fetch = |_token: Option<String>| {
            std::future::ready(Ok::<_, ServiceError>(Page::with_next(vec![0u32], "again")))
        };
        let err = drain_pages("numbers", Some(3), fetch).await.unwrap_err();
        assert!(matches!(err, CatalogError::PageLimit { max_pages: 3, .. }));
    }
}

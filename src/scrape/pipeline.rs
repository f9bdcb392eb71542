//! Worker pool and dispatch
//!
//! The dispatcher spawns a fixed pool of workers, enqueues one task per
//! listing page onto a bounded queue, closes the queue, and then waits for
//! exactly one report per task. Workers share the queue through a mutex and
//! run each task's pipeline strictly sequentially: the Nth detail fetch does
//! not start until the (N-1)th artifact has been written. Pages are
//! independent, so up to `workers` of them are in flight at once.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info, warn};

use super::fetcher::{FetchError, JobApi};
use super::listing::{self, JobStub, MalformedReference};
use super::writer::{sanitize_title, ArtifactError, ArtifactWriter};
use crate::config::CrawlConfig;

/// Unit of work: one listing page to crawl
#[derive(Debug, Clone)]
pub struct ScrapeTask {
    /// Free-text search query
    pub query: String,
    /// Free-text location
    pub location: String,
    /// Listing page number, 1-based
    pub page: u32,
}

/// What to do when a job or page fails
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailurePolicy {
    /// Stop the whole run on the first error
    #[default]
    Abort,
    /// Log and skip the failing job or page, keep crawling
    Skip,
}

/// Errors from one task's pipeline
#[derive(Debug, Error)]
pub enum TaskError {
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Reference(#[from] MalformedReference),
    #[error("failed to write artifact: {0}")]
    Artifact(#[from] ArtifactError),
}

/// Errors ending a whole run
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("page {page} failed: {source}")]
    Task {
        page: u32,
        #[source]
        source: TaskError,
    },
    #[error("worker pool exited before all pages completed")]
    WorkersExited,
}

/// Per-task result counters
#[derive(Debug, Default)]
struct TaskStats {
    found: usize,
    written: usize,
    skipped: usize,
}

/// One completion acknowledgment per task
struct TaskReport {
    page: u32,
    result: Result<TaskStats, TaskError>,
}

/// Counters accumulated over a whole run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlStats {
    /// Pages whose pipeline ran to completion
    pub pages_crawled: u32,
    /// Pages skipped after a failure (skip policy only)
    pub pages_failed: u32,
    /// Job cards discovered across all crawled pages
    pub jobs_found: usize,
    /// Artifacts written
    pub jobs_written: usize,
    /// Jobs skipped after a failure (skip policy only)
    pub jobs_skipped: usize,
}

/// Processes tasks from the shared queue until it is closed and drained.
struct Worker<A> {
    id: usize,
    api: Arc<A>,
    writer: Arc<ArtifactWriter>,
    policy: FailurePolicy,
}

impl<A: JobApi> Worker<A> {
    async fn run(
        self,
        tasks: Arc<Mutex<mpsc::Receiver<ScrapeTask>>>,
        reports: mpsc::Sender<TaskReport>,
    ) {
        debug!("Worker {} started", self.id);

        loop {
            let task = { tasks.lock().await.recv().await };
            let Some(task) = task else { break };

            let page = task.page;
            let result = self.process(&task).await;

            // The dispatcher receives one report per task; if it has gone
            // away the run was aborted and there is nothing left to do.
            if reports.send(TaskReport { page, result }).await.is_err() {
                break;
            }
        }

        debug!("Worker {} finished", self.id);
    }

    /// Run one page's pipeline end-to-end.
    async fn process(&self, task: &ScrapeTask) -> Result<TaskStats, TaskError> {
        info!("Worker {} fetching listing page {}", self.id, task.page);
        let body = self
            .api
            .fetch_listing(&task.query, &task.location, task.page)
            .await?;

        let stubs = listing::parse_listing(&body);
        info!(
            "Worker {} found {} jobs on page {}",
            self.id,
            stubs.len(),
            task.page
        );

        // A page with zero jobs still gets its (empty) directory.
        self.writer.ensure_page_dir(task.page)?;

        let mut stats = TaskStats {
            found: stubs.len(),
            ..TaskStats::default()
        };
        let mut used_names: HashSet<String> = HashSet::new();

        for stub in &stubs {
            match self.process_stub(stub, task.page, &mut used_names).await {
                Ok(path) => {
                    debug!("Worker {} wrote {}", self.id, path.display());
                    stats.written += 1;
                }
                Err(err) if self.policy == FailurePolicy::Skip => {
                    warn!(
                        "Worker {} skipping job '{}' on page {}: {}",
                        self.id, stub.title, task.page, err
                    );
                    stats.skipped += 1;
                }
                Err(err) => return Err(err),
            }
        }

        Ok(stats)
    }

    /// Resolve, fetch, and persist one job.
    async fn process_stub(
        &self,
        stub: &JobStub,
        page: u32,
        used_names: &mut HashSet<String>,
    ) -> Result<PathBuf, TaskError> {
        let key = listing::resolve_job_key(&stub.reference)?;

        debug!(
            "Worker {} page {} pulling job details for '{}'",
            self.id, page, stub.title
        );
        let detail = self.api.fetch_detail(&key).await?;

        // Two jobs on one page can sanitize to the same name; disambiguate
        // with the lookup key rather than silently overwriting.
        let mut name = sanitize_title(&detail.title);
        if !used_names.insert(name.clone()) {
            name = format!("{}_{}", name, key);
        }

        let path = self.writer.write_detail(page, &name, &detail.raw)?;
        Ok(path)
    }
}

/// Creates the worker pool, feeds it one task per page, and waits for every
/// page to be acknowledged.
pub struct Dispatcher<A> {
    config: CrawlConfig,
    api: Arc<A>,
    writer: Arc<ArtifactWriter>,
}

impl<A: JobApi> Dispatcher<A> {
    /// Create a dispatcher over the given API client and writer.
    pub fn new(config: CrawlConfig, api: Arc<A>, writer: Arc<ArtifactWriter>) -> Self {
        Self {
            config,
            api,
            writer,
        }
    }

    /// Crawl pages 1..=page_limit for the given search.
    ///
    /// Returns after exactly `page_limit` tasks have reported completion, or
    /// as soon as one fails under the abort policy.
    pub async fn run(&self, query: &str, location: &str) -> Result<CrawlStats, CrawlError> {
        let page_limit = self.config.page_limit;
        let workers = self.config.workers;

        info!(
            "Dispatching {} pages across {} workers",
            page_limit, workers
        );

        // Queue sized to hold every task so the enqueuing side never blocks.
        let (task_tx, task_rx) = mpsc::channel::<ScrapeTask>(page_limit as usize);
        let (report_tx, mut report_rx) = mpsc::channel::<TaskReport>(page_limit as usize);
        let task_rx = Arc::new(Mutex::new(task_rx));

        // Workers start before anything is enqueued so no task can be missed.
        let mut handles = Vec::with_capacity(workers);
        for id in 0..workers {
            let worker = Worker {
                id,
                api: Arc::clone(&self.api),
                writer: Arc::clone(&self.writer),
                policy: self.config.on_error,
            };
            handles.push(tokio::spawn(
                worker.run(Arc::clone(&task_rx), report_tx.clone()),
            ));
        }
        drop(report_tx);

        for page in 1..=page_limit {
            let task = ScrapeTask {
                query: query.to_string(),
                location: location.to_string(),
                page,
            };
            if task_tx.send(task).await.is_err() {
                return Err(CrawlError::WorkersExited);
            }
        }
        // Close the queue so workers exit once it is drained.
        drop(task_tx);

        let mut stats = CrawlStats::default();
        for _ in 0..page_limit {
            let report = report_rx.recv().await.ok_or(CrawlError::WorkersExited)?;
            match report.result {
                Ok(task_stats) => {
                    stats.pages_crawled += 1;
                    stats.jobs_found += task_stats.found;
                    stats.jobs_written += task_stats.written;
                    stats.jobs_skipped += task_stats.skipped;
                }
                Err(err) => match self.config.on_error {
                    FailurePolicy::Skip => {
                        warn!("Page {} failed, continuing: {}", report.page, err);
                        stats.pages_failed += 1;
                    }
                    FailurePolicy::Abort => {
                        for handle in &handles {
                            handle.abort();
                        }
                        return Err(CrawlError::Task {
                            page: report.page,
                            source: err,
                        });
                    }
                },
            }
        }

        for handle in handles {
            let _ = handle.await;
        }

        info!(
            "Crawl complete: {} pages, {} jobs written",
            stats.pages_crawled, stats.jobs_written
        );
        Ok(stats)
    }
}

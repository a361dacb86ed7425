//! Scrape orchestrator: one concurrent pipeline per page.
//!
//! Each [`PageTarget`] runs fetch → parse → download in its own Tokio task.
//! Pipelines share only the [`HttpClient`]. Image failures never fail a
//! page; a fetch or parse failure does.
//!
//! # Fail-fast
//!
//! With `fail_fast` set (the default), the first page-level failure aborts
//! the remaining tasks. The orchestrator then drains the task set so every
//! aborted pipeline drops its responses and decoders before
//! [`ScrapeOrchestrator::run`] returns. Image re-encodes run on blocking
//! threads that abort cannot stop; `run` waits for them too, so a page
//! reported as cancelled may still have images it finished writing. The
//! caller turns the report into the process exit code.
//!
//! # Concurrency Model
//!
//! - All pages are spawned up front
//! - With `max_concurrent_pages` set, a semaphore permit is taken before a
//!   pipeline starts and released when it ends (RAII)
//! - Within a pipeline the stages run strictly in order

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info, instrument, warn};

use crate::config::ScrapeConfig;
use crate::download::{ImageDownloader, ImageStats};
use crate::fetch::HttpClient;
use crate::parser::parse_page;
use crate::{PageTarget, ScrapeError};

/// Lifecycle of one page pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageState {
    /// Not started.
    Pending,
    /// Page response received.
    Fetched,
    /// Image list extracted.
    Parsed,
    /// Images being downloaded.
    Downloading,
    /// Every image attempted.
    Done,
    /// Fetch or parse failed.
    Failed(String),
}

impl PageState {
    /// Whether `next` is a legal successor of `self`.
    #[must_use]
    pub fn can_advance_to(&self, next: &PageState) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Fetched)
                | (Self::Fetched, Self::Parsed)
                | (Self::Parsed, Self::Downloading)
                | (Self::Downloading, Self::Done)
                | (Self::Pending | Self::Fetched | Self::Parsed, Self::Failed(_))
        )
    }

    /// Whether the pipeline has finished.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed(_))
    }
}

impl fmt::Display for PageState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => f.write_str("pending"),
            Self::Fetched => f.write_str("fetched"),
            Self::Parsed => f.write_str("parsed"),
            Self::Downloading => f.write_str("downloading"),
            Self::Done => f.write_str("done"),
            Self::Failed(reason) => write!(f, "failed: {reason}"),
        }
    }
}

/// Final state of one page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageReport {
    /// Page OID.
    pub oid: String,
    /// Terminal state.
    pub state: PageState,
    /// Image counts (zero when the page failed).
    pub images: ImageStats,
}

impl PageReport {
    /// Whether the page failed.
    #[must_use]
    pub fn is_failed(&self) -> bool {
        matches!(self.state, PageState::Failed(_))
    }
}

/// Summary of a whole run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Finished pages, in configured order.
    pub pages: Vec<PageReport>,
    /// OIDs of pages aborted by fail-fast.
    pub cancelled: Vec<String>,
    /// OIDs of pages whose task panicked.
    pub panicked: Vec<String>,
}

impl RunReport {
    /// Pages that completed.
    #[must_use]
    pub fn pages_done(&self) -> usize {
        self.pages.iter().filter(|p| p.state == PageState::Done).count()
    }

    /// Pages that failed, including panicked tasks.
    #[must_use]
    pub fn pages_failed(&self) -> usize {
        self.pages.iter().filter(|p| p.is_failed()).count() + self.panicked.len()
    }

    /// Images written across all pages.
    #[must_use]
    pub fn images_saved(&self) -> usize {
        self.pages.iter().map(|p| p.images.saved).sum()
    }

    /// Images that failed across all pages.
    #[must_use]
    pub fn images_failed(&self) -> usize {
        self.pages.iter().map(|p| p.images.failed).sum()
    }

    /// Whether every page completed.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.pages_failed() == 0 && self.cancelled.is_empty()
    }

    /// Process exit code: 0 on full success, 1 otherwise.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        i32::from(!self.is_success())
    }
}

/// Tracks one pipeline's state and logs transitions.
#[derive(Debug)]
struct PagePipeline<'a> {
    oid: &'a str,
    state: PageState,
}

impl<'a> PagePipeline<'a> {
    fn new(oid: &'a str) -> Self {
        Self {
            oid,
            state: PageState::Pending,
        }
    }

    fn advance(&mut self, next: PageState) {
        if !self.state.can_advance_to(&next) {
            warn!(oid = self.oid, from = %self.state, to = %next, "unexpected page transition");
        }
        debug!(oid = self.oid, from = %self.state, to = %next, "page transition");
        self.state = next;
    }

    fn fail(mut self, error: &ScrapeError) -> PageReport {
        self.advance(PageState::Failed(error.to_string()));
        self.finish(ImageStats::default())
    }

    fn finish(self, images: ImageStats) -> PageReport {
        PageReport {
            oid: self.oid.to_string(),
            state: self.state,
            images,
        }
    }
}

/// Runs a single page end to end.
#[instrument(skip_all, fields(oid = %target.oid()))]
pub async fn run_page(
    client: &HttpClient,
    downloader: &ImageDownloader,
    target: &PageTarget,
) -> PageReport {
    let oid = target.oid();
    let mut pipeline = PagePipeline::new(oid);

    let page = match client.fetch_page(target).await {
        Ok(page) => page,
        Err(e) => {
            error!(oid, error = %e, scope = ?e.scope(), "could not open webpage");
            return pipeline.fail(&e);
        }
    };
    info!(oid, "loaded webpage");
    pipeline.advance(PageState::Fetched);

    let images = match parse_page(page).await {
        Ok(images) => images,
        Err(e) => {
            error!(oid, error = %e, scope = ?e.scope(), "could not parse webpage");
            return pipeline.fail(&e);
        }
    };
    info!(oid, images = images.len(), "parsed webpage");
    pipeline.advance(PageState::Parsed);

    pipeline.advance(PageState::Downloading);
    let stats = downloader.download_all(oid, target.url(), &images).await;
    pipeline.advance(PageState::Done);
    info!(oid, saved = stats.saved, failed = stats.failed, "finished webpage");
    pipeline.finish(stats)
}

/// Runs page pipelines concurrently and collects their reports.
#[derive(Debug, Clone)]
pub struct ScrapeOrchestrator {
    client: HttpClient,
    downloader: ImageDownloader,
    limiter: Option<Arc<Semaphore>>,
    fail_fast: bool,
}

impl ScrapeOrchestrator {
    /// Creates an orchestrator around an existing client.
    #[must_use]
    pub fn new(client: HttpClient, config: &ScrapeConfig) -> Self {
        let downloader =
            ImageDownloader::new(client.clone(), config.retry.clone(), config.output_dir.clone());
        Self {
            client,
            downloader,
            limiter: config
                .max_concurrent_pages
                .map(|limit| Arc::new(Semaphore::new(limit))),
            fail_fast: config.fail_fast,
        }
    }

    /// Builds the client from `config` and creates the orchestrator.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError::Client`] if the HTTP client cannot be built.
    pub fn from_config(config: &ScrapeConfig) -> Result<Self, ScrapeError> {
        let client = HttpClient::with_timeouts(config.connect_timeout_secs, config.read_timeout_secs)?;
        Ok(Self::new(client, config))
    }

    /// Runs every target and waits for all pipelines to reach a terminal state.
    #[instrument(skip_all, fields(pages = targets.len()))]
    pub async fn run(&self, targets: Vec<PageTarget>) -> RunReport {
        let mut tasks = JoinSet::new();
        let mut by_task = HashMap::new();

        for (index, target) in targets.into_iter().enumerate() {
            let oid = target.oid().to_string();
            let client = self.client.clone();
            let downloader = self.downloader.clone();
            let limiter = self.limiter.clone();

            let handle = tasks.spawn(async move {
                // Permit is dropped when this block exits (RAII)
                let _permit = match limiter {
                    Some(semaphore) => semaphore.acquire_owned().await.ok(),
                    None => None,
                };
                run_page(&client, &downloader, &target).await
            });
            by_task.insert(handle.id(), (index, oid));
        }

        debug!(task_count = by_task.len(), "waiting for pages to complete");

        let mut finished = Vec::new();
        let mut report = RunReport::default();
        let mut aborting = false;

        while let Some(joined) = tasks.join_next_with_id().await {
            match joined {
                Ok((id, page)) => {
                    let index = by_task.get(&id).map_or(usize::MAX, |(index, _)| *index);
                    if page.is_failed() && self.fail_fast && !aborting {
                        warn!(oid = %page.oid, "page failed, stopping remaining pages");
                        tasks.abort_all();
                        aborting = true;
                    }
                    finished.push((index, page));
                }
                Err(e) => {
                    let oid = by_task
                        .get(&e.id())
                        .map(|(_, oid)| oid.clone())
                        .unwrap_or_default();
                    if e.is_cancelled() {
                        debug!(oid = %oid, "page cancelled");
                        report.cancelled.push(oid);
                    } else {
                        error!(oid = %oid, error = %e, "page task panicked");
                        report.panicked.push(oid);
                        if self.fail_fast && !aborting {
                            tasks.abort_all();
                            aborting = true;
                        }
                    }
                }
            }
        }

        self.downloader.wait_for_writes().await;

        finished.sort_by_key(|(index, _)| *index);
        report.pages = finished.into_iter().map(|(_, page)| page).collect();

        info!(
            done = report.pages_done(),
            failed = report.pages_failed(),
            cancelled = report.cancelled.len(),
            images_saved = report.images_saved(),
            images_failed = report.images_failed(),
            "scrape complete"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_machine_happy_path() {
        let path = [
            PageState::Pending,
            PageState::Fetched,
            PageState::Parsed,
            PageState::Downloading,
            PageState::Done,
        ];
        for pair in path.windows(2) {
            assert!(pair[0].can_advance_to(&pair[1]), "{} -> {}", pair[0], pair[1]);
        }
        assert!(PageState::Done.is_terminal());
    }

    #[test]
    fn test_state_machine_failure_edges() {
        let failed = PageState::Failed("boom".into());
        assert!(PageState::Pending.can_advance_to(&failed));
        assert!(PageState::Fetched.can_advance_to(&failed));
        assert!(PageState::Parsed.can_advance_to(&failed));
        assert!(!PageState::Downloading.can_advance_to(&failed));
        assert!(!failed.can_advance_to(&PageState::Pending));
        assert!(!failed.can_advance_to(&PageState::Done));
        assert!(failed.is_terminal());
    }

    #[test]
    fn test_state_machine_rejects_skips() {
        assert!(!PageState::Pending.can_advance_to(&PageState::Parsed));
        assert!(!PageState::Fetched.can_advance_to(&PageState::Done));
        assert!(!PageState::Done.can_advance_to(&PageState::Pending));
    }

    #[test]
    fn test_pipeline_fail_produces_failed_report() {
        let pipeline = PagePipeline::new("wales");
        let report = pipeline.fail(&ScrapeError::bad_status("https://x/wales", 500));
        assert_eq!(report.oid, "wales");
        assert!(report.is_failed());
        assert_eq!(report.images, ImageStats::default());
    }

    #[test]
    fn test_run_report_exit_code() {
        let done = PageReport {
            oid: "england".into(),
            state: PageState::Done,
            images: ImageStats { saved: 3, failed: 1 },
        };
        let mut report = RunReport {
            pages: vec![done.clone()],
            ..RunReport::default()
        };
        assert_eq!(report.exit_code(), 0);
        assert_eq!(report.images_saved(), 3);
        assert_eq!(report.images_failed(), 1);

        report.pages.push(PageReport {
            oid: "wales".into(),
            state: PageState::Failed("HTTP 500".into()),
            images: ImageStats::default(),
        });
        assert_eq!(report.pages_failed(), 1);
        assert_eq!(report.exit_code(), 1);

        let cancelled = RunReport {
            pages: vec![done],
            cancelled: vec!["scotland".into()],
            panicked: Vec::new(),
        };
        assert_eq!(cancelled.exit_code(), 1);
    }
}

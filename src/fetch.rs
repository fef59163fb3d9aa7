//! Fetch-and-store loop: walks the listing, fetches each message, stores its record.
//!
//! The loop owns the listing cursor. Each iteration:
//! 1. Lists one page with the current cursor (none on the first call)
//! 2. Stops if the page has no summaries
//! 3. Fetches, assembles and stores every message on the page, in order
//! 4. Stops if the page carried no continuation token, else advances
//!
//! Everything runs sequentially. Client and store errors end the run;
//! body extraction errors end it too unless the failure policy says skip.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::mail::{ListQuery, MailClient};
use crate::progress::{NoProgress, Progress, ProgressReporter};
use crate::record::MessageRecord;
use crate::store::Store;

/// What to do when one message's body cannot be extracted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// End the whole run with the error.
    #[default]
    Abort,
    /// Leave the message unstored, note it in the report, keep going.
    Skip,
}

/// Options for one fetch run.
#[derive(Debug, Clone, Default)]
pub struct FetchOptions {
    /// Filters sent with every listing request.
    pub query: ListQuery,
    /// Stop after this many pages even if the provider offers more.
    pub max_pages: Option<u32>,
    pub failure_policy: FailurePolicy,
}

/// A message left out of the store under [`FailurePolicy::Skip`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedMessage {
    pub id: String,
    pub reason: String,
}

/// Outcome of a completed run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Records written to the store.
    pub stored: usize,
    /// Non-empty pages processed.
    pub pages: u32,
    pub skipped: Vec<SkippedMessage>,
    /// True when `max_pages` stopped the run before the listing ended.
    pub truncated: bool,
}

/// Drives one listing from first page to last.
pub struct FetchLoop {
    client: Arc<dyn MailClient>,
    store: Arc<dyn Store>,
    options: FetchOptions,
    progress: Arc<dyn ProgressReporter>,
}

impl FetchLoop {
    pub fn new(client: Arc<dyn MailClient>, store: Arc<dyn Store>) -> Self {
        Self {
            client,
            store,
            options: FetchOptions::default(),
            progress: Arc::new(NoProgress),
        }
    }

    pub fn with_options(mut self, options: FetchOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_progress(mut self, progress: Arc<dyn ProgressReporter>) -> Self {
        self.progress = progress;
        self
    }

    /// Run the loop to completion.
    pub async fn run(&self) -> Result<RunReport> {
        let mut report = RunReport::default();

        if let Err(err) = self.walk(&mut report).await {
            self.progress.failed(report.stored);
            return Err(err);
        }

        self.progress.finished(report.stored);
        info!(
            stored = report.stored,
            pages = report.pages,
            skipped = report.skipped.len(),
            truncated = report.truncated,
            "Fetch run finished"
        );
        Ok(report)
    }

    async fn walk(&self, report: &mut RunReport) -> Result<()> {
        let mut cursor: Option<String> = None;

        info!(
            query = ?self.options.query.query,
            labels = ?self.options.query.label_ids,
            max_pages = ?self.options.max_pages,
            "Fetch run started"
        );

        loop {
            if let Some(max) = self.options.max_pages
                && report.pages >= max
            {
                warn!(pages = report.pages, "Page limit reached, stopping before end of listing");
                report.truncated = true;
                break;
            }

            let page = self
                .client
                .list_page(cursor.as_deref(), &self.options.query)
                .await?;

            if page.summaries.is_empty() {
                debug!(page = report.pages + 1, "Empty page, listing finished");
                break;
            }

            report.pages += 1;
            let page_size = page.summaries.len();

            for (index, summary) in page.summaries.iter().enumerate() {
                let message = self.client.get_message(&summary.id).await?;

                let record = match MessageRecord::from_remote(&summary.id, &message) {
                    Ok(record) => record,
                    Err(source) => match self.options.failure_policy {
                        FailurePolicy::Abort => {
                            return Err(Error::MessageBody {
                                id: summary.id.clone(),
                                source,
                            });
                        }
                        FailurePolicy::Skip => {
                            warn!(id = %summary.id, error = %source, "Skipping message with undecodable body");
                            report.skipped.push(SkippedMessage {
                                id: summary.id.clone(),
                                reason: source.to_string(),
                            });
                            continue;
                        }
                    },
                };

                self.store.put(&record.id, &record).await?;
                report.stored += 1;
                debug!(id = %record.id, total = report.stored, "Message stored");

                self.progress.message_stored(&Progress {
                    total: report.stored,
                    page: report.pages,
                    position: index + 1,
                    page_size,
                    result_size_estimate: page.result_size_estimate,
                });
            }

            match page.next_page_token {
                Some(token) => cursor = Some(token),
                None => break,
            }
        }

        Ok(())
    }
}

/// Run a fetch with default options and return the number of records stored.
pub async fn run(client: Arc<dyn MailClient>, store: Arc<dyn Store>) -> Result<usize> {
    let report = FetchLoop::new(client, store).run().await?;
    Ok(report.stored)
}

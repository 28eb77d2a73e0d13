//! Batch dispatch
//!
//! Renders one prompt per record and calls the [`TextGenerator`] for all of
//! them concurrently. Every call resolves to an [`Outcome`]; a failing record
//! never aborts its siblings, and outcomes come back in input order
//! regardless of completion order.

use crate::service::TextGenerator;
use crate::template::render;
use crate::types::{BatchId, BatchReport, Outcome, Record};
use futures::future::join_all;
use std::sync::Arc;
use tracing::Instrument;

/// Fan-out dispatcher over a text generator
#[derive(Clone)]
pub struct BatchDispatcher {
    generator: Arc<dyn TextGenerator>,
}

impl std::fmt::Debug for BatchDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchDispatcher").finish_non_exhaustive()
    }
}

impl BatchDispatcher {
    /// Create dispatcher over `generator`
    #[inline]
    #[must_use]
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    /// Process every record with `template`
    ///
    /// The returned report holds exactly one outcome per record, in the
    /// order of `records`. No concurrency cap is applied.
    pub async fn process(&self, records: &[Record], template: &str) -> BatchReport {
        let id = BatchId::new();
        let span = tracing::info_span!("batch", %id, records = records.len());

        async move {
            let generator = &self.generator;
            let calls = records.iter().enumerate().map(|(index, record)| {
                let prompt = render(template, record);
                async move {
                    match generator.generate(&prompt).await {
                        Ok(content) => Outcome::Success(content),
                        Err(err) => {
                            tracing::warn!(index, "Record failed: {}", err);
                            Outcome::Failure(err.to_string())
                        }
                    }
                }
            });

            let report = BatchReport {
                id,
                outcomes: join_all(calls).await,
            };
            tracing::info!(
                succeeded = report.succeeded(),
                failed = report.failed(),
                "Batch completed"
            );
            report
        }
        .instrument(span)
        .await
    }
}

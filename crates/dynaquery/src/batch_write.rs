//! Chunked batch writes with retry of unprocessed items.
//!
//! Input of any length is split into chunks the store accepts in a single
//! call. Each chunk is submitted on its own; whatever the backend reports as
//! unprocessed is resubmitted, alone, after a backoff. Chunks do not affect
//! each other: a failing chunk neither stops nor undoes the others.

use futures_util::stream::{self, StreamExt};
use tokio::sync::watch;

use dynaquery_core::batch::{chunk, MAX_BATCH_WRITE_SIZE};
use dynaquery_core::client::{BatchWriteRequest, WriteRequest};
use dynaquery_core::{Error, Result};

use crate::retry::backoff;
use crate::table::TableHandle;

/// What a completed batch write did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchWriteSummary {
    /// Items confirmed written.
    pub items: usize,
    pub chunks: usize,
    /// Resubmissions across all chunks.
    pub retries: usize,
}

/// Applies arbitrary-length lists of puts and deletes.
#[derive(Debug, Clone)]
pub struct BatchWriteExecutor {
    table: TableHandle,
}

enum ChunkOutcome {
    Done {
        committed: Vec<WriteRequest>,
        retries: usize,
    },
    Incomplete {
        committed: Vec<WriteRequest>,
        unprocessed: Vec<WriteRequest>,
        retries: usize,
    },
    Rejected {
        committed: Vec<WriteRequest>,
        unprocessed: Vec<WriteRequest>,
        message: String,
    },
    Cancelled {
        committed: Vec<WriteRequest>,
        unknown: Vec<WriteRequest>,
        not_submitted: Vec<WriteRequest>,
    },
}

/// Resolves once cancellation is requested. Never resolves if the sender is
/// dropped without cancelling.
async fn cancelled(cancel: &mut watch::Receiver<bool>) {
    if cancel.wait_for(|c| *c).await.is_err() {
        std::future::pending::<()>().await;
    }
}

fn is_cancelled(cancel: &Option<watch::Receiver<bool>>) -> bool {
    cancel.as_ref().is_some_and(|rx| *rx.borrow())
}

impl BatchWriteExecutor {
    pub fn new(table: TableHandle) -> Self {
        Self { table }
    }

    /// Writes every request, retrying unprocessed items and transient
    /// failures.
    pub async fn write_all(&self, requests: Vec<WriteRequest>) -> Result<BatchWriteSummary> {
        self.execute(requests, None).await
    }

    /// Like [`write_all`](Self::write_all), stopping as soon as `cancel`
    /// turns `true`.
    ///
    /// A cancelled run fails with `BatchCancelled`, splitting the input into
    /// items confirmed by the backend, items whose call was in flight, and
    /// items that were not written.
    pub async fn write_all_with_cancel(
        &self,
        requests: Vec<WriteRequest>,
        cancel: watch::Receiver<bool>,
    ) -> Result<BatchWriteSummary> {
        self.execute(requests, Some(cancel)).await
    }

    async fn execute(
        &self,
        requests: Vec<WriteRequest>,
        cancel: Option<watch::Receiver<bool>>,
    ) -> Result<BatchWriteSummary> {
        if requests.is_empty() {
            return Ok(BatchWriteSummary::default());
        }

        let total = requests.len();
        let chunks = chunk(requests, MAX_BATCH_WRITE_SIZE);
        let chunk_count = chunks.len();
        tracing::debug!(
            table = %self.table.name(),
            items = total,
            chunks = chunk_count,
            concurrency = self.table.concurrency(),
            "Starting batch write"
        );

        let outcomes: Vec<ChunkOutcome> = stream::iter(chunks)
            .map(|requests| self.run_chunk(requests, cancel.clone()))
            .buffer_unordered(self.table.concurrency())
            .collect()
            .await;

        self.combine(outcomes, chunk_count)
    }

    async fn run_chunk(
        &self,
        requests: Vec<WriteRequest>,
        mut cancel: Option<watch::Receiver<bool>>,
    ) -> ChunkOutcome {
        let policy = self.table.retry_policy();
        let mut pending = requests;
        let mut committed = Vec::with_capacity(pending.len());
        let mut attempt = 0;

        loop {
            if is_cancelled(&cancel) {
                return ChunkOutcome::Cancelled {
                    committed,
                    unknown: Vec::new(),
                    not_submitted: pending,
                };
            }

            let call = self.table.client().batch_write_item(BatchWriteRequest {
                table_name: self.table.name().to_string(),
                requests: pending.clone(),
            });
            let result = match cancel.as_mut() {
                Some(rx) => tokio::select! {
                    result = call => result,
                    _ = cancelled(rx) => {
                        return ChunkOutcome::Cancelled {
                            committed,
                            unknown: pending,
                            not_submitted: Vec::new(),
                        };
                    }
                },
                None => call.await,
            };

            match result {
                Ok(response) => {
                    let unprocessed = response.unprocessed;
                    let mut written = pending;
                    for item in &unprocessed {
                        if let Some(position) = written.iter().position(|w| w == item) {
                            written.swap_remove(position);
                        }
                    }
                    committed.extend(written);

                    if unprocessed.is_empty() {
                        return ChunkOutcome::Done {
                            committed,
                            retries: attempt,
                        };
                    }
                    if !policy.should_retry(attempt) {
                        return ChunkOutcome::Incomplete {
                            committed,
                            unprocessed,
                            retries: attempt,
                        };
                    }
                    tracing::warn!(
                        table = %self.table.name(),
                        unprocessed = unprocessed.len(),
                        attempt = attempt + 1,
                        "Resubmitting unprocessed items"
                    );
                    pending = unprocessed;
                }
                Err(err) if err.is_transient() => {
                    if !policy.should_retry(attempt) {
                        return ChunkOutcome::Incomplete {
                            committed,
                            unprocessed: pending,
                            retries: attempt,
                        };
                    }
                    tracing::warn!(
                        table = %self.table.name(),
                        items = pending.len(),
                        attempt = attempt + 1,
                        error = %err,
                        "Transient batch write failure, retrying"
                    );
                }
                Err(err) => {
                    return ChunkOutcome::Rejected {
                        committed,
                        unprocessed: pending,
                        message: err.to_string(),
                    };
                }
            }

            let delay = backoff(policy, attempt);
            attempt += 1;
            match cancel.as_mut() {
                Some(rx) => tokio::select! {
                    _ = tokio::time::sleep(delay) => {}
                    _ = cancelled(rx) => {
                        return ChunkOutcome::Cancelled {
                            committed,
                            unknown: Vec::new(),
                            not_submitted: pending,
                        };
                    }
                },
                None => tokio::time::sleep(delay).await,
            }
        }
    }

    /// Cancellation wins over rejection, rejection over an exhausted retry
    /// budget. Items a failed chunk left behind are reported with the
    /// unwritten ones.
    fn combine(&self, outcomes: Vec<ChunkOutcome>, chunks: usize) -> Result<BatchWriteSummary> {
        let mut summary = BatchWriteSummary {
            chunks,
            ..Default::default()
        };
        let mut committed = Vec::new();
        let mut unknown = Vec::new();
        let mut not_submitted = Vec::new();
        let mut residue = Vec::new();
        let mut rejection: Option<String> = None;
        let mut was_cancelled = false;

        for outcome in outcomes {
            match outcome {
                ChunkOutcome::Done {
                    committed: written,
                    retries,
                } => {
                    summary.retries += retries;
                    committed.extend(written);
                }
                ChunkOutcome::Incomplete {
                    committed: written,
                    unprocessed,
                    retries,
                } => {
                    summary.retries += retries;
                    committed.extend(written);
                    residue.extend(unprocessed);
                }
                ChunkOutcome::Rejected {
                    committed: written,
                    unprocessed,
                    message,
                } => {
                    committed.extend(written);
                    residue.extend(unprocessed);
                    rejection.get_or_insert(message);
                }
                ChunkOutcome::Cancelled {
                    committed: written,
                    unknown: in_flight,
                    not_submitted: unsent,
                } => {
                    was_cancelled = true;
                    committed.extend(written);
                    unknown.extend(in_flight);
                    not_submitted.extend(unsent);
                }
            }
        }
        summary.items = committed.len();

        if was_cancelled {
            not_submitted.extend(residue);
            tracing::error!(
                table = %self.table.name(),
                committed = committed.len(),
                unknown = unknown.len(),
                not_submitted = not_submitted.len(),
                "Batch write cancelled"
            );
            return Err(Error::BatchCancelled {
                committed,
                unknown,
                not_submitted,
            });
        }

        if let Some(message) = rejection {
            tracing::error!(
                table = %self.table.name(),
                unprocessed = residue.len(),
                error = %message,
                "Batch write rejected"
            );
            return Err(Error::BatchRequestInvalid {
                message,
                unprocessed: residue,
            });
        }

        if !residue.is_empty() {
            tracing::error!(
                table = %self.table.name(),
                unprocessed = residue.len(),
                "Batch write abandoned with unprocessed items"
            );
            return Err(Error::BatchIncomplete {
                unprocessed: residue,
            });
        }

        tracing::debug!(
            table = %self.table.name(),
            items = summary.items,
            retries = summary.retries,
            "Batch write complete"
        );
        Ok(summary)
    }
}

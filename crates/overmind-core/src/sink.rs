//! Command sink: the single async boundary of a tick.
//!
//! Everything up to the sealed [`CommandBatch`] is synchronous. The
//! scheduler hands the batch to a [`CommandSink`] once per tick and awaits
//! it; the transport behind the sink is someone else's concern.

use std::future::Future;

use overmind_types::{BatchId, CommandBatch};
use tokio::sync::mpsc;

/// Errors a sink can report.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SinkError {
    /// The receiving side has gone away.
    #[error("command channel closed, batch {batch} dropped")]
    Closed {
        /// The batch that could not be delivered.
        batch: BatchId,
    },

    /// The transport rejected the batch.
    #[error("dispatch rejected: {reason}")]
    Rejected {
        /// Why the transport refused it.
        reason: String,
    },
}

/// Receives one command batch per tick.
pub trait CommandSink {
    /// Deliver `batch`.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError`] if the batch could not be delivered.
    fn dispatch(
        &mut self,
        batch: CommandBatch,
    ) -> impl Future<Output = Result<(), SinkError>> + Send;
}

/// Sink forwarding batches into a bounded tokio channel.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::Sender<CommandBatch>,
}

impl ChannelSink {
    /// Create a sink and the receiver for its batches.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<CommandBatch>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }

    /// Wrap an existing sender.
    pub const fn new(tx: mpsc::Sender<CommandBatch>) -> Self {
        Self { tx }
    }
}

impl CommandSink for ChannelSink {
    async fn dispatch(&mut self, batch: CommandBatch) -> Result<(), SinkError> {
        self.tx
            .send(batch)
            .await
            .map_err(|err| SinkError::Closed { batch: err.0.id })
    }
}

/// Sink keeping every batch in memory, for tests and offline runs.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    batches: Vec<CommandBatch>,
}

impl RecordingSink {
    /// An empty recording sink.
    pub const fn new() -> Self {
        Self { batches: Vec::new() }
    }

    /// All batches received, oldest first.
    pub fn batches(&self) -> &[CommandBatch] {
        &self.batches
    }

    /// The most recent batch.
    pub fn last(&self) -> Option<&CommandBatch> {
        self.batches.last()
    }

    /// Take every recorded batch, leaving the sink empty.
    pub fn drain(&mut self) -> Vec<CommandBatch> {
        std::mem::take(&mut self.batches)
    }
}

impl CommandSink for RecordingSink {
    async fn dispatch(&mut self, batch: CommandBatch) -> Result<(), SinkError> {
        self.batches.push(batch);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn batch(tick: u64) -> CommandBatch {
        CommandBatch {
            id: BatchId::new(),
            tick,
            dispatched_at: Utc::now(),
            commands: Vec::new(),
        }
    }

    #[tokio::test]
    async fn channel_sink_forwards_batches() {
        let (mut sink, mut rx) = ChannelSink::channel(4);
        sink.dispatch(batch(1)).await.unwrap();
        sink.dispatch(batch(2)).await.unwrap();
        assert_eq!(rx.recv().await.unwrap().tick, 1);
        assert_eq!(rx.recv().await.unwrap().tick, 2);
    }

    #[tokio::test]
    async fn closed_channel_reports_the_dropped_batch() {
        let (mut sink, rx) = ChannelSink::channel(1);
        drop(rx);
        let lost = batch(7);
        let id = lost.id;
        let err = sink.dispatch(lost).await.unwrap_err();
        assert_eq!(err, SinkError::Closed { batch: id });
    }

    #[tokio::test]
    async fn recording_sink_keeps_order() {
        let mut sink = RecordingSink::new();
        for tick in 0..3 {
            sink.dispatch(batch(tick)).await.unwrap();
        }
        assert_eq!(sink.batches().len(), 3);
        assert_eq!(sink.last().unwrap().tick, 2);
        assert_eq!(sink.drain().len(), 3);
        assert!(sink.batches().is_empty());
    }
}

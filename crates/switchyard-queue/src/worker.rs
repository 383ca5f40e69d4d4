//! Polling worker that drains a channel into a consumer.

use std::sync::Arc;
use std::time::Duration;

use switchyard_core::config::MessagingConfig;
use switchyard_core::error::DomainError;
use switchyard_core::queue::MessageQueue;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::consumer::MessageConsumer;

/// Outcome of one polling pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerReport {
    /// Messages consumed and acknowledged.
    pub processed: usize,
    /// Messages whose consumer failed; they stay unacknowledged.
    pub failed: usize,
}

/// Polls one channel and hands each message to a consumer.
///
/// A message is acknowledged only after its consumer succeeded. Failed
/// messages are left in flight so a recycling queue can redeliver them.
pub struct QueueWorker {
    queue: Arc<dyn MessageQueue>,
    channel: String,
    consumer: Arc<dyn MessageConsumer>,
    batch_size: usize,
    poll_interval: Duration,
}

impl QueueWorker {
    /// Creates a worker with the default batch size and poll interval.
    #[must_use]
    pub fn new(
        queue: Arc<dyn MessageQueue>,
        channel: impl Into<String>,
        consumer: Arc<dyn MessageConsumer>,
    ) -> Self {
        let defaults = MessagingConfig::default();
        Self {
            queue,
            channel: channel.into(),
            consumer,
            batch_size: defaults.worker_batch_size,
            poll_interval: defaults.poll_interval(),
        }
    }

    /// Creates a worker for `channel` using the batch size and poll interval
    /// from `config`.
    #[must_use]
    pub fn from_config(
        queue: Arc<dyn MessageQueue>,
        channel: impl Into<String>,
        consumer: Arc<dyn MessageConsumer>,
        config: &MessagingConfig,
    ) -> Self {
        Self::new(queue, channel, consumer)
            .with_batch_size(config.worker_batch_size)
            .with_poll_interval(config.poll_interval())
    }

    /// Caps how many messages one pass handles.
    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Sets the delay between passes.
    #[must_use]
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// The channel this worker drains.
    #[must_use]
    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// Consumes up to one batch of the messages currently on the channel.
    ///
    /// # Errors
    ///
    /// Returns the queue's error if dequeuing or acknowledging fails.
    /// Consumer failures are counted in the report instead.
    pub fn process_available(&self) -> Result<WorkerReport, DomainError> {
        let mut report = WorkerReport::default();
        for _ in 0..self.batch_size {
            let Some(message) = self.queue.dequeue(&self.channel)? else {
                break;
            };
            match self.consumer.consume(&message) {
                Ok(()) => {
                    self.queue.acknowledge(&self.channel, &message)?;
                    report.processed += 1;
                }
                Err(e) => {
                    warn!(
                        message_id = %message.id(),
                        channel = %self.channel,
                        error = %e,
                        "consumer failed, leaving message unacknowledged"
                    );
                    report.failed += 1;
                }
            }
        }
        if report != WorkerReport::default() {
            debug!(
                channel = %self.channel,
                processed = report.processed,
                failed = report.failed,
                "worker pass finished"
            );
        }
        Ok(report)
    }

    /// Polls until `shutdown` turns `true` or its sender is dropped.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        if *shutdown.borrow() {
            return;
        }
        info!(channel = %self.channel, "queue worker started");

        let mut interval = tokio::time::interval(self.poll_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if let Err(e) = self.process_available() {
                        error!(channel = %self.channel, error = %e, "queue worker pass failed");
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!(channel = %self.channel, "queue worker stopped");
    }

    /// Runs the worker on the tokio runtime.
    pub fn spawn(self, shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(async move { self.run(shutdown).await })
    }
}

#[cfg(test)]
mod tests {
    use switchyard_core::message::{CommandMessage, SerializedMessage};
    use switchyard_test_support::{
        FailingMessageQueue, RegisterUserCommand, TraceLog, init_test_tracing,
    };

    use super::*;
    use crate::memory::InMemoryMessageQueue;

    struct Recorder(TraceLog);

    impl MessageConsumer for Recorder {
        fn consume(&self, message: &SerializedMessage) -> Result<(), DomainError> {
            self.0.push(message.id().to_string());
            Ok(())
        }
    }

    struct Rejecting;

    impl MessageConsumer for Rejecting {
        fn consume(&self, _message: &SerializedMessage) -> Result<(), DomainError> {
            Err(DomainError::Validation("rejected".to_owned()))
        }
    }

    fn enqueue_commands(queue: &InMemoryMessageQueue, count: usize) -> Vec<String> {
        (0..count)
            .map(|_| {
                let message = CommandMessage::create(RegisterUserCommand::jsmith())
                    .serialize()
                    .unwrap();
                let id = message.id().to_string();
                queue.enqueue("commands", message).unwrap();
                id
            })
            .collect()
    }

    #[test]
    fn test_process_available_consumes_and_acknowledges_in_order() {
        // Arrange
        init_test_tracing();
        let queue = Arc::new(InMemoryMessageQueue::new());
        let ids = enqueue_commands(&queue, 3);
        let log = TraceLog::new();
        let worker = QueueWorker::new(queue.clone(), "commands", Arc::new(Recorder(log.clone())));

        // Act
        let report = worker.process_available().unwrap();

        // Assert
        assert_eq!(report, WorkerReport { processed: 3, failed: 0 });
        assert_eq!(log.entries(), ids);
        assert_eq!(queue.pending_len("commands"), 0);
        assert_eq!(queue.in_flight_len("commands"), 0);
    }

    #[test]
    fn test_process_available_stops_at_batch_size() {
        let queue = Arc::new(InMemoryMessageQueue::new());
        enqueue_commands(&queue, 5);
        let worker = QueueWorker::new(queue.clone(), "commands", Arc::new(Recorder(TraceLog::new())))
            .with_batch_size(2);

        let report = worker.process_available().unwrap();

        assert_eq!(report.processed, 2);
        assert_eq!(queue.pending_len("commands"), 3);
    }

    #[test]
    fn test_failed_message_is_left_unacknowledged() {
        // Arrange
        init_test_tracing();
        let queue = Arc::new(InMemoryMessageQueue::new());
        enqueue_commands(&queue, 1);
        let worker = QueueWorker::new(queue.clone(), "commands", Arc::new(Rejecting));

        // Act
        let report = worker.process_available().unwrap();

        // Assert
        assert_eq!(report, WorkerReport { processed: 0, failed: 1 });
        assert_eq!(queue.in_flight_len("commands"), 1);
    }

    #[test]
    fn test_queue_errors_propagate() {
        let worker = QueueWorker::new(
            Arc::new(FailingMessageQueue),
            "commands",
            Arc::new(Recorder(TraceLog::new())),
        );

        let result = worker.process_available();

        assert!(matches!(result, Err(DomainError::Infrastructure(_))));
    }

    #[test]
    fn test_from_config_uses_configured_batch_size() {
        let queue = Arc::new(InMemoryMessageQueue::new());
        enqueue_commands(&queue, 3);
        let config = MessagingConfig {
            worker_batch_size: 1,
            ..MessagingConfig::default()
        };
        let worker = QueueWorker::from_config(
            queue.clone(),
            "commands",
            Arc::new(Recorder(TraceLog::new())),
            &config,
        );

        let report = worker.process_available().unwrap();

        assert_eq!(report.processed, 1);
        assert_eq!(worker.channel(), "commands");
    }

    #[tokio::test]
    async fn test_run_drains_channel_until_shutdown() {
        // Arrange
        init_test_tracing();
        let queue = Arc::new(InMemoryMessageQueue::new());
        let ids = enqueue_commands(&queue, 2);
        let log = TraceLog::new();
        let worker = QueueWorker::new(queue.clone(), "commands", Arc::new(Recorder(log.clone())))
            .with_poll_interval(Duration::from_millis(5));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        // Act
        let handle = worker.spawn(shutdown_rx);
        tokio::time::timeout(Duration::from_secs(5), async {
            while log.entries().len() < 2 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();
        shutdown_tx.send(true).unwrap();

        // Assert
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(log.entries(), ids);
        assert_eq!(queue.in_flight_len("commands"), 0);
    }

    #[tokio::test]
    async fn test_run_returns_immediately_when_already_shut_down() {
        let queue = Arc::new(InMemoryMessageQueue::new());
        enqueue_commands(&queue, 1);
        let worker = QueueWorker::new(queue.clone(), "commands", Arc::new(Recorder(TraceLog::new())));
        let (_shutdown_tx, shutdown_rx) = watch::channel(true);

        worker.run(shutdown_rx).await;

        assert_eq!(queue.pending_len("commands"), 1);
    }
}

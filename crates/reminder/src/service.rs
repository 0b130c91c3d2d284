//! Ticker-driven reminder loop and its lifecycle.
//!
//! [`ReminderService::start`] drives the loop until either stop source
//! fires: external cancellation (the caller's watch channel) or the
//! internal one-shot stop signal raised by [`ReminderService::stop`].
//! Teardown order is strict — ticker, publisher, metrics server, done
//! latch — so `stop` returns only once the component has fully
//! quiesced.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};
use uuid::Uuid;

use warden_core::config::{MetricsConfig, ReminderConfig};
use warden_events::events::RepoReminder;
use warden_events::{topics, EventPublisher, EventsError, Message};
use warden_store::CatalogStore;

use crate::cursor::Cursor;
use crate::error::ReminderError;
use crate::fetcher::fetch_batch;
use crate::metrics::{MetricsServer, ReminderMetrics};

/// Deadline for each teardown stage.
const SHUTDOWN_DEADLINE: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lifecycle {
    New,
    Running,
    Draining,
    Stopped,
}

/// Stateless reminder scheduler.
///
/// Owns the pagination cursor and the publisher connection for its
/// lifetime; both are released exactly once on shutdown. A stopped
/// instance cannot be restarted.
pub struct ReminderService {
    reminder: ReminderConfig,
    metrics_cfg: MetricsConfig,
    store: Arc<dyn CatalogStore>,
    publisher: Arc<dyn EventPublisher>,
    lifecycle: Mutex<Lifecycle>,
    stop_tx: watch::Sender<bool>,
    done_tx: watch::Sender<bool>,
}

impl ReminderService {
    pub fn new(
        reminder: ReminderConfig,
        metrics: MetricsConfig,
        store: Arc<dyn CatalogStore>,
        publisher: Arc<dyn EventPublisher>,
    ) -> Self {
        let (stop_tx, _) = watch::channel(false);
        let (done_tx, _) = watch::channel(false);
        Self {
            reminder,
            metrics_cfg: metrics,
            store,
            publisher,
            lifecycle: Mutex::new(Lifecycle::New),
            stop_tx,
            done_tx,
        }
    }

    /// Run the reminder loop until cancelled or stopped.
    ///
    /// Returns `Ok(())` on clean cancellation and an error only for
    /// fatal startup problems: invalid configuration, a second start,
    /// or a metrics initialization failure.
    pub async fn start(&self, mut cancel: watch::Receiver<bool>) -> Result<(), ReminderError> {
        if self.reminder.interval.is_zero() {
            return Err(ReminderError::InvalidConfig(
                "interval must be positive".to_string(),
            ));
        }
        if self.reminder.batch_size == 0 {
            return Err(ReminderError::InvalidConfig(
                "batch_size must be positive".to_string(),
            ));
        }

        {
            let mut lifecycle = self.lifecycle.lock().unwrap();
            match *lifecycle {
                Lifecycle::New => *lifecycle = Lifecycle::Running,
                Lifecycle::Running => return Err(ReminderError::AlreadyRunning),
                Lifecycle::Draining | Lifecycle::Stopped => {
                    return Err(ReminderError::AlreadyStopped)
                }
            }
        }

        // Metric failures abort the start, but the publisher is still
        // released and the done latch resolved so `stop` cannot hang.
        let (metrics, metrics_server) = match self.init_metrics().await {
            Ok(pair) => pair,
            Err(e) => {
                self.set_lifecycle(Lifecycle::Draining);
                self.teardown(None).await;
                return Err(e);
            }
        };

        let mut stop_rx = self.stop_tx.subscribe();
        let mut cursor = Cursor::scattered();
        let mut seen: HashSet<Uuid> = HashSet::new();

        let mut ticker = tokio::time::interval(self.reminder.interval);
        // Coalesce: a tick that outlasts the interval drops the missed
        // wakeups instead of queueing them, keeping worst-case memory
        // bounded at one batch.
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(
            interval_secs = self.reminder.interval.as_secs(),
            batch_size = self.reminder.batch_size,
            min_elapsed_secs = self.reminder.min_elapsed.as_secs(),
            cursor = %cursor.position(),
            "reminder loop started"
        );

        loop {
            if *cancel.borrow_and_update() || *stop_rx.borrow_and_update() {
                break;
            }
            tokio::select! {
                res = cancel.changed() => {
                    // A dropped sender counts as cancellation.
                    if res.is_err() {
                        break;
                    }
                }
                _ = stop_rx.changed() => {}
                _ = ticker.tick() => {
                    tokio::select! {
                        res = self.run_tick(&mut cursor, &mut seen, metrics.as_deref()) => {
                            if let Err(e) = res {
                                warn!(error = %e, "tick failed, dropping batch");
                            }
                            if cursor.is_start() {
                                // New sweep: forget which entities we saw.
                                seen.clear();
                            }
                        }
                        _ = cancel.changed() => {
                            debug!("tick abandoned on cancellation");
                        }
                        _ = stop_rx.changed() => {
                            debug!("tick abandoned on stop");
                        }
                    }
                }
            }
        }

        // Ticker halted by loop exit; the rest of the teardown order is
        // publisher, metrics server, done latch.
        info!("reminder loop draining");
        self.set_lifecycle(Lifecycle::Draining);
        self.teardown(metrics_server).await;
        info!("reminder loop stopped");
        Ok(())
    }

    /// Request shutdown and wait until the component has quiesced.
    ///
    /// Safe to call any number of times; only the first call has any
    /// effect, and every call returns once teardown has finished. Also
    /// safe when the loop never started: the publisher is still
    /// released exactly once.
    pub async fn stop(&self) {
        let never_started = {
            let mut lifecycle = self.lifecycle.lock().unwrap();
            if *lifecycle == Lifecycle::New {
                *lifecycle = Lifecycle::Draining;
                true
            } else {
                false
            }
        };

        // send_replace updates the value even when the loop has not
        // subscribed yet; a plain send would be lost in that window.
        self.stop_tx.send_replace(true);

        if never_started {
            self.teardown(None).await;
        }

        let mut done_rx = self.done_tx.subscribe();
        let _ = done_rx.wait_for(|done| *done).await;
    }

    fn set_lifecycle(&self, state: Lifecycle) {
        let mut lifecycle = self.lifecycle.lock().unwrap();
        *lifecycle = state;
    }

    async fn init_metrics(
        &self,
    ) -> Result<(Option<Arc<ReminderMetrics>>, Option<MetricsServer>), ReminderError> {
        if !self.metrics_cfg.enabled {
            debug!("metrics disabled");
            return Ok((None, None));
        }
        let metrics = Arc::new(ReminderMetrics::new()?);
        let server = MetricsServer::spawn(&self.metrics_cfg.address, Arc::clone(&metrics)).await?;
        Ok((Some(metrics), Some(server)))
    }

    /// Close the publisher, stop the metrics server, and resolve the
    /// done latch, in that order. Errors are logged, never propagated —
    /// shutdown always completes.
    async fn teardown(&self, metrics_server: Option<MetricsServer>) {
        if let Err(e) = self.publisher.close().await {
            warn!(error = %e, "publisher close failed, continuing shutdown");
        }
        if let Some(server) = metrics_server {
            server.shutdown(SHUTDOWN_DEADLINE).await;
        }
        self.set_lifecycle(Lifecycle::Stopped);
        // The latch must resolve even when nobody is waiting yet.
        self.done_tx.send_replace(true);
    }

    async fn run_tick(
        &self,
        cursor: &mut Cursor,
        seen: &mut HashSet<Uuid>,
        metrics: Option<&ReminderMetrics>,
    ) -> Result<(), ReminderError> {
        let now = Utc::now();
        let batch = fetch_batch(
            self.store.as_ref(),
            cursor,
            self.reminder.batch_size,
            self.reminder.min_elapsed,
            now,
        )
        .await?;

        if batch.eligible.is_empty() {
            debug!(
                scanned = batch.entities.len(),
                cursor = %cursor.position(),
                "no eligible repositories in batch"
            );
            return Ok(());
        }

        let mut messages = Vec::with_capacity(batch.eligible.len());
        for entity in &batch.eligible {
            let event = RepoReminder::from_entity(entity);
            messages.push(Message::new(topics::REPO_REMINDER, &event).map_err(EventsError::from)?);
        }

        if let Some(m) = metrics {
            m.batch_size.observe(batch.eligible.len() as f64);
        }

        self.publisher.publish_batch(&messages).await?;
        info!(
            count = messages.len(),
            cursor = %cursor.position(),
            "published reminder batch"
        );

        if let Some(m) = metrics {
            let published_at = Utc::now();
            let min_elapsed = chrono::Duration::from_std(self.reminder.min_elapsed)
                .unwrap_or_else(|_| chrono::Duration::zero());
            for entity in &batch.eligible {
                if let Some(last) = batch.last_updated.get(&entity.id) {
                    let overdue = published_at - *last - min_elapsed;
                    let secs = (overdue.num_milliseconds() as f64 / 1000.0).max(0.0);
                    m.send_delay.observe(secs);
                    if seen.insert(entity.id) {
                        m.new_send_delay.observe(secs);
                    }
                }
            }
        }

        Ok(())
    }
}

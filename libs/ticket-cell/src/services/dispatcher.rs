use std::sync::Arc;

use chrono::Utc;
use futures::future::join_all;
use rand::Rng;
use tokio::sync::{mpsc, Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{timeout, Duration};
use tracing::{debug, error, info, instrument, warn};

use crate::models::{DispatcherConfig, NotificationJob, TicketStatus};
use crate::services::gateway::{DeliveryError, MessagingGateway};
use crate::services::store::TicketStore;

/// Asynchronous delivery of ticket confirmations.
///
/// `enqueue` hands the job to a pool of background workers and returns
/// immediately: the ticket request that triggered it is already committed and
/// must not wait on, or fail because of, the messaging provider. Delivery
/// outcomes land on the ticket row (`Notified` / `NotificationFailed`); a
/// ticket whose message never arrives is still a valid reservation.
pub struct NotificationDispatcher {
    tx: mpsc::UnboundedSender<NotificationJob>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    is_shutdown: Arc<RwLock<bool>>,
}

impl NotificationDispatcher {
    pub fn start(
        gateway: Arc<dyn MessagingGateway>,
        tickets: Arc<dyn TicketStore>,
        config: DispatcherConfig,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let rx = Arc::new(Mutex::new(rx));
        let is_shutdown = Arc::new(RwLock::new(false));

        let mut workers = Vec::with_capacity(config.workers);
        for i in 0..config.workers {
            let worker = DispatchWorker {
                name: format!("notify-{}", i),
                gateway: Arc::clone(&gateway),
                tickets: Arc::clone(&tickets),
                tx: tx.clone(),
                rx: Arc::clone(&rx),
                is_shutdown: Arc::clone(&is_shutdown),
                config: config.clone(),
            };
            workers.push(tokio::spawn(async move { worker.run().await }));
        }

        info!(
            "Notification dispatcher started with {} workers",
            config.workers
        );

        Self {
            tx,
            workers: Mutex::new(workers),
            is_shutdown,
        }
    }

    /// Fire-and-forget from the caller's perspective. Never blocks and never
    /// returns an error to the ticket flow; a closed queue is logged only.
    pub fn enqueue(&self, job: NotificationJob) {
        debug!("Enqueueing notification for ticket {}", job.ticket_id);
        if let Err(e) = self.tx.send(job) {
            error!(
                "Notification queue is closed; dropping job for ticket {}",
                e.0.ticket_id
            );
        }
    }

    pub async fn shutdown(&self) {
        info!("Shutting down notification dispatcher");

        {
            let mut flag = self.is_shutdown.write().await;
            *flag = true;
        }

        let handles: Vec<JoinHandle<()>> = self.workers.lock().await.drain(..).collect();
        join_all(handles).await;

        info!("Notification dispatcher shutdown complete");
    }
}

struct DispatchWorker {
    name: String,
    gateway: Arc<dyn MessagingGateway>,
    tickets: Arc<dyn TicketStore>,
    tx: mpsc::UnboundedSender<NotificationJob>,
    rx: Arc<Mutex<mpsc::UnboundedReceiver<NotificationJob>>>,
    is_shutdown: Arc<RwLock<bool>>,
    config: DispatcherConfig,
}

impl DispatchWorker {
    async fn run(&self) {
        debug!("Worker loop started: {}", self.name);

        loop {
            if *self.is_shutdown.read().await {
                debug!("Worker {} received shutdown signal", self.name);
                break;
            }

            let job = {
                let mut rx = self.rx.lock().await;
                match timeout(Duration::from_millis(100), rx.recv()).await {
                    Ok(Some(job)) => job,
                    Ok(None) => break,
                    Err(_) => continue,
                }
            };

            self.process_job(job).await;
        }

        debug!("Worker loop ended: {}", self.name);
    }

    #[instrument(skip(self, job), fields(ticket_id = %job.ticket_id))]
    async fn process_job(&self, mut job: NotificationJob) {
        // Jobs re-queued after a transient failure carry their earliest retry
        // time; honor it before touching the gateway.
        let now = Utc::now();
        if job.next_attempt_at > now {
            let wait = (job.next_attempt_at - now)
                .to_std()
                .unwrap_or(std::time::Duration::ZERO);
            tokio::time::sleep(wait).await;
        }

        match self
            .gateway
            .send(&job.recipient_contact, &job.message_body, job.ticket_id)
            .await
        {
            Ok(()) => {
                info!(
                    "Notification delivered for ticket {} (attempt {})",
                    job.ticket_id,
                    job.attempt_count + 1
                );
                self.mark_ticket(&job, TicketStatus::Notified).await;
            }
            Err(DeliveryError::Transient(msg)) => {
                job.attempt_count += 1;
                if job.can_retry() {
                    let delay = self.retry_delay(job.attempt_count);
                    warn!(
                        "Transient delivery failure for ticket {} (attempt {}/{}), retrying in {:?}: {}",
                        job.ticket_id, job.attempt_count, job.max_attempts, delay, msg
                    );
                    job.next_attempt_at = Utc::now()
                        + chrono::Duration::milliseconds(delay.as_millis() as i64);
                    if self.tx.send(job).is_err() {
                        error!("Notification queue closed during retry re-enqueue");
                    }
                } else {
                    warn!(
                        "Notification attempts exhausted for ticket {} after {} tries: {}",
                        job.ticket_id, job.attempt_count, msg
                    );
                    self.mark_ticket(&job, TicketStatus::NotificationFailed).await;
                }
            }
            Err(DeliveryError::Permanent(msg)) => {
                error!(
                    "Permanent delivery failure for ticket {}: {}",
                    job.ticket_id, msg
                );
                self.mark_ticket(&job, TicketStatus::NotificationFailed).await;
            }
            Err(DeliveryError::NotConfigured) => {
                error!(
                    "Messaging gateway not configured; ticket {} will not be notified",
                    job.ticket_id
                );
                self.mark_ticket(&job, TicketStatus::NotificationFailed).await;
            }
        }
    }

    /// A failed status write leaves the ticket `Issued`; the reservation
    /// itself is unaffected either way.
    async fn mark_ticket(&self, job: &NotificationJob, status: TicketStatus) {
        if let Err(e) = self.tickets.update_status(job.ticket_id, status).await {
            error!(
                "Failed to record notification outcome for ticket {}: {}",
                job.ticket_id, e
            );
        }
    }

    fn retry_delay(&self, attempt: u32) -> Duration {
        let base = self.config.retry_base_delay_ms.max(1);
        let exp = base.saturating_mul(1u64 << attempt.saturating_sub(1).min(6));
        let jitter = rand::thread_rng().gen_range(0..base);
        Duration::from_millis(exp + jitter)
    }
}

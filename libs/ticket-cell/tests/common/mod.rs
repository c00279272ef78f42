use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use tokio::sync::Mutex;
use tokio::time::Duration;
use uuid::Uuid;

use doctor_cell::models::Doctor;
use ticket_cell::*;

pub fn test_doctor(id: Uuid) -> Doctor {
    Doctor {
        id,
        full_name: "Dr. Amara Okafor".to_string(),
        specialty: "General Practice".to_string(),
        is_active: true,
        avg_consultation_minutes: Some(15),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

pub fn fast_allocator_config() -> AllocatorConfig {
    AllocatorConfig {
        max_attempts: 3,
        backoff_base_ms: 5,
    }
}

pub fn fast_dispatcher_config() -> DispatcherConfig {
    DispatcherConfig {
        workers: 2,
        retry_base_delay_ms: 10,
    }
}

/// Directory with a fixed roster, for tests that don't need call accounting.
pub struct StaticDirectory {
    doctors: HashMap<Uuid, Doctor>,
}

impl StaticDirectory {
    pub fn with_doctor(doctor: Doctor) -> Self {
        Self::with_doctors(vec![doctor])
    }

    pub fn with_doctors(doctors: Vec<Doctor>) -> Self {
        Self {
            doctors: doctors.into_iter().map(|d| (d.id, d)).collect(),
        }
    }

    pub fn empty() -> Self {
        Self {
            doctors: HashMap::new(),
        }
    }
}

#[async_trait]
impl DoctorDirectory for StaticDirectory {
    async fn get_active_doctor(&self, doctor_id: Uuid) -> Result<Doctor, TicketError> {
        self.doctors
            .get(&doctor_id)
            .cloned()
            .ok_or(TicketError::DoctorNotFound(doctor_id))
    }
}

/// Sequence store that fails its first N increments, then delegates.
pub struct FlakySequenceStore {
    inner: Arc<MemoryStore>,
    failures_remaining: AtomicU32,
}

impl FlakySequenceStore {
    pub fn new(inner: Arc<MemoryStore>, failures: u32) -> Self {
        Self {
            inner,
            failures_remaining: AtomicU32::new(failures),
        }
    }
}

#[async_trait]
impl SequenceStore for FlakySequenceStore {
    async fn next_number(
        &self,
        doctor_id: Uuid,
        service_day: NaiveDate,
        request_id: Uuid,
    ) -> Result<u32, TicketError> {
        let remaining = self.failures_remaining.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failures_remaining.store(remaining - 1, Ordering::SeqCst);
            return Err(TicketError::StoreUnavailable("injected outage".to_string()));
        }
        self.inner.next_number(doctor_id, service_day, request_id).await
    }
}

#[derive(Debug, Clone)]
pub struct SentMessage {
    pub to: String,
    pub body: String,
    pub idempotency_key: Uuid,
}

enum DefaultOutcome {
    Succeed,
    Transient,
    Permanent,
}

/// Gateway with scripted per-attempt outcomes; once the script runs out,
/// every further attempt resolves to the default outcome. Records every
/// attempt for assertions.
pub struct ScriptedGateway {
    script: Mutex<VecDeque<Result<(), DeliveryError>>>,
    sent: Mutex<Vec<SentMessage>>,
    default_outcome: DefaultOutcome,
}

impl ScriptedGateway {
    pub fn always_ok() -> Self {
        Self::new(Vec::new(), DefaultOutcome::Succeed)
    }

    pub fn always_transient() -> Self {
        Self::new(Vec::new(), DefaultOutcome::Transient)
    }

    pub fn always_permanent() -> Self {
        Self::new(Vec::new(), DefaultOutcome::Permanent)
    }

    pub fn with_script(outcomes: Vec<Result<(), DeliveryError>>) -> Self {
        Self::new(outcomes, DefaultOutcome::Succeed)
    }

    fn new(outcomes: Vec<Result<(), DeliveryError>>, default_outcome: DefaultOutcome) -> Self {
        Self {
            script: Mutex::new(outcomes.into()),
            sent: Mutex::new(Vec::new()),
            default_outcome,
        }
    }

    pub async fn attempts(&self) -> usize {
        self.sent.lock().await.len()
    }

    pub async fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().await.clone()
    }
}

#[async_trait]
impl MessagingGateway for ScriptedGateway {
    async fn send(
        &self,
        to: &str,
        body: &str,
        idempotency_key: Uuid,
    ) -> Result<(), DeliveryError> {
        self.sent.lock().await.push(SentMessage {
            to: to.to_string(),
            body: body.to_string(),
            idempotency_key,
        });

        match self.script.lock().await.pop_front() {
            Some(outcome) => outcome,
            None => match self.default_outcome {
                DefaultOutcome::Succeed => Ok(()),
                DefaultOutcome::Transient => {
                    Err(DeliveryError::Transient("scripted outage".to_string()))
                }
                DefaultOutcome::Permanent => {
                    Err(DeliveryError::Permanent("scripted rejection".to_string()))
                }
            },
        }
    }
}

/// Poll until the ticket reaches the expected status or the timeout passes.
pub async fn wait_for_ticket_status(
    store: &MemoryStore,
    ticket_id: Uuid,
    expected: TicketStatus,
    timeout_secs: u64,
) -> bool {
    let deadline = std::time::Instant::now() + std::time::Duration::from_secs(timeout_secs);

    loop {
        if let Ok(Some(ticket)) = TicketStore::get_ticket(store, ticket_id).await {
            if ticket.status == expected {
                return true;
            }
        }

        if std::time::Instant::now() > deadline {
            return false;
        }

        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}

/// Task envelope and priority lanes
///
/// Every task travels through Redis as a JSON-encoded [`TaskMessage`]. The
/// payload stays an opaque JSON value until the handler for `type` decodes
/// it, so the broker never needs to know task-specific shapes.

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;
use std::time::Duration;
use uuid::Uuid;

/// Task type for the welcome email sent after sign-up
pub const TASK_WELCOME_EMAIL: &str = "email:welcome";

/// Retries before a failing task is archived
pub const DEFAULT_MAX_RETRY: u32 = 25;

const RETRY_BASE_SECS: u64 = 10;
const RETRY_CAP_SECS: u64 = 60 * 60;

/// Priority lane
///
/// Workers pick lanes at random in proportion to their weight, so a busy
/// `critical` lane gets roughly 60% of polls without starving the others.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lane {
    Critical,
    #[default]
    Default,
    Low,
}

impl Lane {
    pub const ALL: [Lane; 3] = [Lane::Critical, Lane::Default, Lane::Low];

    pub fn as_str(&self) -> &'static str {
        match self {
            Lane::Critical => "critical",
            Lane::Default => "default",
            Lane::Low => "low",
        }
    }

    pub fn weight(&self) -> u32 {
        match self {
            Lane::Critical => 6,
            Lane::Default => 3,
            Lane::Low => 1,
        }
    }
}

impl fmt::Display for Lane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Order in which a worker polls the lanes on one iteration
///
/// Weighted sampling without replacement: the first lane is drawn by weight,
/// then the next from the remaining lanes, and so on.
pub fn lane_order<R: Rng + ?Sized>(rng: &mut R) -> Vec<Lane> {
    let mut remaining: Vec<Lane> = Lane::ALL.to_vec();
    let mut order = Vec::with_capacity(remaining.len());

    while !remaining.is_empty() {
        let total: u32 = remaining.iter().map(Lane::weight).sum();
        let mut pick = rng.gen_range(0..total);

        let mut index = remaining.len() - 1;
        for (i, lane) in remaining.iter().enumerate() {
            if pick < lane.weight() {
                index = i;
                break;
            }
            pick -= lane.weight();
        }

        order.push(remaining.remove(index));
    }

    order
}

/// Delay before retry number `retried` (0-based): 10s doubling, capped at 1h
pub fn retry_backoff(retried: u32) -> Duration {
    let factor = 1u64.checked_shl(retried.min(32)).unwrap_or(u64::MAX);
    Duration::from_secs(RETRY_BASE_SECS.saturating_mul(factor).min(RETRY_CAP_SECS))
}

/// Serialized unit of deferred work
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskMessage {
    pub id: Uuid,

    /// Handler key, e.g. `email:welcome`
    #[serde(rename = "type")]
    pub task_type: String,

    pub payload: JsonValue,

    /// Lane the task was enqueued on; set by the client
    #[serde(default)]
    pub queue: Lane,

    /// Failed attempts so far
    #[serde(default)]
    pub retried: u32,

    pub max_retry: u32,

    /// Error of the most recent failed attempt
    pub last_error: Option<String>,

    pub enqueued_at: DateTime<Utc>,
}

impl TaskMessage {
    /// Builds a task with a serialized payload
    pub fn new<P: Serialize>(task_type: impl Into<String>, payload: &P) -> Result<Self, serde_json::Error> {
        Ok(Self {
            id: Uuid::new_v4(),
            task_type: task_type.into(),
            payload: serde_json::to_value(payload)?,
            queue: Lane::Default,
            retried: 0,
            max_retry: DEFAULT_MAX_RETRY,
            last_error: None,
            enqueued_at: Utc::now(),
        })
    }

    pub fn with_max_retry(mut self, max_retry: u32) -> Self {
        self.max_retry = max_retry;
        self
    }

    /// Decodes the payload into the handler's type
    pub fn decode_payload<P: for<'de> Deserialize<'de>>(&self) -> Result<P, serde_json::Error> {
        serde_json::from_value(self.payload.clone())
    }

    /// True when another failure may still be retried
    pub fn can_retry(&self) -> bool {
        self.retried < self.max_retry
    }

    /// Copy recording one more failed attempt
    pub fn failed(&self, error: impl Into<String>) -> Self {
        Self {
            retried: self.retried + 1,
            last_error: Some(error.into()),
            ..self.clone()
        }
    }
}

/// Payload of `email:welcome`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WelcomeEmailPayload {
    pub to: String,
    pub first_name: String,
}

impl WelcomeEmailPayload {
    pub fn into_task(self) -> Result<TaskMessage, serde_json::Error> {
        TaskMessage::new(TASK_WELCOME_EMAIL, &self)
    }
}

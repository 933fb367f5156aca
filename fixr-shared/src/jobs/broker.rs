/// Redis-backed task broker
///
/// # Key layout (per lane)
///
/// ```text
/// fixr:queue:{lane}:pending   LIST   LPUSH on enqueue, RPOP on dequeue
/// fixr:queue:{lane}:active    LIST   tasks currently held by a worker
/// fixr:queue:{lane}:lease     ZSET   active task -> lease deadline (ms)
/// fixr:queue:{lane}:retry     ZSET   failed task -> next attempt (ms)
/// fixr:queue:{lane}:archived  LIST   dead tasks, newest first, capped
/// ```
///
/// Every state change that touches more than one key runs as a Lua script,
/// so a task is always in exactly one place. A worker that dies holding a
/// task leaves it in `active`; once the lease deadline passes,
/// [`RedisBroker::recover_expired`] puts it back at the head of `pending`.

use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Script};
use std::sync::Arc;
use std::time::Duration;

use super::task::{Lane, TaskMessage};
use super::QueueError;

/// Archived tasks kept per lane
pub const ARCHIVE_CAP: isize = 10_000;

/// Max entries moved per lane by one recovery pass
const RECOVERY_BATCH: usize = 100;

const DEQUEUE: &str = r#"
local msg = redis.call('RPOP', KEYS[1])
if not msg then
    return false
end
redis.call('LPUSH', KEYS[2], msg)
redis.call('ZADD', KEYS[3], ARGV[1], msg)
return msg
"#;

const ACK: &str = r#"
redis.call('LREM', KEYS[1], 1, ARGV[1])
return redis.call('ZREM', KEYS[2], ARGV[1])
"#;

const RETRY: &str = r#"
redis.call('LREM', KEYS[1], 1, ARGV[1])
redis.call('ZREM', KEYS[2], ARGV[1])
return redis.call('ZADD', KEYS[3], ARGV[3], ARGV[2])
"#;

const ARCHIVE: &str = r#"
redis.call('LREM', KEYS[1], 1, ARGV[1])
redis.call('ZREM', KEYS[2], ARGV[1])
redis.call('LPUSH', KEYS[3], ARGV[2])
redis.call('LTRIM', KEYS[3], 0, ARGV[3] - 1)
return 1
"#;

const EXTEND_LEASE: &str = r#"
return redis.call('ZADD', KEYS[1], 'XX', 'CH', ARGV[2], ARGV[1])
"#;

const RECOVER: &str = r#"
local expired = redis.call('ZRANGEBYSCORE', KEYS[3], '-inf', ARGV[1], 'LIMIT', 0, ARGV[2])
for _, msg in ipairs(expired) do
    redis.call('LREM', KEYS[2], 1, msg)
    redis.call('ZREM', KEYS[3], msg)
    redis.call('RPUSH', KEYS[1], msg)
end
return #expired
"#;

const FORWARD: &str = r#"
local due = redis.call('ZRANGEBYSCORE', KEYS[2], '-inf', ARGV[1], 'LIMIT', 0, ARGV[2])
for _, msg in ipairs(due) do
    redis.call('ZREM', KEYS[2], msg)
    redis.call('LPUSH', KEYS[1], msg)
end
return #due
"#;

/// Which list or set of a lane
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyKind {
    Pending,
    Active,
    Lease,
    Retry,
    Archived,
}

impl KeyKind {
    fn suffix(&self) -> &'static str {
        match self {
            KeyKind::Pending => "pending",
            KeyKind::Active => "active",
            KeyKind::Lease => "lease",
            KeyKind::Retry => "retry",
            KeyKind::Archived => "archived",
        }
    }
}

/// Redis key for one structure of one lane
pub fn lane_key(lane: Lane, kind: KeyKind) -> String {
    format!("fixr:queue:{}:{}", lane.as_str(), kind.suffix())
}

/// A task held by a worker
///
/// `raw` is the exact string stored in Redis; it identifies the task in the
/// active list and lease set, so it must be handed back unchanged.
#[derive(Debug, Clone)]
pub struct Delivery {
    pub lane: Lane,
    pub raw: String,
}

impl Delivery {
    pub fn decode(&self) -> Result<TaskMessage, serde_json::Error> {
        serde_json::from_str(&self.raw)
    }
}

struct Scripts {
    dequeue: Script,
    ack: Script,
    retry: Script,
    archive: Script,
    extend_lease: Script,
    recover: Script,
    forward: Script,
}

/// Low-level queue operations shared by producer and workers
#[derive(Clone)]
pub struct RedisBroker {
    conn: ConnectionManager,
    scripts: Arc<Scripts>,
}

impl RedisBroker {
    pub fn new(conn: ConnectionManager) -> Self {
        Self {
            conn,
            scripts: Arc::new(Scripts {
                dequeue: Script::new(DEQUEUE),
                ack: Script::new(ACK),
                retry: Script::new(RETRY),
                archive: Script::new(ARCHIVE),
                extend_lease: Script::new(EXTEND_LEASE),
                recover: Script::new(RECOVER),
                forward: Script::new(FORWARD),
            }),
        }
    }

    /// Appends a task to the lane's pending list
    pub async fn push(&self, task: &TaskMessage) -> Result<(), QueueError> {
        let raw = serde_json::to_string(task)?;
        let mut conn = self.conn.clone();
        let _: i64 = conn.lpush(lane_key(task.queue, KeyKind::Pending), raw).await?;
        Ok(())
    }

    /// Takes the oldest pending task from the first non-empty lane in `lanes`
    pub async fn pop(&self, lanes: &[Lane], lease: Duration) -> Result<Option<Delivery>, QueueError> {
        let mut conn = self.conn.clone();
        let deadline = deadline_ms(lease);

        for &lane in lanes {
            let raw: Option<String> = self
                .scripts
                .dequeue
                .key(lane_key(lane, KeyKind::Pending))
                .key(lane_key(lane, KeyKind::Active))
                .key(lane_key(lane, KeyKind::Lease))
                .arg(deadline)
                .invoke_async(&mut conn)
                .await?;

            if let Some(raw) = raw {
                return Ok(Some(Delivery { lane, raw }));
            }
        }

        Ok(None)
    }

    /// Removes a finished task from the active list and lease set
    pub async fn ack(&self, delivery: &Delivery) -> Result<(), QueueError> {
        let mut conn = self.conn.clone();
        let _: i64 = self
            .scripts
            .ack
            .key(lane_key(delivery.lane, KeyKind::Active))
            .key(lane_key(delivery.lane, KeyKind::Lease))
            .arg(&delivery.raw)
            .invoke_async(&mut conn)
            .await?;
        Ok(())
    }

    /// Moves a failed task into the retry set, due after `delay`
    pub async fn retry(
        &self,
        delivery: &Delivery,
        updated: &TaskMessage,
        delay: Duration,
    ) -> Result<(), QueueError> {
        let raw = serde_json::to_string(updated)?;
        let mut conn = self.conn.clone();
        let _: i64 = self
            .scripts
            .retry
            .key(lane_key(delivery.lane, KeyKind::Active))
            .key(lane_key(delivery.lane, KeyKind::Lease))
            .key(lane_key(delivery.lane, KeyKind::Retry))
            .arg(&delivery.raw)
            .arg(raw)
            .arg(deadline_ms(delay))
            .invoke_async(&mut conn)
            .await?;
        Ok(())
    }

    /// Moves a dead task to the archive
    ///
    /// `record` is what gets archived: the updated message when the task
    /// decoded, or the raw string when it did not.
    pub async fn archive(&self, delivery: &Delivery, record: &str) -> Result<(), QueueError> {
        let mut conn = self.conn.clone();
        let _: i64 = self
            .scripts
            .archive
            .key(lane_key(delivery.lane, KeyKind::Active))
            .key(lane_key(delivery.lane, KeyKind::Lease))
            .key(lane_key(delivery.lane, KeyKind::Archived))
            .arg(&delivery.raw)
            .arg(record)
            .arg(ARCHIVE_CAP)
            .invoke_async(&mut conn)
            .await?;
        Ok(())
    }

    /// Pushes the lease deadline of a running task forward
    ///
    /// Returns false when the lease is gone (the task was recovered).
    pub async fn extend_lease(&self, delivery: &Delivery, lease: Duration) -> Result<bool, QueueError> {
        let mut conn = self.conn.clone();
        let _changed: i64 = self
            .scripts
            .extend_lease
            .key(lane_key(delivery.lane, KeyKind::Lease))
            .arg(&delivery.raw)
            .arg(deadline_ms(lease))
            .invoke_async(&mut conn)
            .await?;

        let score: Option<f64> = conn
            .zscore(lane_key(delivery.lane, KeyKind::Lease), &delivery.raw)
            .await?;
        Ok(score.is_some())
    }

    /// Returns tasks with an expired lease to the front of `pending`
    pub async fn recover_expired(&self, lane: Lane) -> Result<usize, QueueError> {
        let mut conn = self.conn.clone();
        let moved: usize = self
            .scripts
            .recover
            .key(lane_key(lane, KeyKind::Pending))
            .key(lane_key(lane, KeyKind::Active))
            .key(lane_key(lane, KeyKind::Lease))
            .arg(now_ms())
            .arg(RECOVERY_BATCH)
            .invoke_async(&mut conn)
            .await?;
        Ok(moved)
    }

    /// Moves retries whose time has come back to `pending`
    pub async fn forward_due_retries(&self, lane: Lane) -> Result<usize, QueueError> {
        let mut conn = self.conn.clone();
        let moved: usize = self
            .scripts
            .forward
            .key(lane_key(lane, KeyKind::Pending))
            .key(lane_key(lane, KeyKind::Retry))
            .arg(now_ms())
            .arg(RECOVERY_BATCH)
            .invoke_async(&mut conn)
            .await?;
        Ok(moved)
    }

    /// Number of entries in one structure of a lane
    pub async fn len(&self, lane: Lane, kind: KeyKind) -> Result<usize, QueueError> {
        let mut conn = self.conn.clone();
        let key = lane_key(lane, kind);
        let len: usize = match kind {
            KeyKind::Lease | KeyKind::Retry => conn.zcard(key).await?,
            _ => conn.llen(key).await?,
        };
        Ok(len)
    }
}

fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

fn deadline_ms(after: Duration) -> i64 {
    now_ms().saturating_add(i64::try_from(after.as_millis()).unwrap_or(i64::MAX))
}

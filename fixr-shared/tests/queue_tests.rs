/// Task queue integration tests
///
/// Require Redis and share the fixed lane keys, so run them serially:
/// cargo test --test queue_tests -- --ignored --test-threads=1

use fixr_shared::jobs::{
    JobClient, KeyKind, Lane, QueueError, RedisBroker, TaskMessage, WelcomeEmailPayload,
};
use fixr_shared::redis::{RedisClient, RedisConfig};
use std::env;
use std::time::Duration;

async fn fresh_broker() -> RedisBroker {
    let url = env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string());
    let client = RedisClient::connect(RedisConfig::new(url)).await.unwrap();
    let mut conn = client.connection();

    for lane in Lane::ALL {
        for kind in [KeyKind::Pending, KeyKind::Active, KeyKind::Lease, KeyKind::Retry, KeyKind::Archived] {
            let _: () = redis::cmd("DEL")
                .arg(fixr_shared::jobs::broker::lane_key(lane, kind))
                .query_async(&mut conn)
                .await
                .unwrap();
        }
    }

    RedisBroker::new(conn)
}

fn welcome_task() -> TaskMessage {
    WelcomeEmailPayload {
        to: "ada@example.com".to_string(),
        first_name: "Ada".to_string(),
    }
    .into_task()
    .unwrap()
}

#[tokio::test]
#[ignore] // Requires running Redis instance
async fn test_enqueue_then_pop_on_requested_lane() {
    let broker = fresh_broker().await;
    let client = JobClient::from_broker(broker.clone());

    let id = client.enqueue(welcome_task(), Lane::Critical).await.unwrap();
    assert_eq!(broker.len(Lane::Critical, KeyKind::Pending).await.unwrap(), 1);

    let delivery = broker
        .pop(&[Lane::Low, Lane::Default, Lane::Critical], Duration::from_secs(60))
        .await
        .unwrap()
        .unwrap();
    let task = delivery.decode().unwrap();

    assert_eq!(delivery.lane, Lane::Critical);
    assert_eq!(task.id, id);
    assert_eq!(task.queue, Lane::Critical);
    assert_eq!(broker.len(Lane::Critical, KeyKind::Active).await.unwrap(), 1);

    broker.ack(&delivery).await.unwrap();
    assert_eq!(broker.len(Lane::Critical, KeyKind::Active).await.unwrap(), 0);
    assert_eq!(broker.len(Lane::Critical, KeyKind::Lease).await.unwrap(), 0);
}

#[tokio::test]
#[ignore] // Requires running Redis instance
async fn test_expired_lease_is_redelivered() {
    let broker = fresh_broker().await;
    let client = JobClient::from_broker(broker.clone());
    let id = client.enqueue(welcome_task(), Lane::Default).await.unwrap();

    // worker takes the task and "crashes" without acking
    let lost = broker
        .pop(&[Lane::Default], Duration::from_millis(0))
        .await
        .unwrap()
        .unwrap();
    tokio::time::sleep(Duration::from_millis(10)).await;

    assert_eq!(broker.recover_expired(Lane::Default).await.unwrap(), 1);

    let again = broker
        .pop(&[Lane::Default], Duration::from_secs(60))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(again.raw, lost.raw);
    assert_eq!(again.decode().unwrap().id, id);
}

#[tokio::test]
#[ignore] // Requires running Redis instance
async fn test_closed_client_keeps_already_enqueued_tasks() {
    let broker = fresh_broker().await;
    let client = JobClient::from_broker(broker.clone());

    client.enqueue(welcome_task(), Lane::Low).await.unwrap();
    client.close();

    let err = client.enqueue(welcome_task(), Lane::Low).await.unwrap_err();
    assert!(matches!(err, QueueError::Closed));

    // a new client (process restart) sees the task enqueued before close
    let restarted = JobClient::from_broker(broker.clone());
    assert!(!restarted.is_closed());
    assert_eq!(broker.len(Lane::Low, KeyKind::Pending).await.unwrap(), 1);
}

#[tokio::test]
#[ignore] // Requires running Redis instance
async fn test_retry_then_forward_when_due() {
    let broker = fresh_broker().await;
    JobClient::from_broker(broker.clone())
        .enqueue(welcome_task(), Lane::Default)
        .await
        .unwrap();

    let delivery = broker
        .pop(&[Lane::Default], Duration::from_secs(60))
        .await
        .unwrap()
        .unwrap();
    let failed = delivery.decode().unwrap().failed("provider returned 503");

    broker.retry(&delivery, &failed, Duration::from_millis(0)).await.unwrap();
    assert_eq!(broker.len(Lane::Default, KeyKind::Retry).await.unwrap(), 1);
    assert_eq!(broker.len(Lane::Default, KeyKind::Active).await.unwrap(), 0);

    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(broker.forward_due_retries(Lane::Default).await.unwrap(), 1);

    let next = broker
        .pop(&[Lane::Default], Duration::from_secs(60))
        .await
        .unwrap()
        .unwrap();
    let task = next.decode().unwrap();
    assert_eq!(task.retried, 1);
    assert_eq!(task.last_error.as_deref(), Some("provider returned 503"));
}

#[tokio::test]
#[ignore] // Requires running Redis instance
async fn test_archive_stores_record() {
    let broker = fresh_broker().await;
    JobClient::from_broker(broker.clone())
        .enqueue(welcome_task(), Lane::Low)
        .await
        .unwrap();

    let delivery = broker
        .pop(&[Lane::Low], Duration::from_secs(60))
        .await
        .unwrap()
        .unwrap();
    broker.archive(&delivery, &delivery.raw).await.unwrap();

    assert_eq!(broker.len(Lane::Low, KeyKind::Archived).await.unwrap(), 1);
    assert_eq!(broker.len(Lane::Low, KeyKind::Active).await.unwrap(), 0);
}

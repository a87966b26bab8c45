use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use herald_broker::{
    Acknowledger, BrokerError, Delivery, DeliveryStream, MessagePublisher, run_workers,
};
use herald_common::{Email, PaginationQuery, mime};
use herald_dispatch::{EmailUseCase, EmailsUseCase, MemoryMailer, ProcessingError};
use herald_metrics::MetricsRegistry;
use herald_store::{EmailRepository, MemoryEmailRepository};
use pretty_assertions::assert_eq;
use tokio_util::sync::CancellationToken;

const SENDER: &str = "noreply@herald.dev";

#[derive(Default)]
struct RecordingPublisher {
    published: Mutex<Vec<(Vec<u8>, String)>>,
}

#[async_trait]
impl MessagePublisher for RecordingPublisher {
    async fn publish(&self, payload: &[u8], content_type: &str) -> Result<(), BrokerError> {
        self.published
            .lock()
            .expect("lock")
            .push((payload.to_vec(), content_type.to_string()));
        Ok(())
    }
}

struct Fixture {
    mailer: MemoryMailer,
    repository: MemoryEmailRepository,
    publisher: Arc<RecordingPublisher>,
    usecase: Arc<EmailUseCase>,
}

fn fixture() -> Fixture {
    let mailer = MemoryMailer::new();
    let repository = MemoryEmailRepository::new();
    let publisher = Arc::new(RecordingPublisher::default());
    let usecase = Arc::new(EmailUseCase::new(
        SENDER,
        Arc::new(mailer.clone()),
        Arc::new(repository.clone()),
        publisher.clone(),
    ));

    Fixture {
        mailer,
        repository,
        publisher,
        usecase,
    }
}

#[tokio::test]
async fn script_stripped_sender_overwritten_and_recorded() {
    let fixture = fixture();
    let payload = concat!(
        r#"{"to":["a@x.com"],"subject":"S","body":"<script>bad</script>hi","#,
        r#""contentType":"text/plain","from":"spoofed@evil.com"}"#,
    )
    .as_bytes();

    let id = fixture.usecase.process(payload).await.expect("processed");

    let sent = fixture.mailer.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].body, "hi");
    assert_eq!(sent[0].from, SENDER);
    assert_eq!(sent[0].to, vec!["a@x.com".to_string()]);

    let stored = fixture.repository.find_email_by_id(id).await.expect("stored");
    assert_eq!(stored.id, Some(id));
    assert_eq!(stored.body, "hi");
    assert_eq!(stored.from, SENDER);
}

#[tokio::test]
async fn empty_recipients_never_reach_transport_or_store() {
    let fixture = fixture();
    let payload = br#"{"to":[],"subject":"S","body":"hi","contentType":"text/plain"}"#;

    let err = fixture.usecase.process(payload).await.expect_err("rejected");

    assert!(matches!(err, ProcessingError::Validation(_)));
    assert!(err.is_client_error());
    assert_eq!(fixture.mailer.attempts(), 0);
    assert!(fixture.repository.is_empty());
}

#[tokio::test]
async fn malformed_payload_is_a_deserialization_error() {
    let fixture = fixture();

    let err = fixture
        .usecase
        .process(b"{not json")
        .await
        .expect_err("rejected");

    assert!(matches!(err, ProcessingError::Deserialization(_)));
    assert_eq!(fixture.mailer.attempts(), 0);
}

#[tokio::test]
async fn transport_failure_skips_persistence() {
    let fixture = fixture();
    fixture.mailer.set_failing(true);
    let payload = br#"{"to":["a@x.com"],"subject":"S","body":"hi"}"#;

    let err = fixture.usecase.process(payload).await.expect_err("rejected");

    assert!(matches!(err, ProcessingError::Delivery(_)));
    assert_eq!(fixture.mailer.attempts(), 1);
    assert_eq!(fixture.repository.creates(), 0);
}

#[tokio::test]
async fn persistence_failure_after_send() {
    let fixture = fixture();
    fixture.repository.set_failing(true);
    let payload = br#"{"to":["a@x.com"],"subject":"S","body":"hi"}"#;

    let err = fixture.usecase.process(payload).await.expect_err("not recorded");

    assert!(matches!(err, ProcessingError::Persistence(_)));
    assert!(err.is_sent());
    assert_eq!(fixture.mailer.attempts(), 1);
    assert_eq!(fixture.mailer.sent().len(), 1);
    assert_eq!(fixture.repository.creates(), 1);
    assert!(fixture.repository.is_empty());
}

#[tokio::test]
async fn wire_created_at_is_ignored() {
    let fixture = fixture();
    let payload =
        br#"{"to":["a@x.com"],"subject":"S","body":"hi","createdAt":"2000-01-01T00:00:00Z"}"#;

    let before = chrono::Utc::now();
    let id = fixture.usecase.process(payload).await.expect("processed");

    let stored = fixture.repository.find_email_by_id(id).await.expect("stored");
    assert!(stored.created_at >= before);
}

#[tokio::test]
async fn publish_serializes_email_as_json() {
    let fixture = fixture();
    let mut email = Email::new(vec!["a@x.com".into()], "Queued", "body");
    fixture.usecase.prepare_email(&mut email).expect("valid");

    fixture.usecase.publish_to_queue(&email).await.expect("published");

    let published = fixture.publisher.published.lock().expect("lock").clone();
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].1, mime::APPLICATION_JSON);

    let decoded: Email = serde_json::from_slice(&published[0].0).expect("json");
    assert_eq!(decoded, email);
}

#[tokio::test]
async fn published_email_round_trips_through_the_pipeline() {
    let fixture = fixture();
    let mut email = Email::new(vec!["a@x.com".into()], "Loop", "<b>bold</b>")
        .with_content_type(mime::TEXT_HTML);
    fixture.usecase.prepare_email(&mut email).expect("valid");
    fixture.usecase.publish_to_queue(&email).await.expect("published");

    let payload = fixture.publisher.published.lock().expect("lock")[0].0.clone();
    fixture.usecase.process(&payload).await.expect("processed");

    assert_eq!(fixture.mailer.sent()[0].body, "<b>bold</b>");
}

#[tokio::test]
async fn empty_dataset_query_skips_row_fetch() {
    let fixture = fixture();

    let list = fixture
        .usecase
        .find_emails_by_receiver("nobody@x.com", PaginationQuery::new(1, 20))
        .await
        .expect("query");

    assert_eq!(list.total_count, 0);
    assert_eq!(list.total_pages, 0);
    assert!(list.emails.is_empty());
    assert!(!list.has_more);
    assert_eq!(fixture.repository.counts(), 1);
    assert_eq!(fixture.repository.row_fetches(), 0);
}

#[tokio::test]
async fn receiver_query_pages_through_results() {
    let fixture = fixture();
    for n in 0..5 {
        let payload = format!(r#"{{"to":["r@x.com"],"subject":"m{n}","body":"b"}}"#);
        fixture.usecase.process(payload.as_bytes()).await.expect("processed");
    }

    let first = fixture
        .usecase
        .find_emails_by_receiver("r@x.com", PaginationQuery::new(1, 2))
        .await
        .expect("query");
    assert_eq!(first.total_count, 5);
    assert_eq!(first.total_pages, 3);
    assert!(first.has_more);
    assert_eq!(first.emails.len(), 2);

    let last = fixture
        .usecase
        .find_emails_by_receiver("r@x.com", PaginationQuery::new(3, 2))
        .await
        .expect("query");
    assert!(!last.has_more);
    assert_eq!(last.emails.len(), 1);
}

#[tokio::test]
async fn lookups_map_missing_and_blank_input() {
    let fixture = fixture();

    let missing = fixture
        .usecase
        .find_email_by_id(uuid::Uuid::new_v4())
        .await
        .expect_err("nothing stored");
    assert!(missing.is_not_found());

    let blank = fixture
        .usecase
        .find_emails_by_receiver("  ", PaginationQuery::default())
        .await
        .expect_err("blank receiver");
    assert!(matches!(blank, herald_dispatch::QueryError::InvalidArgument(_)));
}

#[derive(Default, Clone)]
struct Settled(Arc<Mutex<Vec<(u64, bool)>>>);

#[async_trait]
impl Acknowledger for Settled {
    async fn ack(&self, tag: u64) -> Result<(), BrokerError> {
        self.0.lock().expect("lock").push((tag, true));
        Ok(())
    }

    async fn reject(&self, tag: u64) -> Result<(), BrokerError> {
        self.0.lock().expect("lock").push((tag, false));
        Ok(())
    }
}

#[tokio::test]
async fn consumer_pool_acks_good_and_rejects_bad_deliveries() {
    let fixture = fixture();
    let metrics = MetricsRegistry::new("test").expect("registry");
    let settled = Settled::default();

    let payloads: [&[u8]; 2] = [
        concat!(
            r#"{"to":["a@x.com"],"subject":"S","#,
            r#""body":"<script>bad</script>hi","contentType":"text/plain"}"#,
        )
        .as_bytes(),
        br#"{"to":[],"subject":"S","body":"hi","contentType":"text/plain"}"#,
    ];
    let deliveries: Vec<Result<Delivery, BrokerError>> = payloads
        .iter()
        .zip(1_u64..)
        .map(|(payload, tag)| {
            Ok(Delivery::new(tag, payload.to_vec(), Box::new(settled.clone())))
        })
        .collect();
    let stream: DeliveryStream = Box::pin(tokio_stream::iter(deliveries));

    let result = run_workers(
        stream,
        1,
        fixture.usecase.clone(),
        metrics.consumer().clone(),
        CancellationToken::new(),
    )
    .await;
    assert!(result.expect_err("stream ends").is_stream_closed());

    assert_eq!(*settled.0.lock().expect("lock"), vec![(1, true), (2, false)]);
    assert_eq!(metrics.consumer().incoming(), 2);
    assert_eq!(metrics.consumer().success(), 1);
    assert_eq!(metrics.consumer().error(), 1);
    assert_eq!(fixture.repository.len(), 1);
    assert_eq!(fixture.mailer.attempts(), 1);
}

#[tokio::test]
async fn consumer_pool_rejects_unrecorded_deliveries() {
    let fixture = fixture();
    fixture.repository.set_failing(true);
    let metrics = MetricsRegistry::new("test").expect("registry");
    let settled = Settled::default();

    let payload = br#"{"to":["a@x.com"],"subject":"S","body":"hi"}"#.to_vec();
    let deliveries: Vec<Result<Delivery, BrokerError>> =
        vec![Ok(Delivery::new(7, payload, Box::new(settled.clone())))];
    let stream: DeliveryStream = Box::pin(tokio_stream::iter(deliveries));

    let result = run_workers(
        stream,
        1,
        fixture.usecase.clone(),
        metrics.consumer().clone(),
        CancellationToken::new(),
    )
    .await;
    assert!(result.expect_err("stream ends").is_stream_closed());

    assert_eq!(*settled.0.lock().expect("lock"), vec![(7, false)]);
    assert_eq!(metrics.consumer().success(), 0);
    assert_eq!(metrics.consumer().error(), 1);
    assert_eq!(fixture.mailer.attempts(), 1);
}

//! Runs against a real database when `HERALD_TEST_DATABASE_URL` is set, and
//! is skipped otherwise.

use chrono::{Duration, TimeZone, Utc};
use herald_common::Email;
use herald_store::{EmailRepository, PgEmailRepository, PostgresConfig};
use uuid::Uuid;

async fn repository() -> Option<PgEmailRepository> {
    let url = std::env::var("HERALD_TEST_DATABASE_URL").ok()?;
    let config = PostgresConfig {
        url,
        max_connections: 2,
        connect_timeout_secs: 5,
    };

    let repository = PgEmailRepository::connect(&config).await.expect("connect");
    repository.ensure_schema().await.expect("schema");
    Some(repository)
}

#[tokio::test]
async fn stores_and_queries_by_receiver() {
    let Some(repository) = repository().await else {
        eprintln!("HERALD_TEST_DATABASE_URL not set, skipping");
        return;
    };

    let receiver = format!("{}@herald.test", Uuid::new_v4());
    let mut email = Email::new(vec![receiver.clone()], "Stored", "<p>body</p>")
        .with_content_type("text/html");
    email.prepare("noreply@herald.test");
    email.created_at = Utc.with_ymd_and_hms(2000, 1, 1, 0, 0, 0).single().expect("valid date");

    let before = Utc::now() - Duration::minutes(5);
    let id = repository.create_email(&email).await.expect("create");

    let found = repository.find_email_by_id(id).await.expect("find");
    assert_eq!(found.id, Some(id));
    assert_eq!(found.to, vec![receiver.clone()]);
    assert_eq!(found.from, "noreply@herald.test");
    assert_eq!(found.content_type, "text/html");
    assert!(found.created_at > before, "record time comes from the database");

    assert_eq!(repository.count_by_receiver(&receiver).await.expect("count"), 1);
    let page = repository
        .find_by_receiver(&receiver, 0, 10)
        .await
        .expect("page");
    assert_eq!(page.len(), 1);

    let missing = repository
        .find_email_by_id(Uuid::new_v4())
        .await
        .expect_err("not stored");
    assert!(missing.is_not_found());

    repository.close().await;
}

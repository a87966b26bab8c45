use herald::Herald;
use herald_dispatch::mailer::{TlsMode, TransportConfig};
use herald_store::StoreConfig;

const SAMPLE: &str = include_str!("../../herald.config.ron");

#[test]
fn sample_config_parses() {
    let herald = Herald::from_ron(SAMPLE).expect("sample config");

    assert_eq!(herald.broker.exchange, "emails-exchange");
    assert_eq!(herald.broker.queue, "emails-queue");
    assert_eq!(herald.broker.worker_pool_size, 4);
    assert_eq!(herald.broker.topology().prefetch_count, 4);

    let StoreConfig::Postgres(postgres) = &herald.store else {
        panic!("expected a postgres store");
    };
    assert_eq!(postgres.max_connections, 10);

    assert_eq!(herald.mailer.sender, "noreply@example.com");
    let TransportConfig::Smtp(smtp) = &herald.mailer.transport else {
        panic!("expected an smtp transport");
    };
    assert_eq!(smtp.port, 587);
    assert_eq!(smtp.tls, TlsMode::StartTls);
    assert_eq!(smtp.user, None);

    assert_eq!(herald.rpc.listen_address, "0.0.0.0:5001");
    assert_eq!(herald.metrics.path, "/metrics");
    assert_eq!(herald.shutdown_grace_secs, 30);
}

#[test]
fn memory_backends_for_local_runs() {
    let herald = Herald::from_ron(
        r#"(
            store: Memory,
            mailer: (sender: "dev@localhost", transport: Memory),
        )"#,
    )
    .expect("memory config");

    assert!(matches!(herald.store, StoreConfig::Memory));
    assert!(matches!(herald.mailer.transport, TransportConfig::Memory));
}

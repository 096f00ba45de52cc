use cucumber::{given, then, when, World};
use metrics::RelayMetrics;

#[derive(Debug, World)]
#[world(init = Self::new)]
struct MetricsWorld {
    metrics: RelayMetrics,
}

impl MetricsWorld {
    fn new() -> Self {
        Self {
            metrics: RelayMetrics::new(),
        }
    }
}

#[given("a fresh relay metrics collector")]
async fn given_metrics_collector(world: &mut MetricsWorld) {
    world.metrics = RelayMetrics::new();
}

#[when(expr = "a {word} transaction is submitted")]
async fn when_transaction_submitted(world: &mut MetricsWorld, method: String) {
    world.metrics.record_submitted(method_name(&method));
}

#[when(expr = "a {word} transaction fails")]
async fn when_transaction_fails(world: &mut MetricsWorld, method: String) {
    world.metrics.record_failed(method_name(&method));
}

#[when(expr = "{int} records are read from the ledger")]
async fn when_records_read(world: &mut MetricsWorld, records: u64) {
    world.metrics.record_read(records);
}

#[then(expr = "the snapshot should report {int} submitted and {int} failed transactions")]
async fn then_snapshot_totals(world: &mut MetricsWorld, submitted: u64, failed: u64) {
    let snapshot = world.metrics.snapshot();
    assert_eq!(snapshot.transactions_submitted, submitted);
    assert_eq!(snapshot.transactions_failed, failed);
}

#[then(expr = "the snapshot should report {int} ledger reads")]
async fn then_snapshot_reads(world: &mut MetricsWorld, reads: u64) {
    assert_eq!(world.metrics.snapshot().ledger_reads, reads);
}

#[then("the snapshot should serialize to JSON")]
async fn then_snapshot_serializes(world: &mut MetricsWorld) {
    let json = serde_json::to_value(world.metrics.snapshot()).unwrap();
    assert!(json.get("methods").is_some());
}

fn method_name(method: &str) -> &'static str {
    match method {
        "createPolicy" => "createPolicy",
        "cancelPolicy" => "cancelPolicy",
        "approveClaim" => "approveClaim",
        "rejectClaim" => "rejectClaim",
        other => panic!("Unknown method: {}", other),
    }
}

#[tokio::main]
async fn main() {
    MetricsWorld::run("tests/features").await;
}

//! BDD Tests for the policy registry contract

use cucumber::{given, then, when, World};
use policy_ledger::{Address, ChaincareError, ClaimStatus, PolicyRegistry, RegistryEvent, Wei};

const ADMIN: Address = Address::new([0xA0; 20]);
const USER: Address = Address::new([0x01; 20]);
const ANOTHER_USER: Address = Address::new([0x02; 20]);

#[derive(Debug, World)]
#[world(init = Self::new)]
struct LedgerWorld {
    registry: PolicyRegistry,
    last_events: Vec<RegistryEvent>,
    last_error: Option<ChaincareError>,
}

impl LedgerWorld {
    fn new() -> Self {
        Self {
            registry: PolicyRegistry::new(ADMIN),
            last_events: Vec::new(),
            last_error: None,
        }
    }

    fn record(&mut self, outcome: policy_ledger::Result<Vec<RegistryEvent>>) {
        match outcome {
            Ok(events) => self.last_events = events,
            Err(err) => self.last_error = Some(err),
        }
    }
}

#[given("a freshly deployed registry")]
async fn given_fresh_registry(world: &mut LedgerWorld) {
    world.registry = PolicyRegistry::new(ADMIN);
}

#[given(expr = "the admin creates a policy for the user with details {string} and premium {int}")]
#[when(expr = "the admin creates a policy for the user with details {string} and premium {int}")]
async fn admin_creates_policy(world: &mut LedgerWorld, details: String, premium: u64) {
    let outcome = world
        .registry
        .create_policy(&ADMIN, USER, details, Wei::from(premium));
    world.record(outcome);
}

#[when(expr = "another user creates a policy for the user with details {string} and premium {int}")]
async fn another_user_creates_policy(world: &mut LedgerWorld, details: String, premium: u64) {
    let outcome = world
        .registry
        .create_policy(&ANOTHER_USER, USER, details, Wei::from(premium));
    world.record(outcome);
}

#[when(expr = "the admin cancels policy {int}")]
async fn admin_cancels_policy(world: &mut LedgerWorld, id: u64) {
    let outcome = world.registry.cancel_policy(&ADMIN, id);
    world.record(outcome);
}

#[when(expr = "another user cancels policy {int}")]
async fn another_user_cancels_policy(world: &mut LedgerWorld, id: u64) {
    let outcome = world.registry.cancel_policy(&ANOTHER_USER, id);
    world.record(outcome);
}

#[given(expr = "the user submits a claim against policy {int} for {int}")]
#[when(expr = "the user submits a claim against policy {int} for {int}")]
async fn user_submits_claim(world: &mut LedgerWorld, policy_id: u64, amount: u64) {
    let outcome =
        world
            .registry
            .submit_claim(&USER, policy_id, "Hospital stay".to_string(), Wei::from(amount));
    world.record(outcome);
}

#[when(expr = "the admin approves claim {int}")]
async fn admin_approves_claim(world: &mut LedgerWorld, id: u64) {
    let outcome = world.registry.approve_claim(&ADMIN, id);
    world.record(outcome);
}

#[when(expr = "the admin rejects claim {int}")]
async fn admin_rejects_claim(world: &mut LedgerWorld, id: u64) {
    let outcome = world.registry.reject_claim(&ADMIN, id);
    world.record(outcome);
}

#[then(expr = "policy {int} should belong to the user")]
async fn then_policy_belongs_to_user(world: &mut LedgerWorld, id: u64) {
    assert_eq!(world.registry.policies(id).unwrap().holder, USER);
}

#[then(expr = "policy {int} should have details {string} and premium {int}")]
async fn then_policy_has_details(world: &mut LedgerWorld, id: u64, details: String, premium: u64) {
    let policy = world.registry.policies(id).unwrap();
    assert_eq!(policy.id, id);
    assert_eq!(policy.details, details);
    assert_eq!(policy.premium, Wei::from(premium));
}

#[then(expr = "policy {int} should be active")]
async fn then_policy_active(world: &mut LedgerWorld, id: u64) {
    assert!(world.registry.policies(id).unwrap().active);
}

#[then(expr = "policy {int} should be inactive")]
async fn then_policy_inactive(world: &mut LedgerWorld, id: u64) {
    assert!(!world.registry.policies(id).unwrap().active);
}

#[then(expr = "the policy count should be {int}")]
async fn then_policy_count(world: &mut LedgerWorld, expected: u64) {
    assert_eq!(world.registry.policy_count(), expected);
}

#[then(expr = "the claim count should be {int}")]
async fn then_claim_count(world: &mut LedgerWorld, expected: u64) {
    assert_eq!(world.registry.claim_count(), expected);
}

#[then(expr = "a PolicyCreated event should be emitted for policy {int} with premium {int}")]
async fn then_policy_created_event(world: &mut LedgerWorld, id: u64, premium: u64) {
    let expected = RegistryEvent::PolicyCreated {
        id,
        holder: USER,
        premium: Wei::from(premium),
    };
    assert!(
        world.last_events.contains(&expected),
        "events were {:?}",
        world.last_events
    );
}

#[then(expr = "claim {int} should be {string}")]
async fn then_claim_status(world: &mut LedgerWorld, id: u64, status: String) {
    let expected = match status.as_str() {
        "Pending" => ClaimStatus::Pending,
        "Approved" => ClaimStatus::Approved,
        "Rejected" => ClaimStatus::Rejected,
        other => panic!("Invalid claim status: {}", other),
    };
    assert_eq!(world.registry.get_claim(id).unwrap().status, expected);
}

#[then(expr = "I should get a {string} error")]
async fn then_should_get_error(world: &mut LedgerWorld, message: String) {
    let error = world.last_error.as_ref().expect("Expected an error");
    assert_eq!(error.to_string(), message);
}

#[tokio::main]
async fn main() {
    LedgerWorld::run("tests/features").await;
}

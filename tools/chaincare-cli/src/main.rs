mod api;

use admin_signer::{Credential, HttpLedgerClient, TransactionSender};
use anyhow::Context;
use api::RelayClient;
use chaincare_core::{Address, Wei};
use clap::{Args, Parser, Subcommand};
use policy_ledger::{ContractCall, LedgerClient};
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "chaincare")]
#[command(about = "ChainCare CLI - policies and claims on the ledger")]
#[command(version = chaincare_core::VERSION)]
struct Cli {
    /// Relay base URL
    #[arg(long, global = true, env = "CHAINCARE_RELAY_URL", default_value = "http://127.0.0.1:8000")]
    relay_url: String,

    /// Bearer token from `chaincare auth login`
    #[arg(long, global = true, env = "CHAINCARE_TOKEN", hide_env_values = true)]
    token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate a new signing key and print its address
    Keygen,
    /// Relay status and counters
    Status,
    /// Account management
    Auth {
        #[command(subcommand)]
        action: AuthAction,
    },
    /// Policy management commands
    Policy {
        #[command(subcommand)]
        action: PolicyAction,
    },
    /// Claim management commands
    Claim {
        #[command(subcommand)]
        action: ClaimAction,
    },
}

#[derive(Subcommand, Debug)]
enum AuthAction {
    /// Register a new account bound to a ledger address
    Register {
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        eth_address: Address,
    },
    /// Log in and print a bearer token
    Login {
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
    },
    /// Show the logged-in account
    Me,
    /// List all accounts (admin)
    Users,
}

#[derive(Subcommand, Debug)]
enum PolicyAction {
    /// List all policies
    List,
    /// Create a policy for a registered user (admin)
    Create {
        #[arg(long)]
        user_id: String,
        #[arg(long)]
        details: String,
        /// Premium in ether, e.g. `1.5`
        #[arg(long)]
        premium: String,
    },
    /// Cancel a policy (admin)
    Cancel { id: u64 },
}

#[derive(Subcommand, Debug)]
enum ClaimAction {
    /// List all claims (admin)
    List,
    /// Approve a pending claim (admin)
    Approve { id: u64 },
    /// Reject a pending claim (admin)
    Reject { id: u64 },
    /// Sign and submit a claim straight to the ledger with your own key
    Submit(SubmitClaim),
}

#[derive(Args, Debug)]
struct SubmitClaim {
    #[arg(long)]
    policy_id: u64,
    #[arg(long)]
    reason: String,
    /// Claimed amount in ether
    #[arg(long)]
    amount: String,
    #[arg(long, env = "CHAINCARE_PRIVATE_KEY", hide_env_values = true)]
    private_key: String,
    #[arg(long, env = "WEB3_PROVIDER", default_value = "http://127.0.0.1:7545")]
    ledger_url: String,
    /// Defaults to the contract the ledger node reports
    #[arg(long, env = "POLICY_CONTRACT_ADDRESS")]
    contract: Option<Address>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let relay = RelayClient::new(&cli.relay_url, cli.token.clone());

    match cli.command {
        Commands::Keygen => handle_keygen(),
        Commands::Status => handle_status(&relay).await,
        Commands::Auth { action } => handle_auth_action(&relay, action).await,
        Commands::Policy { action } => handle_policy_action(&relay, action).await,
        Commands::Claim { action } => handle_claim_action(&relay, action).await,
    }
}

fn handle_keygen() -> anyhow::Result<()> {
    let credential = Credential::generate();
    println!("🔑 Address:     {}", credential.address());
    println!("🔒 Private key: 0x{}", credential.secret_hex());
    Ok(())
}

async fn handle_status(relay: &RelayClient) -> anyhow::Result<()> {
    let health = relay.health().await.context("relay is not reachable")?;
    let metrics = relay.metrics().await?;

    println!("📊 ChainCare Relay Status");
    println!("🎯 Service:  {} {}", health["service"], health["version"]);
    println!("📜 Contract: {}", health["contract"]);
    println!("👤 Admin:    {}", health["admin"]);
    println!("👥 Users:    {}", metrics["registered_users"]);
    println!(
        "📨 Transactions: {} submitted, {} failed",
        metrics["relay"]["transactions_submitted"], metrics["relay"]["transactions_failed"]
    );
    Ok(())
}

async fn handle_auth_action(relay: &RelayClient, action: AuthAction) -> anyhow::Result<()> {
    match action {
        AuthAction::Register {
            username,
            password,
            eth_address,
        } => {
            let message = relay.register(&username, &password, eth_address).await?;
            println!("✅ {}", message);
        }
        AuthAction::Login { username, password } => {
            let session = relay.login(&username, &password).await?;
            println!("✅ Logged in as {} ({})", session.user.username, session.user.eth_address);
            println!("export CHAINCARE_TOKEN={}", session.token);
        }
        AuthAction::Me => {
            let user = relay.me().await?;
            println!("👤 {} {} {}", user.id, user.username, user.eth_address);
        }
        AuthAction::Users => {
            for user in relay.users().await? {
                println!("👤 {} {} {}", user.id, user.username, user.eth_address);
            }
        }
    }
    Ok(())
}

async fn handle_policy_action(relay: &RelayClient, action: PolicyAction) -> anyhow::Result<()> {
    match action {
        PolicyAction::List => {
            println!("📋 Listing policies...");
            for policy in relay.policies().await? {
                let state = if policy.is_active { "active" } else { "cancelled" };
                println!(
                    "#{} {} [{}] premium {} ETH ({} wei) holder {}",
                    policy.id, policy.policy_details, state, policy.premium, policy.premium_wei, policy.user
                );
            }
        }
        PolicyAction::Create {
            user_id,
            details,
            premium,
        } => {
            Wei::from_ether_str(&premium).context("premium must be a decimal ether amount")?;
            println!("➕ Creating policy: {}", details);
            let submitted = relay.create_policy(&user_id, &details, &premium).await?;
            println!("✅ {} ({})", submitted.message, submitted.transaction_hash);
        }
        PolicyAction::Cancel { id } => {
            let submitted = relay.cancel_policy(id).await?;
            println!("🗑️  {} ({})", submitted.message, submitted.transaction_hash);
        }
    }
    Ok(())
}

async fn handle_claim_action(relay: &RelayClient, action: ClaimAction) -> anyhow::Result<()> {
    match action {
        ClaimAction::List => {
            println!("📋 Listing claims...");
            for claim in relay.claims().await? {
                println!(
                    "#{} policy #{} [{}] {} ETH by {}: {}",
                    claim.id, claim.policy_id, claim.status, claim.amount, claim.claimant, claim.reason
                );
            }
        }
        ClaimAction::Approve { id } => {
            let submitted = relay.approve_claim(id).await?;
            println!("✅ {} ({})", submitted.message, submitted.transaction_hash);
        }
        ClaimAction::Reject { id } => {
            let submitted = relay.reject_claim(id).await?;
            println!("❌ {} ({})", submitted.message, submitted.transaction_hash);
        }
        ClaimAction::Submit(claim) => handle_submit_claim(claim).await?,
    }
    Ok(())
}

/// Claims bypass the relay: the claimant signs with their own key.
async fn handle_submit_claim(claim: SubmitClaim) -> anyhow::Result<()> {
    let credential = Credential::from_hex(&claim.private_key)?;
    let amount = Wei::from_ether_str(&claim.amount)?;
    let ledger = HttpLedgerClient::new(claim.ledger_url);

    let contract = match claim.contract {
        Some(contract) => contract,
        None => ledger.contract().await?.address,
    };

    println!(
        "📝 Submitting claim on policy #{} from {}",
        claim.policy_id,
        credential.address()
    );
    let sender = TransactionSender::new(Arc::new(ledger), contract);
    let receipt = sender
        .send(
            &credential,
            ContractCall::SubmitClaim {
                policy_id: claim.policy_id,
                reason: claim.reason,
                amount,
            },
        )
        .await?;

    println!(
        "✅ Claim submitted in block {} ({})",
        receipt.block_number, receipt.transaction_hash
    );
    Ok(())
}

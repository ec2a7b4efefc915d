//! Keyprov Provisioning CLI
//!
//! Ensures an account exists for `<realm> <user-id>` and issues a fresh API
//! token for it. The token is the only thing written to stdout; logs go to
//! stderr.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};

use kp_config::{AnalyticsConfig, AppConfig, ConfigLoader};
use kp_provisioning::{
    initialize_indexes, notify_detached, HttpUsageNotifier, MongoAccountStore,
    MongoAuthorizationStore, NoOpUsageNotifier, ProvisioningService, RandomTokenGenerator,
    SystemClock, TsidIdGenerator, UsageEvent, UsageNotifier, UsageNotifierConfig,
};

/// Upper bound on waiting for the usage event before exiting
const USAGE_FLUSH_TIMEOUT: Duration = Duration::from_secs(3);

/// Keyprov account provisioning
#[derive(Parser, Debug)]
#[command(name = "kp-provision")]
#[command(about = "Provision an account and issue a fresh API token")]
struct Args {
    /// Realm (tenant) the account belongs to
    realm: String,

    /// External user identifier
    user_id: String,

    /// Token lifetime in days; zero or negative means never expires
    #[arg(long, allow_negative_numbers = true)]
    days: Option<i64>,

    /// Path to a TOML config file
    #[arg(long, env = "KEYPROV_CONFIG")]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging (JSON if LOG_FORMAT=json, text otherwise)
    kp_common::logging::init_logging("kp-provision");

    let args = Args::parse();

    let loader = match &args.config {
        Some(path) => ConfigLoader::with_path(path),
        None => ConfigLoader::new(),
    };
    let config = loader.load().context("Failed to load configuration")?;

    let expiration_days = args.days.unwrap_or(config.provisioning.default_expiration_days);

    info!(
        realm = %args.realm,
        database = %config.mongodb.database,
        expiration_days,
        "Starting provisioning"
    );

    let service = build_service(&config).await?;
    let notifier = build_notifier(&config.analytics);

    let credential = service
        .provision_and_issue(&args.realm, &args.user_id, expiration_days)
        .await
        .context("Provisioning failed")?;

    println!("{}", credential.token());

    let handle = notify_detached(notifier, UsageEvent::token_issued(&credential));
    if tokio::time::timeout(USAGE_FLUSH_TIMEOUT, handle).await.is_err() {
        warn!("Usage event still pending at exit, dropping it");
    }

    Ok(())
}

async fn build_service(config: &AppConfig) -> Result<ProvisioningService> {
    let client = mongodb::Client::with_uri_str(&config.mongodb.uri)
        .await
        .context("Failed to create MongoDB client")?;
    let db = client.database(&config.mongodb.database);

    if config.mongodb.ensure_indexes {
        initialize_indexes(&db)
            .await
            .context("Failed to initialize indexes")?;
    }

    let service = ProvisioningService::with_collaborators(
        Arc::new(MongoAccountStore::new(&db)),
        Arc::new(MongoAuthorizationStore::new(&db)),
        Arc::new(TsidIdGenerator),
        Arc::new(RandomTokenGenerator::new(config.provisioning.token_prefix.clone())),
        Arc::new(SystemClock),
    )
    .with_max_conflict_retries(config.provisioning.max_conflict_retries);

    Ok(service)
}

fn build_notifier(analytics: &AnalyticsConfig) -> Arc<dyn UsageNotifier> {
    if !analytics.enabled {
        return Arc::new(NoOpUsageNotifier);
    }

    let notifier_config = UsageNotifierConfig {
        endpoint: analytics.endpoint.clone(),
        tracking_id: analytics.tracking_id.clone(),
        app_name: analytics.app_name.clone(),
        app_version: analytics.app_version.clone(),
        timeout: Duration::from_millis(analytics.timeout_ms),
    };

    match HttpUsageNotifier::new(notifier_config) {
        Ok(notifier) => Arc::new(notifier),
        Err(e) => {
            warn!(error = %e, "Usage analytics disabled: failed to build HTTP client");
            Arc::new(NoOpUsageNotifier)
        }
    }
}

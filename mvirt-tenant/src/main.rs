//! mvirt-tenant: creates and removes tenant partitions on network appliances.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::signal;
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mvirt_tenant::clients::{
    FabricCleaner, HttpFabricCleaner, NoopPortDeallocator, PluginPortDeallocator, PortDeallocator,
    RestDeviceClient, UnconfiguredFabric,
};
use mvirt_tenant::{
    Appliance, CleanupPolicy, ManagerConfig, RetryPolicy, ServiceAdapter, Shutdown, TenantManager,
    TenantService, adapter, config,
};

/// mvirt Tenant Manager
#[derive(Parser, Debug)]
#[command(name = "mvirt-tenant", version, about)]
struct Args {
    /// Appliance hostname (repeat for replication mode)
    #[arg(long = "appliance", required = true)]
    appliances: Vec<String>,

    /// Appliance API user
    #[arg(long, env = "MVIRT_TENANT_USERNAME", default_value = "admin")]
    username: String,

    /// Appliance API password
    #[arg(long, env = "MVIRT_TENANT_PASSWORD", hide_env_values = true)]
    password: String,

    /// Scheme used to reach the appliance API
    #[arg(long, default_value = "https")]
    device_scheme: String,

    /// Accept self-signed appliance certificates
    #[arg(long)]
    insecure: bool,

    /// Port allocation plugin endpoint (e.g., http://[::1]:9696/v2.0)
    #[arg(long)]
    plugin_endpoint: Option<String>,

    /// Network fabric endpoint used to release VLAN tags
    #[arg(long)]
    fabric_endpoint: Option<String>,

    /// Default traffic group for new partitions
    #[arg(long, default_value = config::DEFAULT_TRAFFIC_GROUP)]
    traffic_group: String,

    /// Prefix of tenant partition names
    #[arg(long, default_value = adapter::DEFAULT_FOLDER_PREFIX)]
    folder_prefix: String,

    /// Delete attempts when the appliance session expired
    #[arg(long, default_value_t = config::DEFAULT_DELETE_ATTEMPTS)]
    retry_attempts: u32,

    /// Pause between delete attempts in milliseconds
    #[arg(long, default_value_t = config::DEFAULT_DELETE_INTERVAL_MS)]
    retry_interval_ms: u64,

    /// HTTP request timeout in seconds
    #[arg(long, default_value = "30")]
    timeout: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create the tenant partition on every appliance
    Create {
        /// Tenant ID
        #[arg(long)]
        tenant: String,
    },
    /// Tear the tenant partition down on every appliance
    Cleanup {
        /// Tenant ID
        #[arg(long)]
        tenant: String,

        /// Keep going when an appliance fails
        #[arg(long)]
        best_effort: bool,

        /// Appliances processed concurrently in best-effort mode
        #[arg(long, default_value = "4")]
        max_parallel: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mvirt_tenant=info,reqwest=warn,hyper=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(args.timeout))
        .danger_accept_invalid_certs(args.insecure)
        .build()
        .context("Failed to build HTTP client")?;

    let device = Arc::new(RestDeviceClient::new(
        http.clone(),
        &args.device_scheme,
        &args.username,
        &args.password,
    ));

    let ports: Arc<dyn PortDeallocator> = match &args.plugin_endpoint {
        Some(endpoint) => Arc::new(PluginPortDeallocator::new(http.clone(), endpoint)),
        None => Arc::new(NoopPortDeallocator),
    };

    let fabric: Arc<dyn FabricCleaner> = match &args.fabric_endpoint {
        Some(endpoint) => Arc::new(HttpFabricCleaner::new(http.clone(), endpoint)),
        None => {
            warn!("No fabric endpoint configured, tagged VLANs cannot be removed");
            Arc::new(UnconfiguredFabric)
        }
    };

    let config = ManagerConfig {
        default_traffic_group: args.traffic_group.clone(),
        retry: RetryPolicy {
            max_attempts: args.retry_attempts,
            interval: Duration::from_millis(args.retry_interval_ms),
        },
    };

    // Ctrl-C stops teardown at the next phase boundary
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            info!("Received Ctrl-C, stopping after the current step");
            let _ = shutdown_tx.send(true);
        }
    });

    let manager = TenantManager::new(
        device,
        ports,
        fabric,
        ServiceAdapter::new(&args.folder_prefix),
        config,
    )
    .with_shutdown(Shutdown::new(shutdown_rx));

    let appliances: Vec<Appliance> = args.appliances.iter().map(Appliance::new).collect();

    match args.command {
        Commands::Create { tenant } => {
            let service = TenantService::new(tenant, appliances);
            let provisioned = manager
                .assure_created(&service)
                .await
                .context("Tenant creation failed")?;
            info!(
                "Partition {} ready (traffic group {}, created on {} appliance(s))",
                provisioned.partition,
                provisioned.traffic_group,
                provisioned.created.len()
            );
        }
        Commands::Cleanup {
            tenant,
            best_effort,
            max_parallel,
        } => {
            let service = TenantService::new(tenant, appliances);
            let policy = if best_effort {
                CleanupPolicy::BestEffort { max_parallel }
            } else {
                CleanupPolicy::AbortOnFirstFailure
            };

            match manager.assure_cleanup(&service, policy).await {
                Ok(report) => {
                    for (hostname, outcome) in &report.outcomes {
                        info!("{}: {:?}", hostname, outcome);
                    }
                }
                Err(e) => {
                    error!("Teardown incomplete, safe to retry later: {}", e);
                    return Err(e).context("Tenant cleanup failed");
                }
            }
        }
    }

    Ok(())
}

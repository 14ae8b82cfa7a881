use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use sale_ingest::app::{DeviceDirectory, SaleIngestHandler, SalesLedger};
use sale_ingest::config::WebhookConfig;
use sale_ingest::constants::DEFAULT_PORT;
use sale_ingest::infra::{InMemoryStore, SupabaseStore};
use sale_ingest::server::{self, AppState};
use sale_ingest::{logging, metrics};

#[derive(Parser)]
#[command(name = "sale_ingest")]
#[command(about = "Webhook receiver for vending point-of-sale notifications")]
#[command(version)]
struct Cli {
    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Address to bind
    #[arg(long, default_value = "0.0.0.0")]
    bind: IpAddr,

    /// Prometheus exporter address, e.g. 127.0.0.1:9464
    #[arg(long, env = "SALE_INGEST_METRICS_ADDR")]
    metrics_addr: Option<SocketAddr>,

    /// Keep devices and sales in memory instead of Supabase
    #[arg(long)]
    in_memory: bool,

    /// JSON array of device registry rows to seed the in-memory store with
    #[arg(long, requires = "in_memory")]
    devices: Option<PathBuf>,

    /// Directory for rotated JSON log files
    #[arg(long, default_value = "logs")]
    log_dir: PathBuf,
}

type Stores = (Arc<dyn DeviceDirectory>, Arc<dyn SalesLedger>);

fn create_stores(cli: &Cli, config: &WebhookConfig) -> Result<Stores> {
    if cli.in_memory {
        let store = match &cli.devices {
            Some(path) => InMemoryStore::from_seed_file(path)?,
            None => InMemoryStore::new(),
        };
        info!("Using in-memory storage with {} devices", store.device_count());
        let store = Arc::new(store);
        let devices: Arc<dyn DeviceDirectory> = store.clone();
        let ledger: Arc<dyn SalesLedger> = store;
        Ok((devices, ledger))
    } else {
        info!("Using Supabase storage at {:?}", config.supabase.url);
        let store = Arc::new(SupabaseStore::new(&config.supabase));
        let devices: Arc<dyn DeviceDirectory> = store.clone();
        let ledger: Arc<dyn SalesLedger> = store;
        Ok((devices, ledger))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenv::dotenv().ok();

    let cli = Cli::parse();

    let _log_guard = logging::init_logging(&cli.log_dir);

    if let Some(addr) = cli.metrics_addr {
        metrics::init_metrics(addr);
    }

    let config = WebhookConfig::from_env();
    config.warn_if_incomplete();

    let (devices, ledger) = create_stores(&cli, &config)?;
    let handler = SaleIngestHandler::new(&config, devices, ledger);

    server::start_server(AppState::new(handler), SocketAddr::new(cli.bind, cli.port)).await
}

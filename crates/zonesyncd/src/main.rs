// # zonesyncd - zone reconciliation runner
//
// This binary is a THIN integration layer:
// - DO NOT add diffing, normalization or provider logic here
// - All reconciliation logic lives in zonesync-core
// - Provider specifics live in the provider crates
//
// The zonesyncd binary is responsible for:
// 1. Reading its settings from environment variables
// 2. Loading the zone configuration file
// 3. Registering providers and creating the configured one
// 4. Previewing or pushing corrections, one task per zone
//
// ## Configuration
//
// - `ZONESYNC_CONFIG`: Path to the JSON zone configuration (required)
// - `ZONESYNC_MODE`: `preview` (default) lists corrections, `push` applies them
// - `ZONESYNC_LOG_LEVEL`: trace, debug, info (default), warn, error
// - `ZONESYNC_PROVIDER_TOKEN`: Provider token, used when the file has none
// - `ZONESYNC_PROVIDER_API_KEY`: Provider API key, used when the file has none
//
// ## Example
//
// ```bash
// export ZONESYNC_CONFIG=/etc/zonesync/zones.json
// export ZONESYNC_PROVIDER_TOKEN=your_token
// export ZONESYNC_MODE=push
//
// zonesyncd
// ```

use anyhow::Result;
use std::env;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;
use zonesync_core::{DnsProvider, ProviderRegistry, Reconciler, ZoneConfig, ZoneSyncConfig};

/// Exit codes for different termination scenarios
///
/// - 0: Every zone reconciled (or previewed) cleanly
/// - 1: Configuration or startup error
/// - 2: A zone failed or a correction could not be applied
#[derive(Debug, Clone, Copy)]
enum ZoneSyncExitCode {
    Clean = 0,
    ConfigError = 1,
    RuntimeError = 2,
}

impl From<ZoneSyncExitCode> for ExitCode {
    fn from(code: ZoneSyncExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// What to do with the computed corrections
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Preview,
    Push,
}

/// Runner settings
struct Config {
    config_path: String,
    mode: Mode,
    log_level: String,
    provider_token: Option<String>,
    provider_api_key: Option<String>,
}

impl Config {
    /// Load settings from environment variables
    fn from_env() -> Result<Self> {
        let mode = match env::var("ZONESYNC_MODE")
            .unwrap_or_else(|_| "preview".to_string())
            .to_lowercase()
            .as_str()
        {
            "preview" => Mode::Preview,
            "push" => Mode::Push,
            other => anyhow::bail!(
                "ZONESYNC_MODE '{}' is not supported. Supported modes: preview, push",
                other
            ),
        };

        Ok(Self {
            config_path: env::var("ZONESYNC_CONFIG").unwrap_or_default(),
            mode,
            log_level: env::var("ZONESYNC_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            provider_token: env::var("ZONESYNC_PROVIDER_TOKEN").ok().filter(|s| !s.is_empty()),
            provider_api_key: env::var("ZONESYNC_PROVIDER_API_KEY")
                .ok()
                .filter(|s| !s.is_empty()),
        })
    }

    /// Validate the settings
    fn validate(&self) -> Result<()> {
        if self.config_path.is_empty() {
            anyhow::bail!(
                "ZONESYNC_CONFIG is required. \
                Set it via: export ZONESYNC_CONFIG=/etc/zonesync/zones.json"
            );
        }

        if !std::path::Path::new(&self.config_path).is_file() {
            anyhow::bail!("ZONESYNC_CONFIG does not point to a file: {}", self.config_path);
        }

        match self.log_level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!(
                "ZONESYNC_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }

        Ok(())
    }

    /// Load the zone configuration file and apply credential overrides
    fn load_zones(&self) -> Result<ZoneSyncConfig> {
        let mut zones = ZoneSyncConfig::from_file(&self.config_path)?;
        zones
            .provider
            .fill_credentials(self.provider_token.clone(), self.provider_api_key.clone());
        zones.validate()?;
        Ok(zones)
    }
}

fn main() -> ExitCode {
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return ZoneSyncExitCode::ConfigError.into();
        }
    };

    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {}", e);
        return ZoneSyncExitCode::ConfigError.into();
    }

    let log_level = match config.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return ZoneSyncExitCode::ConfigError.into();
    }

    let zones = match config.load_zones() {
        Ok(zones) => zones,
        Err(e) => {
            error!("Configuration error: {}", e);
            return ZoneSyncExitCode::ConfigError.into();
        }
    };

    let registry = ProviderRegistry::new();
    register_providers(&registry);

    let provider: Arc<dyn DnsProvider> = match registry.create_provider(&zones.provider) {
        Ok(provider) => Arc::from(provider),
        Err(e) => {
            error!("Failed to create {} provider: {}", zones.provider.type_name(), e);
            return ZoneSyncExitCode::ConfigError.into();
        }
    };

    info!(
        "Starting zonesyncd: {} zone(s) on {} in {:?} mode",
        zones.zones.len(),
        provider.provider_name(),
        config.mode
    );

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return ZoneSyncExitCode::RuntimeError.into();
        }
    };

    let clean = rt.block_on(run_zones(
        provider,
        zones.zones,
        config.mode,
        zones.engine.continue_on_error,
    ));

    if clean {
        ZoneSyncExitCode::Clean.into()
    } else {
        ZoneSyncExitCode::RuntimeError.into()
    }
}

/// Register every provider compiled into this binary
fn register_providers(registry: &ProviderRegistry) {
    #[cfg(feature = "gandi")]
    {
        info!("Registering Gandi provider");
        zonesync_provider_gandi::register(registry);
    }

    #[cfg(feature = "softlayer")]
    {
        info!("Registering SoftLayer provider");
        zonesync_provider_softlayer::register(registry);
    }

    info!("Available providers: {}", registry.list_providers().join(", "));
}

/// Reconcile every zone concurrently; true if all of them came out clean
async fn run_zones(
    provider: Arc<dyn DnsProvider>,
    zones: Vec<ZoneConfig>,
    mode: Mode,
    continue_on_error: bool,
) -> bool {
    let mut tasks = Vec::with_capacity(zones.len());
    for zone in zones {
        let provider = Arc::clone(&provider);
        let name = zone.name.clone();
        let handle = tokio::spawn(async move {
            reconcile_zone(provider, zone, mode, continue_on_error).await
        });
        tasks.push((name, handle));
    }

    let mut clean = true;
    for (name, handle) in tasks {
        match handle.await {
            Ok(Ok(true)) => {}
            Ok(Ok(false)) => clean = false,
            Ok(Err(e)) => {
                error!("{}: {}", name, e);
                clean = false;
            }
            Err(e) => {
                error!("{}: zone task failed: {}", name, e);
                clean = false;
            }
        }
    }
    clean
}

/// Preview or push one zone; false if any correction failed
async fn reconcile_zone(
    provider: Arc<dyn DnsProvider>,
    zone: ZoneConfig,
    mode: Mode,
    continue_on_error: bool,
) -> Result<bool> {
    let reconciler = Reconciler::new(provider);
    let plan = reconciler.plan_zone(&zone).await?;

    let nameservers = reconciler.provider().nameservers(&plan.zone).await?;
    println!("Domain: {}", plan.zone.name);
    println!("Name servers: {}", nameservers.join(", "));

    for (idx, correction) in plan.corrections.iter().enumerate() {
        println!("#{}: {}", idx + 1, correction.message);
    }
    if plan.is_empty() {
        info!("{}: nothing to do", plan.zone.name);
        return Ok(true);
    }

    if mode == Mode::Preview {
        println!("{} correction(s) pending for {}", plan.change_count, plan.zone.name);
        return Ok(true);
    }

    let report = reconciler.execute(&plan, continue_on_error).await;
    info!(
        "{}: {} applied, {} failed, {} skipped",
        plan.zone.name,
        report.applied.len(),
        report.failed.len(),
        report.skipped
    );
    for failure in &report.failed {
        warn!("{}: FAILURE! {}: {}", plan.zone.name, failure.message, failure.error);
    }
    Ok(report.is_success())
}

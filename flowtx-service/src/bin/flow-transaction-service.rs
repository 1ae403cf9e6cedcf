#[path = "flow-transaction-service/cli.rs"]
mod cli;
#[path = "flow-transaction-service/modes/mod.rs"]
mod modes;
#[path = "flow-transaction-service/setup.rs"]
mod setup;

use crate::cli::Cli;
use flowtx_service::api::{run_api_server, ApiState};
use flowtx_service::service::flow::ServiceFlow;
use flowtx_service::service::metrics::Metrics;
use log::{info, warn};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Cli::parse_args();
    // Environment is written while the process is still single-threaded.
    args.apply_to_env();
    let runtime = tokio::runtime::Builder::new_multi_thread().enable_all().build()?;
    runtime.block_on(run(args))
}

async fn run(args: Cli) -> Result<(), Box<dyn std::error::Error>> {
    setup::init_logging(args.log_dir.as_deref(), &args.log_level)?;
    info!("flow-transaction-service starting log_level={}", args.log_level);

    let app_config = setup::load_app_config()?;
    setup::log_startup_banner(&app_config);

    let store = setup::init_lease_store(&app_config).await?;

    if args.leases {
        info!("lease inspection mode requested");
        modes::leases::dump_leases(store, &app_config).await?;
        return Ok(());
    }

    let flow = Arc::new(ServiceFlow::from_config(app_config.clone(), store.clone()).await?);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    spawn_status_reporter(flow.metrics());

    if app_config.api.enabled {
        let api_addr: SocketAddr = app_config.api.addr.parse().map_err(|err| format!("invalid api.addr: {}", err))?;
        let state = Arc::new(ApiState { lease_store: store.clone(), metrics: flow.metrics() });
        let shutdown_for_api = shutdown_rx.clone();
        tokio::spawn(async move {
            if let Err(err) = run_api_server(api_addr, state, shutdown_for_api).await {
                warn!("http api error: {}", err);
            }
        });
    }

    let flow_for_loops = flow.clone();
    let mut loops = tokio::spawn(async move { flow_for_loops.run(shutdown_rx).await });

    tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            match signal {
                Ok(()) => info!("interrupt received, stopping intake"),
                Err(err) => warn!("interrupt listener failed error={}", err),
            }
            let _ = shutdown_tx.send(true);
        }
        result = &mut loops => {
            match result {
                Ok(Ok(())) => info!("intake loops finished"),
                Ok(Err(err)) => return Err(err.into()),
                Err(err) => return Err(err.into()),
            }
        }
    }

    info!("flow-transaction-service stopped");
    Ok(())
}

fn spawn_status_reporter(metrics: Arc<Metrics>) {
    tokio::spawn(async move {
        let interval_seconds = 300u64;
        info!("status reporter started interval_seconds={}", interval_seconds);
        let mut interval = tokio::time::interval(Duration::from_secs(interval_seconds));
        loop {
            interval.tick().await;
            let snapshot = metrics.snapshot();
            info!(
                "periodic status report uptime_minutes={} dispatch_confirmed={} dispatch_no_key={} dispatch_failed={} callbacks_published={} callbacks_failed={} events_forwarded={} events_rejected={} messages_malformed={}",
                snapshot.uptime.as_secs() / 60,
                snapshot.dispatch_confirmed,
                snapshot.dispatch_no_key,
                snapshot.dispatch_failed,
                snapshot.callbacks_published,
                snapshot.callbacks_failed,
                snapshot.events_forwarded,
                snapshot.events_rejected,
                snapshot.messages_malformed
            );
        }
    });
}

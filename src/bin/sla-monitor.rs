//! SLA monitor service.
//!
//! Restores state from the configured store, runs the metric scheduler and
//! answers requests read from stdin, one per line:
//!
//! ```text
//! POST /orders {"user_name":"alice","service_type":"api","sla_uptime_pct":99.5,"sla_latency_ms":300}
//! GET /orders/1
//! POST /simulate/1 {"latency_ms": 900}
//! ```

use slamon::api::{parse_request_line, ApiResponse, ApiService};
use slamon::engine::{EngineConfig, MetricScheduler, SlaEngine};
use slamon::monitoring::init_tracing;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, error, info, warn};

#[tokio::main]
async fn main() {
    let config = match EngineConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("sla-monitor: {}", e);
            std::process::exit(2);
        }
    };
    init_tracing(&config.logging);

    if let Err(e) = run(config).await {
        error!(error = %e, "sla-monitor stopped");
        std::process::exit(1);
    }
}

async fn run(config: EngineConfig) -> slamon::Result<()> {
    let scheduler_config = config.scheduler.clone();
    let engine = Arc::new(SlaEngine::from_config(config).await?);
    info!(
        store = %engine.config().store.backend,
        window = engine.config().window_size,
        orders = engine.registry().len().await,
        "sla-monitor started"
    );

    let mut events = engine.subscribe();
    let watcher = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => info!(
                    order_id = %event.order_id,
                    old = %event.old_status,
                    new = %event.new_status,
                    "{}",
                    event.details
                ),
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "status event subscriber lagged"),
                Err(RecvError::Closed) => break,
            }
        }
    });

    let scheduler = scheduler_config.enabled.then(|| {
        MetricScheduler::spawn(
            engine.clone(),
            Duration::from_secs(scheduler_config.interval_seconds),
        )
    });

    let api = ApiService::new(engine.clone());
    tokio::select! {
        result = serve_stdin(&api) => result?,
        _ = tokio::signal::ctrl_c() => info!("shutdown requested"),
    }

    if let Some(scheduler) = scheduler {
        scheduler.shutdown().await;
    }
    watcher.abort();
    info!("sla-monitor stopped");
    Ok(())
}

async fn serve_stdin(api: &ApiService) -> slamon::Result<()> {
    let mut stdin = BufReader::new(tokio::io::stdin());
    let mut stdout = tokio::io::stdout();
    let mut buf = Vec::new();
    let mut line_no = 0u64;

    loop {
        buf.clear();
        if stdin.read_until(b'\n', &mut buf).await? == 0 {
            break;
        }
        line_no += 1;

        let response = match parse_request_line(&buf) {
            Ok(Some(request)) => {
                let response = api.handle(request.method, request.path, request.body).await;
                if !response.is_success() {
                    debug!(
                        line = line_no,
                        method = request.method,
                        path = request.path,
                        status = response.status,
                        "request not successful"
                    );
                }
                response
            }
            Ok(None) => continue,
            Err(e) => {
                warn!(line = line_no, error = %e, "skipping unreadable request line");
                ApiResponse::from_error(&e)
            }
        };

        let out = format!("{} {}\n", response.status, response.body);
        stdout.write_all(out.as_bytes()).await?;
        stdout.flush().await?;
    }

    // stdin closed; keep running until interrupted
    std::future::pending::<()>().await;
    Ok(())
}

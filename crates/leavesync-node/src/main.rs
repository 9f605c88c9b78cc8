//! leavesync-node — the approval-sync engine node binary.
//!
//! Startup sequence:
//!   1. Build the upstream client and the three flat-file stores
//!   2. Wire the sync engine and (if credentials are present) the callback
//!      handler
//!   3. Start the incremental-poll and status-check cron schedulers, plus
//!      the callback queue-drain timer
//!   4. Serve the HTTP surface (callback endpoint + sync control API)

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use chrono::Utc;
use clap::Parser;
use cron::Schedule;
use tracing::{info, warn};

use leavesync_client::UpstreamClient;
use leavesync_core::constants::{
    DEFAULT_STATUS_CHECK_INTERVAL_CRON, DEFAULT_SYNC_INTERVAL_CRON,
    MANUAL_TRIGGER_MIN_SPACING_SECS, QUEUE_DRAIN_INTERVAL_SECS, SCHEDULER_INITIAL_DELAY_SECS,
};
use leavesync_crypto::CallbackKey;
use leavesync_server::{serve, AppState};
use leavesync_sync::{
    run_incremental_cycle, run_status_check_cycle, CallbackCredentials, CallbackHandler,
    SyncConfig, SyncEngine,
};

#[derive(Parser, Debug)]
#[command(
    name = "leavesync-node",
    version,
    about = "Keeps an internal leave-tracking store in sync with the upstream approval platform"
)]
struct Args {
    /// Enterprise-platform corp ID.
    #[arg(long, env = "WECOM_CORPID")]
    corp_id: String,

    /// Application secret used to mint access tokens.
    #[arg(long, env = "WECOM_SECRET")]
    secret: String,

    /// Base URL of the upstream approval platform's API.
    #[arg(long, env = "WECOM_BASE_URL", default_value = "https://qyapi.weixin.qq.com")]
    base_url: String,

    /// Callback signature token. Required, together with the encoding AES
    /// key, for the push-callback endpoint to do anything but reject requests.
    #[arg(long, env = "WECOM_CALLBACK_TOKEN")]
    callback_token: Option<String>,

    /// Base64-encoded (43-char, `=`-padded on use) callback encryption key.
    #[arg(long, env = "WECOM_CALLBACK_ENCODING_AES_KEY")]
    callback_encoding_aes_key: Option<String>,

    /// Expected recipient ID embedded in encrypted callback payloads.
    /// Defaults to `corp_id` when not set, which is correct for the common
    /// single-tenant deployment.
    #[arg(long, env = "WECOM_CALLBACK_RECIPIENT_ID")]
    callback_recipient_id: Option<String>,

    /// Directory holding the three flat JSON state files.
    #[arg(long, env = "DATA_DIR", default_value = "./data")]
    data_dir: PathBuf,

    /// Address the HTTP surface listens on.
    #[arg(long, env = "LISTEN_ADDR", default_value = "0.0.0.0:8080")]
    listen_addr: SocketAddr,

    /// Cron expression for the incremental-poll scheduler.
    #[arg(long, env = "SYNC_INTERVAL_CRON")]
    sync_interval_cron: Option<String>,

    #[arg(long, env = "AUTO_SYNC_ENABLED", default_value_t = true)]
    auto_sync_enabled: bool,

    /// Cron expression for the status-check scheduler.
    #[arg(long, env = "STATUS_CHECK_INTERVAL_CRON")]
    status_check_interval_cron: Option<String>,

    #[arg(long, env = "STATUS_CHECK_ENABLED", default_value_t = true)]
    status_check_enabled: bool,

    /// Approvals last touched more than this many days ago are dropped from
    /// the active index even if still nominally Pending.
    #[arg(long, env = "ACTIVE_INDEX_CUTOFF_DAYS", default_value_t = 90)]
    active_index_cutoff_days: i64,

    /// On a cursor reset (or first run), the incremental poller starts this
    /// many days in the past.
    #[arg(long, env = "INCREMENTAL_BASELINE_DAYS_AGO", default_value_t = 7)]
    incremental_baseline_days_ago: i64,

    #[arg(long, env = "MANUAL_TRIGGER_MIN_SPACING_SECS", default_value_t = MANUAL_TRIGGER_MIN_SPACING_SECS)]
    manual_trigger_min_spacing_secs: i64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,leavesync=debug".parse().unwrap()),
        )
        .init();

    let args = Args::parse();
    info!("leavesync node starting");

    std::fs::create_dir_all(&args.data_dir)
        .with_context(|| format!("creating data dir {}", args.data_dir.display()))?;

    let client = Arc::new(UpstreamClient::new(
        args.base_url.clone(),
        args.corp_id.clone(),
        args.secret.clone(),
    ));

    let now = Utc::now().timestamp();
    let recipient_id = args
        .callback_recipient_id
        .clone()
        .unwrap_or_else(|| args.corp_id.clone());
    let config = SyncConfig {
        incremental_baseline: now - args.incremental_baseline_days_ago * 86_400,
        active_index_cutoff: now - args.active_index_cutoff_days * 86_400,
        callback_recipient_id: recipient_id.clone(),
        manual_trigger_min_spacing_secs: args.manual_trigger_min_spacing_secs,
    };

    let engine = Arc::new(SyncEngine::new(client, &args.data_dir, config));
    if !args.auto_sync_enabled {
        engine.set_auto_sync_enabled(false);
    }
    if !args.status_check_enabled {
        engine.set_status_check_enabled(false);
    }

    let credentials = match (&args.callback_token, &args.callback_encoding_aes_key) {
        (Some(token), Some(encoding_key)) => {
            let key = CallbackKey::from_encoding_key(encoding_key)
                .context("parsing callback encoding AES key")?;
            Some(CallbackCredentials {
                token: token.clone(),
                key,
                recipient_id,
            })
        }
        _ => {
            warn!("callback token/encoding key not configured — push-callback endpoint is inert");
            None
        }
    };
    let callback = Arc::new(CallbackHandler::new(Arc::clone(&engine), credentials));

    spawn_poll_scheduler(
        Arc::clone(&engine),
        args.sync_interval_cron
            .clone()
            .unwrap_or_else(|| DEFAULT_SYNC_INTERVAL_CRON.to_string()),
    );
    spawn_status_check_scheduler(
        Arc::clone(&engine),
        args.status_check_interval_cron
            .clone()
            .unwrap_or_else(|| DEFAULT_STATUS_CHECK_INTERVAL_CRON.to_string()),
    );
    spawn_queue_drain(Arc::clone(&callback));

    let state = Arc::new(AppState {
        engine: Arc::clone(&engine),
        callback,
    });

    info!("leavesync node ready");
    serve(state, args.listen_addr).await
}

fn next_sleep_duration(schedule: &Schedule) -> Duration {
    let now = Utc::now();
    schedule
        .upcoming(Utc)
        .next()
        .and_then(|next| (next - now).to_std().ok())
        .unwrap_or(Duration::from_secs(60))
}

fn spawn_poll_scheduler(engine: Arc<SyncEngine>, cron_expr: String) {
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(SCHEDULER_INITIAL_DELAY_SECS)).await;
        let schedule = match Schedule::from_str(&cron_expr) {
            Ok(s) => s,
            Err(e) => {
                warn!(error = %e, cron_expr, "invalid incremental-poll cron expression, scheduler disabled");
                return;
            }
        };
        loop {
            tokio::time::sleep(next_sleep_duration(&schedule)).await;
            if !engine.auto_sync_enabled() {
                continue;
            }
            match run_incremental_cycle(&engine).await {
                Ok(outcome) => info!(?outcome, "incremental poll tick"),
                Err(e) => warn!(error = %e, "incremental poll tick failed"),
            }
        }
    });
}

fn spawn_status_check_scheduler(engine: Arc<SyncEngine>, cron_expr: String) {
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(SCHEDULER_INITIAL_DELAY_SECS)).await;
        let schedule = match Schedule::from_str(&cron_expr) {
            Ok(s) => s,
            Err(e) => {
                warn!(error = %e, cron_expr, "invalid status-check cron expression, scheduler disabled");
                return;
            }
        };
        loop {
            tokio::time::sleep(next_sleep_duration(&schedule)).await;
            if !engine.status_check_enabled() {
                continue;
            }
            match run_status_check_cycle(&engine).await {
                Ok(outcome) => info!(?outcome, "status-check tick"),
                Err(e) => warn!(error = %e, "status-check tick failed"),
            }
        }
    });
}

fn spawn_queue_drain(callback: Arc<CallbackHandler>) {
    tokio::spawn(async move {
        if !callback.configured() {
            return;
        }
        let mut interval = tokio::time::interval(Duration::from_secs(QUEUE_DRAIN_INTERVAL_SECS));
        loop {
            interval.tick().await;
            callback.drain_queue().await;
        }
    });
}

use std::{
    net::SocketAddr,
    path::{Path, PathBuf},
    process::ExitCode,
};

use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use fdlog::{
    config::{PREFERENCES_FILE, Preferences, SessionConfig},
    core::store::SortOrder,
    engine::qso_rate,
    export::export_all,
    geo,
    listener::UdpListener,
    persist::sqlite::SqliteOpSink,
    runtime::{LogHandle, RuntimeConfig, spawn_fdlog},
    scp::{SCP_FILE, SuperCheck},
    sections::SectionCatalog,
    session::Session,
};

#[derive(Debug, Parser)]
#[command(name = "fdlog", about = "Field Day contact logger")]
struct Cli {
    /// Contact log database.
    #[arg(long, global = true, default_value = "FieldDay.db")]
    db: PathBuf,
    /// Preferences file; created with defaults when missing.
    #[arg(long, global = true, default_value = PREFERENCES_FILE)]
    prefs: PathBuf,
    /// Debug-level logging.
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Log contacts from digital-mode UDP datagrams until Ctrl-C.
    Listen {
        #[arg(long)]
        bind: Option<SocketAddr>,
    },
    /// Write the ADIF, Cabrillo, statistics and marker files.
    Export {
        #[arg(long, default_value = ".")]
        out: PathBuf,
    },
    /// Print the claimed score.
    Score,
    /// Super check partial and band/mode history for a callsign.
    Check {
        call: String,
        #[arg(long, default_value = SCP_FILE)]
        scp: PathBuf,
    },
}

fn init_logger(verbose: bool) {
    let default = if verbose { "fdlog=debug,info" } else { "fdlog=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .compact(),
        )
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logger(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "fdlog failed");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let prefs = Preferences::load_or_create(&cli.prefs)?;
    let sink = SqliteOpSink::open(&cli.db)?;
    let store = sink.load_store()?;
    let runtime = RuntimeConfig {
        power_thresholds: prefs.power_thresholds,
        ..RuntimeConfig::default()
    };
    let handle = spawn_fdlog(store, Some(Box::new(sink)), runtime);

    let result = match cli.command {
        Command::Listen { bind } => listen(handle.clone(), prefs, bind).await,
        Command::Export { out } => export(&handle, &prefs, out).await,
        Command::Score => score(&handle, &prefs).await,
        Command::Check { call, scp } => check(&handle, &call, &scp).await,
    };
    handle.shutdown().await?;
    result
}

async fn listen(
    handle: LogHandle,
    prefs: Preferences,
    bind: Option<SocketAddr>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = SessionConfig::default();
    if let Some(bind) = bind {
        config.bind = bind;
    }
    let session = Session::new(prefs, handle, config).with_remote_from_prefs()?;
    session.authenticate_remote().await;

    let listener = UdpListener::bind(session.config().bind).await?;
    listener
        .run(session, async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;
    Ok(())
}

async fn export(
    handle: &LogHandle,
    prefs: &Preferences,
    out: PathBuf,
) -> Result<(), Box<dyn std::error::Error>> {
    let contacts = handle.all(SortOrder::Ascending).await?;
    let outcomes = export_all(&out, &contacts, prefs, SectionCatalog::global());
    let mut failed = 0;
    for outcome in &outcomes {
        match &outcome.result {
            Ok(path) => println!("wrote {}", path.display()),
            Err(err) => {
                failed += 1;
                println!("FAILED {}: {err}", outcome.file);
            }
        }
    }
    if failed > 0 {
        return Err(format!("{failed} export file(s) failed").into());
    }
    Ok(())
}

async fn score(handle: &LogHandle, prefs: &Preferences) -> Result<(), Box<dyn std::error::Error>> {
    let score = handle.score().await?;
    let contacts = handle.all(SortOrder::Ascending).await?;
    let rate = qso_rate(&contacts, Utc::now());
    let sections = handle.worked_sections().await?;
    println!(
        "CW {}  PH {}  DI {}  band/mode {}",
        score.cw_count, score.phone_count, score.digital_count, score.band_mode_mults
    );
    println!(
        "basic {} x{} = {} ({})",
        score.basic_score, score.multiplier, score.final_score, score.power_category
    );
    println!(
        "last 15 min {}  last hour {}",
        rate.last_15_minutes, rate.last_hour
    );
    println!("sections worked {}: {}", sections.len(), sections.join(" "));

    let farthest = contacts
        .iter()
        .filter_map(|c| geo::path(&prefs.mygrid, &c.grid).map(|p| (c, p)))
        .max_by_key(|(_, p)| p.km);
    if let Some((c, p)) = farthest {
        println!("farthest {} {}: {} km at {} deg", c.callsign, c.grid, p.km, p.degrees);
    }
    Ok(())
}

async fn check(
    handle: &LogHandle,
    call: &str,
    scp_path: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    match SuperCheck::load(scp_path) {
        Ok(scp) => println!("scp: {}", scp.matches(call).join(" ")),
        Err(err) => tracing::warn!(error = %err, "super check list unavailable"),
    }
    let worked = handle.worked_on(call.trim().to_ascii_uppercase()).await?;
    if worked.is_empty() {
        println!("{} not worked", call.trim().to_ascii_uppercase());
    }
    for (band, mode) in worked {
        println!("worked {band}M {mode}");
    }
    Ok(())
}

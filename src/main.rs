// Challenge Dashboard
// Main entry point

use std::io::{self, IsTerminal, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration as StdDuration;

use anyhow::{anyhow, bail, Context, Result};
use chrono::{Duration, Utc};
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

use challenge_dashboard::models::challenge::ChallengeStatus;
use challenge_dashboard::models::event::Event;
use challenge_dashboard::models::settings::Settings;
use challenge_dashboard::services::board::{EventBoard, StatusFilter};
use challenge_dashboard::services::cache::ResponseCache;
use challenge_dashboard::services::database::Database;
use challenge_dashboard::services::provider::{ChallengeSource, EventLoader, HttpChallengeSource};
use challenge_dashboard::services::refresh::{FetchTicket, RefreshScheduler};
use challenge_dashboard::services::settings::SettingsService;
use challenge_dashboard::services::status::UrgencyThresholds;
use challenge_dashboard::ui::{render_board, render_event_list, RenderOptions};

const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

#[derive(Debug, Parser)]
#[command(name = "challenge-dashboard", version, about = "Live challenge status board")]
struct Cli {
    /// Path to config.toml (defaults to the per-user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Overrides provider.base_url
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Skip the response cache entirely
    #[arg(long, global = true)]
    no_cache: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Write a config file populated with defaults
    Init {
        #[arg(long)]
        force: bool,
    },
    /// List the platform's events
    Events,
    /// Show a live board for one event
    Watch {
        event_id: i64,

        /// Render a single frame and exit
        #[arg(long)]
        once: bool,

        /// Only show challenges with this status
        #[arg(long)]
        status: Option<ChallengeStatus>,

        #[arg(long)]
        no_color: bool,
    },
}

fn main() -> Result<()> {
    // Initialize logging
    env_logger::init();

    let cli = Cli::parse();
    log::info!("Starting Challenge Dashboard");

    let settings_service = SettingsService::new(cli.config.clone());
    let mut settings = settings_service.load()?;
    if let Some(url) = cli.api_url {
        settings.provider.base_url = url;
    }

    match cli.command {
        Command::Init { force } => init_config(&settings_service, &settings, force),
        Command::Events => {
            validate(&settings)?;
            let cache_db = open_cache(&settings, cli.no_cache);
            list_events(&settings, cache_db.as_ref())
        }
        Command::Watch {
            event_id,
            once,
            status,
            no_color,
        } => {
            validate(&settings)?;
            let cache_db = open_cache(&settings, cli.no_cache);
            let options = RenderOptions {
                filter: status.map_or(StatusFilter::All, StatusFilter::Only),
                tz: settings.display.tz().map_err(|err| anyhow!(err))?,
                color: !no_color && io::stdout().is_terminal(),
            };
            watch(&settings, cache_db.as_ref(), event_id, once, &options)
        }
    }
}

fn validate(settings: &Settings) -> Result<()> {
    settings
        .validate()
        .map_err(|err| anyhow!("Invalid settings: {}", err))
}

fn init_config(service: &SettingsService, settings: &Settings, force: bool) -> Result<()> {
    if let Some(path) = service.path() {
        if path.exists() && !force {
            bail!("{} already exists (use --force to overwrite)", path.display());
        }
    }

    let path = service.save(settings)?;
    println!("Wrote {}", path.display());
    Ok(())
}

/// The cache is an optimisation: failing to open it degrades to uncached reads.
fn open_cache(settings: &Settings, disabled: bool) -> Option<Database> {
    if disabled || settings.cache.ttl_seconds == 0 {
        return None;
    }

    let path = settings
        .cache
        .path
        .clone()
        .or_else(SettingsService::default_cache_path)?;

    let opened = Database::open_file(&path).and_then(|db| {
        db.initialize_schema()?;
        Ok(db)
    });

    match opened {
        Ok(db) => {
            let ttl = Duration::from_std(cache_ttl(settings)).unwrap_or_else(|_| Duration::zero());
            if let Err(err) = ResponseCache::new(db.connection()).purge_expired(Utc::now(), ttl) {
                log::warn!("Failed to purge response cache: {:#}", err);
            }
            Some(db)
        }
        Err(err) => {
            log::warn!("Response cache unavailable ({}): {:#}", path.display(), err);
            None
        }
    }
}

fn cache_ttl(settings: &Settings) -> StdDuration {
    StdDuration::from_secs(settings.cache.ttl_seconds)
}

fn list_events(settings: &Settings, cache_db: Option<&Database>) -> Result<()> {
    let source = HttpChallengeSource::new(&settings.provider)?;
    let loader = EventLoader::new(
        source,
        cache_db.map(|db| ResponseCache::new(db.connection())),
        cache_ttl(settings),
    );

    let now = Utc::now();
    let events = loader.list_events(now)?;
    let tz = settings.display.tz().map_err(|err| anyhow!(err))?;
    print!("{}", render_event_list(&events, now, tz));
    Ok(())
}

fn watch(
    settings: &Settings,
    cache_db: Option<&Database>,
    event_id: i64,
    once: bool,
    options: &RenderOptions,
) -> Result<()> {
    let source = Arc::new(HttpChallengeSource::new(&settings.provider)?);
    let loader = EventLoader::new(
        Arc::clone(&source),
        cache_db.map(|db| ResponseCache::new(db.connection())),
        cache_ttl(settings),
    );

    let mut board = EventBoard::new(
        event_id,
        RefreshScheduler::new(StdDuration::from_millis(settings.display.refresh_margin_millis)),
        UrgencyThresholds::from(&settings.display),
    );

    if once {
        let loaded = loader.load_event(event_id, Utc::now())?;
        let now = Utc::now();
        board.load_snapshot(loaded.event, now)?;
        print!("{}", render_board(&board, now, options));
        return Ok(());
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    let tick = StdDuration::from_millis(settings.display.tick_millis);
    let result = runtime.block_on(run_board(&loader, &mut board, source, tick, options));
    board.teardown();
    // stdin reads and in-flight fetches sit on blocking threads; don't wait them out
    runtime.shutdown_timeout(StdDuration::from_millis(500));
    result
}

type FetchOutcome = (FetchTicket, Result<Event>);

fn spawn_fetch<S>(
    board: &mut EventBoard,
    source: &Arc<S>,
    tx: &mpsc::UnboundedSender<FetchOutcome>,
) where
    S: ChallengeSource + Send + Sync + 'static,
{
    let ticket = board.begin_fetch();
    let event_id = board.event_id();
    let source = Arc::clone(source);
    let tx = tx.clone();

    tokio::task::spawn_blocking(move || {
        let result = source.fetch_event(event_id);
        // receiver gone means the board was torn down
        let _ = tx.send((ticket, result));
    });
}

fn redraw(board: &EventBoard, options: &RenderOptions) -> Result<()> {
    let mut stdout = io::stdout().lock();
    write!(stdout, "{}{}", CLEAR_SCREEN, render_board(board, Utc::now(), options))
        .and_then(|_| stdout.flush())
        .context("Failed to write to terminal")
}

/// Display tick and boundary refresh run as two independent timers; fetches
/// run on the blocking pool and report back through a channel.
async fn run_board<S>(
    loader: &EventLoader<'_, Arc<S>>,
    board: &mut EventBoard,
    source: Arc<S>,
    tick: StdDuration,
    options: &RenderOptions,
) -> Result<()>
where
    S: ChallengeSource + Send + Sync + 'static,
{
    let (tx, mut rx) = mpsc::unbounded_channel::<FetchOutcome>();

    match loader.cached_event(board.event_id(), Utc::now())? {
        Some(hit) => board.load_snapshot(hit.event, Utc::now())?,
        None => spawn_fetch(board, &source, &tx),
    }

    let mut ticker = tokio::time::interval(tick);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        let refresh_wait = board.scheduler().time_until_due(Utc::now());
        let refresh_timer = async move {
            match refresh_wait {
                Some(wait) => tokio::time::sleep(wait).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            _ = ticker.tick() => {
                redraw(board, options)?;
            }
            _ = refresh_timer => {
                if board.refresh_due(Utc::now()) {
                    log::info!("Scheduled refresh of event {}", board.event_id());
                    spawn_fetch(board, &source, &tx);
                }
            }
            Some((ticket, result)) = rx.recv() => {
                let now = Utc::now();
                match result {
                    Ok(event) => {
                        if board.apply_response(ticket, event.clone(), now) {
                            loader.store_event(&event, now);
                        }
                    }
                    Err(err) => {
                        board.apply_failure(ticket, format!("{:#}", err), now);
                    }
                }
                redraw(board, options)?;
            }
            line = stdin.next_line(), if stdin_open => {
                match line {
                    Ok(Some(input)) if input.trim().eq_ignore_ascii_case("q") => break,
                    Ok(Some(_)) => {
                        log::info!("Manual refresh of event {}", board.event_id());
                        spawn_fetch(board, &source, &tx);
                    }
                    Ok(None) => stdin_open = false,
                    Err(err) => {
                        log::warn!("Stopped reading stdin: {}", err);
                        stdin_open = false;
                    }
                }
            }
            _ = &mut shutdown => break,
        }
    }

    log::info!("Closing board for event {}", board.event_id());
    Ok(())
}

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Layout},
    Terminal,
};
use tokio::runtime::Runtime;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use replica_doctor::app::{App, View};
use replica_doctor::config::Overrides;
use replica_doctor::{
    events, ui, ChannelPresenter, ConsolePresenter, JsonPresenter, MonitorConfig, MySqlReplica,
    PollLoop, PollStats, Presenter,
};

#[derive(Parser, Debug)]
#[command(name = "replica-doctor")]
#[command(about = "Monitor MySQL replication lag and skip known fatal replication errors")]
struct Args {
    /// MySQL replica host
    #[arg(long)]
    host: Option<String>,

    /// MySQL port [default: 3306]
    #[arg(long)]
    port: Option<u16>,

    /// MySQL user
    #[arg(long)]
    user: Option<String>,

    /// MySQL password
    #[arg(long)]
    password: Option<String>,

    /// Configuration file (TOML, YAML or JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Time between polls (e.g. "5s", "500ms") [default: 5s]
    #[arg(short, long)]
    interval: Option<String>,

    /// Regular expression to look for in Last_SQL_Error (repeatable)
    #[arg(long = "pattern", value_name = "REGEX")]
    patterns: Vec<String>,

    /// Show the interactive dashboard
    #[arg(long, conflicts_with_all = ["json", "once"])]
    tui: bool,

    /// Print one JSON object per event instead of the text report
    #[arg(long)]
    json: bool,

    /// Run a single poll cycle and exit
    #[arg(long)]
    once: bool,

    /// Log level (overridden by RUST_LOG)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Write logs to this file instead of stderr
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Lag in seconds at which the replica is reported as WARN
    #[arg(long)]
    lag_warn: Option<u64>,

    /// Lag in seconds at which the replica is reported as CRIT
    #[arg(long)]
    lag_crit: Option<u64>,
}

impl Args {
    fn overrides(&self) -> Overrides {
        Overrides {
            host: self.host.clone(),
            port: self.port,
            user: self.user.clone(),
            password: self.password.clone(),
            interval: self.interval.clone(),
            error_patterns: self.patterns.clone(),
            lag_warning_secs: self.lag_warn,
            lag_critical_secs: self.lag_crit,
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level, args.log_file.as_deref(), args.tui)?;

    let config = MonitorConfig::load(args.config.as_deref(), &args.overrides())?;
    let rt = Runtime::new()?;

    let replica = config.replica();
    rt.block_on(replica.ping())
        .with_context(|| format!("Failed to connect to {}", config.target()))?;
    match connection_banner(&config.target(), args.json) {
        Some(banner) => println!("{}", banner),
        None => info!(target_replica = %config.target(), "successfully connected to MySQL database"),
    }

    let result = if args.tui {
        run_dashboard(&rt, &config, replica.clone())
    } else {
        let presenter: Box<dyn Presenter> = if args.json {
            Box::new(JsonPresenter::stdout())
        } else {
            Box::new(ConsolePresenter::stdout(config.thresholds.clone()))
        };
        rt.block_on(run_headless(&config, replica.clone(), presenter, args.once));
        Ok(())
    };

    if let Err(e) = rt.block_on(replica.disconnect()) {
        warn!(error = %e, "failed to close connection pool");
    }
    result
}

/// The stdout line announcing a live connection. JSON mode keeps stdout to
/// one object per line, so the announcement goes to the log instead.
fn connection_banner(target: &str, json: bool) -> Option<String> {
    if json {
        None
    } else {
        Some(format!("Successfully connected to MySQL database at {}", target))
    }
}

/// Console and JSON modes log to stderr; the dashboard owns the terminal, so
/// it only logs when given a file.
fn init_logging(level: &str, log_file: Option<&Path>, dashboard: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .with_context(|| format!("Invalid log level: {}", level))?;

    match log_file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
                .map_err(|e| anyhow::anyhow!(e))?;
        }
        None if !dashboard => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(io::stderr)
                .try_init()
                .map_err(|e| anyhow::anyhow!(e))?;
        }
        None => {}
    }
    Ok(())
}

fn build_loop(
    config: &MonitorConfig,
    replica: MySqlReplica,
    presenter: Box<dyn Presenter>,
) -> PollLoop {
    PollLoop::new(Box::new(replica.clone()), Box::new(replica), presenter)
        .with_matcher(config.matcher.clone())
        .with_interval(config.interval)
}

/// Run until Ctrl+C (or for one cycle with `--once`).
async fn run_headless(
    config: &MonitorConfig,
    replica: MySqlReplica,
    presenter: Box<dyn Presenter>,
    once: bool,
) {
    let mut poll_loop = build_loop(config, replica, presenter);

    if once {
        poll_loop.poll_once().await;
        log_stats(poll_loop.stats());
        return;
    }

    let shutdown = CancellationToken::new();
    let ctrl_c = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupt received, shutting down");
        }
        ctrl_c.cancel();
    });

    let stats = poll_loop.run(shutdown).await;
    log_stats(stats);
}

fn log_stats(stats: PollStats) {
    info!(
        cycles = stats.cycles,
        fetch_failures = stats.fetch_failures,
        empty_status = stats.empty_status,
        matches = stats.matches,
        recoveries_succeeded = stats.recoveries_succeeded,
        recoveries_failed = stats.recoveries_failed,
        "monitoring summary"
    );
}

/// Run the poll loop on the runtime and the dashboard on this thread.
fn run_dashboard(rt: &Runtime, config: &MonitorConfig, replica: MySqlReplica) -> Result<()> {
    let (presenter, receiver) = ChannelPresenter::create();
    let mut poll_loop = build_loop(config, replica, Box::new(presenter));

    let shutdown = CancellationToken::new();
    let loop_shutdown = shutdown.clone();
    let handle = rt.spawn(async move { poll_loop.run(loop_shutdown).await });

    let app = App::new(receiver, config.target(), config.thresholds.clone());
    let result = run_tui(app);

    shutdown.cancel();
    match rt.block_on(handle) {
        Ok(stats) => log_stats(stats),
        Err(e) => warn!(error = %e, "poll loop task failed"),
    }
    result
}

fn run_tui(mut app: App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Setup panic hook to restore terminal
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic);
    }));

    let result = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> Result<()> {
    // Minimum terminal size for usable display
    const MIN_WIDTH: u16 = 60;
    const MIN_HEIGHT: u16 = 12;

    while app.running {
        app.drain_events();

        terminal.draw(|frame| {
            let area = frame.area();

            if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
                let msg = format!(
                    "Terminal too small: {}x{}\nMinimum: {}x{}\n\nResize to continue",
                    area.width, area.height, MIN_WIDTH, MIN_HEIGHT
                );
                let paragraph = ratatui::widgets::Paragraph::new(msg)
                    .alignment(ratatui::layout::Alignment::Center)
                    .style(ratatui::style::Style::default().fg(ratatui::style::Color::Yellow));
                let top = (area.height / 2).saturating_sub(2);
                let centered = ratatui::layout::Rect::new(0, top, area.width, 5.min(area.height));
                frame.render_widget(paragraph, centered);
                return;
            }

            let chunks = Layout::vertical([
                Constraint::Length(1), // Header bar
                Constraint::Length(1), // Tabs
                Constraint::Min(8),    // Content
                Constraint::Length(1), // Status bar
            ])
            .split(area);

            ui::common::render_header(frame, app, chunks[0]);
            ui::common::render_tabs(frame, app, chunks[1]);

            match app.current_view {
                View::Status => ui::status::render(frame, app, chunks[2]),
                View::Events => ui::log::render(frame, app, chunks[2]),
            }

            ui::common::render_status_bar(frame, app, chunks[3]);

            if app.show_help {
                ui::common::render_help(frame, app, area);
            }
        })?;

        if let Some(Event::Key(key)) = events::poll_event(Duration::from_millis(100))? {
            if key.kind == KeyEventKind::Press {
                events::handle_key_event(app, key);
            }
        }
    }

    Ok(())
}

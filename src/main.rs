use clap::{error::ErrorKind, CommandFactory, Parser, ValueEnum};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use log::{info, LevelFilter};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    error::Error,
    io::{self, stdin},
    path::PathBuf,
    time::Duration,
};
use whirl::{
    app::App,
    app_dirs::AppDirs,
    clock::{Clock, SystemClock},
    config::{Config, ConfigStore, FileConfigStore},
    logging,
    options::OptionStore,
    runtime::{CrosstermEventSource, DeadlineWake, Runner, SpinEvent, SpinEventSource, WakePolicy},
    spinner::SpinScheduler,
};

/// decision spinner tui: list your options, spin, and let the wheel decide
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A decision spinner for the terminal. Enter your options, hit spin, and watch the highlight cycle and slow down before it settles on a random pick."
)]
pub struct Cli {
    /// options to start with
    #[clap(value_name = "OPTION")]
    options: Vec<String>,

    /// seed the random source for reproducible spins
    #[clap(long)]
    seed: Option<u64>,

    /// config file to use instead of the default location
    #[clap(short = 'c', long)]
    config: Option<PathBuf>,

    /// write the effective config to the config file and exit
    #[clap(long)]
    write_config: bool,

    /// verbosity of the log file
    #[clap(long, value_enum, default_value_t = LogLevel::Info)]
    log_level: LogLevel,
}

#[derive(Debug, Copy, Clone, PartialEq, ValueEnum, strum_macros::Display)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn as_filter(&self) -> LevelFilter {
        match self {
            LogLevel::Off => LevelFilter::Off,
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

impl Cli {
    fn config_store(&self) -> FileConfigStore {
        match &self.config {
            Some(path) => FileConfigStore::with_path(path),
            None => FileConfigStore::new(),
        }
    }

    /// File config with command line overrides applied
    fn effective_config(&self, store: &impl ConfigStore) -> Config {
        let mut config = store.load();
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        config
    }

    fn build_app<C: Clock>(&self, config: &Config, clock: C) -> App<C> {
        let spinner = match config.seed {
            Some(seed) => SpinScheduler::with_seed(seed),
            None => SpinScheduler::new(),
        }
        .with_timing(config.timing.clone());

        App::new(OptionStore::from_labels(&self.options), spinner, clock)
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if let Some(path) = AppDirs::log_path() {
        // A missing log file never stops the app.
        let _ = logging::init_logger(&path, cli.log_level.as_filter());
    }

    let store = cli.config_store();
    let config = cli.effective_config(&store);

    if cli.write_config {
        store.save(&config)?;
        println!("wrote {}", store.path().display());
        return Ok(());
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = cli.build_app(&config, SystemClock::new());
    let mut runner = Runner::new(
        CrosstermEventSource,
        DeadlineWake::new(Duration::from_millis(config.idle_ms)),
    );
    info!("starting with {} options", app.store.count());

    let result = start_tui(&mut terminal, &mut app, &mut runner);
    app.shutdown();

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn start_tui<B: Backend, C: Clock, E: SpinEventSource, W: WakePolicy>(
    terminal: &mut Terminal<B>,
    app: &mut App<C>,
    runner: &mut Runner<E, W>,
) -> Result<(), Box<dyn Error>> {
    terminal.draw(|f| f.render_widget(&*app, f.area()))?;

    while !app.should_quit {
        let redraw = match runner.step(app.next_due_in())? {
            SpinEvent::Tick => {
                let was_spinning = app.spinner.is_spinning();
                app.on_tick();
                was_spinning
            }
            SpinEvent::Resize => true,
            SpinEvent::Key(key) => {
                app.handle_key(key);
                true
            }
        };

        if redraw && !app.should_quit {
            terminal.draw(|f| f.render_widget(&*app, f.area()))?;
        }
    }

    Ok(())
}

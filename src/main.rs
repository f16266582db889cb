use std::path::PathBuf;
use std::sync::mpsc;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use rotkey::autostart;
use rotkey::backends::dummy::DummyBackend;
use rotkey::backends::randr::RandrBackend;
use rotkey::backends::DisplayApi;
use rotkey::config::{Config, ConfigStore};
use rotkey::controller::Controller;
use rotkey::event_loop::{self, RunMode};
use rotkey::feedback::x11::XPopupNotifier;
use rotkey::feedback::{LogNotifier, Notifier};
use rotkey::guard;
use rotkey::hotkeys::x11::{KeyTable, XGrabHost};
use rotkey::hotkeys::NoHotkeys;
use rotkey::orientation::Orientation;
use rotkey::processes::{self, ProcFs};
use rotkey::signals;
use rotkey::transform;
use rotkey::x11::{self, XSession};

#[derive(Parser)]
#[clap(
    name = "rotkey",
    version,
    about = "Rotate a display with Ctrl+Alt+arrow keys while a watched program runs"
)]
struct Cli {
    /// Settings file [default: $XDG_CONFIG_HOME/rotkey/config.json]
    #[clap(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Rotate an in-memory 1920x1080 display instead of a real one
    #[clap(long, global = true)]
    dry_run: bool,

    /// Log debug messages
    #[clap(short, long, global = true)]
    verbose: bool,

    #[clap(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Listen for hotkeys (default)
    Run,
    /// Rotate a display once, ignoring the watched process
    Rotate {
        /// Clockwise degrees: 0, 90, 180 or 270
        #[clap(allow_hyphen_values = true)]
        degrees: isize,
        /// Display index [default: from settings]
        #[clap(long)]
        display: Option<usize>,
    },
    /// Rotate to 90 degrees, wait 30 seconds, rotate back to 0
    AutoRevert {
        #[clap(long)]
        display: Option<usize>,
    },
    /// Tell whether hotkeys would act right now
    Guard,
    /// List running processes that can be watched
    Processes,
    /// List connected displays
    Displays,
    /// Show or change settings
    #[clap(subcommand)]
    Config(ConfigCommand),
    /// Start with the desktop session
    Autostart {
        #[clap(value_enum)]
        state: Toggle,
    },
}

#[derive(Subcommand)]
enum ConfigCommand {
    Show,
    Set {
        /// Only act while a process with this name runs
        #[clap(long, value_name = "NAME")]
        watch: Option<String>,
        /// Stop watching a process
        #[clap(long, conflicts_with = "watch")]
        no_watch: bool,
        /// Act regardless of the watched process
        #[clap(long, value_name = "BOOL")]
        dev_mode: Option<bool>,
        #[clap(long, value_name = "BOOL")]
        auto_start: Option<bool>,
        /// Display index to rotate
        #[clap(long, value_name = "INDEX")]
        screen: Option<usize>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Toggle {
    On,
    Off,
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn config_path(cli: &Cli) -> Result<PathBuf> {
    cli.config
        .clone()
        .or_else(Config::default_path)
        .ok_or_else(|| anyhow!("No config directory; pass --config"))
}

fn connect() -> Result<Arc<XSession>> {
    XSession::connect().context("Unable to connect to the X server, is DISPLAY set?")
}

/// The display backend, and the X session if one was opened for it.
fn display_backend(dry_run: bool) -> Result<(Box<dyn DisplayApi>, Option<Arc<XSession>>)> {
    if dry_run {
        return Ok((Box::new(DummyBackend::single_1080p()), None));
    }
    let session = connect()?;
    let backend = RandrBackend::new(session.clone()).context("RandR unavailable")?;
    Ok((Box::new(backend), Some(session)))
}

fn run(cli: &Cli) -> Result<()> {
    let path = config_path(cli)?;
    let store = ConfigStore::load(path);
    if store.get().auto_start {
        if let Err(e) = autostart::set_enabled(true) {
            tracing::warn!("Unable to enable autostart: {}", e);
        }
    }

    let (sender, inbox) = mpsc::channel();
    signals::forward_termination(sender.clone()).context("Unable to handle signals")?;

    let session = connect()?;
    let display: Box<dyn DisplayApi> = if cli.dry_run {
        Box::new(DummyBackend::single_1080p())
    } else {
        Box::new(RandrBackend::new(session.clone()).context("RandR unavailable")?)
    };
    let hotkeys = XGrabHost::new(session.clone());
    let keys = hotkeys.key_table();

    let mut controller = Controller::new(
        store,
        display,
        Box::new(ProcFs::new()),
        Box::new(XPopupNotifier::new(session.clone())),
        Box::new(hotkeys),
    );
    if controller.start() == 0 {
        tracing::warn!("No hotkey could be registered; nothing will happen");
    }

    // Both the pump and the signal thread end the loop with a Shutdown
    // message, which releases the hotkeys.
    x11::spawn_event_pump(session, keys, sender);
    event_loop::run(&mut controller, &inbox, RunMode::Forever);
    Ok(())
}

fn rotate(cli: &Cli, degrees: isize, display: Option<usize>) -> Result<()> {
    let orientation = Orientation::from_degrees(degrees)?;
    let config = Config::load_or_default(&config_path(cli)?);
    let (mut backend, _session) = display_backend(cli.dry_run)?;
    let index = match display {
        Some(index) => index,
        None => config.screen_index_within(backend.displays()?.len()),
    };
    let mode = transform::apply(backend.as_mut(), index, orientation)?;
    println!("{}: {} ({}x{})", mode.device, mode.orientation, mode.width, mode.height);
    Ok(())
}

fn auto_revert(cli: &Cli, display: Option<usize>) -> Result<()> {
    let path = config_path(cli)?;
    let store = ConfigStore::load(path);
    let (mut backend, session) = display_backend(cli.dry_run)?;
    let index = match display {
        Some(index) => index,
        None => store.get().screen_index_within(backend.displays()?.len()),
    };

    let (sender, inbox) = mpsc::channel();
    let notifier: Box<dyn Notifier> = match session {
        Some(session) => {
            // Only expose events are needed, to paint the popups.
            x11::spawn_event_pump(session.clone(), KeyTable::default(), sender);
            Box::new(XPopupNotifier::new(session))
        }
        None => {
            drop(sender);
            Box::new(LogNotifier::default())
        }
    };
    let mut controller = Controller::new(
        store,
        backend,
        Box::new(ProcFs::new()),
        notifier,
        Box::new(NoHotkeys),
    );

    if let Err(e) = controller.fire_auto_revert_sequence(index, Instant::now()) {
        tracing::warn!("Rotation to 90° failed: {}", e);
    }
    println!("Reverting to 0° in 30 seconds");
    event_loop::run(&mut controller, &inbox, RunMode::UntilIdle);
    Ok(())
}

fn check_guard(cli: &Cli) -> Result<bool> {
    let config = Config::load_or_default(&config_path(cli)?);
    let permitted = guard::permits(&config.guard(), &mut ProcFs::new());
    match (&config.watch_process_name, config.dev_mode, permitted) {
        (_, true, _) => println!("permitted: dev mode"),
        (Some(name), false, true) => println!("permitted: {} is running", name),
        (Some(name), false, false) => println!("denied: {} is not running", name),
        (None, false, _) => println!("denied: no process to watch"),
    }
    Ok(permitted)
}

fn list_displays(cli: &Cli) -> Result<()> {
    let (mut backend, _session) = display_backend(cli.dry_run)?;
    for (index, device) in backend.displays()?.iter().enumerate() {
        let mode = backend.current_mode(device)?;
        println!(
            "{}: {} {} {}x{}",
            index, device, mode.orientation, mode.width, mode.height
        );
    }
    Ok(())
}

fn edit_config(
    cli: &Cli,
    watch: &Option<String>,
    no_watch: bool,
    dev_mode: Option<bool>,
    auto_start: Option<bool>,
    screen: Option<usize>,
) -> Result<()> {
    let path = config_path(cli)?;
    let mut config = Config::load_or_default(&path);
    if let Some(name) = watch {
        config.watch_process_name = Some(name.clone());
    }
    if no_watch {
        config.watch_process_name = None;
    }
    if let Some(dev_mode) = dev_mode {
        config.dev_mode = dev_mode;
    }
    if let Some(auto_start) = auto_start {
        config.auto_start = auto_start;
    }
    if let Some(screen) = screen {
        config.screen_index = screen;
    }
    config
        .save(&path)
        .with_context(|| format!("Unable to write {}", path.display()))?;
    autostart::set_enabled(config.auto_start)?;
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match &cli.command {
        None | Some(Command::Run) => run(&cli)?,
        Some(Command::Rotate { degrees, display }) => rotate(&cli, *degrees, *display)?,
        Some(Command::AutoRevert { display }) => auto_revert(&cli, *display)?,
        Some(Command::Guard) => {
            if !check_guard(&cli)? {
                std::process::exit(1);
            }
        }
        Some(Command::Processes) => {
            for name in processes::picker_list(&mut ProcFs::new())? {
                println!("{}", name);
            }
        }
        Some(Command::Displays) => list_displays(&cli)?,
        Some(Command::Config(ConfigCommand::Show)) => {
            let config = Config::load_or_default(&config_path(&cli)?);
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        Some(Command::Config(ConfigCommand::Set {
            watch,
            no_watch,
            dev_mode,
            auto_start,
            screen,
        })) => edit_config(&cli, watch, *no_watch, *dev_mode, *auto_start, *screen)?,
        Some(Command::Autostart { state }) => {
            let enable = matches!(state, Toggle::On);
            let path = config_path(&cli)?;
            let mut config = Config::load_or_default(&path);
            config.auto_start = enable;
            config.save(&path)?;
            autostart::set_enabled(enable)?;
        }
    }
    Ok(())
}

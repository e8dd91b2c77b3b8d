//! keytone - play pitches from your computer keyboard
//!
//! Prints a pitch event for every press and release of a bound key.

use anyhow::Result;
use clap::{Parser, Subcommand};
use crossterm::{
    event::{
        self, Event, KeyCode, KeyEventKind, KeyModifiers, KeyboardEnhancementFlags,
        PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, supports_keyboard_enhancement},
};
use std::io::stdout;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use keytone::{
    config::{Config, InputSource},
    ControllerOptions, KeyEventBus, KeyboardController, OsKeyboardListener, Output, PitchEvent,
    RepeatTracker,
};

#[derive(Parser)]
#[command(name = "keytone")]
#[command(author, version, about = "Computer keyboard to pitch controller", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Config file path (default: ~/.config/keytone/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Frequency of A4 in Hz
    #[arg(long)]
    base_frequency: Option<f64>,

    /// Octave of the bottom/home rows (1-7)
    #[arg(long)]
    first_octave: Option<u8>,

    /// Octave of the QWERTY/number rows (1-7)
    #[arg(long)]
    second_octave: Option<u8>,

    /// Velocity attached to pitch events (0-100)
    #[arg(long)]
    velocity: Option<u8>,

    /// Read keys at the OS level instead of from the terminal
    #[arg(long)]
    os_input: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a default configuration file
    Init,
    /// Show the configuration file path
    ConfigPath,
    /// Print the key to pitch table
    Table,
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Init) => {
            let path = Config::create_default_config_file()?;
            println!("Created default config at: {}", path.display());
            return Ok(());
        }
        Some(Commands::ConfigPath) => {
            let path = Config::config_path()?;
            println!("{}", path.display());
            return Ok(());
        }
        Some(Commands::Table) | None => {}
    }

    // Load config
    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load_or_default(),
    };

    // Apply CLI overrides
    if let Some(base_frequency) = cli.base_frequency {
        config.tuning.base_frequency = base_frequency;
    }
    if let Some(octave) = cli.first_octave {
        config.tuning.first_octave = octave;
    }
    if let Some(octave) = cli.second_octave {
        config.tuning.second_octave = octave;
    }
    if let Some(velocity) = cli.velocity {
        config.tuning.velocity = Some(velocity);
    }
    if cli.os_input {
        config.input.source = InputSource::Os;
    }

    let tuning = config.tuning()?;

    if let Some(Commands::Table) = cli.command {
        let table = keytone::frequency::build(
            tuning.base_frequency(),
            tuning.first_octave(),
            tuning.second_octave(),
        );
        for entry in table.iter() {
            println!(
                "{}  {:<4} {:>10.3} Hz",
                entry.binding.label,
                entry.note,
                entry.reported_frequency()
            );
        }
        return Ok(());
    }

    let bus = Arc::new(KeyEventBus::new());
    let options = ControllerOptions::default()
        .configuration(tuning)
        .press_output(Output::new(|e| print_event("on ", e)))
        .release_output(Output::new(|e| print_event("off", e)));
    let mut controller = KeyboardController::with_options(bus.clone(), options)?;
    controller.set_auto_restart(config.controller.auto_restart);
    controller.link()?;

    let os_keyboard = match config.input.source {
        InputSource::Os => {
            let listener = OsKeyboardListener::new();
            if listener.is_none() {
                log::warn!("OS keyboard input unavailable, falling back to terminal input");
            }
            listener
        }
        InputSource::Terminal => None,
    };
    let release_after = Duration::from_millis(config.input.release_ms);

    println!("keytone: play with z-m / q-u rows, Esc to quit");

    let result = {
        let terminal = TerminalGuard::enter()?;
        run_event_loop(&bus, os_keyboard, terminal.enhanced, release_after)
    };

    controller.unlink();
    result
}

/// Raw mode (and key release reporting where supported) for the lifetime
/// of the guard
struct TerminalGuard {
    enhanced: bool,
}

impl TerminalGuard {
    fn enter() -> Result<Self> {
        enable_raw_mode()?;
        // From here on Drop restores the terminal, even if a push fails
        let mut guard = Self { enhanced: false };
        if supports_keyboard_enhancement().unwrap_or(false) {
            execute!(
                stdout(),
                PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
            )?;
            guard.enhanced = true;
        }
        Ok(guard)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        if self.enhanced {
            let _ = execute!(stdout(), PopKeyboardEnhancementFlags);
        }
        let _ = disable_raw_mode();
    }
}

fn print_event(prefix: &str, event: &PitchEvent) {
    // Raw mode needs an explicit carriage return
    print!("{} {}\r\n", prefix, event);
}

fn run_event_loop(
    bus: &KeyEventBus,
    os_keyboard: Option<OsKeyboardListener>,
    enhanced: bool,
    release_after: Duration,
) -> Result<()> {
    let mut keys = RepeatTracker::new(release_after);
    let result = pump_events(bus, os_keyboard, enhanced, &mut keys);

    // Close any notes still sounding from terminal input
    for notification in keys.release_all() {
        bus.dispatch(&notification);
    }
    result
}

fn pump_events(
    bus: &KeyEventBus,
    mut os_keyboard: Option<OsKeyboardListener>,
    enhanced: bool,
    keys: &mut RepeatTracker,
) -> Result<()> {
    loop {
        if let Some(os_kb) = &os_keyboard {
            let mut stopped = false;
            loop {
                match os_kb.try_recv() {
                    Ok(Some(notification)) => {
                        if notification.event.key == "Escape" {
                            return Ok(());
                        }
                        bus.dispatch(&notification);
                    }
                    Ok(None) => break,
                    Err(e) => {
                        log::warn!("{}, falling back to terminal input", e);
                        stopped = true;
                        break;
                    }
                }
            }
            if stopped {
                os_keyboard = None;
            }
        }

        // Without key-up reporting, held keys are released by expiry
        if os_keyboard.is_none() && !enhanced {
            for notification in keys.expired() {
                bus.dispatch(&notification);
            }
        }

        if !event::poll(Duration::from_millis(16))? {
            continue;
        }

        let Event::Key(key) = event::read()? else {
            continue;
        };

        match key.code {
            KeyCode::Esc => return Ok(()),
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => return Ok(()),
            // OS listener already delivers these
            KeyCode::Char(_) if os_keyboard.is_some() => {}
            KeyCode::Char(c) => {
                let label = c.to_ascii_lowercase().to_string();
                let notification = match key.kind {
                    KeyEventKind::Press => keys.press(&label),
                    KeyEventKind::Repeat => keys.repeat(&label),
                    KeyEventKind::Release => keys.release(&label),
                };
                bus.dispatch(&notification);
            }
            _ => {}
        }
    }
}

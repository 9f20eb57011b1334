//! vkbd command-line tool.
//!
//! Creates a virtual keyboard, waits for the system to pick it up, sends the
//! requested key events, and removes the keyboard again.
//!
//! # Usage
//!
//! ```text
//! vkbd [OPTIONS] <COMMAND>
//!
//! Commands:
//!   press <KEY>...   Press and release each key in turn
//!   down  <KEY>      Press a key and leave it down
//!   up    <KEY>      Release a key
//!   keys             List every key name and code
//!
//! Options:
//!   --config <FILE>         Config file [default: ~/.config/vkbd/config.toml]
//!   --device <PATH>         uinput device file
//!   --name <NAME>           Device name
//!   --settle-ms <MS>        Delay after creating the device
//!   --key-delay-ms <MS>     Delay between keys of `press`
//! ```
//!
//! `KEY` is either a number (`30`) or a name (`KEY_A`, `a`, `leftshift`).
//!
//! # Environment variable overrides
//!
//! | Variable      | Overrides     |
//! |---------------|---------------|
//! | `VKBD_DEVICE` | `device.path` |
//! | `VKBD_NAME`   | `device.name` |
//! | `RUST_LOG`    | `logging.level` |
//!
//! Command-line flags win over environment variables, which win over the
//! config file.
//!
//! # Note on `down`
//!
//! The device is removed when the process exits, and the kernel releases any
//! key still held at that point.  `down` is therefore mostly useful for
//! watching the event stream with `evtest`.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use tokio::time::sleep;
use tracing::info;
use tracing_subscriber::EnvFilter;

use vkbd::infrastructure::config::{load_config, AppConfig};
use vkbd::{create_keyboard, VirtualKeyboard};
use vkbd_core::keymap::KEY_TABLE;
use vkbd_core::{validate_name, validate_path, KeyMapper};

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Drive a software keyboard through Linux uinput.
#[derive(Debug, Parser)]
#[command(name = "vkbd", about = "Virtual keyboard on top of Linux uinput", version)]
struct Cli {
    /// Config file to read instead of the default location.
    #[arg(long)]
    config: Option<PathBuf>,

    /// uinput device file.
    #[arg(long, env = "VKBD_DEVICE")]
    device: Option<String>,

    /// Name the keyboard is announced under (at most 80 bytes).
    #[arg(long, env = "VKBD_NAME")]
    name: Option<String>,

    /// Milliseconds to wait after creating the device.
    #[arg(long)]
    settle_ms: Option<u64>,

    /// Milliseconds to wait between the keys of `press`.
    #[arg(long)]
    key_delay_ms: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Press and release each key in turn.
    Press {
        #[arg(required = true)]
        keys: Vec<String>,
    },
    /// Press a key and leave it down.
    Down { key: String },
    /// Release a key.
    Up { key: String },
    /// List every key name and code.
    Keys,
}

impl Cli {
    /// Applies the command-line overrides on top of `config`.
    fn apply_to(&self, mut config: AppConfig) -> AppConfig {
        if let Some(device) = &self.device {
            config.device.path = device.clone();
        }
        if let Some(name) = &self.name {
            config.device.name = name.clone();
        }
        if let Some(ms) = self.settle_ms {
            config.timing.settle_delay_ms = ms;
        }
        if let Some(ms) = self.key_delay_ms {
            config.timing.key_delay_ms = ms;
        }
        config
    }
}

// ── Commands ──────────────────────────────────────────────────────────────────

/// Resolves every key argument up front so a typo in the last key does not
/// leave the earlier ones already sent.
fn parse_keys(keys: &[String]) -> anyhow::Result<Vec<i32>> {
    keys.iter()
        .map(|k| KeyMapper::parse_key(k).with_context(|| format!("unknown key '{k}'")))
        .collect()
}

async fn execute(
    keyboard: &VirtualKeyboard,
    command: &Command,
    key_delay: Duration,
) -> anyhow::Result<()> {
    match command {
        Command::Press { keys } => {
            let codes = parse_keys(keys)?;
            for (i, code) in codes.into_iter().enumerate() {
                if i > 0 && !key_delay.is_zero() {
                    sleep(key_delay).await;
                }
                keyboard
                    .key_press(code)
                    .with_context(|| format!("failed to press key {code}"))?;
            }
        }
        Command::Down { key } => {
            let code = parse_keys(std::slice::from_ref(key))?[0];
            keyboard
                .key_down(code)
                .with_context(|| format!("failed to press down key {code}"))?;
        }
        Command::Up { key } => {
            let code = parse_keys(std::slice::from_ref(key))?[0];
            keyboard
                .key_up(code)
                .with_context(|| format!("failed to release key {code}"))?;
        }
        Command::Keys => {}
    }
    Ok(())
}

fn print_key_table() {
    for (name, code) in KEY_TABLE {
        println!("{code:>4}  {name}");
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    run(Cli::parse()).await
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    // Listing the table needs neither the config nor a device.
    if matches!(cli.command, Command::Keys) {
        print_key_table();
        return Ok(());
    }

    let config = load_config(cli.config.as_deref()).context("failed to load config")?;
    let config = cli.apply_to(config);

    // `RUST_LOG` wins; otherwise the configured level.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .init();

    // `create_keyboard` panics on these; report them as ordinary errors here.
    let path = config.device.path.as_str();
    let name = config.device.name.as_bytes();
    if let Err(e) = validate_path(path).and_then(|()| validate_name(name)) {
        bail!("invalid device configuration: {e}");
    }

    let keyboard = create_keyboard(path, name)
        .with_context(|| format!("failed to create keyboard on {path}"))?;
    info!(device = path, name = keyboard.name(), "keyboard ready");

    let settle = config.timing.settle_delay();
    if !settle.is_zero() {
        sleep(settle).await;
    }

    let outcome = execute(&keyboard, &cli.command, config.timing.key_delay()).await;
    let closed = keyboard.close().context("failed to close keyboard");
    outcome.and(closed)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

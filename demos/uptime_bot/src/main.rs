//! Uptime Bot Demo
//!
//! A console bot built on Courier. Each line on stdin is one incoming
//! message, and replies are printed to stdout:
//!
//! ```text
//! alice@example.org: !uptime          direct message from alice
//! #lobby Alice: hey Courier, you up?  group message in "lobby" from Alice
//! ```
//!
//! # Commands
//!
//! - `!uptime`: how long the bot has been running
//! - `!slow <text>`: answers after a pause, on its own task
//! - `!echo <text>`: repeats the text (hidden from help)
//! - `!help [command]`: the built-in help
//!
//! Group messages that mention the bot are answered with a hint to ask in
//! private.
//!
//! # Usage
//!
//! ```bash
//! cargo run --package uptime-bot -- --nick Courier
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use async_trait::async_trait;
use clap::Parser;
use courier::prelude::*;
use courier::runtime::LogOutput;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};

// ============================================================================
// Command line
// ============================================================================

#[derive(Debug, Parser)]
#[command(name = "uptime-bot", about = "A console demo bot for Courier")]
struct Args {
    /// Configuration file (TOML).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// The bot's identity; messages from it are ignored.
    #[arg(long)]
    identity: Option<String>,

    /// The bot's nickname in group chats.
    #[arg(long)]
    nick: Option<String>,
}

// ============================================================================
// Console transport
// ============================================================================

/// Prints replies to stdout.
struct ConsoleTransport;

#[async_trait]
impl Transport for ConsoleTransport {
    async fn send_reply(&self, target: &ReplyTarget, text: &str) -> TransportResult<()> {
        println!("[{target}] {text}");
        Ok(())
    }
}

/// Parses `sender: text` or `#room nick: text`.
fn parse_line(line: &str) -> Option<IncomingMessage> {
    let (head, body) = line.split_once(": ")?;

    match head.strip_prefix('#') {
        Some(group) => {
            let (room, nick) = group.split_once(' ')?;
            Some(IncomingMessage::group(room, nick.trim(), body))
        }
        None if !head.trim().is_empty() => Some(IncomingMessage::direct(head.trim(), body)),
        None => None,
    }
}

async fn read_console(runtime: Arc<CourierRuntime>) {
    let inbound = runtime.inbound();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        match lines.next_line().await {
            Ok(Some(line)) if line.trim().is_empty() => {}
            Ok(Some(line)) => match parse_line(&line) {
                Some(msg) => {
                    if inbound.send(msg).await.is_err() {
                        break;
                    }
                }
                None => warn!(%line, "Expected `sender: text` or `#room nick: text`"),
            },
            Ok(None) => break,
            Err(e) => {
                error!(error = %e, "Failed to read stdin");
                break;
            }
        }
    }

    info!("End of input");
    runtime.stop();
}

// ============================================================================
// Commands
// ============================================================================

/// The uptime plugin.
struct UptimeCommands {
    started: Instant,
}

impl UptimeCommands {
    fn new() -> Self {
        Self {
            started: Instant::now(),
        }
    }
}

impl CommandProvider for UptimeCommands {
    fn name(&self) -> &str {
        "uptime"
    }

    fn commands(self: Arc<Self>) -> Vec<CommandSpec> {
        let started = self.started;
        vec![
            CommandSpec::new("uptime", move |_msg, _args| {
                let elapsed = started.elapsed();
                async move { format_uptime(elapsed) }
            })
            .doc("Shows how long the bot has been running."),
            CommandSpec::new("echo", |_msg, args: String| async move { args })
                .hidden(true)
                .doc("Repeats what you say."),
            CommandSpec::new("slow", |msg: Arc<IncomingMessage>, args: String| async move {
                tokio::time::sleep(Duration::from_secs(2)).await;
                format!("{}, I thought about '{args}' for a while.", msg.sender())
            })
            .threaded(true)
            .doc(
                "Thinks for two seconds before answering.\n\n\
                 Runs on its own task, so other commands are answered meanwhile.",
            ),
        ]
    }
}

fn format_uptime(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    let parts = [
        (secs / 86_400, "day"),
        (secs / 3_600 % 24, "hour"),
        (secs / 60 % 60, "minute"),
    ];

    let text = parts
        .iter()
        .filter(|(n, _)| *n > 0)
        .map(|(n, unit)| plural(*n, unit))
        .collect::<Vec<_>>()
        .join(", ");

    if text.is_empty() {
        format!("up {}", plural(secs, "second"))
    } else {
        format!("up {text}")
    }
}

fn plural(n: u64, unit: &str) -> String {
    if n == 1 {
        format!("{n} {unit}")
    } else {
        format!("{n} {unit}s")
    }
}

// ============================================================================
// Hooks
// ============================================================================

struct DemoHooks;

impl RouterHooks for DemoHooks {
    fn unknown_command(&self, msg: &IncomingMessage, command: &str, _args: &str) -> Option<String> {
        if msg.is_group() {
            return Some("Ask me in private".to_string());
        }
        (!command.is_empty()).then(|| format!("I don't know '{command}'. Try !help."))
    }

    fn bottom_of_help(&self) -> String {
        "\n\nLines look like `you@host: !command args`.".to_string()
    }

    fn on_start(&self) {
        info!("Reading messages from stdin");
    }

    fn on_shutdown(&self) {
        info!("Uptime bot signing off");
    }
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut defaults = CourierConfig::default();
    defaults.bot.identity = "courier@localhost".to_string();
    defaults.bot.display_name = Some("Courier".to_string());
    defaults.bot.description = Some("Courier uptime bot.".to_string());
    defaults.logging.output = LogOutput::Stderr;

    let mut builder = CourierRuntime::builder().merge(defaults).hooks(DemoHooks);
    if let Some(path) = &args.config {
        builder = builder.config_file(path);
    }
    if let Some(identity) = args.identity {
        builder = builder.set("bot.identity", identity);
    }
    if let Some(nick) = args.nick {
        builder = builder.set("bot.display_name", nick);
    }

    let runtime = Arc::new(builder.build(ConsoleTransport)?);
    let count = runtime.register_provider(Arc::new(UptimeCommands::new()));
    info!(commands = count, "Uptime plugin loaded");

    tokio::spawn(read_console(Arc::clone(&runtime)));
    runtime.run().await?;

    Ok(())
}

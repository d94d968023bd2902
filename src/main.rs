//! Binary entrypoint for the escaperoom CLI.
//!
//! Commands:
//! - `serve [--host <addr>] [--port <n>]` - run the relay server
//! - `play [--theme <id>] [--relay <url>]` - play in the terminal against a running relay
//! - `themes` - list the built-in themes
//! - `init` - create a starter `config.toml`
//! - `segment [file] [--max-length <n>]` - show how a text is split for display
//!
//! See the library crate docs for module-level details: `escaperoom::`.
use std::io::Read;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::{info, warn};

use escaperoom::config::Config;
use escaperoom::logutil::describe_key;
use escaperoom::relay::client::AnthropicClient;
use escaperoom::relay::theme::Theme;
use escaperoom::relay::Relay;
use escaperoom::story::Segmenter;

#[derive(Parser)]
#[command(name = "escaperoom")]
#[command(about = "An LLM-narrated text escape room")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path (can be used before or after subcommand)
    #[arg(short, long, default_value = "config.toml", global = true)]
    config: String,

    /// Verbose logging (-v, -vv for more; may appear before or after subcommand)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the relay server
    Serve {
        /// Address to bind (overrides config)
        #[arg(long)]
        host: Option<String>,
        /// Port to listen on (overrides config and PORT)
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Play a game in this terminal
    Play {
        /// Theme id (see `themes`) or any free-form theme
        #[arg(short, long)]
        theme: Option<String>,
        /// Relay base URL (overrides config)
        #[arg(short, long)]
        relay: Option<String>,
    },
    /// List the built-in themes
    Themes,
    /// Create a starter configuration file
    Init,
    /// Print the display segments of a text (file or stdin)
    Segment {
        /// Input file; reads stdin when omitted
        file: Option<String>,
        /// Maximum characters per segment (overrides config)
        #[arg(short, long)]
        max_length: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    // API keys usually live in .env next to the binary
    dotenvy::dotenv().ok();

    // init starts from defaults
    let config = match cli.command {
        Commands::Init => Config::default(),
        _ => Config::load_or_default(&cli.config)
            .await
            .with_context(|| format!("loading {}", cli.config))?
            .with_env_overrides(),
    };
    let interactive = matches!(cli.command, Commands::Play { .. });
    init_logging(&config, cli.verbose, interactive);

    match cli.command {
        Commands::Serve { host, port } => {
            let mut config = config;
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            info!("Starting escaperoom relay v{}", env!("CARGO_PKG_VERSION"));
            info!(
                "model={} base_url={} api_key={}",
                config.model.model,
                config.model.base_url,
                describe_key(&config.model.api_key)
            );
            let relay = Relay::new(Arc::new(AnthropicClient::new(&config.model)));
            escaperoom::server::serve(&config.server, Arc::new(relay)).await?;
        }
        Commands::Play { theme, relay } => {
            let mut config = config;
            if let Some(url) = relay {
                config.game.relay_url = url;
            }
            let theme = theme
                .map(|t| Theme::from_id(&t))
                .unwrap_or(Theme::CyberpunkNovel);
            escaperoom::shell::run(&config, theme).await?;
        }
        Commands::Themes => {
            for theme in Theme::builtin() {
                println!("{:<18} {}  {}", theme.id(), theme.display_name(), theme.description());
            }
            println!("其他任意文字都会作为自定义主题发送。");
        }
        Commands::Segment { file, max_length } => {
            let text = match file {
                Some(path) => tokio::fs::read_to_string(&path)
                    .await
                    .with_context(|| format!("reading {}", path))?,
                None => {
                    let mut buf = String::new();
                    std::io::stdin().read_to_string(&mut buf)?;
                    buf
                }
            };
            let max = max_length.unwrap_or(config.reveal.max_segment_chars);
            let segmenter = Segmenter::with_limits(max, config.reveal.flush_threshold_chars.min(max));
            for (i, segment) in segmenter.split(&text).iter().enumerate() {
                println!("{:>3} [{:>3}] {}", i + 1, segment.chars().count(), segment);
            }
        }
        Commands::Init => {
            if std::path::Path::new(&cli.config).exists() {
                warn!("{} already exists; leaving it untouched", cli.config);
            } else {
                Config::create_default(&cli.config).await?;
                info!("Configuration file created at {}", cli.config);
            }
        }
    }

    Ok(())
}

/// Configure env_logger. `-v` flags win over `logging.level`; the interactive
/// client defaults to warnings only so log lines do not interleave with the
/// typewriter output.
fn init_logging(config: &Config, verbosity: u8, interactive: bool) {
    use std::io::Write;
    let mut builder = env_logger::Builder::new();
    let base_level = match verbosity {
        0 if interactive => log::LevelFilter::Warn,
        0 => config.logging.level_filter(),
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    builder.filter_level(base_level);

    let file = config.logging.file.as_ref().and_then(|path| {
        std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .ok()
    });
    match file {
        Some(f) => {
            let write_mutex = std::sync::Arc::new(std::sync::Mutex::new(f));
            // Foreground runs echo to the console as well
            let is_tty = atty::is(atty::Stream::Stdout);
            builder.format(move |fmt, record| {
                let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
                let line = format!("{} [{}] {}", ts, record.level(), record.args());
                if let Ok(mut guard) = write_mutex.lock() {
                    let _ = writeln!(guard, "{}", line);
                }
                if is_tty && !interactive {
                    writeln!(fmt, "{}", line)
                } else {
                    Ok(())
                }
            });
        }
        None => {
            builder.format(|fmt, record| {
                let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
                writeln!(fmt, "{} [{}] {}", ts, record.level(), record.args())
            });
        }
    }
    let _ = builder.try_init();
}

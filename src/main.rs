// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use log::{info, warn, Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use postrelay::app_config::{self, Config};
use postrelay::formatting::{RenderedSegment, Surface};
use postrelay::relay::{Relay, SentHistory};

/// CLI Wrapper for Surface to implement ValueEnum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliSurface {
    Message,
    Caption,
}

impl From<CliSurface> for Surface {
    fn from(cli_surface: CliSurface) -> Self {
        match cli_surface {
            CliSurface::Message => Surface::Message,
            CliSurface::Caption => Surface::Caption,
        }
    }
}

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Split and render text into ready-to-send segments
    Chunk(ChunkArgs),

    /// Relay the latest posts of every configured channel once
    Run(RunArgs),

    /// Generate shell completions for postrelay
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Parser, Debug)]
struct ChunkArgs {
    /// Text file to chunk (stdin when omitted)
    #[arg(value_name = "INPUT")]
    input: Option<PathBuf>,

    /// Delivery surface
    #[arg(short, long, value_enum, default_value = "message")]
    surface: CliSurface,

    /// Category label tagged onto the first segment
    #[arg(long)]
    category: Option<String>,

    /// Use the heuristic splitter only
    #[arg(long)]
    no_selector: bool,

    /// Print segments as JSON
    #[arg(long)]
    json: bool,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

#[derive(Parser, Debug)]
struct RunArgs {
    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

/// postrelay - translated post relay with bounded message chunking
#[derive(Parser, Debug)]
#[command(name = "postrelay")]
#[command(version = "0.1.0")]
#[command(about = "Relay translated posts as length-bounded Telegram messages")]
#[command(long_about = "postrelay fetches the latest posts of configured channels, translates them,
splits the translation into platform-safe segments and sends them to Telegram.

EXAMPLES:
    postrelay chunk post.txt                         # Chunk a file for the message surface
    postrelay chunk -s caption --category \"Market Events\" post.txt
    cat post.txt | postrelay chunk --no-selector --json
    postrelay run -c conf.json                       # Relay every configured channel once
    postrelay completions bash > postrelay.bash      # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config-path. If the config file doesn't exist, a default one
    will be created automatically. Secrets may also come from GEMINI_API_KEY,
    TELEGRAM_BOT_TOKEN, TELEGRAM_CHAT_ID, RAPIDAPI_KEY, RAPIDAPI_HOST and
    TWITTER_API_URL.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        log::set_boxed_logger(Box::new(CustomLogger::new(level)))?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: Emoji and ANSI color for a level
    fn style_for_level(level: Level) -> (&'static str, &'static str) {
        match level {
            Level::Error => ("❌", "1;31"),
            Level::Warn => ("⚠️", "1;33"),
            Level::Info => ("✅", "1;32"),
            Level::Debug => ("🔍", "1;36"),
            Level::Trace => ("📋", "1;35"),
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let (emoji, color) = Self::style_for_level(record.level());
            let _ = writeln!(
                std::io::stderr(),
                "\x1B[{}m{} {} {}\x1B[0m",
                color, now, emoji, record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize the logger once at the most verbose level the CLI allows;
    // the effective level is applied through set_max_level afterwards
    CustomLogger::init(LevelFilter::Trace)?;
    log::set_max_level(LevelFilter::Info);

    let cli = CommandLineOptions::parse();

    match cli.command {
        Commands::Completions { shell } => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "postrelay", &mut std::io::stdout());
            Ok(())
        }
        Commands::Chunk(args) => run_chunk(args).await,
        Commands::Run(args) => run_relay(args).await,
    }
}

/// Load the config at `path`, creating a default one when missing, then apply
/// environment overrides and the effective log level
fn load_config(path: &str, cli_level: Option<CliLogLevel>) -> Result<Config> {
    if let Some(level) = cli_level {
        log::set_max_level(app_config::LogLevel::from(level).to_level_filter());
    }

    let config_path = Path::new(path);
    let mut config = if config_path.exists() {
        Config::from_file(config_path)?
    } else {
        warn!("Config file not found at '{}', creating default config.", path);
        let config = Config::default();
        config.save(config_path)?;
        config
    };

    config.apply_env_overrides()?;

    if let Some(level) = cli_level {
        config.log_level = level.into();
    }
    log::set_max_level(config.log_level.to_level_filter());

    Ok(config)
}

async fn run_chunk(args: ChunkArgs) -> Result<()> {
    let config = load_config(&args.config_path, args.log_level)?;
    config.validate().context("Configuration validation failed")?;

    let text = match &args.input {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read input file: {}", path.display()))?,
        None => {
            let mut buffer = String::new();
            std::io::stdin().read_to_string(&mut buffer)
                .context("Failed to read text from stdin")?;
            buffer
        }
    };

    let assembler = config.build_assembler(!args.no_selector && config.selector.enabled);
    let segments = assembler
        .assemble(&text, args.surface.into(), args.category.as_deref())
        .await;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&segments)?);
    } else {
        print_segments(&segments);
    }

    Ok(())
}

fn print_segments(segments: &[RenderedSegment]) {
    let total = segments.len();
    for segment in segments {
        println!(
            "----- {}/{} [{}] raw-len={} -----",
            segment.index + 1, total, segment.surface, segment.raw_len
        );
        println!("{}", segment.text);
    }
}

async fn run_relay(args: RunArgs) -> Result<()> {
    let config = load_config(&args.config_path, args.log_level)?;
    config.validate_for_run().context("Configuration validation failed")?;

    if !config.assistant.is_configured() {
        warn!("Assistant API key is not set: translations will fail and posts will be skipped");
    }

    let relay = Relay::from_config(&config)?;
    let mut history = SentHistory::load(&config.history_path);

    let report = relay.run(&config.channels, &mut history).await?;
    info!("{} new posts relayed", report.records.len());

    Ok(())
}

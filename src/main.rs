// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use futures::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError, debug, info};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use aisylum::app_config::{self, Config};
use aisylum::builtin::{
    ChatMessage, DownloadMonitor, LanguagePair, RewriterLength, RewriterOptions, RewriterTone,
    SummarizerOptions, SummaryType, TextFormat, TextLength, WriterOptions, WriterTone,
};
use aisylum::dispatch::DEFAULT_DETECTION_RESULTS;
use aisylum::errors::AppError;
use aisylum::language_utils::supported_language;
use aisylum::lessons::lesson_module;
use aisylum::{ChatContext, FallbackDispatcher, SessionManager};

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
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

#[derive(Debug, Clone, ValueEnum)]
enum CliSummaryType {
    KeyPoints,
    Tldr,
    Teaser,
    Headline,
}

impl From<CliSummaryType> for SummaryType {
    fn from(cli_type: CliSummaryType) -> Self {
        match cli_type {
            CliSummaryType::KeyPoints => SummaryType::KeyPoints,
            CliSummaryType::Tldr => SummaryType::Tldr,
            CliSummaryType::Teaser => SummaryType::Teaser,
            CliSummaryType::Headline => SummaryType::Headline,
        }
    }
}

#[derive(Debug, Clone, ValueEnum)]
enum CliLength {
    Short,
    Medium,
    Long,
}

impl From<CliLength> for TextLength {
    fn from(cli_length: CliLength) -> Self {
        match cli_length {
            CliLength::Short => TextLength::Short,
            CliLength::Medium => TextLength::Medium,
            CliLength::Long => TextLength::Long,
        }
    }
}

impl From<CliLength> for RewriterLength {
    fn from(cli_length: CliLength) -> Self {
        match cli_length {
            CliLength::Short => RewriterLength::Shorter,
            CliLength::Medium => RewriterLength::AsIs,
            CliLength::Long => RewriterLength::Longer,
        }
    }
}

#[derive(Debug, Clone, ValueEnum)]
enum CliTone {
    Formal,
    Neutral,
    Casual,
}

impl From<CliTone> for WriterTone {
    fn from(cli_tone: CliTone) -> Self {
        match cli_tone {
            CliTone::Formal => WriterTone::Formal,
            CliTone::Neutral => WriterTone::Neutral,
            CliTone::Casual => WriterTone::Casual,
        }
    }
}

impl From<CliTone> for RewriterTone {
    fn from(cli_tone: CliTone) -> Self {
        match cli_tone {
            CliTone::Formal => RewriterTone::MoreFormal,
            CliTone::Neutral => RewriterTone::AsIs,
            CliTone::Casual => RewriterTone::MoreCasual,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Check that the remote proxy is up
    Health,

    /// Show the on-device availability of every capability
    Availability {
        /// Source language of the translator probe
        #[arg(long, default_value = "en")]
        source: String,

        /// Target language of the translator probe
        #[arg(long, default_value = "es")]
        target: String,
    },

    /// Send a message to the assistant
    Prompt {
        text: String,

        /// Conversation the message belongs to
        #[arg(long, default_value_t = 1)]
        chat_id: u64,

        /// Print the answer as it is generated
        #[arg(long)]
        stream: bool,
    },

    /// Summarize text
    Summarize {
        text: String,

        #[arg(short = 'k', long = "type", value_enum, default_value = "tldr")]
        summary_type: CliSummaryType,

        #[arg(long, value_enum, default_value = "medium")]
        length: CliLength,

        /// Produce markdown instead of plain text
        #[arg(long)]
        markdown: bool,
    },

    /// Generate a title for a conversation given as "role: content" messages
    Title {
        #[arg(required = true)]
        messages: Vec<String>,
    },

    /// Write text from a prompt
    Write {
        prompt: String,

        #[arg(long, value_enum, default_value = "neutral")]
        tone: CliTone,

        #[arg(long, value_enum, default_value = "medium")]
        length: CliLength,

        /// Background the writer should take into account
        #[arg(long)]
        context: Option<String>,
    },

    /// Rewrite text
    Rewrite {
        text: String,

        #[arg(long, value_enum, default_value = "neutral")]
        tone: CliTone,

        #[arg(long, value_enum, default_value = "medium")]
        length: CliLength,

        /// Rewrite more clearly, in the language the text is written in
        #[arg(long, conflicts_with_all = ["tone", "length"])]
        clearly: bool,
    },

    /// Translate text; the source language is detected
    Translate {
        text: String,

        /// Target language code (e.g., 'en', 'es', 'fr')
        #[arg(short, long)]
        target_language: String,
    },

    /// Detect the language of text
    Detect {
        text: String,

        /// Number of candidates to show
        #[arg(short, long, default_value_t = DEFAULT_DETECTION_RESULTS)]
        top: usize,
    },

    /// Proofread text
    Proofread { text: String },

    /// Generate the lessons of a course module
    Lessons {
        /// Language to learn (en, es, fr, de, zh, ja, ko, pt, ru, ar)
        #[arg(short, long)]
        language: String,

        /// Module number, 1 to 20
        #[arg(short, long)]
        module: u32,
    },

    /// Generate shell completions for aisylum
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Aisylum - AI operations on-device first, remote proxy second
///
/// Every command probes the local model and falls back to the remote AI proxy
/// when the model is not ready or fails.
#[derive(Parser, Debug)]
#[command(name = "aisylum")]
#[command(version = "0.1.0")]
#[command(about = "AI operations with on-device first, remote fallback")]
#[command(long_about = "Aisylum runs AI text operations on a local model when one is available \
and falls back to the remote AI proxy otherwise.

EXAMPLES:
    aisylum prompt \"What is a haiku?\"               # Ask the assistant
    aisylum prompt --stream \"Tell me a story\"       # Stream the answer
    aisylum translate -t fr \"Good morning\"          # Translate to French
    aisylum lessons -l es -m 3                      # Spanish lessons for module 3
    aisylum --no-local summarize \"...\"              # Remote proxy only
    aisylum completions bash > aisylum.bash         # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config. If the config file doesn't exist, a default one
    will be created automatically. AISYLUM_API_BASE_URL overrides the proxy URL.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json", global = true)]
    config: PathBuf,

    /// Set logging level
    #[arg(long, value_enum, global = true)]
    log_level: Option<CliLogLevel>,

    /// Remote proxy base URL
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Never use the local model
    #[arg(long, global = true)]
    no_local: bool,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: Emoji for log level
    fn get_emoji_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "❌ ",
            Level::Warn => "🚧 ",
            Level::Info => " ",
            Level::Debug => "🔍 ",
            Level::Trace => "📋 ",
        }
    }

    // @returns: ANSI color for log level
    fn get_color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "1;31",
            Level::Warn => "1;33",
            Level::Info => "1;32",
            Level::Debug => "1;36",
            Level::Trace => "1;35",
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level.max(log::max_level())
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let level = record.level();
            let _ = writeln!(
                std::io::stderr(),
                "\x1B[{}m{} {} {}\x1B[0m",
                Self::get_color_for_level(level),
                now,
                Self::get_emoji_for_level(level),
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize the logger once with info level by default
    // The level is updated after loading the config
    CustomLogger::init(LevelFilter::Info)?;

    let cli = CommandLineOptions::parse();

    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = CommandLineOptions::command();
        generate(*shell, &mut cmd, "aisylum", &mut std::io::stdout());
        return Ok(());
    }

    let config = load_config(&cli)?;
    log::set_max_level(config.log_level.to_level_filter());

    let sessions = Arc::new(SessionManager::init());
    sessions.set_download_monitor(Some(download_progress_monitor()));
    let dispatcher = FallbackDispatcher::from_config(&config, Arc::clone(&sessions));

    let result = run_command(&dispatcher, cli.command).await;
    dispatcher.dispose();
    result
}

// Config file, then environment, then command line
fn load_config(cli: &CommandLineOptions) -> Result<Config> {
    let mut config = Config::load_or_create(&cli.config)?;
    config.apply_env_overrides();

    if let Some(base_url) = &cli.base_url {
        config.proxy.base_url = base_url.clone();
    }
    if cli.no_local {
        config.local_model.enabled = false;
    }
    if let Some(log_level) = &cli.log_level {
        config.log_level = log_level.clone().into();
    }

    config.validate().context("Configuration validation failed")?;
    debug!("Using remote proxy at {}", config.proxy.base_url);
    Ok(config)
}

fn download_progress_monitor() -> DownloadMonitor {
    let progress_bar = ProgressBar::new(100);
    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {percent}% {msg}")
        .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {percent}% {msg}"))
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    progress_bar.set_style(style.progress_chars("█▓▒░"));
    progress_bar.set_message("Downloading model");

    Arc::new(move |fraction: f64| {
        let position = (fraction.clamp(0.0, 1.0) * 100.0).round() as u64;
        progress_bar.set_position(position);
        if position >= 100 {
            progress_bar.finish_and_clear();
        }
    })
}

fn parse_message(line: &str) -> ChatMessage {
    match line.split_once(':') {
        Some((role, content)) if !role.trim().is_empty() && !role.contains(' ') => {
            ChatMessage::new(role.trim(), content.trim())
        }
        _ => ChatMessage::user(line.trim()),
    }
}

async fn run_command(dispatcher: &FallbackDispatcher, command: Commands) -> Result<()> {
    match command {
        Commands::Health => {
            dispatcher.health().await?;
            info!("Remote proxy is healthy");
        }
        Commands::Availability { source, target } => {
            let pair = LanguagePair::new(source, target);
            for (capability, state) in dispatcher.prober().check_all(Some(&pair)).await {
                println!("{:<18} {}", capability, state);
            }
        }
        Commands::Prompt { text, chat_id, stream } => {
            let chat = ChatContext::new(chat_id);
            if stream {
                let mut chunks = dispatcher.prompt_streaming(&chat, &text).await?;
                let mut stdout = std::io::stdout();
                while let Some(chunk) = chunks.next().await {
                    write!(stdout, "{}", chunk?)?;
                    stdout.flush()?;
                }
                writeln!(stdout)?;
            } else {
                println!("{}", dispatcher.prompt(&chat, &text).await?);
            }
        }
        Commands::Summarize { text, summary_type, length, markdown } => {
            let mut options = SummarizerOptions::new(summary_type.into(), length.into());
            if markdown {
                options.format = TextFormat::Markdown;
            }
            println!("{}", dispatcher.summarize(&text, &options).await?);
        }
        Commands::Title { messages } => {
            let messages: Vec<ChatMessage> = messages.iter().map(|line| parse_message(line)).collect();
            println!("{}", dispatcher.conversation_title(&messages).await?);
        }
        Commands::Write { prompt, tone, length, context } => {
            let options = WriterOptions {
                tone: tone.into(),
                length: length.into(),
                shared_context: context,
                ..WriterOptions::default()
            };
            println!("{}", dispatcher.write(&prompt, &options).await?);
        }
        Commands::Rewrite { text, tone, length, clearly } => {
            let rewritten = if clearly {
                dispatcher.rewrite_clearly(&text).await?
            } else {
                let options = RewriterOptions {
                    tone: tone.into(),
                    length: length.into(),
                    ..RewriterOptions::default()
                };
                dispatcher.rewrite(&text, &options).await?
            };
            println!("{}", rewritten);
        }
        Commands::Translate { text, target_language } => {
            let translation = dispatcher.translate(&text, &target_language).await?;
            if let Some(source) = &translation.source_language {
                info!("Detected source language: {}", source);
            }
            println!("{}", translation.text);
        }
        Commands::Detect { text, top } => {
            for detection in dispatcher.detect_language(&text, top).await? {
                println!("{} {:.2}", detection.detected_language, detection.confidence);
            }
        }
        Commands::Proofread { text } => {
            let result = dispatcher.proofread(&text).await?;
            println!("{}", result.corrected_input);
        }
        Commands::Lessons { language, module } => {
            let module = lesson_module(module)
                .ok_or_else(|| AppError::Config(format!("No lesson module {}, expected 1 to 20", module)))?;
            let language = supported_language(&language)
                .ok_or_else(|| AppError::Config(format!("Unsupported learning language: {}", language)))?;

            info!("Generating {} lessons: {}", language.name, module.title);
            let lessons = dispatcher.generate_module_lessons(language.code, module).await?;
            println!("{}", serde_json::to_string_pretty(&lessons)?);
        }
        Commands::Completions { .. } => {}
    }

    Ok(())
}

//! The `quill` CLI: writes a short blog post with Gemini, and checks that
//! the Gemini credential works.

#[macro_use]
extern crate tracing;

use std::io::IsTerminal as _;
use std::process::ExitCode;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use quill::Printer;
use quill::commands::{self, BlogPostSettings};
use quill::core::ModelClient;
use quill_gemini_model::{GeminiConfigBuilder, GeminiProvider};
use tracing_subscriber::EnvFilter;

const DEFAULT_WRITER_MODEL: &str = "gemini-2.0-flash";
const DEFAULT_CHECK_MODEL: &str = "gemini-1.5-flash";

#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Gemini API key.
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true, global = true)]
    api_key: Option<String>,

    /// Model id, e.g. `gemini-2.0-flash`.
    #[arg(long, env = "GEMINI_MODEL", global = true)]
    model: Option<String>,

    /// Base URL of the Gemini REST API.
    #[arg(long, env = "GEMINI_BASE_URL", global = true)]
    base_url: Option<String>,

    /// Request timeout in seconds. No timeout by default.
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,

    /// Log progress to stderr.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output.
    #[arg(long, global = true)]
    no_color: bool,
}

#[derive(Clone, Debug, Subcommand)]
enum Command {
    /// Write a short blog post (the default).
    Write {
        /// Sampling temperature in [0, 1].
        #[arg(
            long,
            env = "QUILL_TEMPERATURE",
            default_value_t = 0.7,
            value_parser = commands::parse_temperature,
        )]
        temperature: f64,

        /// What to write about.
        #[arg(long, default_value = commands::BLOG_TASK)]
        task: String,

        /// The criteria of the final answer.
        #[arg(long, default_value = commands::BLOG_EXPECTED_OUTPUT)]
        expected_output: String,
    },
    /// Send the blog task once to verify the API key.
    CheckKey,
    /// List the models that can generate content.
    ListModels,
}

impl Command {
    fn default_write() -> Self {
        Command::Write {
            temperature: 0.7,
            task: commands::BLOG_TASK.to_owned(),
            expected_output: commands::BLOG_EXPECTED_OUTPUT.to_owned(),
        }
    }

    fn default_model(&self) -> &'static str {
        match self {
            Command::CheckKey => DEFAULT_CHECK_MODEL,
            _ => DEFAULT_WRITER_MODEL,
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let dotenv = dotenvy::dotenv();
    let cli = Cli::parse();

    let default_level = if cli.verbose { "info" } else { "warn" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    if let Err(err) = dotenv {
        if !err.not_found() {
            warn!("failed to load .env: {err}");
        }
    }

    let command = cli.command.clone().unwrap_or_else(Command::default_write);
    let model = cli
        .model
        .clone()
        .unwrap_or_else(|| command.default_model().to_owned());

    let api_key = cli.api_key.clone().unwrap_or_else(|| {
        warn!("GEMINI_API_KEY is not set, requests will be rejected");
        String::new()
    });
    let mut config = GeminiConfigBuilder::with_api_key(api_key).with_model(&model);
    if let Some(base_url) = &cli.base_url {
        config = config.with_base_url(base_url);
    }
    if let Some(secs) = cli.timeout_secs {
        config = config.with_timeout(Duration::from_secs(secs));
    }
    let model_client = ModelClient::new(GeminiProvider::new(config.build()));

    let stdout = std::io::stdout();
    let colored = !cli.no_color && stdout.is_terminal();
    let mut printer = Printer::new(stdout.lock()).with_color(colored);

    let result = match command {
        Command::Write {
            temperature,
            task,
            expected_output,
        } => {
            let settings = BlogPostSettings {
                model,
                temperature,
                task,
                expected_output,
            };
            write(model_client, &settings, &mut printer).await
        }
        Command::CheckKey => commands::check_key(&model_client, &mut printer)
            .await
            .map_err(Into::into),
        Command::ListModels => {
            commands::list_models(&model_client, &mut printer)
                .await
                .map_err(Into::into)
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let prefix = "Error:";
            if colored {
                eprintln!("{} {err:#}", prefix.bright_red().bold());
            } else {
                eprintln!("{prefix} {err:#}");
            }
            ExitCode::FAILURE
        }
    }
}

async fn write<W: std::io::Write>(
    model_client: ModelClient,
    settings: &BlogPostSettings,
    printer: &mut Printer<W>,
) -> anyhow::Result<()> {
    let progress_style = ProgressStyle::with_template("{spinner} {wide_msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏");
    let progress_bar = ProgressBar::new_spinner();
    progress_bar.set_style(progress_style);

    let crew = commands::writer_crew(model_client, settings, {
        let progress_bar = progress_bar.clone();
        let bytes = AtomicUsize::new(0);
        move |delta| {
            let total =
                bytes.fetch_add(delta.len(), Ordering::Relaxed) + delta.len();
            progress_bar.set_message(format!("✍️  Writing... ({total} bytes)"));
        }
    });

    let hooks = commands::Hooks {
        on_started: || {
            progress_bar.set_message("🤔 Thinking...");
            progress_bar.enable_steady_tick(Duration::from_millis(100));
        },
        // Finish the progress bar before printing anything else.
        on_finished: || progress_bar.finish_and_clear(),
    };
    commands::write_blog_post(&crew, settings, printer, hooks).await?;
    Ok(())
}

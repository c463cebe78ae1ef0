//! Long Translate CLI - submit a document to the translation service and wait for the result.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use long_translate_core::{
    AppConfig, CancellationToken, Error, Lang, LanguageFormat, PollPolicy, Progress, SourceFile,
    TranslationClient, TranslationOutcome, save_to_file, target_languages,
};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "long-translate")]
#[command(author, version, about = "Translate txt, pdf and docx documents", long_about = None)]
struct Args {
    /// Document to translate (.txt, .pdf, .docx)
    input: Option<PathBuf>,

    /// Target language code (see --list-languages)
    #[arg(short = 't', long)]
    target: Option<String>,

    /// Translation service base URL
    #[arg(long, env = "LONG_TRANSLATE_API_BASE")]
    api_base: Option<String>,

    /// Static user token sent as x-user-token
    #[arg(long, env = "LONG_TRANSLATE_TOKEN")]
    token: Option<String>,

    /// Maximum result queries before giving up
    #[arg(long)]
    max_retries: Option<u32>,

    /// Fixed delay between result queries, in milliseconds
    #[arg(long)]
    poll_delay_ms: Option<u64>,

    /// Stop polling on any status other than 200 or 404
    #[arg(long)]
    strict_poll: bool,

    /// How the target language is sent: code or label
    #[arg(long)]
    language_format: Option<LanguageFormat>,

    /// Save the translation into this directory
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Config file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// List target languages and exit
    #[arg(long)]
    list_languages: bool,

    /// Verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Args {
    /// Apply command-line overrides on top of the loaded config.
    fn apply(&self, config: &mut AppConfig) {
        if let Some(target) = &self.target {
            config.target_lang = Lang::new(target);
        }
        if let Some(api_base) = &self.api_base {
            config.service.api_base.clone_from(api_base);
        }
        if let Some(token) = &self.token {
            config.service.user_token.clone_from(token);
        }
        if let Some(max_retries) = self.max_retries {
            config.poll.max_retries = max_retries;
        }
        if let Some(delay_ms) = self.poll_delay_ms {
            config.poll.delay_ms = delay_ms;
        }
        if self.strict_poll {
            config.poll.policy = PollPolicy::Strict;
        }
        if let Some(format) = self.language_format {
            config.service.language_format = format;
        }
        if let Some(output) = &self.output {
            config.export.output_dir = Some(output.clone());
        }
    }
}

// CLI output is intentional
#[allow(clippy::print_stdout)]
fn print_languages() {
    for lang in target_languages() {
        println!("{:<4} {:<12} {}", lang.code, lang.name, lang.label);
    }
}

fn spinner() -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    // Template is hardcoded and valid, unwrap is safe
    #[allow(clippy::unwrap_used)]
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap(),
    );
    pb.enable_steady_tick(Duration::from_millis(120));
    pb
}

fn describe(progress: &Progress) -> Option<String> {
    match progress {
        Progress::Encoding => Some("Reading file...".to_string()),
        Progress::Submitting => Some("Submitting...".to_string()),
        Progress::Submitted { handle } => Some(format!("Translating (job {handle})...")),
        Progress::Waiting { attempt, max_retries } => {
            Some(format!("Translating... retries: {attempt}/{max_retries}"))
        }
        Progress::Finished => None,
    }
}

/// Short user-facing notice; the detailed cause goes to the log.
const fn failure_notice(outcome: &TranslationOutcome) -> &'static str {
    match outcome {
        TranslationOutcome::Failed {
            reason: Error::NoFileSelected,
        } => "Please select a file first",
        TranslationOutcome::TimedOut { .. } => "Translation timed out",
        TranslationOutcome::Cancelled { .. } => "Translation cancelled",
        TranslationOutcome::Failed { .. } | TranslationOutcome::Completed { .. } => {
            "Translation failed"
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (before parsing args so env vars are available)
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let log_level = match args.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .init();

    if args.list_languages {
        print_languages();
        return Ok(());
    }

    let mut config = if let Some(config_path) = &args.config {
        AppConfig::from_file(config_path).context("Failed to load config file")?
    } else {
        AppConfig::load()
    };
    args.apply(&mut config);
    config.validate().context("Invalid configuration")?;

    let client = TranslationClient::new(&config).context("Failed to initialize client")?;
    let file = args.input.as_ref().map(SourceFile::from_path);

    // Ctrl-C abandons the in-flight request or delay and ends with Cancelled
    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    let pb = spinner();
    let report = {
        let pb = pb.clone();
        move |p: Progress| match describe(&p) {
            Some(msg) => pb.set_message(msg),
            None => pb.finish_and_clear(),
        }
    };

    info!(
        "Translating to {} via {} (max {} retries, {} ms apart)",
        config.target_lang, config.service.api_base, config.poll.max_retries, config.poll.delay_ms
    );

    let outcome = client
        .translate_with(file.as_ref(), &config.target_lang, &cancel, Some(&report))
        .await;

    let text = match outcome {
        TranslationOutcome::Completed { text } => text,
        other => {
            error!("{}", other);
            anyhow::bail!(failure_notice(&other));
        }
    };

    // CLI output is intentional
    #[allow(clippy::print_stdout)]
    {
        println!("{text}");
    }

    if let Some(dir) = &config.export.output_dir {
        let path = save_to_file(&text, dir)
            .await
            .context("Failed to save translation")?;

        #[allow(clippy::print_stderr)]
        {
            eprintln!("Translation saved to: {}", path.display());
        }
    }

    Ok(())
}

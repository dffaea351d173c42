//! Binary entry point for the subtitle translator.

use anyhow::{anyhow, Result};
use clap::{Parser, ValueEnum};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::time::Duration;
use subru_core::naming::{
    EnglishMatch, LiteralSuffixConvention, LocaleTagConvention, NamingConvention,
};
use subru_core::run::{RunSummary, Runner, Throttle, DEFAULT_DELAY};
use subru_core::translate::google::GoogleTranslator;
use subru_core::translate::openai::OpenAiTranslator;
use subru_core::translate::{SrtFileTranslator, Translator, DEFAULT_BATCH_SIZE};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Translation service used for the subtitle text.
#[derive(Clone, Copy, Debug, ValueEnum)]
enum Backend {
    /// Public Google Translate endpoint, no key required.
    Google,
    /// OpenAI chat completions, key read from `OPENAI_API_KEY`.
    Openai,
}

/// Command line options for the binary.
#[derive(Parser)]
#[command(about = "Translate every English .srt file in a directory to Russian")]
struct Cli {
    /// Directory holding the subtitles.
    #[arg(long, default_value = ".")]
    dir: PathBuf,

    /// Ask for the old and new filename suffix on stdin.
    #[arg(long, conflicts_with_all = ["from", "to"])]
    interactive: bool,

    /// Filename suffix to replace, for example `_en.srt`.
    #[arg(long, requires = "to")]
    from: Option<String>,

    /// Replacement suffix, for example `_ru.srt`.
    #[arg(long, requires = "from")]
    to: Option<String>,

    /// Only translate files tagged `.en`, `.en_XX` or `.en-XX`.
    #[arg(long, conflicts_with_all = ["interactive", "from"])]
    strict_english: bool,

    #[arg(long, value_enum, default_value_t = Backend::Google)]
    backend: Backend,

    /// Number of subtitle blocks sent per backend request batch.
    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
    batch_size: usize,

    /// Pause after each translated file, in milliseconds.
    #[arg(long, default_value_t = DEFAULT_DELAY.as_millis() as u64)]
    delay_ms: u64,

    /// Enable verbose debug and trace logs.
    #[arg(long)]
    debug: bool,
}

/// Application entry point which parses CLI args and performs actions.
/// The naming convention is validated before any file or backend is touched.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let filter = if cli.debug {
        EnvFilter::default()
            .add_directive("subru=trace".parse()?)
            .add_directive("subru_core=trace".parse()?)
            .add_directive("info".parse()?)
    } else {
        EnvFilter::default()
            .add_directive("subru=info".parse()?)
            .add_directive("subru_core=info".parse()?)
            .add_directive("warn".parse()?)
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let convention = build_convention(&cli)?;
    let summary = match cli.backend {
        Backend::Google => run_with(GoogleTranslator::new()?, &cli, &convention).await?,
        Backend::Openai => run_with(OpenAiTranslator::new()?, &cli, &convention).await?,
    };
    for failure in &summary.failed {
        warn!("failed: {} ({})", failure.file, failure.detail());
    }
    Ok(())
}

/// Run the directory pass with the chosen backend.
async fn run_with<T: Translator>(
    translator: T,
    cli: &Cli,
    convention: &NamingConvention,
) -> Result<RunSummary> {
    let file_translator = SrtFileTranslator::new(translator).with_batch_size(cli.batch_size);
    Runner::new(file_translator)
        .with_throttle(Throttle::new(Duration::from_millis(cli.delay_ms)))
        .run(&cli.dir, convention)
        .await
}

/// Pick the naming convention from the flags, prompting when asked to.
fn build_convention(cli: &Cli) -> Result<NamingConvention> {
    if cli.interactive {
        let stdin = io::stdin();
        let (old, new) = prompt_suffixes(stdin.lock(), io::stdout())?;
        return Ok(LiteralSuffixConvention::new(&old, &new)?.into());
    }
    if let (Some(old), Some(new)) = (&cli.from, &cli.to) {
        return Ok(LiteralSuffixConvention::new(old, new)?.into());
    }
    let english = if cli.strict_english {
        EnglishMatch::TaggedOnly
    } else {
        EnglishMatch::AnyNonRussian
    };
    info!("no suffixes given, using locale tags");
    Ok(LocaleTagConvention::new(english).into())
}

/// Read the old and new suffix, one line each.
fn prompt_suffixes(mut input: impl BufRead, mut out: impl Write) -> Result<(String, String)> {
    let mut ask = |label: &str| -> Result<String> {
        write!(out, "{label}: ")?;
        out.flush()?;
        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            return Err(anyhow!("stdin closed before {label} was entered"));
        }
        Ok(line.trim().to_string())
    };
    let old = ask("suffix to replace (e.g. _en.srt)")?;
    let new = ask("new suffix (e.g. _ru.srt)")?;
    Ok((old, new))
}

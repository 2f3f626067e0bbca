use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use quiz_core::model::{QuestionBank, QuizConfigDraft, QuizVariant};
use services::{AppServices, AppServicesConfig, Clock, QuizDriver, RandomSource};
use tracing_subscriber::EnvFilter;

mod terminal;

use terminal::{StdoutShare, TerminalBell, TerminalRenderer, read_intents};

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidNumber { flag: &'static str, raw: String },
    InvalidVariant { raw: String },
    InvalidDbUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidNumber { flag, raw } => write!(f, "invalid {flag} value: {raw}"),
            ArgsError::InvalidVariant { raw } => write!(f, "invalid --variant value: {raw}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn parse_number<T: std::str::FromStr>(raw: String, flag: &'static str) -> Result<T, ArgsError> {
    raw.trim()
        .parse()
        .map_err(|_| ArgsError::InvalidNumber { flag, raw })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- play  [--bank <path>] [--variant <name>] [--db <sqlite_url>]");
    eprintln!("                            [--seed <n>] [--sample <n>] [--auto-advance-ms <ms>]");
    eprintln!("                            [--shuffle] [--shuffle-options] [--share-url <url>] [--fresh]");
    eprintln!("  cargo run -p app -- check [--bank <path>] [--variant <name>]");
    eprintln!();
    eprintln!("Variants: driving-exam, brain-type, anti-bullying");
    eprintln!();
    eprintln!("Defaults for play:");
    eprintln!("  --bank  crates/app/assets/driving_exam.json");
    eprintln!("  --variant driving-exam");
    eprintln!("  --db sqlite:quiz.sqlite3");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  QUIZ_BANK, QUIZ_VARIANT, QUIZ_DB_URL, QUIZ_SEED, RUST_LOG");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Play,
    Check,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "play" => Some(Self::Play),
            "check" => Some(Self::Check),
            _ => None,
        }
    }
}

struct Args {
    bank_path: PathBuf,
    variant: QuizVariant,
    db_url: String,
    seed: Option<u64>,
    overrides: ConfigOverrides,
    fresh: bool,
}

/// Flags layered over the variant's preset config.
#[derive(Default)]
struct ConfigOverrides {
    sample_size: Option<u32>,
    auto_advance_ms: Option<u32>,
    shuffle_questions: bool,
    shuffle_options: bool,
    share_url: Option<String>,
}

impl ConfigOverrides {
    fn apply(self, mut draft: QuizConfigDraft) -> QuizConfigDraft {
        if self.sample_size.is_some() {
            draft.sample_size = self.sample_size;
        }
        if self.auto_advance_ms.is_some() {
            draft.auto_advance_ms = self.auto_advance_ms;
        }
        draft.shuffle_questions |= self.shuffle_questions;
        draft.shuffle_options |= self.shuffle_options;
        if self.share_url.is_some() {
            draft.share_url = self.share_url;
        }
        draft
    }
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut bank_path = std::env::var("QUIZ_BANK").map_or_else(
            |_| PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/assets/driving_exam.json")),
            PathBuf::from,
        );
        let mut variant = match std::env::var("QUIZ_VARIANT") {
            Ok(raw) => raw
                .parse::<QuizVariant>()
                .map_err(|_| ArgsError::InvalidVariant { raw })?,
            Err(_) => QuizVariant::DrivingExam,
        };
        let mut db_url = std::env::var("QUIZ_DB_URL")
            .ok()
            .map_or_else(|| "sqlite://quiz.sqlite3".into(), normalize_sqlite_url);
        let mut seed = std::env::var("QUIZ_SEED")
            .ok()
            .and_then(|value| value.trim().parse::<u64>().ok());
        let mut overrides = ConfigOverrides::default();
        let mut fresh = false;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--bank" => bank_path = PathBuf::from(require_value(args, "--bank")?),
                "--variant" => {
                    let value = require_value(args, "--variant")?;
                    variant = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidVariant { raw: value.clone() })?;
                }
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--seed" => seed = Some(parse_number(require_value(args, "--seed")?, "--seed")?),
                "--sample" => {
                    overrides.sample_size =
                        Some(parse_number(require_value(args, "--sample")?, "--sample")?);
                }
                "--auto-advance-ms" => {
                    let value = require_value(args, "--auto-advance-ms")?;
                    overrides.auto_advance_ms = Some(parse_number(value, "--auto-advance-ms")?);
                }
                "--shuffle" => overrides.shuffle_questions = true,
                "--shuffle-options" => overrides.shuffle_options = true,
                "--share-url" => overrides.share_url = Some(require_value(args, "--share-url")?),
                "--fresh" => fresh = true,
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            bank_path,
            variant,
            db_url,
            seed,
            overrides,
            fresh,
        })
    }
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = std::path::Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

fn load_bank(path: &Path) -> Result<QuestionBank, Box<dyn std::error::Error>> {
    let raw = std::fs::read_to_string(path)
        .map_err(|err| format!("failed to read {}: {err}", path.display()))?;
    let bank = QuestionBank::from_json_str(&raw)
        .map_err(|err| format!("invalid bank {}: {err}", path.display()))?;
    Ok(bank)
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv: Vec<String> = std::env::args().skip(1).collect();

    // Default behavior: play when no subcommand is provided.
    let cmd = match argv.first().map(String::as_str) {
        None => Command::Play,
        Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) if first.starts_with("--") => Command::Play,
        Some(first) => Command::from_arg(first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };

    if !argv.is_empty() && !argv[0].starts_with("--") {
        argv.remove(0);
    }

    let mut iter = argv.into_iter();
    let parsed = Args::parse(&mut iter).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let bank = load_bank(&parsed.bank_path)?;
    let config = parsed
        .overrides
        .apply(parsed.variant.default_draft())
        .validate()?;

    match cmd {
        Command::Check => {
            let metadata = bank.metadata();
            println!(
                "{}: {} levels, {} questions",
                parsed.bank_path.display(),
                bank.levels().len(),
                bank.question_count()
            );
            if let Some(version) = &metadata.version {
                println!("version: {version}");
            }
            if let Some(declared) = metadata.total_questions {
                if usize::try_from(declared).ok() != Some(bank.question_count()) {
                    println!("note: metadata declares {declared} questions");
                }
            }
            for level in bank.levels() {
                println!("  [{}] {}: {} questions", level.id(), level.name(), level.questions().len());
            }
            println!("unique questions in pool: {}", bank.pool().len());
            println!("variant: {} ({})", parsed.variant.title(), parsed.variant);
            Ok(())
        }
        Command::Play => {
            // Open + migrate SQLite at startup. Keep this in the binary glue so core/services stay pure.
            prepare_sqlite_file(&parsed.db_url)?;
            let random = parsed.seed.map_or(RandomSource::Entropy, RandomSource::seeded);
            let services = AppServices::new_sqlite(
                &parsed.db_url,
                bank,
                AppServicesConfig {
                    variant: parsed.variant,
                    config,
                    random,
                    clock: Clock::system(),
                    audio: Arc::new(TerminalBell),
                    share: Arc::new(StdoutShare),
                },
            )
            .await?;

            let quiz_loop = services.quiz_loop();
            if parsed.fresh {
                quiz_loop.forget_progress().await;
            }
            let session = services.start_session().await?;

            println!("{}", parsed.variant.title());
            let (driver, intents) =
                QuizDriver::new(quiz_loop, session, TerminalRenderer::new(parsed.variant));
            let input = tokio::spawn(read_intents(intents));
            let (session, _renderer) = driver.run().await;
            input.abort();

            tracing::info!(
                score = session.score(),
                position = session.position(),
                finished = session.is_finished(),
                "quiz closed"
            );
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() {
    init_tracing();
    let code = match run().await {
        Ok(()) => 0,
        Err(err) => {
            // At this layer (binary glue), printing once is fine.
            eprintln!("{err}");
            2
        }
    };
    // Exit here: a stdin reader blocked on input would otherwise hold the runtime open.
    std::process::exit(code);
}

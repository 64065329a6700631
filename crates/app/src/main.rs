use std::fmt;

use quest_core::SortMode;
use quest_core::model::{HelpMode, QuestId, StepId};
use services::view::{render_log, render_quest};
use services::{
    AppServices, ClarifyingAnswer, Clock, MissionDraft, QuestApiConfig, RemoteSync,
};

const DEFAULT_DB_URL: &str = "sqlite://sgxp.sqlite3";

#[derive(Debug, PartialEq, Eq)]
enum ArgsError {
    MissingCommand,
    UnknownCommand(String),
    MissingValue { flag: &'static str },
    MissingArg { name: &'static str },
    UnknownArg(String),
    InvalidId { raw: String },
    InvalidSort { raw: String },
    InvalidAnswer { raw: String },
    InvalidDbUrl { raw: String },
    MissingMission,
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingCommand => write!(f, "missing subcommand"),
            ArgsError::UnknownCommand(cmd) => write!(f, "unknown subcommand: {cmd}"),
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::MissingArg { name } => write!(f, "missing <{name}>"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidId { raw } => write!(f, "invalid id: {raw}"),
            ArgsError::InvalidSort { raw } => write!(f, "invalid --sort value: {raw}"),
            ArgsError::InvalidAnswer { raw } => {
                write!(f, "invalid --answer value (expected QUESTION=ANSWER): {raw}")
            }
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::MissingMission => write!(f, "--mission is required"),
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

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  sgxp clarify  --mission <text> [mission flags]");
    eprintln!("  sgxp generate --mission <text> [mission flags] [--answer <question=answer>]...");
    eprintln!("  sgxp log      [--sort recent|oldest|quest-sgxp-high|quest-sgxp-low]");
    eprintln!("  sgxp show     <quest_id>");
    eprintln!("  sgxp toggle   <quest_id> <step_id>");
    eprintln!("  sgxp delete   <quest_id>");
    eprintln!("  sgxp clear");
    eprintln!();
    eprintln!("Mission flags:");
    eprintln!("  --mode <supplies|awareness|helpers|...>  --nickname <name>  --age-range <range>");
    eprintln!();
    eprintln!("Common flags:");
    eprintln!("  --api <base_url>   (default http://localhost:5000)");
    eprintln!("  --db <sqlite_url>  (default {DEFAULT_DB_URL})");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  SGXP_API_BASE_URL, SGXP_API_TIMEOUT_SECS, SGXP_DB_URL, RUST_LOG");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CommandKind {
    Clarify,
    Generate,
    Log,
    Show,
    Toggle,
    Delete,
    Clear,
}

impl CommandKind {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "clarify" => Some(Self::Clarify),
            "generate" => Some(Self::Generate),
            "log" => Some(Self::Log),
            "show" => Some(Self::Show),
            "toggle" => Some(Self::Toggle),
            "delete" => Some(Self::Delete),
            "clear" => Some(Self::Clear),
            _ => None,
        }
    }

    fn takes_mission(self) -> bool {
        matches!(self, Self::Clarify | Self::Generate)
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Clarify(MissionDraft),
    Generate(MissionDraft, Vec<ClarifyingAnswer>),
    Log(SortMode),
    Show(QuestId),
    Toggle(QuestId, StepId),
    Delete(QuestId),
    Clear,
}

#[derive(Debug)]
struct Args {
    api: QuestApiConfig,
    db_url: String,
    command: Command,
}

impl Args {
    fn from_env(args: impl IntoIterator<Item = String>) -> Result<Self, ArgsError> {
        let db_url = std::env::var("SGXP_DB_URL")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map_or_else(default_db_url, normalize_sqlite_url);
        Self::parse(args, QuestApiConfig::from_env(), db_url)
    }

    fn parse(
        args: impl IntoIterator<Item = String>,
        mut api: QuestApiConfig,
        mut db_url: String,
    ) -> Result<Self, ArgsError> {
        let mut args = args.into_iter();
        let first = args.next().ok_or(ArgsError::MissingCommand)?;
        let kind =
            CommandKind::from_arg(&first).ok_or_else(|| ArgsError::UnknownCommand(first.clone()))?;

        let mut mission = MissionDraft::default();
        let mut answers = Vec::new();
        let mut sort = SortMode::default();
        let mut positional = Vec::new();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--api" => api.base_url = require_value(&mut args, "--api")?,
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--mission" if kind.takes_mission() => {
                    mission.mission_idea = require_value(&mut args, "--mission")?;
                }
                "--mode" if kind.takes_mission() => {
                    mission.help_mode = HelpMode::from(require_value(&mut args, "--mode")?.as_str());
                }
                "--nickname" if kind.takes_mission() => {
                    mission.nickname = require_value(&mut args, "--nickname")?;
                }
                "--age-range" if kind.takes_mission() => {
                    mission.age_range = require_value(&mut args, "--age-range")?;
                }
                "--answer" if kind == CommandKind::Generate => {
                    answers.push(parse_answer(require_value(&mut args, "--answer")?)?);
                }
                "--sort" if kind == CommandKind::Log => {
                    let value = require_value(&mut args, "--sort")?;
                    sort = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidSort { raw: value.clone() })?;
                }
                other if other.starts_with('-') => return Err(ArgsError::UnknownArg(arg)),
                _ => positional.push(arg),
            }
        }

        if kind.takes_mission() && mission.mission_idea.trim().is_empty() {
            return Err(ArgsError::MissingMission);
        }

        let mut positional = positional.into_iter();
        let command = match kind {
            CommandKind::Clarify => Command::Clarify(mission),
            CommandKind::Generate => Command::Generate(mission, answers),
            CommandKind::Log => Command::Log(sort),
            CommandKind::Show => Command::Show(parse_id(positional.next(), "quest_id")?),
            CommandKind::Toggle => Command::Toggle(
                parse_id(positional.next(), "quest_id")?,
                parse_id(positional.next(), "step_id")?,
            ),
            CommandKind::Delete => Command::Delete(parse_id(positional.next(), "quest_id")?),
            CommandKind::Clear => Command::Clear,
        };
        if let Some(extra) = positional.next() {
            return Err(ArgsError::UnknownArg(extra));
        }

        Ok(Self {
            api,
            db_url,
            command,
        })
    }
}

fn parse_id<T: std::str::FromStr>(raw: Option<String>, name: &'static str) -> Result<T, ArgsError> {
    let raw = raw.ok_or(ArgsError::MissingArg { name })?;
    raw.parse().map_err(|_| ArgsError::InvalidId { raw })
}

fn parse_answer(raw: String) -> Result<ClarifyingAnswer, ArgsError> {
    match raw.split_once('=') {
        Some((question, answer)) if !question.trim().is_empty() => Ok(ClarifyingAnswer {
            question: question.trim().to_string(),
            answer: answer.trim().to_string(),
        }),
        _ => Err(ArgsError::InvalidAnswer { raw }),
    }
}

fn normalize_sqlite_url(raw: String) -> String {
    let trimmed = raw.trim();
    if trimmed == "sqlite::memory:" {
        return trimmed.to_string();
    }

    let rest = trimmed
        .strip_prefix("sqlite://")
        .or_else(|| trimmed.strip_prefix("sqlite:"))
        .unwrap_or(trimmed);
    let (path_str, query) = match rest.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (rest, None),
    };
    if path_str.is_empty() {
        return trimmed.to_string();
    }

    let path = std::path::Path::new(path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| std::path::PathBuf::from("."))
            .join(path)
    };
    match query {
        Some(query) => format!("sqlite://{}?{query}", absolute.display()),
        None => format!("sqlite://{}", absolute.display()),
    }
}

fn default_db_url() -> String {
    normalize_sqlite_url(DEFAULT_DB_URL.to_string())
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

fn report_sync(action: &str, sync: RemoteSync) {
    if sync == RemoteSync::Failed {
        eprintln!("{action} locally; the server could not be updated.");
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let argv: Vec<String> = std::env::args().skip(1).collect();
    if argv.first().is_none_or(|first| first == "help")
        || argv.iter().any(|arg| arg == "--help" || arg == "-h")
    {
        print_usage();
        return Ok(());
    }

    let args = Args::from_env(argv).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    tracing::debug!(db_url = %args.db_url, api = %args.api.base_url, "starting sgxp");
    prepare_sqlite_file(&args.db_url)?;
    let services = AppServices::connect(&args.db_url, args.api, Clock::default()).await?;
    let mut session = services.session();

    match args.command {
        Command::Clarify(mission) => {
            for (index, question) in session.clarify(&mission).await.iter().enumerate() {
                println!("{}. {question}", index + 1);
            }
        }
        Command::Generate(mission, answers) => {
            let active = session.generate(&mission, &answers).await?;
            println!("{}", render_quest(active));
        }
        Command::Log(sort) => {
            let status = session.hydrate().await;
            println!("{}", render_log(&session.suit_log(sort), status));
        }
        Command::Show(id) => {
            let active = session.open_quest(id).await?;
            println!("{}", render_quest(active));
        }
        Command::Toggle(id, step) => {
            session.open_quest(id).await?;
            session.toggle_step(step).await?;
            if let Some(active) = session.current() {
                println!("{}", render_quest(active));
            }
        }
        Command::Delete(id) => {
            let sync = session.delete_quest(id).await;
            report_sync("Deleted", sync);
            println!("Quest {id} deleted.");
        }
        Command::Clear => {
            let sync = session.clear_all().await;
            report_sync("Cleared", sync);
            println!("Suit Log cleared.");
        }
    }
    Ok(())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() {
    init_tracing();
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}

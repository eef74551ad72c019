mod checker;
mod core;
mod error;
mod index;
mod judger;
mod languages;
mod model;
mod poller;
mod report;
mod resolver;
mod runner;
mod samples;
mod settings;
mod workspace;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use crate::index::{IndexEntry, ProblemIndex, INDEX_FILE};
use crate::judger::judge_samples;
use crate::languages::LanguageTable;
use crate::model::Contest;
use crate::poller::{CommandStatusSource, PollState, SubmissionPoller};
use crate::resolver::resolve;
use crate::runner::{CommandSpec, LocalRunner};
use crate::samples::SampleStore;
use crate::settings::Settings;
use crate::workspace::{resolve_contest_dir, Workspace};

const DEFAULT_LOG_DIRECTIVE: &str = "acp=info";

#[derive(Parser, Debug)]
#[command(name = "acp", author, version, about = "Local sample judge for contest workspaces", long_about = None)]
struct Cli {
    /// Settings file (TOML); falls back to ACP_CONFIG, then built-in defaults
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Test a solution against the samples of a problem
    #[command(visible_alias = "t")]
    Test {
        /// Problem index or (part of) its name, title or URL
        problem: String,
        /// Command that runs the solution, e.g. "python main.py"
        #[arg(short, long)]
        command: Option<String>,
        /// Contest directory holding info.json
        #[arg(short, long)]
        directory: Option<PathBuf>,
        /// Time limit per sample in milliseconds
        #[arg(short, long, value_name = "MS")]
        time_limit: Option<u64>,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Run a solution once, feeding it this process's stdin
    #[command(visible_alias = "r")]
    Run {
        problem: String,
        #[arg(short, long)]
        command: Option<String>,
        #[arg(short, long)]
        directory: Option<PathBuf>,
    },
    /// List the problems of the contest
    #[command(visible_alias = "ls")]
    List {
        #[arg(short, long)]
        directory: Option<PathBuf>,
    },
    /// Create an empty contest directory with its problem index
    New {
        /// Contest URL or id, e.g. abc100
        contest: String,
        /// Problem letters, optionally with points, e.g. A:100 B:200 C
        #[arg(required = true)]
        letters: Vec<String>,
        /// Where to create the contest directory
        #[arg(short, long)]
        directory: Option<PathBuf>,
    },
    /// Append a sample case to a problem
    AddSample {
        problem: String,
        /// File with the sample input
        #[arg(long)]
        input: PathBuf,
        /// File with the expected output
        #[arg(long)]
        output: PathBuf,
        #[arg(short, long)]
        directory: Option<PathBuf>,
    },
    /// Poll a submission until it is judged
    #[command(visible_alias = "w")]
    Watch {
        /// Command printing `label<TAB>columns...` for the latest submission
        #[arg(long)]
        status_command: String,
        /// Number of polls before giving up
        #[arg(long)]
        attempts: Option<usize>,
        /// Seconds between polls
        #[arg(long, value_name = "SECS")]
        interval: Option<u64>,
    },
    /// Show the joined contest
    Status,
    /// Show the submission languages
    Langs {
        /// Language id, key or alias to look up
        query: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(log_filter(std::env::var("RUST_LOG").ok().as_deref()))
        .init();

    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config_path = cli
        .config
        .clone()
        .or_else(|| std::env::var("ACP_CONFIG").ok().map(PathBuf::from));
    let settings = Settings::load(config_path.as_deref())?;

    // Dropping the command future on interrupt kills a running solution
    tokio::select! {
        result = dispatch(cli.command, &settings) => result,
        _ = tokio::signal::ctrl_c() => {
            warn!("Interrupted");
            Ok(ExitCode::from(130))
        }
    }
}

/// `RUST_LOG` when set, else `acp=info`
fn log_filter(rust_log: Option<&str>) -> EnvFilter {
    match rust_log {
        Some(directives) if !directives.trim().is_empty() => EnvFilter::new(directives),
        _ => EnvFilter::new(DEFAULT_LOG_DIRECTIVE),
    }
}

async fn dispatch(command: Commands, settings: &Settings) -> Result<ExitCode> {
    let cwd = std::env::current_dir().context("Failed to get current directory")?;

    match command {
        Commands::Test {
            problem,
            command,
            directory,
            time_limit,
            json,
        } => {
            let (contest_dir, entry) = find_problem(settings, &cwd, directory.as_deref(), &problem)?;
            let problem_dir = entry.root_path(&contest_dir);
            let store = SampleStore::open(&problem_dir)?;
            let cmd = solution_command(settings, command.as_deref(), &problem_dir)?;

            let mut options = settings.judge_options();
            if let Some(ms) = time_limit {
                options.time_limit = Duration::from_millis(ms);
            }

            let runner = LocalRunner::new(settings.run_timeout());
            let report = judge_samples(&runner, &entry.name, &cmd, &store, &options).await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("{}", report);
            }

            Ok(if report.all_accepted() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Commands::Run {
            problem,
            command,
            directory,
        } => {
            let (contest_dir, entry) = find_problem(settings, &cwd, directory.as_deref(), &problem)?;
            let problem_dir = entry.root_path(&contest_dir);
            let cmd = solution_command(settings, command.as_deref(), &problem_dir)?;

            eprintln!("- Execute Directory:  '{}'", problem_dir.display());
            eprintln!("- Execute Command:    \"{}\"", cmd.display());
            eprintln!("  Waiting input ...");

            let mut input = String::new();
            tokio::io::stdin()
                .read_to_string(&mut input)
                .await
                .context("Failed to read stdin")?;

            let runner = LocalRunner::new(settings.run_timeout());
            let outcome = runner
                .execute(&cmd, Some(&input), settings.run_timeout())
                .await?;

            if !outcome.stdout.is_empty() {
                println!("Output:\n{}", outcome.stdout.trim_end());
            }
            if !outcome.stderr.is_empty() {
                eprintln!("Runtime Error:\n{}", outcome.stderr.trim_end());
            }
            info!(
                "Finished with {:?} in {:.2}s",
                outcome.status,
                outcome.elapsed.as_secs_f64()
            );

            Ok(if outcome.is_success() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Commands::List { directory } => {
            let contest_dir = resolve_contest_dir(directory.as_deref(), &cwd, &settings.cache_dir)?;
            let index = ProblemIndex::load(contest_dir.join(INDEX_FILE))?;
            if index.is_empty() {
                warn!("No problems in {}", contest_dir.display());
            }
            let width = index.iter().map(|(_, e)| e.name.len()).max().unwrap_or(0);
            for (position, entry) in index.iter() {
                println!(
                    "{:02} | {:<width$} - {} | {}",
                    position,
                    entry.name,
                    entry.title,
                    entry.url,
                    width = width
                );
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::New {
            contest,
            letters,
            directory,
        } => {
            let base = match directory {
                Some(directory) => cwd.join(directory),
                None => cwd.clone(),
            };
            let mut contest = Contest::from_url(&contest);
            for spec in &letters {
                contest.add_task(spec)?;
            }

            let contest_dir = base.join(&contest.name);
            for problem in contest.problems() {
                SampleStore::create(contest_dir.join(&problem.root_dir))?;
            }
            contest.to_index().save(contest_dir.join(INDEX_FILE))?;

            let workspace = Workspace::locate_or_init(&cwd, &base, &settings.cache_dir)?;
            workspace.record_contest(contest.reference(), &contest_dir)?;

            println!(
                "Created {} with {} problems in {}",
                contest,
                contest.problems().len(),
                contest_dir.display()
            );
            let points: Vec<String> = contest
                .points()
                .iter()
                .filter(|(_, point)| **point > 0)
                .map(|(letter, point)| format!("{}: {}", letter, point))
                .collect();
            if !points.is_empty() {
                println!("Points: {}", points.join(", "));
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::AddSample {
            problem,
            input,
            output,
            directory,
        } => {
            let (contest_dir, entry) = find_problem(settings, &cwd, directory.as_deref(), &problem)?;
            let input = std::fs::read_to_string(&input)
                .with_context(|| format!("Failed to read {}", input.display()))?;
            let output = std::fs::read_to_string(&output)
                .with_context(|| format!("Failed to read {}", output.display()))?;

            let store = SampleStore::create(entry.root_path(&contest_dir))?;
            let case = store.add_case(&input, &output)?;
            println!("Added {} to {}", case.name(), entry.name);
            Ok(ExitCode::SUCCESS)
        }
        Commands::Watch {
            status_command,
            attempts,
            interval,
        } => {
            let command = CommandSpec::parse(&status_command);
            if command.is_empty() {
                bail!("Empty status command");
            }

            let mut config = settings.poll_config();
            if let Some(attempts) = attempts {
                config.max_attempts = attempts;
            }
            if let Some(secs) = interval {
                config.interval = Duration::from_secs(secs);
            }

            let source = CommandStatusSource::new(
                command,
                Duration::from_secs(settings.poll.status_timeout_secs),
            );
            let report = SubmissionPoller::new(config).poll(&source).await;
            debug!("Poll trace: {:?}", report.transitions);

            match (report.final_state, report.last_status) {
                (PollState::Done, Some(status)) => {
                    println!("{}", status.line());
                    println!("Judging finished: {}", status.label);
                }
                _ => {
                    println!(
                        "Judging did not finish after {} polls. Please check the results on the site.",
                        report.attempts
                    );
                }
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Status => {
            let languages = LanguageTable::builtin()?;
            match Workspace::locate(&cwd, &settings.cache_dir) {
                Some(workspace) => {
                    let cache = workspace.read_cache()?;
                    match (cache.contest, cache.target_dir) {
                        (Some(contest), Some(target_dir)) => println!(
                            "Joined contests: {} at {}",
                            contest.name,
                            workspace.root().join(target_dir).display()
                        ),
                        _ => println!("No joined contests"),
                    }
                }
                None => println!("No joined contests"),
            }
            println!(
                "Submission language: {} ({})",
                settings.language_id,
                languages.name_of(settings.language_id)
            );
            Ok(ExitCode::SUCCESS)
        }
        Commands::Langs { query } => {
            let languages = LanguageTable::builtin()?;
            match query {
                Some(query) => match languages.find(&query) {
                    Some(language) => println!("ID: {} - {}", language.id, language.name),
                    None => bail!("Unknown language: {}", query),
                },
                None => {
                    for language in languages.iter() {
                        println!("ID: {} - {}", language.id, language.name);
                    }
                }
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Resolve `key` against the index of the contest directory
fn find_problem(
    settings: &Settings,
    cwd: &Path,
    directory: Option<&Path>,
    key: &str,
) -> Result<(PathBuf, IndexEntry)> {
    let contest_dir = resolve_contest_dir(directory, cwd, &settings.cache_dir)?;
    let index = ProblemIndex::load(contest_dir.join(INDEX_FILE))?;
    let resolved = resolve(&index, key).map_err(|e| {
        if !e.candidates().is_empty() {
            warn!("{} problems match {:?}", e.candidates().len(), key);
        }
        e
    })?;
    info!(
        "Problem {:?} resolved to #{} {}",
        key, resolved.position, resolved.entry.name
    );
    let entry = resolved.entry.clone();
    Ok((contest_dir, entry))
}

fn solution_command(settings: &Settings, command: Option<&str>, work_dir: &Path) -> Result<CommandSpec> {
    let cmd = CommandSpec::parse(command.unwrap_or(&settings.command));
    if cmd.is_empty() {
        bail!("Empty solution command");
    }
    if !work_dir.is_dir() {
        bail!("Problem directory does not exist: {}", work_dir.display());
    }
    Ok(cmd.with_work_dir(work_dir))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rust_log_replaces_default_filter() {
        let filter = log_filter(Some("acp=debug")).to_string();
        assert!(filter.contains("acp=debug"));
        assert!(!filter.contains("acp=info"));
    }

    #[test]
    fn test_default_filter() {
        assert_eq!(log_filter(None).to_string(), DEFAULT_LOG_DIRECTIVE);
        assert_eq!(log_filter(Some("  ")).to_string(), DEFAULT_LOG_DIRECTIVE);
    }

    #[test]
    fn test_cli_parses_task_specs() {
        let cli = Cli::try_parse_from(["acp", "new", "abc100", "A:100", "B", "-d", "contests"])
            .unwrap();
        match cli.command {
            Commands::New {
                contest,
                letters,
                directory,
            } => {
                assert_eq!(contest, "abc100");
                assert_eq!(letters, vec!["A:100", "B"]);
                assert_eq!(directory, Some(PathBuf::from("contests")));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}

use std::{
    io::{self, BufRead, Write},
    path::PathBuf,
};

use clap::{Args, Parser, Subcommand};
use colored::*;
use jiff::{Timestamp, civil::Date};
use tracing_subscriber::EnvFilter;

use crate::{
    clock::{Clock, StreakTransition, SystemClock},
    config::{Config, DATA_DIR_ENV},
    filter::{AttendanceFilter, filter},
    models::{
        draft::{HackathonDraft, Rejection, StageDraft},
        hackathon::{Attendance, Hackathon},
        stage::{Stage, StageStatus},
    },
    services::{
        hackathons::{Outcome, Tracker},
        lookup::{LookupError, find_hackathon, find_stage},
        streak::check_in,
    },
    storage::json::JsonFileStorage,
};

mod clock;
mod config;
mod filter;
mod models;
mod services;
mod storage;
mod transfer;
mod ui;

#[derive(Parser)]
#[command(
    name = "hacktrack",
    about = "Hackathon deadlines and multi-stage submissions in your terminal"
)]
struct Cli {
    /// Directory holding the JSON documents
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Use this config file instead of the default one
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log what is being done to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List tracked hackathons, soonest deadline first
    List {
        /// Only show one attendance type
        #[arg(short = 't', long = "type", value_enum, default_value_t)]
        kind: AttendanceFilter,
    },

    /// Show a hackathon and its stages
    Show {
        /// Id, slug or part of the name
        hackathon: String,
    },

    /// Track a new hackathon
    Add {
        /// Hackathon name
        name: String,

        #[command(flatten)]
        fields: HackathonFields,
    },

    /// Edit a tracked hackathon
    Edit {
        /// Id, slug or part of the name
        hackathon: String,

        /// Rename the hackathon
        #[arg(long)]
        name: Option<String>,

        #[command(flatten)]
        fields: HackathonFields,

        /// Remove a stage without completing it (can be used multiple times)
        #[arg(long = "drop-stage", action = clap::ArgAction::Append)]
        drop_stage: Vec<String>,

        /// Switch to a single deadline, keeping the current one unless --deadline is given
        #[arg(long, conflicts_with = "stage")]
        fixed: bool,
    },

    /// Stop tracking a hackathon
    Remove {
        /// Id, slug or part of the name
        hackathon: String,
    },

    /// Manage submission stages
    #[command(subcommand)]
    Stage(StageCommands),

    /// Check in for today and show the streak
    Streak,

    /// Write every document into one backup bundle
    Export {
        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Overwrite every document with the contents of a backup bundle
    Import {
        /// Bundle produced by `hacktrack export`
        file: PathBuf,

        /// Don't ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Debug, Subcommand)]
enum StageCommands {
    /// Finish a stage and discard it; finishing the last one stops tracking the hackathon
    Complete { hackathon: String, stage: String },
    /// Mark a stage done, or not done again
    Toggle { hackathon: String, stage: String },
    /// Set the status of a stage
    Status {
        hackathon: String,
        stage: String,
        #[arg(value_enum)]
        status: StageStatus,
    },
}

#[derive(Debug, Args)]
struct HackathonFields {
    /// Submission deadline (e.g., "2025-03-10"); unused once stages are added
    #[arg(short, long)]
    deadline: Option<Date>,

    /// Organizer or platform (e.g., "Devpost", "Unstop")
    #[arg(short, long)]
    platform: Option<String>,

    /// Application link
    #[arg(short, long)]
    link: Option<String>,

    /// Attendance type (defaults to virtual when a link is given)
    #[arg(short = 't', long = "type", value_enum)]
    kind: Option<Attendance>,

    /// Add a stage as "Name@2025-03-01" or "Name@2025-02-01..2025-03-01" (can be used multiple times)
    #[arg(short, long, action = clap::ArgAction::Append)]
    stage: Vec<StageDraft>,
}

impl HackathonFields {
    fn apply(self, draft: &mut HackathonDraft) -> Result<(), Rejection> {
        if let Some(deadline) = self.deadline {
            draft.deadline = Some(deadline);
        }
        if let Some(platform) = self.platform {
            draft.platform = platform;
        }
        if let Some(link) = self.link {
            draft.link = link;
        }
        if let Some(kind) = self.kind {
            draft.kind = kind;
        }
        for stage in self.stage {
            draft.add_stage(stage)?;
            draft.is_multistage = true;
        }
        Ok(())
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn exit_with_error(message: impl std::fmt::Display) -> ! {
    eprintln!("Error: {}", message);
    std::process::exit(1);
}

fn report_lookup_error(hackathons: &[Hackathon], error: LookupError) -> ! {
    if let LookupError::AmbiguousHackathon(names) = error {
        eprintln!("Error: Hackathon reference is ambiguous. Multiple hackathons found:");
        for name in names {
            eprintln!("  - {}", name);
        }
        eprintln!("\nPlease be more specific or use the id.");
        std::process::exit(1);
    }

    eprintln!("Error: {}", error);
    if !hackathons.is_empty() {
        eprintln!("\nTracked hackathons:");
        for h in hackathons {
            eprintln!("  - {} ({})", h.name, ui::short_id(&h.id));
        }
    }
    std::process::exit(1);
}

fn lookup_hackathon<'a>(hackathons: &'a [Hackathon], reference: &str) -> &'a Hackathon {
    find_hackathon(hackathons, reference).unwrap_or_else(|e| report_lookup_error(hackathons, e))
}

fn lookup_stage<'a>(hackathon: &'a Hackathon, reference: &str) -> &'a Stage {
    if !hackathon.is_multistage() {
        exit_with_error(format!(
            "'{}' has a single deadline and no stages",
            hackathon.name
        ));
    }

    match find_stage(hackathon.stages(), reference) {
        Ok(stage) => stage,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!("\nStages of {}:", hackathon.name);
            for stage in hackathon.stages() {
                eprintln!("  - {} ({})", stage.name, ui::short_id(&stage.id));
            }
            std::process::exit(1);
        }
    }
}

/// Resolves both references and returns owned ids plus the stage name
fn lookup_stage_ids(
    tracker: &Tracker<JsonFileStorage>,
    hackathon: &str,
    stage: &str,
) -> (String, String, String) {
    let hackathon = lookup_hackathon(tracker.hackathons(), hackathon);
    let stage = lookup_stage(hackathon, stage);
    (hackathon.id.clone(), stage.id.clone(), stage.name.clone())
}

fn print_rejection(rejection: Rejection) -> ! {
    match rejection {
        Rejection::MissingDeadline => exit_with_error(
            "A deadline is required: pass --deadline, or add at least one stage with --stage. Nothing was saved.",
        ),
        other => exit_with_error(format!("{}. Nothing was saved.", capitalize(&other.to_string()))),
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn confirm(prompt: &str) -> bool {
    print!("{} [y/N] ", prompt);
    if io::stdout().flush().is_err() {
        return false;
    }

    let mut answer = String::new();
    match io::stdin().lock().read_line(&mut answer) {
        Ok(_) => matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"),
        Err(_) => false,
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);
    let config = Config::load(&config_path).unwrap_or_else(|e| exit_with_error(e));
    let tz = config.time_zone().unwrap_or_else(|e| exit_with_error(e));
    let clock = SystemClock::new(tz);

    let data_dir = config.resolve_data_dir(
        cli.data_dir,
        std::env::var_os(DATA_DIR_ENV).map(PathBuf::from),
    );
    let storage = JsonFileStorage::open(data_dir).unwrap_or_else(|e| exit_with_error(e));

    let mut tracker = match Tracker::open(storage) {
        Ok(tracker) => tracker,
        Err(e) => exit_with_error(format!("Failed to load hackathons: {}", e)),
    };

    let command = cli.command.unwrap_or(Commands::List {
        kind: AttendanceFilter::All,
    });

    match command {
        Commands::List { kind } => {
            let today = clock.today();
            let shown = filter(tracker.hackathons(), kind);

            if shown.is_empty() {
                if tracker.hackathons().is_empty() {
                    println!("No hackathons tracked yet. Ready to build something great?");
                } else {
                    println!("No matching hackathons");
                }
            } else {
                let title = match kind {
                    AttendanceFilter::All => "Hackathons",
                    AttendanceFilter::InPerson => "In-person hackathons",
                    AttendanceFilter::Virtual => "Virtual hackathons",
                };
                ui::render_view_header(title, shown.len());
                for hackathon in shown {
                    ui::render_hackathon_line(hackathon, today);
                }
                println!();
            }
        }
        Commands::Show { hackathon } => {
            let hackathon = lookup_hackathon(tracker.hackathons(), &hackathon);
            ui::render_hackathon_details(hackathon, clock.today());
        }
        Commands::Add { name, fields } => {
            let mut draft = HackathonDraft {
                name,
                ..HackathonDraft::default()
            };
            if fields.kind.is_none() && fields.link.as_deref().is_some_and(|l| !l.trim().is_empty())
            {
                draft.kind = Attendance::Virtual;
            }
            if let Err(rejection) = fields.apply(&mut draft) {
                print_rejection(rejection);
            }

            match tracker.add(draft) {
                Ok(Outcome::Skipped(rejection)) => print_rejection(rejection),
                Ok(Outcome::Added(id)) => match tracker.get(&id) {
                    Some(added) => println!(
                        "✓ Now tracking {} (deadline {})",
                        added.name.bold(),
                        ui::format_deadline(added.deadline())
                    ),
                    None => println!("✓ Now tracking hackathon"),
                },
                Ok(_) => println!("✓ Now tracking hackathon"),
                Err(e) => exit_with_error(format!("Failed to add hackathon: {}", e)),
            }
        }
        Commands::Edit {
            hackathon,
            name,
            fields,
            drop_stage,
            fixed,
        } => {
            let current = lookup_hackathon(tracker.hackathons(), &hackathon);
            let id = current.id.clone();
            let current_deadline = current.deadline();
            let mut draft = HackathonDraft::from_hackathon(current);

            if let Some(name) = name {
                draft.name = name;
            }
            for reference in drop_stage {
                let stage_id = match find_stage(&draft.stages, &reference) {
                    Ok(stage) => stage.id.clone(),
                    Err(e) => exit_with_error(e),
                };
                if let Err(rejection) = draft.remove_stage(&stage_id) {
                    print_rejection(rejection);
                }
            }
            if let Err(rejection) = fields.apply(&mut draft) {
                print_rejection(rejection);
            }
            if fixed {
                draft.is_multistage = false;
                draft.deadline = draft.deadline.or(Some(current_deadline));
            }

            match tracker.update(&id, draft) {
                Ok(Outcome::Skipped(rejection)) => print_rejection(rejection),
                Ok(_) => match tracker.get(&id) {
                    Some(updated) => println!(
                        "✓ Updated {} (deadline {})",
                        updated.name.bold(),
                        ui::format_deadline(updated.deadline())
                    ),
                    None => println!("✓ Updated hackathon"),
                },
                Err(e) => exit_with_error(format!("Failed to update hackathon: {}", e)),
            }
        }
        Commands::Remove { hackathon } => {
            let (id, name) = match find_hackathon(tracker.hackathons(), &hackathon) {
                Ok(target) => (target.id.clone(), target.name.clone()),
                Err(LookupError::HackathonNotFound(_)) => {
                    println!("Nothing to remove: no hackathon matches '{}'", hackathon);
                    return;
                }
                Err(e) => report_lookup_error(tracker.hackathons(), e),
            };

            match tracker.remove(&id) {
                Ok(Outcome::Skipped(_)) => println!("Nothing to remove"),
                Ok(_) => println!("✓ Stopped tracking {}", name),
                Err(e) => exit_with_error(format!("Failed to remove hackathon: {}", e)),
            }
        }
        Commands::Stage(StageCommands::Complete { hackathon, stage }) => {
            let (id, stage_id, stage_name) = lookup_stage_ids(&tracker, &hackathon, &stage);

            match tracker.complete_stage(&id, &stage_id) {
                Ok(Outcome::Applied) => {
                    println!("✓ Stage {} completed", stage_name.bold());
                    if let Some(updated) = tracker.get(&id) {
                        println!(
                            "  └─ next deadline {}",
                            ui::format_deadline(updated.deadline())
                        );
                    }
                }
                Ok(Outcome::Deleted) => {
                    println!("✓ Final stage {} completed", stage_name.bold());
                    println!("  └─ hackathon finished and no longer tracked");
                }
                Ok(Outcome::Skipped(rejection)) => print_rejection(rejection),
                Ok(Outcome::Added(_)) => unreachable!("complete_stage never adds a hackathon"),
                Err(e) => exit_with_error(format!("Failed to complete stage: {}", e)),
            }
        }
        Commands::Stage(StageCommands::Toggle { hackathon, stage }) => {
            let (id, stage_id, stage_name) = lookup_stage_ids(&tracker, &hackathon, &stage);

            match tracker.toggle_stage(&id, &stage_id) {
                Ok(Outcome::Skipped(rejection)) => print_rejection(rejection),
                Ok(_) => {
                    let completed = tracker
                        .get(&id)
                        .and_then(|h| h.stages().iter().find(|s| s.id == stage_id))
                        .is_some_and(|s| s.completed);
                    let state = if completed { "done" } else { "not done" };
                    println!("✓ Stage {} marked {}", stage_name.bold(), state);
                }
                Err(e) => exit_with_error(format!("Failed to update stage: {}", e)),
            }
        }
        Commands::Stage(StageCommands::Status {
            hackathon,
            stage,
            status,
        }) => {
            let (id, stage_id, stage_name) = lookup_stage_ids(&tracker, &hackathon, &stage);

            match tracker.update_stage_status(&id, &stage_id, status) {
                Ok(Outcome::Skipped(rejection)) => print_rejection(rejection),
                Ok(_) => println!(
                    "✓ Stage {} set to {}",
                    stage_name.bold(),
                    ui::format_stage_status(status)
                ),
                Err(e) => exit_with_error(format!("Failed to update stage: {}", e)),
            }
        }
        Commands::Streak => match check_in(tracker.storage(), &clock) {
            Ok(result) => {
                match result.transition {
                    StreakTransition::Start => println!("✓ Streak started"),
                    StreakTransition::Continue => println!("✓ Streak extended"),
                    StreakTransition::Reset => println!("Streak reset, starting again"),
                    StreakTransition::AlreadyCounted => println!("Already checked in today"),
                }
                ui::render_streak(&result.record, &clock.time_zone());
            }
            Err(e) => exit_with_error(format!("Failed to update streak: {}", e)),
        },
        Commands::Export { output } => {
            let json = transfer::export(tracker.storage(), Timestamp::now())
                .and_then(|bundle| transfer::to_json(&bundle))
                .unwrap_or_else(|e| exit_with_error(format!("Failed to export: {}", e)));

            match output {
                Some(path) => {
                    if let Err(e) = std::fs::write(&path, json) {
                        exit_with_error(format!("Failed to write '{}': {}", path.display(), e));
                    }
                    println!("✓ Workspace exported to {}", path.display());
                }
                None => println!("{}", json),
            }
        }
        Commands::Import { file, yes } => {
            let content = std::fs::read_to_string(&file).unwrap_or_else(|e| {
                exit_with_error(format!("Failed to read '{}': {}", file.display(), e))
            });
            let bundle = transfer::parse_bundle(&content)
                .unwrap_or_else(|e| exit_with_error(format!("Import failed: {}", e)));

            let prompt = format!(
                "This will overwrite {} document(s) in {}. Continue?",
                bundle.documents.len(),
                tracker.storage().root().display()
            );
            if !yes && !confirm(&prompt) {
                println!("Import cancelled");
                return;
            }

            let written = transfer::import(tracker.storage(), &bundle)
                .unwrap_or_else(|e| exit_with_error(format!("Import failed: {}", e)));
            if let Err(e) = tracker.reload() {
                exit_with_error(format!("Failed to reload hackathons: {}", e));
            }
            println!(
                "✓ Imported {} document(s), {} hackathon(s) tracked",
                written,
                tracker.hackathons().len()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::{CommandFactory, error::ErrorKind};

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_edit_fixed_conflicts_with_new_stages() {
        let result = Cli::try_parse_from([
            "hacktrack",
            "edit",
            "build-week",
            "--fixed",
            "--stage",
            "Final@2025-03-01",
        ]);
        match result {
            Err(e) => assert_eq!(e.kind(), ErrorKind::ArgumentConflict),
            Ok(_) => panic!("Expected --fixed and --stage to conflict"),
        }

        assert!(
            Cli::try_parse_from(["hacktrack", "edit", "build-week", "--fixed", "--deadline", "2025-03-10"])
                .is_ok()
        );
    }
}

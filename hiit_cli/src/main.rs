use clap::{Parser, Subcommand};
use hiit_core::progression::{badge_statuses, next_badge, BadgeTier};
use hiit_core::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Sender};
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "hiit")]
#[command(about = "HIIT interval timer with levels and badges", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a workout and run the timer
    Start {
        /// Workout length in minutes
        #[arg(long)]
        minutes: Option<u32>,

        /// Equipment you have (dumbbell, kettlebell, resistance_band, jump_rope, pullup_bar)
        #[arg(long, value_delimiter = ',')]
        equipment: Vec<String>,

        /// Only use these categories (upper_body, lower_body, core, cardio, full_body)
        #[arg(long, value_delimiter = ',')]
        category: Vec<String>,

        /// Seed for exercise selection
        #[arg(long)]
        seed: Option<u64>,

        /// Dry run - show the plan without starting the timer
        #[arg(long)]
        dry_run: bool,

        /// Auto-run (for testing) - fast-forward the clock without reading input
        #[arg(long)]
        auto: bool,
    },

    /// Show totals, streaks and level (default)
    Stats,

    /// List all badges
    Badges,

    /// Show the level for an arbitrary number of minutes
    Level {
        #[arg(long, allow_negative_numbers = true)]
        minutes: i64,
    },

    /// Roll up the workout log to CSV
    Rollup {
        /// Clean up processed logs after rollup
        #[arg(long)]
        cleanup: bool,
    },
}

struct DataPaths {
    wal_dir: PathBuf,
    wal_path: PathBuf,
    csv_path: PathBuf,
    profile_path: PathBuf,
}

impl DataPaths {
    fn new(data_dir: &Path) -> Self {
        let wal_dir = data_dir.join("wal");
        Self {
            wal_path: wal_dir.join("workouts.wal"),
            wal_dir,
            csv_path: data_dir.join("workouts.csv"),
            profile_path: data_dir.join("profile.json"),
        }
    }
}

fn main() -> Result<()> {
    hiit_core::logging::init();

    let cli = Cli::parse();

    let config = Config::load()?;
    let data_dir = cli.data_dir.unwrap_or_else(|| config.data.data_dir.clone());
    let paths = DataPaths::new(&data_dir);
    tracing::debug!("Using data directory {:?}", data_dir);

    match cli.command {
        Some(Commands::Start {
            minutes,
            equipment,
            category,
            seed,
            dry_run,
            auto,
        }) => cmd_start(
            &paths,
            &config,
            StartOptions {
                minutes,
                equipment,
                category,
                seed,
                dry_run,
                auto,
            },
        ),
        Some(Commands::Stats) | None => cmd_stats(&paths),
        Some(Commands::Badges) => cmd_badges(&paths),
        Some(Commands::Level { minutes }) => {
            display_snapshot(&calculate_next_level_progress(minutes));
            Ok(())
        }
        Some(Commands::Rollup { cleanup }) => cmd_rollup(&paths, cleanup),
    }
}

struct StartOptions {
    minutes: Option<u32>,
    equipment: Vec<String>,
    category: Vec<String>,
    seed: Option<u64>,
    dry_run: bool,
    auto: bool,
}

fn cmd_start(paths: &DataPaths, config: &Config, opts: StartOptions) -> Result<()> {
    let catalog = get_default_catalog();
    let errors = catalog.validate();
    if !errors.is_empty() {
        eprintln!("Catalog validation errors:");
        for error in errors {
            eprintln!("  - {}", error);
        }
        return Err(Error::CatalogValidation("Invalid catalog".into()));
    }

    let mut equipment: Vec<Equipment> = opts
        .equipment
        .iter()
        .filter_map(|e| match e.parse() {
            Ok(eq) => Some(eq),
            Err(_) => {
                eprintln!("Unknown equipment: {}. Ignoring.", e);
                None
            }
        })
        .collect();
    if opts.equipment.is_empty() {
        equipment = config.equipment.available.clone();
    }

    let categories: Vec<ExerciseCategory> = opts
        .category
        .iter()
        .filter_map(|c| match c.parse() {
            Ok(cat) => Some(cat),
            Err(_) => {
                eprintln!("Unknown category: {}. Using any category.", c);
                None
            }
        })
        .collect();

    let request = PlanRequest {
        minutes: opts.minutes.unwrap_or(config.workout.default_minutes),
        equipment,
        categories,
    };

    let mut rng = match opts.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let plan = generate_plan(catalog, &request, &config.workout, &mut rng)?;

    display_plan(&plan);

    if opts.dry_run {
        println!("\n[Dry run - not starting timer]");
        return Ok(());
    }

    let profile = UserProfile::load_or_create(&paths.profile_path)?;
    let store: Arc<dyn StatsStore + Send + Sync> =
        Arc::new(JsonlStore::new(&paths.wal_path).with_archive(&paths.csv_path));

    let (session, start_events) = WorkoutSession::start(plan, profile.user_id, store)?;

    // The sender stays alive for the whole run; closing stdin does not quit
    let (tx, rx) = mpsc::channel();
    let interval = if opts.auto {
        Duration::ZERO
    } else {
        print_controls();
        spawn_input_reader(tx.clone());
        Duration::from_secs(1)
    };

    let mut render = Renderer { live: !opts.auto };
    for event in &start_events {
        render.event(session.engine(), event);
    }
    let outcome = session.run(&rx, interval, |engine, event| render.event(engine, event));
    drop(tx);

    match outcome {
        SessionOutcome::Completed { log, commit } => {
            match commit {
                CommitStatus::Saved => {
                    println!("✓ Logged {} minutes", log.duration_minutes);
                }
                CommitStatus::DuplicateSuppressed => {
                    println!("✓ Workout already recorded in the last 30 seconds");
                }
                CommitStatus::Failed(reason) => {
                    println!("⚠ Workout completed but stats couldn't be saved ({})", reason);
                }
            }

            let logs = load_workout_logs(&paths.wal_path, &paths.csv_path)?;
            let stats = compute_stats(&logs, profile.user_id, chrono::Utc::now().date_naive());
            println!();
            display_snapshot(&calculate_next_level_progress(stats.total_minutes));
        }
        SessionOutcome::Abandoned { elapsed_seconds } => {
            println!(
                "\nWorkout abandoned after {} - nothing recorded.",
                format_time(elapsed_seconds)
            );
        }
    }

    Ok(())
}

fn cmd_stats(paths: &DataPaths) -> Result<()> {
    let profile = UserProfile::load_or_create(&paths.profile_path)?;
    let logs = load_workout_logs(&paths.wal_path, &paths.csv_path)?;
    let stats = compute_stats(&logs, profile.user_id, chrono::Utc::now().date_naive());

    println!("\n╭─────────────────────────────────────────╮");
    println!("│  YOUR STATS");
    println!("╰─────────────────────────────────────────╯");
    println!();
    println!("  Workouts:        {}", stats.total_workouts);
    println!("  Minutes:         {}", stats.total_minutes);
    println!("  Current streak:  {} days", stats.current_streak_days);
    println!("  Longest streak:  {} days", stats.longest_streak_days);
    if let Some(last) = stats.last_workout_at {
        println!("  Last workout:    {}", last.format("%Y-%m-%d %H:%M UTC"));
    }
    println!();

    display_snapshot(&calculate_next_level_progress(stats.total_minutes));

    if let Some(badge) = next_badge(stats.total_minutes) {
        println!("  Next badge: {} (level {})", badge.name, badge.level);
    }
    println!();

    Ok(())
}

fn cmd_badges(paths: &DataPaths) -> Result<()> {
    let profile = UserProfile::load_or_create(&paths.profile_path)?;
    let logs = load_workout_logs(&paths.wal_path, &paths.csv_path)?;
    let stats = compute_stats(&logs, profile.user_id, chrono::Utc::now().date_naive());

    println!();
    for status in badge_statuses(stats.total_minutes) {
        let marker = if status.unlocked { "✓" } else { "·" };
        println!(
            "  {} {:<18} level {:>2}  {:<8}  {}",
            marker,
            status.badge.name,
            status.badge.level,
            BadgeTier::for_level(status.badge.level).label(),
            status.badge.description
        );
    }
    println!();

    Ok(())
}

fn cmd_rollup(paths: &DataPaths, cleanup: bool) -> Result<()> {
    if !paths.wal_path.exists() {
        println!("No workout log found - nothing to roll up.");
        return Ok(());
    }

    let count = hiit_core::csv_rollup::wal_to_csv_and_archive(&paths.wal_path, &paths.csv_path)?;

    println!("✓ Rolled up {} workouts to CSV", count);
    println!("  CSV: {}", paths.csv_path.display());

    if cleanup {
        let cleaned = hiit_core::csv_rollup::cleanup_processed_wals(&paths.wal_dir)?;
        if cleaned > 0 {
            println!("✓ Cleaned up {} processed logs", cleaned);
        }
    }

    Ok(())
}

fn display_plan(plan: &WorkoutPlan) {
    let settings = &plan.settings;
    println!("\n╭─────────────────────────────────────────╮");
    println!("│  {} MIN HIIT", plan.total_duration_seconds / 60);
    println!("╰─────────────────────────────────────────╯");
    println!();
    println!(
        "  {} rounds · {}s work · {}s rest",
        settings.rounds, settings.exercise_time_seconds, settings.rest_time_seconds
    );
    let scheduled = plan.scheduled_seconds(hiit_core::timer::GET_READY_SECONDS);
    println!("  {}:{:02} on the clock", scheduled / 60, scheduled % 60);
    println!();
    for (i, exercise) in plan.exercises.iter().enumerate() {
        println!(
            "  {}. {:<24} {:<16} {}",
            i + 1,
            exercise.name,
            exercise.equipment,
            exercise.category
        );
    }
    println!();
}

fn display_snapshot(snapshot: &ProgressionSnapshot) {
    println!(
        "  Level {} ({})",
        snapshot.level,
        BadgeTier::for_level(snapshot.level).label()
    );
    println!(
        "  {} {:.0}%",
        progress_bar(snapshot.progress_percent, 30),
        snapshot.progress_percent
    );
    if snapshot.is_max_level() {
        println!("  Max level reached");
    } else {
        println!(
            "  {} minutes to level {}",
            snapshot.minutes_to_next_level,
            snapshot.level + 1
        );
    }
}

fn progress_bar(percent: f64, width: usize) -> String {
    let filled = ((percent.clamp(0.0, 100.0) / 100.0) * width as f64).round() as usize;
    format!("[{}{}]", "█".repeat(filled), "░".repeat(width - filled))
}

/// Prints timer events. Per-second output only when running live.
struct Renderer {
    live: bool,
}

impl Renderer {
    fn event(&mut self, engine: &TimerEngine, event: &TimerEvent) {
        let plan = engine.plan();
        match event {
            TimerEvent::PhaseStarted {
                phase: Phase::Finished,
                ..
            } => {}
            TimerEvent::PhaseStarted {
                phase,
                round,
                exercise_index,
                seconds,
            } => {
                let name = plan
                    .exercises
                    .get(*exercise_index)
                    .map(|e| e.name.as_str())
                    .unwrap_or("");
                let heading = match phase {
                    Phase::Resting => match engine.next_exercise() {
                        Some(next) => format!("next up: {}", next.name),
                        None => String::new(),
                    },
                    _ => name.to_string(),
                };
                println!(
                    "\n▶ {:<9} {:<24} round {}/{} · exercise {}/{} · {}",
                    phase.label(),
                    heading,
                    round + 1,
                    plan.settings.rounds,
                    exercise_index + 1,
                    plan.exercises.len(),
                    format_time(*seconds)
                );
            }
            TimerEvent::Cue(count) => {
                println!("  {}...", count);
            }
            TimerEvent::Tick(remaining) if self.live && engine.phase() != Phase::GetReady => {
                print!(
                    "\r  {} {}  ",
                    format_time(*remaining),
                    progress_bar(engine.progress_percent(), 20)
                );
                let _ = io::stdout().flush();
            }
            TimerEvent::Tick(_) => {}
            TimerEvent::Paused => println!("\n⏸ Paused - 'r' + Enter to resume"),
            TimerEvent::Resumed => println!("▶ Resumed"),
            TimerEvent::Completed(log) => {
                println!("\n🎉 Workout complete! {} minutes of HIIT.", log.duration_minutes);
            }
        }
    }
}

fn print_controls() {
    println!("─────────────────────────────────────────");
    println!("  'p' + Enter to pause, 'r' to resume");
    println!("  's' + Enter to skip, 'q' to quit");
}

/// Forward stdin commands to the session until stdin closes
fn spawn_input_reader(tx: Sender<Control>) {
    std::thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            let control = match line.trim().to_lowercase().as_str() {
                "p" => Control::Pause,
                "r" => Control::Resume,
                "s" => Control::Skip,
                "q" => Control::Quit,
                _ => continue,
            };
            if tx.send(control).is_err() {
                break;
            }
        }
    });
}

use clap::{Parser, Subcommand};
use taskchain::logging::LogLevel;
use taskchain::model::Status;
use taskchain::output::Format;
use taskchain::propagate::ConflictPolicy;

#[derive(Parser)]
#[command(
    name = "taskchain",
    version,
    about = "Task tracker that keeps dependent tasks blocked until their dependencies are done"
)]
struct Cli {
    /// Output format
    #[arg(long, global = true, value_enum, default_value = "json")]
    format: Format,
    /// Shorthand for --format pretty
    #[arg(long, global = true, hide = true)]
    pretty: bool,
    /// Log level (overrides TASKCHAIN_LOG)
    #[arg(long, global = true, value_enum)]
    log_level: Option<LogLevel>,
    /// How to settle an ancestor reached by several paths (overrides config.json)
    #[arg(long, global = true, value_enum)]
    conflict_policy: Option<ConflictPolicy>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new .taskchain/ directory here
    Init,
    /// Create a new task
    Create {
        /// Task title
        title: String,
        /// Task description
        #[arg(long, short)]
        description: String,
        /// Task IDs this task depends on (comma-separated)
        #[arg(long, value_delimiter = ',')]
        depends_on: Vec<u64>,
    },
    /// Display a single task
    Show {
        /// Task ID to show
        id: u64,
    },
    /// List tasks
    List {
        /// Filter by status
        #[arg(long, value_enum)]
        status: Option<Status>,
        /// Only tasks that depend directly on this task ID
        #[arg(long)]
        depends_on: Option<u64>,
    },
    /// Edit task fields and propagate the resulting status
    Edit {
        /// Task ID to edit
        id: u64,
        /// New title
        #[arg(long)]
        title: Option<String>,
        /// New description
        #[arg(long, short)]
        description: Option<String>,
        /// Requested status (forced to blocked while a dependency is not done)
        #[arg(long, value_enum)]
        status: Option<Status>,
        /// Replace dependencies (comma-separated task IDs, empty to clear)
        #[arg(long, value_delimiter = ',', num_args = 0..)]
        depends_on: Option<Vec<u64>>,
    },
    /// Set a task's status and update every task that depends on it
    Status {
        /// Task ID
        id: u64,
        /// New status
        #[arg(value_enum)]
        status: Status,
    },
    /// Print the updates a status change would cause, without saving
    Propagate {
        /// Task ID
        id: u64,
        /// Hypothetical new status
        #[arg(value_enum)]
        status: Status,
    },
}

fn run(cli: Cli, format: Format) -> taskchain::error::Result<()> {
    let policy = cli.conflict_policy;

    if let Commands::Init = cli.command {
        let cwd = std::env::current_dir()?;
        return taskchain::commands::init::run(&cwd);
    }

    let root = taskchain::store::repo::find_repo_root()?;
    match cli.command {
        Commands::Init => unreachable!(),
        Commands::Create {
            title,
            description,
            depends_on,
        } => taskchain::commands::create::run(&root, title, description, depends_on, policy, format),
        Commands::Show { id } => taskchain::commands::show::run(&root, id, format),
        Commands::List { status, depends_on } => {
            taskchain::commands::list::run(&root, status, depends_on, format)
        }
        Commands::Edit {
            id,
            title,
            description,
            status,
            depends_on,
        } => taskchain::commands::edit::run(
            &root,
            id,
            title,
            description,
            status,
            depends_on,
            policy,
            format,
        ),
        Commands::Status { id, status } => {
            taskchain::commands::status::set(&root, id, status, policy, format)
        }
        Commands::Propagate { id, status } => {
            taskchain::commands::status::preview(&root, id, status, policy, format)
        }
    }
}

fn main() {
    let cli = Cli::parse();
    taskchain::logging::init_logging(cli.log_level);
    let format = if cli.pretty {
        Format::Pretty
    } else {
        cli.format
    };
    if let Err(e) = run(cli, format) {
        match format {
            Format::Json => {
                eprintln!(
                    "{}",
                    serde_json::json!({
                        "error": e.code(),
                        "message": e.to_string()
                    })
                );
            }
            _ => eprintln!("error: {e}"),
        }
        std::process::exit(1);
    }
}

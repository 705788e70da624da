use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "td", about = concat!("[·] taskdeck v", env!("CARGO_PKG_VERSION"), " - projects and todos in one JSON file"), version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Run against a different store directory
    #[arg(short = 'C', long = "store-dir", global = true)]
    pub store_dir: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new taskdeck store in the current directory
    Init(InitArgs),
    /// List projects with their todos and subtasks
    List(ListArgs),
    /// Create a new project
    Project(ProjectArgs),
    /// Add a todo to a project
    Add(AddArgs),
    /// Add a subtask to a todo
    Sub(SubArgs),
    /// Mark a project, todo, or subtask done (or reopen it)
    Done(DoneArgs),
    /// Delete a project, todo, or subtask
    Delete(DeleteArgs),
    /// Search projects, todos, and subtasks by regex
    Search(SearchArgs),
    /// Validate the store (or a JSON file) and report problems
    Check(CheckArgs),
    /// Import a JSON export (taskdeck, Todoist, or Trello)
    Import(ImportArgs),
    /// Export the store to a JSON file
    Export(ExportArgs),
    /// Create, list, or prune backups
    Backup(BackupCmd),
}

// ---------------------------------------------------------------------------
// Setup
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct InitArgs {
    /// Reinitialize even if a store already exists
    #[arg(long)]
    pub force: bool,
}

// ---------------------------------------------------------------------------
// Read commands
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct ListArgs {
    /// Only this project (by ID or exact name)
    pub project: Option<String>,
    /// Include completed projects even when the settings hide them
    #[arg(long)]
    pub all: bool,
}

#[derive(Args)]
pub struct SearchArgs {
    /// Regex pattern (case-insensitive)
    pub pattern: String,
}

#[derive(Args)]
pub struct CheckArgs {
    /// Validate this file instead of the store
    #[arg(long)]
    pub file: Option<String>,
    /// Treat warnings as blocking too
    #[arg(long)]
    pub strict: bool,
    /// Skip duplicate-ID detection
    #[arg(long)]
    pub no_ids: bool,
}

// ---------------------------------------------------------------------------
// Write commands
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct ProjectArgs {
    /// Project name
    pub name: String,
    /// Optional description
    #[arg(long)]
    pub description: Option<String>,
}

#[derive(Args)]
pub struct AddArgs {
    /// Project (by ID or exact name)
    pub project: String,
    /// Todo text
    pub text: String,
}

#[derive(Args)]
pub struct SubArgs {
    /// Parent todo ID
    pub todo: String,
    /// Subtask text
    pub text: String,
}

#[derive(Args)]
pub struct DoneArgs {
    /// ID of a project, todo, or subtask
    pub id: String,
    /// Reopen instead of completing
    #[arg(long)]
    pub undo: bool,
}

#[derive(Args)]
pub struct DeleteArgs {
    /// ID of a project, todo, or subtask
    pub id: String,
}

// ---------------------------------------------------------------------------
// Import / export / backup
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct ImportArgs {
    /// JSON file to import
    pub file: String,
    /// Show format, validation report, and counts without committing
    #[arg(long)]
    pub dry_run: bool,
    /// Commit without asking for confirmation
    #[arg(short = 'y', long)]
    pub yes: bool,
}

#[derive(Args)]
pub struct ExportArgs {
    /// Destination file
    pub file: String,
}

#[derive(Args)]
pub struct BackupCmd {
    #[command(subcommand)]
    pub action: Option<BackupAction>,
}

#[derive(Subcommand)]
pub enum BackupAction {
    /// Write a new timestamped backup (the default)
    Create,
    /// List existing backups, newest first
    List,
    /// Delete all but the newest N backups
    Prune {
        /// How many backups to keep
        #[arg(long, default_value_t = 5)]
        keep: usize,
    },
}

use clap::{ArgAction, Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "tt", about = concat!("tt v", env!("CARGO_PKG_VERSION"), " - tile template directory"), version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Run against a different library directory
    #[arg(short = 'C', long = "library-dir", global = true)]
    pub library_dir: Option<String>,

    /// More log output on stderr (repeatable)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new tile library in the current directory
    Init(InitArgs),
    /// List the directory tree
    Ls(LsArgs),
    /// Show a template or folder
    Show(IdArg),
    /// Create a template at the end of a folder
    Add(AddArgs),
    /// Edit a template
    Edit(EditArgs),
    /// Delete a template
    Rm(IdArg),
    /// Move a template out of its folder to the root
    ClearFolder(IdArg),
    /// Move a template (simulates a drag-and-drop)
    Mv(MvArgs),
    /// Folder management
    Folder(FolderCmd),
    /// Print the drag payload for a template or folder
    Drag(IdArg),
    /// Drop a drag payload onto a target
    Drop(DropArgs),
    /// Export a template to a JSON file
    Export(ExportArgs),
    /// Overwrite a template with data from a JSON file
    Import(ImportArgs),
    /// Validate library integrity
    Check(CheckArgs),
    /// Read or change library.toml
    Config(ConfigCmd),
}

// ---------------------------------------------------------------------------
// Shared args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct IdArg {
    /// Template or folder ID
    pub id: String,
}

/// Where a moved entry is dropped. Exactly one is required.
#[derive(Args, Debug, Clone)]
#[group(required = true, multiple = false)]
pub struct TargetArgs {
    /// Place before this template
    #[arg(long, value_name = "TEMPLATE")]
    pub before: Option<String>,
    /// Place after this template
    #[arg(long, value_name = "TEMPLATE")]
    pub after: Option<String>,
    /// Drop onto this template; the direction follows the current order
    #[arg(long, value_name = "TEMPLATE")]
    pub beside: Option<String>,
    /// Drop onto a folder header (a collapsed folder takes it as a sibling)
    #[arg(long, value_name = "FOLDER")]
    pub onto: Option<String>,
    /// Drop into a folder's contents
    #[arg(long, value_name = "FOLDER")]
    pub into: Option<String>,
    /// Drop at the root
    #[arg(long)]
    pub root: bool,
}

// ---------------------------------------------------------------------------
// Init / read command args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct InitArgs {
    /// Library name (default: inferred from directory name)
    #[arg(long)]
    pub name: Option<String>,
    /// Reinitialize even if tiles/ already exists
    #[arg(long)]
    pub force: bool,
}

#[derive(Args)]
pub struct LsArgs {
    /// Expand every folder
    #[arg(long)]
    pub all: bool,
    /// Only show entries whose name matches this regex (case-insensitive)
    #[arg(long, short)]
    pub search: Option<String>,
}

// ---------------------------------------------------------------------------
// Template command args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct AddArgs {
    /// Template name
    pub name: String,
    /// Folder to create it in (default: root)
    #[arg(long)]
    pub folder: Option<String>,
    /// Image path
    #[arg(long)]
    pub image: Option<String>,
}

#[derive(Args)]
pub struct EditArgs {
    /// Template ID
    pub id: String,
    /// New name
    #[arg(long)]
    pub name: Option<String>,
    /// Move into this folder (placed last)
    #[arg(long, conflicts_with = "root")]
    pub folder: Option<String>,
    /// Move to the root (placed last)
    #[arg(long)]
    pub root: bool,
    /// New image path
    #[arg(long)]
    pub image: Option<String>,
}

#[derive(Args)]
pub struct MvArgs {
    /// Template ID
    pub id: String,
    #[command(flatten)]
    pub target: TargetArgs,
}

#[derive(Args)]
pub struct DropArgs {
    /// Drag payload text (as printed by `tt drag`), or `-` to read stdin
    pub payload: String,
    #[command(flatten)]
    pub target: TargetArgs,
}

#[derive(Args)]
pub struct ExportArgs {
    /// Template ID
    pub id: String,
    /// Output file (default: fvtt-tiledata-<name>.json in the current directory)
    #[arg(short, long)]
    pub output: Option<String>,
}

#[derive(Args)]
pub struct ImportArgs {
    /// Template ID to overwrite
    pub id: String,
    /// JSON file to import
    pub file: String,
}

#[derive(Args)]
pub struct CheckArgs {
    /// Clear dangling folder references and break folder cycles
    #[arg(long)]
    pub fix: bool,
}

// ---------------------------------------------------------------------------
// Folder management
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct FolderCmd {
    #[command(subcommand)]
    pub action: FolderAction,
}

#[derive(Subcommand)]
pub enum FolderAction {
    /// Create a folder
    Add(FolderAddArgs),
    /// Rename or restyle a folder
    Edit(FolderEditArgs),
    /// Remove a folder, moving its direct contents to the root
    Rm(IdArg),
    /// Delete a folder and everything inside it
    Delete(FolderDeleteArgs),
    /// Show a folder's contents in listings and drops
    Expand(IdArg),
    /// Hide a folder's contents
    Collapse(IdArg),
    /// Move a folder (simulates a drag-and-drop)
    Mv(MvArgs),
}

#[derive(Args)]
pub struct FolderAddArgs {
    /// Folder name
    pub name: String,
    /// Parent folder (default: root)
    #[arg(long)]
    pub parent: Option<String>,
    /// Color, e.g. "#aa3300"
    #[arg(long)]
    pub color: Option<String>,
    /// Child ordering: "m" (manual) or "a" (alphabetical)
    #[arg(long)]
    pub sorting: Option<String>,
}

#[derive(Args)]
pub struct FolderEditArgs {
    /// Folder ID
    pub id: String,
    /// New name
    #[arg(long)]
    pub name: Option<String>,
    /// New color; an empty string clears it
    #[arg(long)]
    pub color: Option<String>,
    /// Child ordering: "m" (manual) or "a" (alphabetical)
    #[arg(long)]
    pub sorting: Option<String>,
}

#[derive(Args)]
pub struct FolderDeleteArgs {
    /// Folder ID
    pub id: String,
    /// Skip confirmation prompt
    #[arg(long)]
    pub yes: bool,
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct ConfigCmd {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print one key, or every key when omitted
    Get(ConfigGetArgs),
    /// Set a key, e.g. `tt config set sorting.max_depth 3`
    Set(ConfigSetArgs),
}

#[derive(Args)]
pub struct ConfigGetArgs {
    /// Key as section.field
    pub key: Option<String>,
}

#[derive(Args)]
pub struct ConfigSetArgs {
    /// Key as section.field
    pub key: String,
    /// New value
    pub value: String,
}

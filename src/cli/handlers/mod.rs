mod init;
pub use init::cmd_init;

use std::collections::HashSet;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::warn;

/// Global override for library directory (set by -C flag)
static LIBRARY_DIR_OVERRIDE: Mutex<Option<PathBuf>> = Mutex::new(None);

use crate::cli::commands::*;
use crate::cli::output::*;
use crate::io::library_io::{self, LibraryError};
use crate::io::lock::LibraryLock;
use crate::io::state::{UiState, read_ui_state, write_ui_state};
use crate::io::store::atomic_write;
use crate::model::config::{LibraryConfig, UserConfig};
use crate::model::drag::{DragData, DragKind};
use crate::model::item::{DirectoryEntry, ItemKind, SortingMode};
use crate::model::library::Library;
use crate::ops::drop_ops::{self, DropContext, DropOutcome, DropTarget};
use crate::ops::sort::SortUpdate;
use crate::ops::tree::TreeIndex;
use crate::ops::{check, folder_ops, search, template_ops, transfer};

type CmdResult = Result<(), Box<dyn std::error::Error>>;

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub fn dispatch(cli: Cli) -> CmdResult {
    let json = cli.json;

    if let Some(ref dir) = cli.library_dir {
        let abs = std::fs::canonicalize(dir)
            .map_err(|e| format!("cannot resolve -C path '{}': {}", dir, e))?;
        LIBRARY_DIR_OVERRIDE
            .lock()
            .map_err(|_| "library dir override poisoned")?
            .replace(abs);
    }

    match cli.command {
        // Runs before a library exists
        Commands::Init(args) => cmd_init(args, cli.library_dir.as_deref()),

        // Read commands
        Commands::Ls(args) => cmd_ls(args, json),
        Commands::Show(args) => cmd_show(args, json),
        Commands::Drag(args) => cmd_drag(args),
        Commands::Check(args) => cmd_check(args, json),

        // Template commands
        Commands::Add(args) => cmd_add(args, json),
        Commands::Edit(args) => cmd_edit(args),
        Commands::Rm(args) => cmd_rm(args),
        Commands::ClearFolder(args) => cmd_clear_folder(args),
        Commands::Mv(args) => cmd_mv(args, ItemKind::Template, json),
        Commands::Drop(args) => cmd_drop(args, json),
        Commands::Export(args) => cmd_export(args, json),
        Commands::Import(args) => cmd_import(args),

        // Folders and config
        Commands::Folder(cmd) => cmd_folder(cmd, json),
        Commands::Config(cmd) => cmd_config(cmd, json),
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn library_root() -> Result<PathBuf, Box<dyn std::error::Error>> {
    let start = match LIBRARY_DIR_OVERRIDE
        .lock()
        .map_err(|_| "library dir override poisoned")?
        .as_ref()
    {
        Some(dir) => dir.clone(),
        None => std::env::current_dir()?,
    };
    Ok(library_io::discover_library(&start)?)
}

fn load_library_cwd() -> Result<Library, Box<dyn std::error::Error>> {
    let root = library_root()?;
    Ok(library_io::load_library(&root)?)
}

/// Lock `tiles/`, waiting as long as library.toml allows
fn lock_library(data_dir: &Path) -> Result<LibraryLock, Box<dyn std::error::Error>> {
    let (config, _) = library_io::read_config(data_dir)?;
    Ok(LibraryLock::acquire(data_dir, config.library.lock_timeout())?)
}

/// Take the write lock, then load. Hold the returned lock until saved.
fn lock_and_load() -> Result<(LibraryLock, Library), Box<dyn std::error::Error>> {
    let root = library_root()?;
    let lock = lock_library(&root.join(library_io::TILES_DIR))?;
    let library = library_io::load_library(&root)?;
    Ok((lock, library))
}

fn load_state(library: &Library) -> UiState {
    read_ui_state(&library.data_dir).unwrap_or_default()
}

fn require_gm(user: &UserConfig, action: &str) -> Result<(), String> {
    if user.gm {
        Ok(())
    } else {
        Err(format!("permission denied: only a GM can {}", action))
    }
}

fn require_modify(entry: &impl DirectoryEntry, user: &UserConfig) -> Result<(), String> {
    if entry.can_modify(user) {
        Ok(())
    } else {
        Err(format!(
            "permission denied: {} cannot modify \"{}\"",
            user.id,
            entry.label()
        ))
    }
}

fn template_index(library: &Library, id: &str) -> Result<usize, String> {
    library
        .templates
        .iter()
        .position(|t| t.id == id)
        .ok_or_else(|| format!("template not found: {}", id))
}

fn parse_sorting(raw: Option<&str>) -> Result<Option<SortingMode>, String> {
    raw.map(|s| {
        SortingMode::parse_mode(s)
            .ok_or_else(|| format!("invalid sorting \"{}\": use \"m\" or \"a\"", s))
    })
    .transpose()
}

/// Translate target flags into a drop target and direction
fn drop_target(args: &TargetArgs) -> (DropTarget, Option<bool>) {
    if let Some(id) = &args.before {
        (DropTarget::Template { id: id.clone() }, Some(true))
    } else if let Some(id) = &args.after {
        (DropTarget::Template { id: id.clone() }, Some(false))
    } else if let Some(id) = &args.beside {
        (DropTarget::Template { id: id.clone() }, None)
    } else if let Some(id) = &args.onto {
        (DropTarget::Folder { id: id.clone() }, None)
    } else if let Some(id) = &args.into {
        (DropTarget::FolderContents { id: id.clone() }, None)
    } else {
        (DropTarget::Root, None)
    }
}

/// Persist whichever list a drop changed and report it
fn apply_drop(
    library: &mut Library,
    payload: &str,
    target: &TargetArgs,
    json: bool,
) -> CmdResult {
    let drag = DragData::parse(payload)?;
    let kind = match drag.kind {
        DragKind::Template => ItemKind::Template,
        DragKind::Folder => ItemKind::Folder,
    };
    let id = drag.item_id()?.to_string();
    match drag.kind {
        DragKind::Template => {
            if let Some(t) = library.template(&id) {
                require_modify(t, &library.config.user)?;
            }
        }
        DragKind::Folder if drag.is_template_folder() => {
            if let Some(f) = library.folder(&id) {
                require_modify(f, &library.config.user)?;
            }
        }
        // handle_drop ignores folders from other directories
        DragKind::Folder => {}
    }

    let (target, sort_before) = drop_target(target);
    let expanded: HashSet<String> = load_state(library).expanded.into_iter().collect();
    let ctx = DropContext {
        max_depth: library.config.sorting.max_depth,
        density: library.config.sorting.density,
        expanded: &expanded,
    };
    let outcome = drop_ops::handle_drop(
        &library.templates,
        &library.folders,
        payload,
        &target,
        sort_before,
        &ctx,
    )?;
    outcome.apply(&mut library.templates, &mut library.folders);

    let updates: &[SortUpdate] = match &outcome {
        DropOutcome::Templates(updates) => {
            library_io::save_templates(library)?;
            updates.as_slice()
        }
        DropOutcome::Folders(updates) => {
            library_io::save_folders(library)?;
            updates.as_slice()
        }
        DropOutcome::Ignored => &[],
    };

    let ignored = outcome == DropOutcome::Ignored;
    if json {
        let out = MoveJson {
            kind,
            id,
            ignored,
            updates: updates.iter().map(update_to_json).collect(),
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else if ignored {
        eprintln!("nothing to move");
    } else {
        for line in format_updates(updates) {
            println!("{}", line);
        }
    }
    Ok(())
}

fn print_created(kind: ItemKind, id: &str, name: &str, json: bool) -> CmdResult {
    if json {
        let out = CreatedJson {
            kind,
            id: id.to_string(),
            name: name.to_string(),
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!("{}", id);
    }
    Ok(())
}

/// Ask on stderr, read y/n from stdin
fn confirm(prompt: &str) -> std::io::Result<bool> {
    eprint!("{} [y/n] ", prompt);
    let mut input = String::new();
    std::io::stdin().read_line(&mut input)?;
    Ok(input.trim().eq_ignore_ascii_case("y"))
}

// ---------------------------------------------------------------------------
// Read-only command handlers
// ---------------------------------------------------------------------------

fn cmd_ls(args: LsArgs, json: bool) -> CmdResult {
    let library = load_library_cwd()?;
    let mut state = load_state(&library);
    let index = TreeIndex::new(&library.folders, &library.templates);
    let tree = index.build_tree(library.config.sorting.root);

    let found = match &args.search {
        Some(pattern) => {
            let re = search::build_search_regex(pattern)
                .map_err(|e| format!("invalid search pattern: {}", e))?;
            Some(search::search(&index, &re))
        }
        None => None,
    };
    let vis = Visibility {
        all: args.all,
        expanded: &state.expanded,
        search: found.as_ref(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&tree_to_json(&tree, &vis))?);
    } else {
        let lines = format_tree(&tree, &vis);
        if lines.is_empty() {
            println!("(no templates)");
        }
        for line in &lines {
            println!("{}", line);
        }
    }

    if args.search.is_some() && state.last_search != args.search {
        state.last_search = args.search;
        if let Err(e) = write_ui_state(&library.data_dir, &state) {
            warn!(error = %e, "could not save last search");
        }
    }
    Ok(())
}

fn cmd_show(args: IdArg, json: bool) -> CmdResult {
    let library = load_library_cwd()?;
    let index = TreeIndex::new(&library.folders, &library.templates);

    if let Some(template) = index.template(&args.id) {
        if json {
            println!("{}", serde_json::to_string_pretty(template)?);
        } else {
            let folder_name = index
                .template_parent(&template.id)
                .and_then(|p| index.folder(p))
                .map(|f| f.name.as_str());
            for line in format_template_detail(template, folder_name) {
                println!("{}", line);
            }
        }
        return Ok(());
    }

    let folder = index
        .folder(&args.id)
        .ok_or_else(|| format!("no template or folder with id {}", args.id))?;
    if json {
        println!("{}", serde_json::to_string_pretty(folder)?);
    } else {
        let parent_name = index
            .folder_parent(&folder.id)
            .and_then(|p| index.folder(p))
            .map(|f| f.name.as_str());
        let expanded = load_state(&library).is_expanded(&folder.id);
        for line in format_folder_detail(folder, parent_name, index.depth(&folder.id), expanded) {
            println!("{}", line);
        }
    }
    Ok(())
}

fn cmd_drag(args: IdArg) -> CmdResult {
    let library = load_library_cwd()?;
    let drag = if let Some(template) = library.template(&args.id) {
        DragData::from_template(template)?
    } else {
        let folder = library
            .folder(&args.id)
            .ok_or_else(|| format!("no template or folder with id {}", args.id))?;
        DragData::from_folder(folder)?
    };
    println!("{}", drag.to_text()?);
    Ok(())
}

// ---------------------------------------------------------------------------
// Check and repair
// ---------------------------------------------------------------------------

fn cmd_check(args: CheckArgs, json: bool) -> CmdResult {
    let (_lock, mut library) = if args.fix {
        let (lock, library) = lock_and_load()?;
        (Some(lock), library)
    } else {
        (None, load_library_cwd()?)
    };

    let repaired = if args.fix {
        let summary = check::repair(&mut library.templates, &mut library.folders);
        if !summary.templates_to_root.is_empty() {
            library_io::save_templates(&library)?;
        }
        if !summary.folders_to_root.is_empty() || !summary.cycles_broken.is_empty() {
            library_io::save_folders(&library)?;
        }
        Some(summary)
    } else {
        None
    };

    let result = check::check_library(
        &library.templates,
        &library.folders,
        library.config.sorting.max_depth,
    );

    if json {
        let out = CheckJson {
            result: &result,
            repaired: repaired.as_ref(),
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    if let Some(summary) = &repaired {
        for id in &summary.templates_to_root {
            println!("fixed: template {} moved to root (missing folder)", id);
        }
        for id in &summary.folders_to_root {
            println!("fixed: folder {} moved to root (missing parent)", id);
        }
        for id in &summary.cycles_broken {
            println!("fixed: folder {} moved to root (cycle)", id);
        }
    }
    if !result.errors.is_empty() {
        println!("Errors:");
        for err in &result.errors {
            match err {
                check::CheckError::DuplicateId { kind, id, count } => {
                    println!("  {} id {} is used {} times", kind, id, count);
                }
                check::CheckError::FolderCycle { folder_id } => {
                    println!("  folder {} is its own ancestor", folder_id);
                }
                check::CheckError::DepthExceeded {
                    folder_id,
                    depth,
                    max_depth,
                } => {
                    println!(
                        "  folder {} is nested {} deep (max {})",
                        folder_id, depth, max_depth
                    );
                }
            }
        }
    }
    if !result.warnings.is_empty() {
        if !result.errors.is_empty() {
            println!();
        }
        println!("Warnings:");
        for warning in &result.warnings {
            match warning {
                check::CheckWarning::DanglingTemplateFolder {
                    template_id,
                    folder_id,
                } => {
                    println!(
                        "  template {} is in missing folder {}",
                        template_id, folder_id
                    );
                }
                check::CheckWarning::DanglingFolderParent {
                    folder_id,
                    parent_id,
                } => {
                    println!("  folder {} has missing parent {}", folder_id, parent_id);
                }
                check::CheckWarning::EmptyName { kind, id } => {
                    println!("  {} {} has no name", kind, id);
                }
            }
        }
    }
    if result.valid {
        println!("✓ library is valid");
    } else {
        println!("✗ library has errors");
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Template CRUD handlers
// ---------------------------------------------------------------------------

fn cmd_add(args: AddArgs, json: bool) -> CmdResult {
    let (_lock, mut library) = lock_and_load()?;
    require_gm(&library.config.user, "create templates")?;

    let id = template_ops::create_template(
        &mut library.templates,
        &library.folders,
        template_ops::NewTemplate {
            name: args.name,
            folder: args.folder,
            image: args.image,
        },
        &library.config,
    )?;
    library_io::save_templates(&library)?;

    let name = library.template(&id).map(|t| t.name.clone()).unwrap_or_default();
    print_created(ItemKind::Template, &id, &name, json)
}

fn cmd_edit(args: EditArgs) -> CmdResult {
    let (_lock, mut library) = lock_and_load()?;
    let idx = template_index(&library, &args.id)?;
    require_modify(&library.templates[idx], &library.config.user)?;

    let folder = if args.root {
        Some(None)
    } else {
        args.folder.map(Some)
    };
    template_ops::edit_template(
        &mut library.templates,
        &library.folders,
        &args.id,
        template_ops::TemplateEdit {
            name: args.name,
            folder,
            image: args.image,
        },
        &library.config,
    )?;
    library_io::save_templates(&library)?;
    println!("{}", args.id);
    Ok(())
}

fn cmd_rm(args: IdArg) -> CmdResult {
    let (_lock, mut library) = lock_and_load()?;
    let idx = template_index(&library, &args.id)?;
    require_modify(&library.templates[idx], &library.config.user)?;

    let removed = template_ops::delete_template(&mut library.templates, &args.id)?;
    library_io::save_templates(&library)?;
    println!("deleted {} ({})", removed.name, removed.id);
    Ok(())
}

fn cmd_clear_folder(args: IdArg) -> CmdResult {
    let (_lock, mut library) = lock_and_load()?;
    let idx = template_index(&library, &args.id)?;
    require_modify(&library.templates[idx], &library.config.user)?;

    if template_ops::clear_folder(&mut library.templates, &args.id)? {
        library_io::save_templates(&library)?;
        println!("{} moved to root", args.id);
    } else {
        println!("{} is already at root", args.id);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Move and drop handlers
// ---------------------------------------------------------------------------

fn cmd_mv(args: MvArgs, kind: ItemKind, json: bool) -> CmdResult {
    let (_lock, mut library) = lock_and_load()?;
    let drag = match kind {
        ItemKind::Template => {
            let template = library
                .template(&args.id)
                .ok_or_else(|| format!("template not found: {}", args.id))?;
            DragData::from_template(template)?
        }
        ItemKind::Folder => {
            let folder = library
                .folder(&args.id)
                .ok_or_else(|| format!("folder not found: {}", args.id))?;
            DragData::from_folder(folder)?
        }
    };
    let payload = drag.to_text()?;
    apply_drop(&mut library, &payload, &args.target, json)
}

fn cmd_drop(args: DropArgs, json: bool) -> CmdResult {
    let payload = if args.payload == "-" {
        let mut text = String::new();
        std::io::stdin().read_to_string(&mut text)?;
        text
    } else {
        args.payload
    };
    let (_lock, mut library) = lock_and_load()?;
    apply_drop(&mut library, payload.trim(), &args.target, json)
}

// ---------------------------------------------------------------------------
// Import and export handlers
// ---------------------------------------------------------------------------

fn cmd_export(args: ExportArgs, json: bool) -> CmdResult {
    let library = load_library_cwd()?;
    require_gm(&library.config.user, "export templates")?;
    let template = library
        .template(&args.id)
        .ok_or_else(|| format!("template not found: {}", args.id))?;

    let text = transfer::export_text(template, &library.config.export)?;
    let path = match args.output {
        Some(p) => PathBuf::from(p),
        None => std::env::current_dir()?.join(transfer::export_filename(&template.name)),
    };
    atomic_write(&path, text.as_bytes())
        .map_err(|e| format!("could not write {}: {}", path.display(), e))?;

    if json {
        let out = ExportedJson {
            id: template.id.clone(),
            path: path.display().to_string(),
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!("{}", path.display());
    }
    Ok(())
}

fn cmd_import(args: ImportArgs) -> CmdResult {
    let (_lock, mut library) = lock_and_load()?;
    require_gm(&library.config.user, "import templates")?;
    let idx = template_index(&library, &args.id)?;

    let text = transfer::read_import_file(Path::new(&args.file))?;
    let imported = transfer::import_template(&library.templates[idx], &text, &library.config)?;
    let name = imported.name.clone();
    library.templates[idx] = imported;
    library_io::save_templates(&library)?;
    println!("imported {} into {} ({})", args.file, name, args.id);
    Ok(())
}

// ---------------------------------------------------------------------------
// Folder command handlers
// ---------------------------------------------------------------------------

fn cmd_folder(cmd: FolderCmd, json: bool) -> CmdResult {
    match cmd.action {
        FolderAction::Add(args) => cmd_folder_add(args, json),
        FolderAction::Edit(args) => cmd_folder_edit(args),
        FolderAction::Rm(args) => cmd_folder_rm(args, json),
        FolderAction::Delete(args) => cmd_folder_delete(args, json),
        FolderAction::Expand(args) => cmd_folder_expand(args, true),
        FolderAction::Collapse(args) => cmd_folder_expand(args, false),
        FolderAction::Mv(args) => cmd_mv(args, ItemKind::Folder, json),
    }
}

fn cmd_folder_add(args: FolderAddArgs, json: bool) -> CmdResult {
    let (_lock, mut library) = lock_and_load()?;
    require_gm(&library.config.user, "create folders")?;
    let sorting = parse_sorting(args.sorting.as_deref())?.unwrap_or_default();

    let id = folder_ops::create_folder(
        &mut library.folders,
        folder_ops::NewFolder {
            name: args.name,
            parent: args.parent,
            color: args.color,
            sorting,
        },
        library.config.sorting.max_depth,
        library.config.sorting.density,
    )?;
    library_io::save_folders(&library)?;

    let name = library.folder(&id).map(|f| f.name.clone()).unwrap_or_default();
    print_created(ItemKind::Folder, &id, &name, json)
}

fn cmd_folder_edit(args: FolderEditArgs) -> CmdResult {
    let (_lock, mut library) = lock_and_load()?;
    let folder = library
        .folder(&args.id)
        .ok_or_else(|| format!("folder not found: {}", args.id))?;
    require_modify(folder, &library.config.user)?;

    folder_ops::edit_folder(
        &mut library.folders,
        &args.id,
        folder_ops::FolderEdit {
            name: args.name,
            color: args.color,
            sorting: parse_sorting(args.sorting.as_deref())?,
        },
    )?;
    library_io::save_folders(&library)?;
    println!("{}", args.id);
    Ok(())
}

/// Drop expanded-state entries for folders that no longer exist
fn prune_state(library: &Library) {
    let mut state = load_state(library);
    let before = state.expanded.len();
    state.retain_folders(|id| library.folder(id).is_some());
    if state.expanded.len() != before
        && let Err(e) = write_ui_state(&library.data_dir, &state)
    {
        warn!(error = %e, "could not update folder state");
    }
}

fn cmd_folder_rm(args: IdArg, json: bool) -> CmdResult {
    let (_lock, mut library) = lock_and_load()?;
    require_gm(&library.config.user, "remove folders")?;

    let summary =
        folder_ops::remove_folder(&mut library.folders, &mut library.templates, &args.id)?;
    library_io::save_folders(&library)?;
    if !summary.templates_moved.is_empty() {
        library_io::save_templates(&library)?;
    }
    prune_state(&library);

    if json {
        println!("{}", serde_json::to_string_pretty(&removed_to_json(&summary))?);
    } else {
        println!(
            "removed {}; {} folders and {} templates moved to root",
            args.id,
            summary.folders_moved.len(),
            summary.templates_moved.len()
        );
    }
    Ok(())
}

fn cmd_folder_delete(args: FolderDeleteArgs, json: bool) -> CmdResult {
    let (_lock, mut library) = lock_and_load()?;
    require_gm(&library.config.user, "delete folders")?;
    let folder = library
        .folder(&args.id)
        .ok_or_else(|| format!("folder not found: {}", args.id))?;

    if !args.yes
        && !confirm(&format!(
            "Delete \"{}\" and everything inside it?",
            folder.name
        ))?
    {
        println!("cancelled");
        return Ok(());
    }

    let summary =
        folder_ops::delete_folder(&mut library.folders, &mut library.templates, &args.id)?;
    library_io::save_folders(&library)?;
    if !summary.templates_deleted.is_empty() {
        library_io::save_templates(&library)?;
    }
    prune_state(&library);

    if json {
        println!("{}", serde_json::to_string_pretty(&deleted_to_json(&summary))?);
    } else {
        println!(
            "deleted {} folders and {} templates",
            summary.folders_deleted.len(),
            summary.templates_deleted.len()
        );
    }
    Ok(())
}

fn cmd_folder_expand(args: IdArg, expanded: bool) -> CmdResult {
    let (_lock, library) = lock_and_load()?;
    library
        .folder(&args.id)
        .ok_or_else(|| format!("folder not found: {}", args.id))?;

    let mut state = load_state(&library);
    if state.set_expanded(&args.id, expanded) {
        write_ui_state(&library.data_dir, &state)?;
    }
    println!(
        "{} {}",
        args.id,
        if expanded { "expanded" } else { "collapsed" }
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

fn cmd_config(cmd: ConfigCmd, json: bool) -> CmdResult {
    match cmd.action {
        ConfigAction::Get(args) => cmd_config_get(args, json),
        ConfigAction::Set(args) => cmd_config_set(args),
    }
}

fn cmd_config_get(args: ConfigGetArgs, json: bool) -> CmdResult {
    let root = library_root()?;
    let (config, _) = library_io::read_config(&root.join(library_io::TILES_DIR))?;

    let keys: Vec<String> = match args.key {
        Some(key) => vec![key],
        None => library_io::config_keys().map(str::to_string).collect(),
    };
    let mut entries = Vec::with_capacity(keys.len());
    for key in keys {
        let value = library_io::get_config_value(&config, &key)?;
        entries.push(ConfigEntryJson { key, value });
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
    } else if entries.len() == 1 {
        println!("{}", entries[0].value);
    } else {
        for entry in &entries {
            println!("{} = {}", entry.key, entry.value);
        }
    }
    Ok(())
}

fn cmd_config_set(args: ConfigSetArgs) -> CmdResult {
    let root = library_root()?;
    let data_dir = root.join(library_io::TILES_DIR);
    let _lock = lock_library(&data_dir)?;

    let (_, mut doc) = library_io::read_config(&data_dir)?;
    library_io::set_config_value(&mut doc, &args.key, &args.value)?;
    // Reject edits that leave the file unloadable
    toml::from_str::<LibraryConfig>(&doc.to_string()).map_err(LibraryError::from)?;
    library_io::write_config(&data_dir, &doc)?;
    println!("{} = {}", args.key, args.value);
    Ok(())
}

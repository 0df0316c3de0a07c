use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgGroup, Parser, Subcommand};
use shelf::metadata::{MetadataFetcher, analyze_link};
use shelf::service::validate_url;
use shelf::share::{ShareOutcome, process_shared_link};
use shelf::utils::{ensure_database_directory, format_date, parse_due_date};
use shelf::{
    BulkAction, CategoryFilter, Config, Database, Link, LinkError, LinkId, LinkMetadata,
    LinkService, LinkStatus, LinkUpdate, ListLinksOptions, NewLink, SortConfig, SortDirection,
    SortKey, StatusFilter, UNCATEGORIZED,
};
use time::OffsetDateTime;
use tracing_subscriber::EnvFilter;

/// shelf - a personal link organizer with AI-generated summaries
#[derive(Parser)]
#[command(name = "shelf")]
#[command(about = "A personal link organizer with AI-generated summaries")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand)]
enum Commands {
    /// Save a link and fetch its title, summary and category
    Add(AddCommand),
    /// Save the first URL found in shared text
    Share(ShareCommand),
    /// List saved links
    List(ListCommand),
    /// Show every field of one link
    Show(IdArg),
    /// Flip a link between pending and done
    Toggle(IdArg),
    /// Edit a link's title, summary, category or due date
    Edit(EditCommand),
    /// Delete a link
    Delete(IdArg),
    /// Delete every completed link
    ClearCompleted,
    /// Run an in-depth AI analysis and save it as the link's summary
    Analyze(IdArg),
    /// Manage categories
    #[command(subcommand)]
    Category(CategoryCommand),
    /// Apply one action to several links
    Bulk(BulkCommand),
    /// Show totals and per-category counts
    Stats,
    /// Set the default sort order
    Sort(SortCommand),
    /// Write all links as JSON to a file or stdout
    Export(ExportCommand),
    /// Add links from a JSON export
    Import(ImportCommand),
    /// Launch the interactive terminal UI
    Tui,
}

#[derive(Parser)]
struct AddCommand {
    /// The URL to save
    #[arg(value_name = "URL")]
    url: String,

    /// Due date (YYYY-MM-DD)
    #[arg(long, value_name = "DATE")]
    due: Option<String>,

    /// Skip the AI request and use the URL as title
    #[arg(long)]
    no_ai: bool,
}

#[derive(Parser)]
struct ShareCommand {
    /// Shared text containing a URL
    #[arg(value_name = "TEXT")]
    text: Option<String>,

    /// Shared URL; takes priority over TEXT
    #[arg(long, value_name = "URL")]
    url: Option<String>,
}

#[derive(Parser)]
struct ListCommand {
    /// Show only pending, done or all links
    #[arg(long, value_name = "STATUS", default_value = "all")]
    status: StatusFilter,

    /// Show only links in this category
    #[arg(long, value_name = "CATEGORY")]
    category: Option<String>,

    /// Sort by created, title, status or due (defaults to the saved order)
    #[arg(long, value_name = "KEY")]
    sort: Option<SortKey>,

    /// Ascending order
    #[arg(long, conflicts_with = "desc")]
    asc: bool,

    /// Descending order
    #[arg(long)]
    desc: bool,
}

#[derive(Parser)]
struct IdArg {
    /// Link ID
    #[arg(value_name = "ID")]
    id: LinkId,
}

#[derive(Parser)]
#[command(group(ArgGroup::new("changes").required(true).multiple(true)))]
struct EditCommand {
    /// Link ID
    #[arg(value_name = "ID")]
    id: LinkId,

    #[arg(long, group = "changes")]
    title: Option<String>,

    #[arg(long, group = "changes")]
    summary: Option<String>,

    #[arg(long, group = "changes")]
    category: Option<String>,

    /// New due date (YYYY-MM-DD)
    #[arg(long, value_name = "DATE", group = "changes", conflicts_with = "clear_due")]
    due: Option<String>,

    /// Remove the due date
    #[arg(long, group = "changes")]
    clear_due: bool,
}

#[derive(Subcommand)]
enum CategoryCommand {
    /// List categories
    List,
    /// Add a category
    Add {
        #[arg(value_name = "NAME")]
        name: String,
    },
    /// Rename a category and relabel its links
    Rename {
        #[arg(value_name = "OLD")]
        old: String,
        #[arg(value_name = "NEW")]
        new: String,
    },
    /// Delete a category; its links move to Uncategorized
    Delete {
        #[arg(value_name = "NAME")]
        name: String,
    },
}

#[derive(Parser)]
#[command(group(ArgGroup::new("action").required(true).args(["delete", "status", "category"])))]
struct BulkCommand {
    /// Comma-separated link IDs
    #[arg(value_name = "IDS", value_delimiter = ',', required = true)]
    ids: Vec<LinkId>,

    /// Delete the links
    #[arg(long)]
    delete: bool,

    /// Set the status (pending or done)
    #[arg(long, value_name = "STATUS")]
    status: Option<LinkStatus>,

    /// Move the links to a category
    #[arg(long, value_name = "CATEGORY")]
    category: Option<String>,
}

#[derive(Parser)]
struct SortCommand {
    /// created, title, status or due
    #[arg(value_name = "KEY")]
    key: SortKey,

    #[arg(long, conflicts_with = "desc")]
    asc: bool,

    #[arg(long)]
    desc: bool,
}

#[derive(Parser)]
struct ExportCommand {
    /// Output file; stdout when omitted
    #[arg(value_name = "FILE")]
    file: Option<PathBuf>,
}

#[derive(Parser)]
struct ImportCommand {
    #[arg(value_name = "FILE")]
    file: PathBuf,
}

fn main() {
    let cli = Cli::parse();

    if !matches!(cli.command, Commands::Tui) {
        init_logging();
    }
    let config = Config::load();

    let result = match cli.command {
        Commands::Tui => shelf::tui::run(&config),
        command => open_service(&config).and_then(|service| dispatch(command, &service, &config)),
    };

    if let Err(e) = result {
        let exit_code = if is_user_error(&e) { 1 } else { 2 };
        eprintln!("Error: {e:#}");
        std::process::exit(exit_code);
    }
}

/// Logs to stderr; `RUST_LOG` overrides the default `warn` level.
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Determines if an error is a user error (vs internal error).
///
/// User errors are validation failures such as an invalid URL, an unknown
/// link ID or a malformed date. Everything else (database, I/O, network) is
/// internal.
fn is_user_error(error: &anyhow::Error) -> bool {
    error
        .chain()
        .any(|cause| cause.is::<LinkError>() || cause.is::<time::error::Parse>())
}

fn open_service(config: &Config) -> Result<LinkService> {
    let db_path = config.database_path()?;
    ensure_database_directory(&db_path)?;
    let db = Database::open(&db_path).context("Failed to open database")?;
    Ok(LinkService::new(db))
}

fn dispatch(command: Commands, service: &LinkService, config: &Config) -> Result<()> {
    match command {
        Commands::Add(cmd) => {
            let fetcher = if cmd.no_ai {
                None
            } else {
                Some(MetadataFetcher::from_config(config)?)
            };
            execute_add(service, fetcher.as_ref(), &cmd)
        }
        Commands::Share(cmd) => {
            let fetcher = MetadataFetcher::from_config(config)?;
            execute_share(service, &fetcher, &cmd)
        }
        Commands::List(cmd) => execute_list(service, &cmd),
        Commands::Show(arg) => execute_show(service, arg.id),
        Commands::Toggle(arg) => execute_toggle(service, arg.id),
        Commands::Edit(cmd) => execute_edit(service, &cmd),
        Commands::Delete(arg) => execute_delete(service, arg.id),
        Commands::ClearCompleted => {
            let removed = service.clear_completed()?;
            println!("Removed {removed} completed link(s)");
            Ok(())
        }
        Commands::Analyze(arg) => {
            let fetcher = MetadataFetcher::from_config(config)?;
            execute_analyze(service, &fetcher, arg.id)
        }
        Commands::Category(cmd) => execute_category(service, &cmd),
        Commands::Bulk(cmd) => execute_bulk(service, &cmd),
        Commands::Stats => execute_stats(service),
        Commands::Sort(cmd) => execute_sort(service, &cmd),
        Commands::Export(cmd) => execute_export(service, &cmd),
        Commands::Import(cmd) => execute_import(service, &cmd),
        Commands::Tui => shelf::tui::run(config),
    }
}

fn require_link(service: &LinkService, id: LinkId) -> Result<Link> {
    Ok(service.get_link(id)?.ok_or(LinkError::NotFound(id))?)
}

/// Saves a link, fetching AI metadata unless `fetcher` is `None`.
fn execute_add(
    service: &LinkService,
    fetcher: Option<&MetadataFetcher>,
    cmd: &AddCommand,
) -> Result<()> {
    let due_date = cmd.due.as_deref().map(parse_due_date).transpose()?;
    let url = validate_url(&cmd.url)?;
    let url = url.as_str();

    if let Some(existing) = service.find_by_url(url)? {
        println!("Already saved (id: {}): {}", existing.id(), existing.title());
        return Ok(());
    }

    let metadata = match fetcher {
        Some(fetcher) => fetcher.fetch_link_metadata(url),
        None => LinkMetadata::new(url, "", UNCATEGORIZED),
    };

    match service.add_link(NewLink::new(url, metadata).due_date(due_date))? {
        Some(link) => {
            println!("Link saved (id: {}): {}", link.id(), link.title());
            println!("Category: {}", link.category());
            if link.is_error() {
                println!("Note: the summary could not be fetched for this link.");
            }
        }
        None => println!("Already saved: {url}"),
    }
    Ok(())
}

fn execute_analyze(service: &LinkService, fetcher: &MetadataFetcher, id: LinkId) -> Result<()> {
    let link = analyze_link(service, fetcher, id)?.ok_or(LinkError::NotFound(id))?;
    println!("{}", link.summary());
    println!();
    println!("Saved as the summary of link {}", link.id());
    Ok(())
}

fn execute_share(service: &LinkService, fetcher: &MetadataFetcher, cmd: &ShareCommand) -> Result<()> {
    match process_shared_link(service, fetcher, cmd.url.as_deref(), cmd.text.as_deref())? {
        ShareOutcome::Saved(link) => println!("Link saved (id: {}): {}", link.id(), link.title()),
        ShareOutcome::AlreadySaved(link) => {
            println!("Already saved (id: {}): {}", link.id(), link.title());
        }
        ShareOutcome::NoUrl => println!("No URL found in shared content"),
    }
    Ok(())
}

fn execute_list(service: &LinkService, cmd: &ListCommand) -> Result<()> {
    let mut sort = service.sort_config()?;
    if let Some(key) = cmd.sort {
        sort.key = key;
    }
    if let Some(direction) = direction_flag(cmd.asc, cmd.desc) {
        sort.direction = direction;
    }

    let options = ListLinksOptions {
        status: cmd.status,
        category: cmd
            .category
            .clone()
            .map_or(CategoryFilter::All, CategoryFilter::Named),
        sort,
    };
    let links = service.list_links(&options)?;

    if links.is_empty() {
        println!("No links found");
        return Ok(());
    }

    let now = OffsetDateTime::now_utc();
    for link in &links {
        println!("{}", format_link_line(link, now));
    }
    Ok(())
}

fn execute_show(service: &LinkService, id: LinkId) -> Result<()> {
    let link = require_link(service, id)?;
    print!("{}", format_link_detail(&link));
    Ok(())
}

fn execute_toggle(service: &LinkService, id: LinkId) -> Result<()> {
    let link = service
        .toggle_status(id)?
        .ok_or(LinkError::NotFound(id))?;
    println!("Link {} marked {}", link.id(), link.status());
    Ok(())
}

fn execute_edit(service: &LinkService, cmd: &EditCommand) -> Result<()> {
    let due_date = if cmd.clear_due {
        Some(None)
    } else {
        cmd.due
            .as_deref()
            .map(parse_due_date)
            .transpose()?
            .map(Some)
    };

    let update = LinkUpdate {
        title: cmd.title.clone(),
        summary: cmd.summary.clone(),
        category: cmd.category.clone(),
        status: None,
        due_date,
    };

    let link = service
        .update_link(cmd.id, update)?
        .ok_or(LinkError::NotFound(cmd.id))?;
    println!("Link {} updated: {}", link.id(), link.title());
    Ok(())
}

fn execute_delete(service: &LinkService, id: LinkId) -> Result<()> {
    if service.delete_link(id)? {
        println!("Link {id} deleted");
    } else {
        println!("No link with id {id}");
    }
    Ok(())
}

fn execute_category(service: &LinkService, cmd: &CategoryCommand) -> Result<()> {
    match cmd {
        CategoryCommand::List => {
            for name in service.list_categories()? {
                println!("{name}");
            }
        }
        CategoryCommand::Add { name } => {
            if service.add_category(name)? {
                println!("Category '{}' added", name.trim());
            } else {
                println!("Category '{}' already exists", name.trim());
            }
        }
        CategoryCommand::Rename { old, new } => {
            let moved = service.rename_category(old, new)?;
            println!(
                "Category '{}' renamed to '{}' ({moved} link(s) relabeled)",
                old.trim(),
                new.trim()
            );
        }
        CategoryCommand::Delete { name } => {
            let moved = service.delete_category(name)?;
            println!(
                "Category '{}' deleted ({moved} link(s) moved to {UNCATEGORIZED})",
                name.trim()
            );
        }
    }
    Ok(())
}

fn execute_bulk(service: &LinkService, cmd: &BulkCommand) -> Result<()> {
    let action = bulk_action(cmd)?;
    let affected = service.bulk_apply(&cmd.ids, &action)?;
    let verb = match action {
        BulkAction::Delete => "Deleted".to_string(),
        BulkAction::SetStatus(status) => format!("Marked {status}"),
        BulkAction::SetCategory(category) => format!("Moved to '{category}'"),
    };
    println!("{verb}: {affected} link(s)");
    Ok(())
}

fn bulk_action(cmd: &BulkCommand) -> Result<BulkAction> {
    if cmd.delete {
        return Ok(BulkAction::Delete);
    }
    if let Some(status) = cmd.status {
        return Ok(BulkAction::SetStatus(status));
    }
    match &cmd.category {
        Some(category) => Ok(BulkAction::SetCategory(category.clone())),
        None => anyhow::bail!("No bulk action given"),
    }
}

fn execute_stats(service: &LinkService) -> Result<()> {
    let stats = service.stats()?;
    println!("Total links: {}", stats.total);
    println!("Pending:     {}", stats.pending);
    println!("Completed:   {} ({}%)", stats.completed, stats.completion_percent());
    if !stats.categories.is_empty() {
        println!();
        println!("By category:");
        for (name, count) in &stats.categories {
            println!("  {name}: {count}");
        }
    }
    Ok(())
}

fn execute_sort(service: &LinkService, cmd: &SortCommand) -> Result<()> {
    let current = service.sort_config()?;
    let direction = direction_flag(cmd.asc, cmd.desc).unwrap_or(current.direction);
    let config = SortConfig::new(cmd.key, direction);
    service.set_sort_config(config)?;
    println!("Sorting by {} ({})", config.key, config.direction);
    Ok(())
}

fn execute_export(service: &LinkService, cmd: &ExportCommand) -> Result<()> {
    let json = service.export_json()?;
    match &cmd.file {
        Some(path) => {
            std::fs::write(path, json)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("Exported links to {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn execute_import(service: &LinkService, cmd: &ImportCommand) -> Result<()> {
    let json = std::fs::read_to_string(&cmd.file)
        .with_context(|| format!("Failed to read {}", cmd.file.display()))?;
    let imported = service.import_json(&json)?;
    println!("Imported {imported} link(s)");
    Ok(())
}

fn direction_flag(asc: bool, desc: bool) -> Option<SortDirection> {
    match (asc, desc) {
        (true, _) => Some(SortDirection::Asc),
        (_, true) => Some(SortDirection::Desc),
        _ => None,
    }
}

/// One-line summary used by `list`.
///
/// Format: `[x] #ID Title (Category) due YYYY-MM-DD - URL`, with the due date
/// flagged when overdue.
fn format_link_line(link: &Link, now: OffsetDateTime) -> String {
    let check = if link.status().is_done() { "x" } else { " " };
    let mut line = format!(
        "[{check}] #{} {} ({})",
        link.id(),
        link.title(),
        link.category()
    );
    if let Some(due) = link.due_date() {
        line.push_str(&format!(" due {}", format_date(due)));
        if link.is_overdue(now) {
            line.push_str(" OVERDUE");
        }
    }
    line.push_str(&format!(" - {}", link.url()));
    line
}

fn format_link_detail(link: &Link) -> String {
    let mut out = String::new();
    out.push_str(&format!("#{} {}\n", link.id(), link.title()));
    out.push_str(&format!("URL:      {}\n", link.url()));
    out.push_str(&format!("Category: {}\n", link.category()));
    out.push_str(&format!("Status:   {}\n", link.status()));
    out.push_str(&format!("Saved:    {}\n", format_date(link.created_at())));
    if let Some(due) = link.due_date() {
        out.push_str(&format!("Due:      {}\n", format_date(due)));
    }
    if !link.summary().is_empty() {
        out.push_str(&format!("\n{}\n", link.summary()));
    }
    if !link.sources().is_empty() {
        out.push_str("\nSources:\n");
        for source in link.sources() {
            out.push_str(&format!("  - {} <{}>\n", source.title, source.uri));
        }
    }
    out
}

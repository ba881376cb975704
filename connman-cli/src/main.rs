//! `cm` - Command-line interface for the `ConnManager` connection manager
//!
//! Provides commands for adding, editing, listing, searching and deleting
//! connections, launching a client for a stored connection, and exchanging
//! connections with JSON files.

use std::fmt::Write as _;
use std::io::{self, BufRead, Write as _};
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use connman_core::config::{ConfigManager, ResolvedConfig};
use connman_core::error::{ConfigError, ConnManError, ExchangeError, LaunchError, StoreError};
use connman_core::models::{
    Connection, ConnectionChanges, ConnectionDraft, FieldUpdate, ProtocolType, Resolution,
};
use connman_core::protocol::{
    build_launch_command, detect_client, prepare_connect, PasswordHandoff, Protocol,
    ProtocolRegistry,
};
use connman_core::search::{ConnectionFilter, SearchError, SearchQuery};
use connman_core::store::ConnectionStore;
use connman_core::{export_all, import_all, AppContext, Confirmation, ConflictPolicy};
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// `ConnManager` command-line interface for managing remote connections
#[derive(Parser)]
#[command(name = "cm")]
#[command(author, version, about = "Personal connection manager with an encrypted store")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub debug: bool,

    /// Path to the configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to the connection database (overrides the configuration)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Path to the encryption key file (overrides the configuration)
    #[arg(long, global = true)]
    pub key: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Add a new connection
    #[command(visible_alias = "a", about = "Add a new connection to the store")]
    Add {
        /// Unique alias for the new connection
        alias: String,

        /// Host address (hostname, IP or URL)
        #[arg(short = 'H', long)]
        host: String,

        /// Protocol type (ssh, rdp, vnc, vmrc, http)
        #[arg(short = 'P', long, default_value = "ssh")]
        protocol: ProtocolType,

        /// Port number (defaults to the protocol default)
        #[arg(short, long)]
        port: Option<u16>,

        /// Username for authentication
        #[arg(short, long)]
        user: Option<String>,

        /// Prompt for a password to store encrypted
        #[arg(long)]
        password: bool,

        /// Path to SSH private key file
        #[arg(short, long)]
        key_file: Option<PathBuf>,

        /// Windows domain (RDP)
        #[arg(long)]
        domain: Option<String>,

        /// Window size as WIDTHxHEIGHT (RDP)
        #[arg(long)]
        resolution: Option<Resolution>,

        /// Tags, repeated or comma-separated
        #[arg(short, long = "tag", value_delimiter = ',')]
        tags: Vec<String>,

        /// Free-form notes
        #[arg(short, long)]
        notes: Option<String>,

        /// Additional client option as KEY=VALUE
        #[arg(short, long = "extra", value_name = "KEY=VALUE", value_parser = parse_extra)]
        extras: Vec<(String, String)>,
    },

    /// Connect to a server by alias or ID
    #[command(visible_alias = "c", about = "Launch the client for a stored connection")]
    Connect {
        /// Connection alias or ID
        target: String,
    },

    /// List connections
    #[command(visible_alias = "l", about = "List connections, optionally by protocol or tag")]
    List {
        /// Protocol name or tag to filter by
        protocol_or_tag: Option<String>,

        /// Output format for the connection list
        #[arg(short, long, default_value = "table", value_enum)]
        format: OutputFormat,
    },

    /// Search connections
    #[command(visible_alias = "s", about = "Search connections by text")]
    Search {
        /// Text to look for; supports `protocol:` and `tag:` operators
        text: String,

        /// Output format for the results
        #[arg(short, long, default_value = "table", value_enum)]
        format: OutputFormat,
    },

    /// Show connection details
    #[command(about = "Show connection details")]
    Show {
        /// Connection alias or ID
        target: String,

        /// Print the decrypted password
        #[arg(long)]
        reveal: bool,
    },

    /// Delete a connection
    #[command(visible_alias = "d", about = "Delete a connection")]
    Delete {
        /// Connection alias or ID
        target: String,
    },

    /// Edit a connection
    #[command(
        visible_alias = "e",
        about = "Edit an existing connection; an empty value clears an optional field"
    )]
    Edit {
        /// Connection alias or ID
        target: String,

        /// New alias
        #[arg(short, long)]
        alias: Option<String>,

        /// New host
        #[arg(short = 'H', long)]
        host: Option<String>,

        /// New protocol
        #[arg(short = 'P', long)]
        protocol: Option<ProtocolType>,

        /// New port
        #[arg(short, long)]
        port: Option<String>,

        /// New username
        #[arg(short, long)]
        user: Option<String>,

        /// Prompt for a new password
        #[arg(long, conflicts_with = "no_password")]
        password: bool,

        /// Remove the stored password
        #[arg(long)]
        no_password: bool,

        /// New SSH private key path
        #[arg(short, long)]
        key_file: Option<String>,

        /// New Windows domain
        #[arg(long)]
        domain: Option<String>,

        /// New window size as WIDTHxHEIGHT
        #[arg(long)]
        resolution: Option<String>,

        /// Replacement tags, comma-separated
        #[arg(short, long)]
        tags: Option<String>,

        /// New notes
        #[arg(short, long)]
        notes: Option<String>,

        /// Set a client option as KEY=VALUE; KEY= removes it
        #[arg(short, long = "extra", value_name = "KEY=VALUE", value_parser = parse_extra)]
        extras: Vec<(String, String)>,
    },

    /// Import connections from a JSON file
    #[command(visible_alias = "i", about = "Import connections from a JSON file")]
    Import {
        /// Input file path
        file: PathBuf,

        /// What to do when an alias already exists
        #[arg(long, default_value = "skip", value_enum)]
        on_conflict: ConflictArg,

        /// Do not ask before overwriting existing connections
        #[arg(short, long)]
        yes: bool,
    },

    /// Export connections to a JSON file
    #[command(visible_alias = "x", about = "Export all connections with plaintext passwords")]
    Export {
        /// Output file path
        file: PathBuf,

        /// Do not ask before writing plaintext passwords
        #[arg(short, long)]
        yes: bool,
    },
}

/// Output format for the list and search commands
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum OutputFormat {
    /// Display as formatted table
    Table,
    /// Output as JSON
    Json,
    /// Output as CSV
    Csv,
}

/// Alias conflict handling for imports
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum ConflictArg {
    /// Keep the existing connection
    Skip,
    /// Replace the existing connection
    Overwrite,
    /// Import under a new alias
    Rename,
}

impl From<ConflictArg> for ConflictPolicy {
    fn from(arg: ConflictArg) -> Self {
        match arg {
            ConflictArg::Skip => Self::Skip,
            ConflictArg::Overwrite => Self::Overwrite,
            ConflictArg::Rename => Self::Rename,
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let config = load_config(&cli);
    init_tracing(
        cli.debug,
        config.as_ref().ok().and_then(|c| c.log_level.as_deref()),
    );

    let result = config.and_then(|config| {
        let mut ctx = AppContext::open(config)?;
        run(&mut ctx, cli.command)
    });

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(e.exit_code());
    }
}

/// Loads the configuration and applies the path overrides
fn load_config(cli: &Cli) -> Result<ResolvedConfig, CliError> {
    let manager = match &cli.config {
        Some(file) => ConfigManager::with_config_file(file.clone()),
        None => ConfigManager::new()?,
    };
    let mut config = manager.load_resolved()?;
    if let Some(db) = &cli.db {
        config = config.with_db_path(db);
    }
    if let Some(key) = &cli.key {
        config = config.with_key_path(key);
    }
    Ok(config)
}

/// Installs the log subscriber; `RUST_LOG` overrides the default level
fn init_tracing(debug: bool, configured: Option<&str>) {
    let default_level = if debug {
        "debug"
    } else {
        configured.unwrap_or("info")
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

/// Dispatches a parsed command
fn run(ctx: &mut AppContext, command: Commands) -> Result<(), CliError> {
    match command {
        Commands::Add {
            alias,
            host,
            protocol,
            port,
            user,
            password,
            key_file,
            domain,
            resolution,
            tags,
            notes,
            extras,
        } => {
            let mut draft = ConnectionDraft::new(alias, protocol, host).with_tags(tags);
            draft.port = port;
            draft.username = user;
            draft.ssh_key_path = key_file;
            draft.domain = domain;
            draft.resolution = resolution;
            draft.notes = notes;
            draft.extras = extras.into_iter().collect();
            if password {
                draft.password = Some(prompt_new_password()?);
            }
            cmd_add(ctx, draft)
        }
        Commands::Connect { target } => cmd_connect(ctx, &target),
        Commands::List {
            protocol_or_tag,
            format,
        } => cmd_list(ctx, protocol_or_tag.as_deref(), format),
        Commands::Search { text, format } => cmd_search(ctx, &text, format),
        Commands::Show { target, reveal } => cmd_show(ctx, &target, reveal),
        Commands::Delete { target } => cmd_delete(ctx, &target),
        Commands::Edit {
            target,
            alias,
            host,
            protocol,
            port,
            user,
            password,
            no_password,
            key_file,
            domain,
            resolution,
            tags,
            notes,
            extras,
        } => {
            let mut changes = ConnectionChanges {
                alias,
                host,
                protocol,
                port: parse_update(port)?,
                username: text_update(user),
                ssh_key_path: text_update(key_file).map(PathBuf::from),
                domain: text_update(domain),
                resolution: parse_update(resolution)?,
                notes: text_update(notes),
                tags: tags.map(|t| split_tags(&t)),
                ..ConnectionChanges::default()
            };
            if password {
                changes.password = FieldUpdate::Set(prompt_new_password()?);
            } else if no_password {
                changes.password = FieldUpdate::Clear;
            }
            cmd_edit(ctx, &target, changes, extras)
        }
        Commands::Import {
            file,
            on_conflict,
            yes,
        } => cmd_import(ctx, &file, on_conflict.into(), yes),
        Commands::Export { file, yes } => cmd_export(ctx, &file, yes),
    }
}

/// Add connection command handler
fn cmd_add(ctx: &mut AppContext, draft: ConnectionDraft) -> Result<(), CliError> {
    let connection = ctx.store_mut().add(draft)?;
    println!(
        "Added connection '{}' (ID: {})",
        connection.alias, connection.id
    );
    Ok(())
}

/// List connections command handler
fn cmd_list(
    ctx: &AppContext,
    protocol_or_tag: Option<&str>,
    format: OutputFormat,
) -> Result<(), CliError> {
    let connections = list_connections(ctx.store(), protocol_or_tag)?;
    print_connections(&connections, format)
}

/// A protocol name lists that protocol, anything else is read as a tag
fn list_connections(
    store: &ConnectionStore,
    protocol_or_tag: Option<&str>,
) -> Result<Vec<Connection>, CliError> {
    Ok(match protocol_or_tag {
        None => store.list()?,
        Some(value) => {
            store.list_filtered(&ConnectionFilter::ProtocolOrTag(value.to_string()))?
        }
    })
}

/// Search command handler
fn cmd_search(ctx: &AppContext, text: &str, format: OutputFormat) -> Result<(), CliError> {
    let query = SearchQuery::parse(text)?;
    let connections = query.run(ctx.store())?;
    print_connections(&connections, format)
}

fn print_connections(connections: &[Connection], format: OutputFormat) -> Result<(), CliError> {
    match format {
        OutputFormat::Table => println!("{}", format_table(connections)),
        OutputFormat::Json => println!("{}", format_json(connections)?),
        OutputFormat::Csv => println!("{}", format_csv(connections)),
    }
    Ok(())
}

/// Format connections as a table string
#[must_use]
pub fn format_table(connections: &[Connection]) -> String {
    if connections.is_empty() {
        return "No connections found.".to_string();
    }

    let rows: Vec<[String; 8]> = connections
        .iter()
        .map(|c| {
            [
                c.id.to_string(),
                c.alias.clone(),
                c.protocol.as_str().to_string(),
                c.host.clone(),
                c.effective_port().to_string(),
                c.username.clone().unwrap_or_default(),
                c.tags_display(),
                c.password.display_indicator().to_string(),
            ]
        })
        .collect();

    let headers = [
        "ID", "ALIAS", "PROTOCOL", "HOST", "PORT", "USER", "TAGS", "PASSWORD",
    ];
    let mut widths = headers.map(str::len);
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.len());
        }
    }

    let mut output = String::new();
    let header: Vec<String> = headers.into_iter().map(String::from).collect();
    push_row(&mut output, &header, &widths);
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    push_row(&mut output, &rule, &widths);
    for row in &rows {
        push_row(&mut output, row, &widths);
    }

    output.trim_end().to_string()
}

fn push_row(output: &mut String, cells: &[String], widths: &[usize]) {
    let line: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{cell:<width$}"))
        .collect();
    let _ = writeln!(output, "{}", line.join("  ").trim_end());
}

/// Format connections as JSON string
///
/// # Errors
///
/// Returns `CliError::Config` if JSON serialization fails.
pub fn format_json(connections: &[Connection]) -> Result<String, CliError> {
    let output: Vec<ConnectionOutput> = connections.iter().map(Into::into).collect();
    serde_json::to_string_pretty(&output)
        .map_err(|e| CliError::Config(format!("Failed to serialize to JSON: {e}")))
}

/// Format connections as CSV string
#[must_use]
pub fn format_csv(connections: &[Connection]) -> String {
    let mut output = String::new();
    output.push_str("id,alias,protocol,host,port,username,tags,password\n");

    for conn in connections {
        let _ = writeln!(
            output,
            "{},{},{},{},{},{},{},{}",
            conn.id,
            escape_csv_field(&conn.alias),
            conn.protocol.as_str(),
            escape_csv_field(&conn.host),
            conn.effective_port(),
            escape_csv_field(conn.username.as_deref().unwrap_or_default()),
            escape_csv_field(&conn.tags_display()),
            conn.password.display_indicator()
        );
    }

    output.trim_end().to_string()
}

/// Escape a CSV field if it contains special characters
fn escape_csv_field(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Connection summary for JSON output; never carries a password
#[derive(Debug, Clone, serde::Serialize)]
pub struct ConnectionOutput {
    pub id: i64,
    pub alias: String,
    pub protocol: ProtocolType,
    pub host: String,
    pub port: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    pub password: &'static str,
}

impl From<&Connection> for ConnectionOutput {
    fn from(conn: &Connection) -> Self {
        Self {
            id: conn.id,
            alias: conn.alias.clone(),
            protocol: conn.protocol,
            host: conn.host.clone(),
            port: conn.effective_port(),
            username: conn.username.clone(),
            tags: conn.tags.iter().cloned().collect(),
            password: conn.password.display_indicator(),
        }
    }
}

/// Show connection details command handler
fn cmd_show(ctx: &AppContext, target: &str, reveal: bool) -> Result<(), CliError> {
    let connection = ctx.store().get(target)?;

    println!("Connection Details:");
    println!("  ID:         {}", connection.id);
    println!("  Alias:      {}", connection.alias);
    println!("  Protocol:   {}", connection.protocol.as_str());
    println!("  Host:       {}", connection.host);
    match connection.port {
        Some(port) => println!("  Port:       {port}"),
        None => println!("  Port:       {} (default)", connection.effective_port()),
    }
    if let Some(ref user) = connection.username {
        println!("  Username:   {user}");
    }
    if connection.password.is_set() {
        if reveal {
            let secret = ctx.store().decrypt_password(&connection)?;
            println!("  Password:   {}", secret.expose_secret());
        } else {
            println!("  Password:   {}", connection.password.display_indicator());
        }
    }
    if let Some(ref key) = connection.ssh_key_path {
        println!("  Key Path:   {}", key.display());
    }
    if let Some(ref domain) = connection.domain {
        println!("  Domain:     {domain}");
    }
    if let Some(resolution) = connection.resolution {
        println!("  Resolution: {resolution}");
    }
    if !connection.tags.is_empty() {
        println!("  Tags:       {}", connection.tags_display());
    }
    for (key, value) in &connection.extras {
        println!("  Option:     {key}={value}");
    }
    if let Some(ref notes) = connection.notes {
        println!("  Notes:      {notes}");
    }
    println!(
        "  Created:    {}",
        connection.created_at.format("%Y-%m-%d %H:%M:%S")
    );
    println!(
        "  Updated:    {}",
        connection.updated_at.format("%Y-%m-%d %H:%M:%S")
    );

    Ok(())
}

/// Delete connection command handler
fn cmd_delete(ctx: &mut AppContext, target: &str) -> Result<(), CliError> {
    let connection = ctx.store().get(target)?;
    ctx.store_mut().delete(&connection.id.to_string())?;
    println!(
        "Deleted connection '{}' (ID: {})",
        connection.alias, connection.id
    );
    Ok(())
}

/// Edit connection command handler
fn cmd_edit(
    ctx: &mut AppContext,
    target: &str,
    mut changes: ConnectionChanges,
    extras: Vec<(String, String)>,
) -> Result<(), CliError> {
    if !extras.is_empty() {
        let mut merged = ctx.store().get(target)?.extras;
        for (key, value) in extras {
            if value.is_empty() {
                merged.remove(&key);
            } else {
                merged.insert(key, value);
            }
        }
        changes.extras = Some(merged);
    }

    if changes.is_empty() {
        return Err(CliError::Input("Nothing to change".to_string()));
    }

    let connection = ctx.store_mut().update(target, changes)?;
    println!(
        "Updated connection '{}' (ID: {})",
        connection.alias, connection.id
    );
    Ok(())
}

/// Connect command handler
///
/// The client is started in the background; `cm` does not wait for it.
#[allow(clippy::zombie_processes)]
fn cmd_connect(ctx: &AppContext, target: &str) -> Result<(), CliError> {
    let mut request = prepare_connect(ctx.store(), target)?;

    let handler = ProtocolRegistry::new().get_by_type(request.protocol);
    if matches!(request.password, PasswordHandoff::PromptInteractively)
        && !handler.client_prompts_for_password()
    {
        let prompt = format!("Password for {}: ", request.alias);
        let password = SecretString::from(rpassword::prompt_password(prompt)?);
        if !password.expose_secret().is_empty() {
            request = request.with_password(PasswordHandoff::Provided(password));
        }
    }

    let command = build_launch_command(&request)?;
    let client = detect_client(&command.program);
    if !client.installed() {
        let mut message = format!("Required program '{}' not found", command.program);
        if let Some(hint) = client.install_hint {
            let _ = write!(message, ". {hint}");
        }
        return Err(CliError::Launch(message));
    }

    eprintln!("Executing: {command}");
    let child = command
        .to_command()
        .spawn()
        .map_err(|e| CliError::Launch(format!("Failed to start {}: {e}", command.program)))?;
    info!(alias = %request.alias, pid = child.id(), "Started client");

    Ok(())
}

/// Import command handler
fn cmd_import(
    ctx: &mut AppContext,
    file: &Path,
    policy: ConflictPolicy,
    yes: bool,
) -> Result<(), CliError> {
    let confirmation = if policy == ConflictPolicy::Overwrite && !yes {
        confirm("Existing connections with the same alias will be replaced. Continue?")?
    } else {
        Confirmation::Confirmed
    };
    if !confirmation.is_confirmed() {
        return Err(CliError::Aborted);
    }

    let report = import_all(ctx.store_mut(), file, policy, confirmation)?;

    for renamed in &report.renamed {
        println!("  Renamed '{}' to '{}'", renamed.from, renamed.to);
    }
    for skipped in &report.skipped {
        println!("  Skipped '{}': alias already exists", skipped.alias);
    }
    for error in &report.errors {
        eprintln!("  Failed {error}");
    }
    println!("{}", report.summary());

    if report.has_errors() && report.imported == 0 {
        return Err(CliError::Import(format!(
            "No connections imported from {}",
            file.display()
        )));
    }
    Ok(())
}

/// Export command handler
fn cmd_export(ctx: &AppContext, file: &Path, yes: bool) -> Result<(), CliError> {
    let confirmation = if yes {
        Confirmation::Confirmed
    } else {
        confirm(&format!(
            "{} will contain all passwords in plaintext. Continue?",
            file.display()
        ))?
    };
    if !confirmation.is_confirmed() {
        return Err(CliError::Aborted);
    }

    let summary = export_all(ctx.store(), file, confirmation)?;
    println!("{}", summary.summary());
    if summary.plaintext_warning {
        eprintln!(
            "Warning: {} contains plaintext passwords; keep it safe or delete it",
            summary.path.display()
        );
    }
    Ok(())
}

/// Asks a yes/no question on the terminal
fn confirm(question: &str) -> Result<Confirmation, CliError> {
    eprint!("{question} [y/N] ");
    io::stderr().flush()?;
    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(parse_answer(&answer).into())
}

fn parse_answer(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

/// Prompts twice for a new password
fn prompt_new_password() -> Result<SecretString, CliError> {
    let first = SecretString::from(rpassword::prompt_password("Password: ")?);
    let second = SecretString::from(rpassword::prompt_password("Repeat password: ")?);
    if first.expose_secret() != second.expose_secret() {
        return Err(CliError::Input("Passwords do not match".to_string()));
    }
    debug!("Password read from terminal");
    Ok(first)
}

/// Parses a `KEY=VALUE` client option
fn parse_extra(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("invalid KEY=VALUE: no '=' in '{s}'"))?;
    if key.trim().is_empty() {
        return Err(format!("invalid KEY=VALUE: empty key in '{s}'"));
    }
    Ok((key.trim().to_string(), value.to_string()))
}

/// Maps an edit flag to a field update: absent keeps, empty clears
fn text_update(value: Option<String>) -> FieldUpdate<String> {
    match value {
        None => FieldUpdate::Keep,
        Some(v) if v.trim().is_empty() => FieldUpdate::Clear,
        Some(v) => FieldUpdate::Set(v),
    }
}

/// Like [`text_update`], parsing the value
fn parse_update<T>(value: Option<String>) -> Result<FieldUpdate<T>, CliError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match text_update(value) {
        FieldUpdate::Set(v) => v
            .trim()
            .parse()
            .map(FieldUpdate::Set)
            .map_err(|e| CliError::Input(format!("Invalid value '{v}': {e}"))),
        FieldUpdate::Keep => Ok(FieldUpdate::Keep),
        FieldUpdate::Clear => Ok(FieldUpdate::Clear),
    }
}

fn split_tags(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(String::from)
        .collect()
}

/// Exit codes for CLI operations
pub mod exit_codes {
    /// Success - operation completed successfully
    pub const SUCCESS: i32 = 0;
    /// General error - configuration, validation, or other non-connection errors
    pub const GENERAL_ERROR: i32 = 1;
    /// Connection failure - connection not found or client could not be started
    pub const CONNECTION_FAILURE: i32 = 2;
}

/// CLI error type
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Connection not found
    #[error("Connection not found: {0}")]
    ConnectionNotFound(String),

    /// Client launch error
    #[error("Launch error: {0}")]
    Launch(String),

    /// Import error
    #[error("Import error: {0}")]
    Import(String),

    /// Invalid command-line input
    #[error("{0}")]
    Input(String),

    /// The user declined a confirmation prompt
    #[error("Aborted")]
    Aborted,

    /// Error reported by the core library
    #[error(transparent)]
    Core(ConnManError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl CliError {
    /// Returns the appropriate exit code for this error type.
    ///
    /// Exit codes:
    /// - 0: Success (not an error)
    /// - 1: General error (configuration, validation, import, export, IO)
    /// - 2: Connection failure (connection not found, client not started)
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionNotFound(_) | Self::Launch(_) => exit_codes::CONNECTION_FAILURE,
            Self::Config(_)
            | Self::Import(_)
            | Self::Input(_)
            | Self::Aborted
            | Self::Core(_)
            | Self::Io(_) => exit_codes::GENERAL_ERROR,
        }
    }
}

impl From<StoreError> for CliError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(target) => Self::ConnectionNotFound(target),
            other => Self::Core(other.into()),
        }
    }
}

impl From<ExchangeError> for CliError {
    fn from(err: ExchangeError) -> Self {
        match err {
            ExchangeError::Store(store) => store.into(),
            other => Self::Core(other.into()),
        }
    }
}

impl From<LaunchError> for CliError {
    fn from(err: LaunchError) -> Self {
        Self::Launch(err.to_string())
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<SearchError> for CliError {
    fn from(err: SearchError) -> Self {
        Self::Core(err.into())
    }
}

impl From<ConnManError> for CliError {
    fn from(err: ConnManError) -> Self {
        match err {
            ConnManError::Store(store) => store.into(),
            ConnManError::Exchange(exchange) => exchange.into(),
            ConnManError::Launch(launch) => launch.into(),
            ConnManError::Config(config) => config.into(),
            other => Self::Core(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use connman_core::crypto::KeyManager;
    use tempfile::TempDir;

    fn sample_connections() -> (TempDir, Vec<Connection>) {
        let temp = TempDir::new().unwrap();
        let mut store =
            ConnectionStore::open_in_memory(KeyManager::new(temp.path().join("cm.key"))).unwrap();
        store
            .add(
                ConnectionDraft::new("db1", ProtocolType::Ssh, "10.0.0.2")
                    .with_username("admin")
                    .with_password("s3cret")
                    .with_tags(["prod", "db"]),
            )
            .unwrap();
        store
            .add(ConnectionDraft::new("web1", ProtocolType::Http, "10.0.0.5"))
            .unwrap();
        let connections = store.list().unwrap();
        (temp, connections)
    }

    #[test]
    fn test_list_by_protocol_or_tag() {
        let temp = TempDir::new().unwrap();
        let mut store =
            ConnectionStore::open_in_memory(KeyManager::new(temp.path().join("cm.key"))).unwrap();
        store
            .add(ConnectionDraft::new("db1", ProtocolType::Ssh, "10.0.0.2").with_tags(["prod"]))
            .unwrap();
        store
            .add(ConnectionDraft::new("web1", ProtocolType::Http, "10.0.0.5").with_tags(["lab"]))
            .unwrap();
        let aliases = |filter| -> Vec<String> {
            list_connections(&store, filter)
                .unwrap()
                .into_iter()
                .map(|c| c.alias)
                .collect()
        };

        assert_eq!(aliases(None), vec!["db1", "web1"]);
        assert_eq!(aliases(Some("HTTP")), vec!["web1"]);
        assert_eq!(aliases(Some("prod")), vec!["db1"]);
        assert!(aliases(Some("pro")).is_empty());
    }

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_add() {
        let cli = Cli::try_parse_from([
            "cm", "add", "db1", "-H", "10.0.0.2", "-P", "rdp", "--tag", "prod,db", "-e",
            "cert=ignore",
        ])
        .unwrap();
        match cli.command {
            Commands::Add {
                alias,
                protocol,
                tags,
                extras,
                password,
                ..
            } => {
                assert_eq!(alias, "db1");
                assert_eq!(protocol, ProtocolType::Rdp);
                assert_eq!(tags, vec!["prod", "db"]);
                assert_eq!(extras, vec![("cert".to_string(), "ignore".to_string())]);
                assert!(!password);
            }
            _ => panic!("expected add"),
        }
    }

    #[test]
    fn test_parse_short_aliases() {
        let cli = Cli::try_parse_from(["cm", "l", "ssh"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::List { protocol_or_tag: Some(ref p), .. } if p == "ssh"
        ));

        let cli = Cli::try_parse_from(["cm", "i", "in.json", "--on-conflict", "rename"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Import {
                on_conflict: ConflictArg::Rename,
                yes: false,
                ..
            }
        ));

        let cli = Cli::try_parse_from(["cm", "--debug", "x", "out.json", "--yes"]).unwrap();
        assert!(cli.debug);
        assert!(matches!(cli.command, Commands::Export { yes: true, .. }));

        for alias in ["a", "c", "s", "d", "e"] {
            let args: &[&str] = match alias {
                "a" => &["cm", "a", "n", "-H", "h"],
                _ => &["cm", alias, "n"],
            };
            assert!(Cli::try_parse_from(args).is_ok(), "alias {alias}");
        }
    }

    #[test]
    fn test_parse_rejects_unknown_protocol() {
        assert!(Cli::try_parse_from(["cm", "add", "x", "-H", "h", "-P", "spice"]).is_err());
        assert!(Cli::try_parse_from(["cm", "add", "x", "-H", "h", "-e", "novalue"]).is_err());
    }

    #[test]
    fn test_edit_password_flags_conflict() {
        assert!(
            Cli::try_parse_from(["cm", "edit", "db1", "--password", "--no-password"]).is_err()
        );
    }

    #[test]
    fn test_field_updates() {
        assert_eq!(text_update(None), FieldUpdate::Keep);
        assert_eq!(text_update(Some(String::new())), FieldUpdate::Clear);
        assert_eq!(
            text_update(Some("root".into())),
            FieldUpdate::Set("root".to_string())
        );
        assert_eq!(
            parse_update::<u16>(Some("2222".into())).unwrap(),
            FieldUpdate::Set(2222)
        );
        assert_eq!(
            parse_update::<u16>(Some(String::new())).unwrap(),
            FieldUpdate::Clear
        );
        assert!(parse_update::<u16>(Some("http".into())).is_err());
        assert_eq!(split_tags("a, b,,c"), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_format_table() {
        let (_temp, connections) = sample_connections();
        let table = format_table(&connections);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("ID"));
        assert!(lines[0].contains("PASSWORD"));
        assert!(lines[2].contains("db1"));
        assert!(lines[2].contains("db,prod"));
        assert!(lines[2].contains("********"));
        assert!(!table.contains("s3cret"));
        assert!(lines[3].contains("web1"));
        assert!(lines[3].contains("80"));
    }

    #[test]
    fn test_format_table_empty() {
        assert_eq!(format_table(&[]), "No connections found.");
    }

    #[test]
    fn test_format_json_and_csv_hide_passwords() {
        let (_temp, connections) = sample_connections();
        let json = format_json(&connections).unwrap();
        assert!(json.contains("\"alias\": \"db1\""));
        assert!(!json.contains("s3cret"));

        let csv = format_csv(&connections);
        assert!(csv.starts_with("id,alias,protocol"));
        assert!(csv.contains("\"db,prod\""));
        assert!(!csv.contains("s3cret"));
    }

    #[test]
    fn test_escape_csv_field() {
        assert_eq!(escape_csv_field("plain"), "plain");
        assert_eq!(escape_csv_field("a,b"), "\"a,b\"");
        assert_eq!(escape_csv_field("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn test_parse_answer() {
        assert!(parse_answer("y\n"));
        assert!(parse_answer(" YES "));
        assert!(!parse_answer("\n"));
        assert!(!parse_answer("nope"));
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(
            CliError::from(StoreError::NotFound("x".into())).exit_code(),
            exit_codes::CONNECTION_FAILURE
        );
        assert_eq!(
            CliError::from(LaunchError::ClientNotFound("ssh".into())).exit_code(),
            exit_codes::CONNECTION_FAILURE
        );
        assert_eq!(
            CliError::from(StoreError::DuplicateAlias("x".into())).exit_code(),
            exit_codes::GENERAL_ERROR
        );
        assert_eq!(CliError::Aborted.exit_code(), exit_codes::GENERAL_ERROR);
        assert_ne!(exit_codes::SUCCESS, exit_codes::GENERAL_ERROR);
    }
}

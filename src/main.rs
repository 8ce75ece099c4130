//! Purpose: `folio` CLI entry point and command definitions.
//! Role: Binary crate root; parses args, runs commands, emits JSON on stdout.
//! Invariants: Commands emit stable JSON on stdout; errors go to stderr.
//! Invariants: Non-interactive errors are emitted as JSON on stderr.
//! Invariants: Process exit code is derived from `api::to_exit_code`.
#![allow(clippy::result_large_err)]
use std::io::{self, IsTerminal, Read};
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueHint, error::ErrorKind as ClapErrorKind};
use clap_complete::aot::Shell;
use serde_json::{Value, json};

mod command_dispatch;
mod data_paths;
mod serve;

use data_paths::default_data_dir;
use folio::api::{Catalog, Error, ErrorKind, LocalClient, Record, to_exit_code};

#[derive(Copy, Clone, Debug)]
struct RunOutcome {
    exit_code: i32,
}

impl RunOutcome {
    fn ok() -> Self {
        Self { exit_code: 0 }
    }

    fn with_code(exit_code: i32) -> Self {
        Self { exit_code }
    }
}

fn main() {
    let exit_code = match run() {
        Ok(outcome) => outcome.exit_code,
        Err(err) => {
            emit_error(&err);
            to_exit_code(err.kind())
        }
    };
    std::process::exit(exit_code);
}

fn run() -> Result<RunOutcome, Error> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => match err.kind() {
            ClapErrorKind::DisplayHelp
            | ClapErrorKind::DisplayVersion
            | ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
                err.print().map_err(|io_err| {
                    Error::new(ErrorKind::Io)
                        .with_message("failed to write help")
                        .with_source(io_err)
                })?;
                let exit_code = if matches!(
                    err.kind(),
                    ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
                ) {
                    2
                } else {
                    0
                };
                return Ok(RunOutcome::with_code(exit_code));
            }
            _ => {
                return Err(Error::new(ErrorKind::Usage)
                    .with_message(clap_error_summary(&err))
                    .with_hint("Run `folio --help` for usage."));
            }
        },
    };

    let data_dir = cli.data_dir.unwrap_or_else(default_data_dir);
    command_dispatch::dispatch_command(cli.command, data_dir)
}

fn clap_error_summary(err: &clap::Error) -> String {
    err.to_string()
        .lines()
        .next()
        .unwrap_or("invalid arguments")
        .trim_start_matches("error: ")
        .to_string()
}

#[derive(Parser)]
#[command(
    name = "folio",
    version,
    about = "Catalog of books, authors, and publishers backed by plain JSON files",
    long_about = None,
    before_help = r#"Records are free-form JSON objects keyed by their identifier field.
Books must reference an existing author and publisher; an author or
publisher stays undeletable while a book references it."#,
    after_help = r#"EXAMPLES
  $ folio init
  $ folio author add '{"authorId":"a1","name":"Ursula"}'
  $ folio publisher add '{"publisherId":"p1","name":"Parnassus"}'
  $ folio book add '{"bookId":"b1","authorId":"a1","publisherId":"p1"}'
  $ folio book set b1 '{"title":"The Dispossessed"}'
  $ folio serve --bind 127.0.0.1:9718

  $ folio <command> --help"#,
    arg_required_else_help = true
)]
struct Cli {
    #[arg(
        long,
        global = true,
        help = "Data directory for collection documents (default: ~/.folio/data)",
        value_hint = ValueHint::DirPath
    )]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    #[command(about = "Create the collection documents if absent")]
    Init,
    #[command(subcommand, about = "Manage author records")]
    Author(EntityCommand),
    #[command(subcommand, about = "Manage book records")]
    Book(EntityCommand),
    #[command(subcommand, about = "Manage publisher records")]
    Publisher(EntityCommand),
    #[command(about = "Run the HTTP/JSON server")]
    Serve(ServeArgs),
    #[command(about = "Generate shell completions")]
    Completion {
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Copy, Clone, Debug)]
enum Entity {
    Author,
    Book,
    Publisher,
}

#[derive(Subcommand)]
enum EntityCommand {
    #[command(about = "List all records")]
    List,
    #[command(about = "Fetch one record by identifier")]
    Get { id: String },
    #[command(about = "Create a record from a JSON object (use - for stdin)")]
    Add { record: String },
    #[command(about = "Merge JSON fields over an existing record (use - for stdin)")]
    Set { id: String, record: String },
    #[command(about = "Delete a record by identifier")]
    Rm { id: String },
}

#[derive(Args)]
struct ServeArgs {
    #[arg(long, default_value = "127.0.0.1:9718", help = "Address to bind")]
    bind: String,
    #[arg(long, help = "Permit binding to non-loopback addresses")]
    allow_non_loopback: bool,
}

fn run_entity_command(
    catalog: &Catalog,
    entity: Entity,
    command: EntityCommand,
) -> Result<RunOutcome, Error> {
    match command {
        EntityCommand::List => {
            let records = match entity {
                Entity::Author => catalog.list_authors(),
                Entity::Book => catalog.list_books(),
                Entity::Publisher => catalog.list_publishers(),
            }?;
            emit_json(json!(records));
        }
        EntityCommand::Get { id } => {
            let record = match entity {
                Entity::Author => catalog.get_author(&id),
                Entity::Book => catalog.get_book(&id),
                Entity::Publisher => catalog.get_publisher(&id),
            }?;
            emit_json(record.into_value());
        }
        EntityCommand::Add { record } => {
            let record = read_record_arg(&record)?;
            let created = match entity {
                Entity::Author => catalog.create_author(record),
                Entity::Book => catalog.create_book(record),
                Entity::Publisher => catalog.create_publisher(record),
            }?;
            emit_json(created.into_value());
        }
        EntityCommand::Set { id, record } => {
            let partial = read_record_arg(&record)?;
            let updated = match entity {
                Entity::Author => catalog.update_author(&id, partial),
                Entity::Book => catalog.update_book(&id, partial),
                Entity::Publisher => catalog.update_publisher(&id, partial),
            }?;
            emit_json(updated.into_value());
        }
        EntityCommand::Rm { id } => {
            match entity {
                Entity::Author => catalog.delete_author(&id),
                Entity::Book => catalog.delete_book(&id),
                Entity::Publisher => catalog.delete_publisher(&id),
            }?;
            emit_json(json!({ "deleted": id }));
        }
    }
    Ok(RunOutcome::ok())
}

/// A record argument is inline JSON, or `-` to read one object from stdin.
fn read_record_arg(arg: &str) -> Result<Record, Error> {
    let raw = if arg == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer).map_err(|err| {
            Error::new(ErrorKind::Io)
                .with_message("failed to read record from stdin")
                .with_source(err)
        })?;
        buffer
    } else {
        arg.to_string()
    };

    let value: Value = serde_json::from_str(raw.trim()).map_err(|err| {
        Error::new(ErrorKind::Usage)
            .with_message("record is not valid JSON")
            .with_hint("Pass an object like '{\"authorId\":\"a1\"}' or - for stdin.")
            .with_source(err)
    })?;
    Record::from_value(value)
}

fn emit_json(value: Value) {
    if io::stdout().is_terminal() {
        let pretty = serde_json::to_string_pretty(&value).unwrap_or_else(|_| value.to_string());
        println!("{pretty}");
    } else {
        println!("{value}");
    }
}

fn emit_error(err: &Error) {
    if io::stderr().is_terminal() {
        eprintln!("error: {err}");
        if let Some(hint) = err.hint() {
            eprintln!("hint: {hint}");
        }
        return;
    }

    let json = serde_json::to_string(&error_json(err)).unwrap_or_else(|_| {
        "{\"error\":{\"kind\":\"Internal\",\"message\":\"json encode failed\"}}".to_string()
    });
    eprintln!("{json}");
}

fn error_json(err: &Error) -> Value {
    let mut body = serde_json::Map::new();
    body.insert("kind".to_string(), json!(format!("{:?}", err.kind())));
    body.insert(
        "message".to_string(),
        json!(err.message().unwrap_or("error")),
    );
    if let Some(id) = err.id() {
        body.insert("id".to_string(), json!(id));
    }
    if let Some(path) = err.path() {
        body.insert("path".to_string(), json!(path.display().to_string()));
    }
    if let Some(hint) = err.hint() {
        body.insert("hint".to_string(), json!(hint));
    }
    json!({ "error": body })
}

//! Book API binary.
//!
//! `bookapi serve` runs the server; every other subcommand talks to a running
//! server over HTTP.

use std::process::ExitCode;

use bookapi::cli::{Cli, Command};
use bookapi::{Book, PrettyPrint, ReplaceOutcome};
use clap::Parser;
use serde::Serialize;
use tabled::{Table, Tabled};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(matches!(cli.command, Command::Serve { .. }));

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(serving: bool) {
    let default = if serving {
        "bookapi=info,tower_http=info"
    } else {
        "bookapi=warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> bookapi::Result<()> {
    let json = cli.json;

    match &cli.command {
        Command::Serve(args) => bookapi::api::run(args.config()?).await,
        Command::List => {
            let books = cli.client()?.list().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&books)?);
            } else {
                let rows: Vec<BookRow> = books.iter().map(BookRow::from).collect();
                println!("{}", Table::new(rows));
                println!("\n{} books", books.len());
            }
            Ok(())
        }
        Command::Get { id } => {
            let book = cli.client()?.get(*id).await?;
            output_single(&book, json)
        }
        Command::Create(fields) => {
            let id = cli.client()?.create(&fields.to_book(None)).await?;
            output_id(id, "created", json)
        }
        Command::Replace { id, fields } => {
            match cli.client()?.replace(&fields.to_book(*id)).await? {
                ReplaceOutcome::Created(id) => output_id(id, "created", json),
                ReplaceOutcome::Replaced => output_id(id.unwrap_or_default(), "replaced", json),
            }
        }
        Command::Patch { id, fields, clear } => {
            let patch = fields.to_patch(clear)?;
            cli.client()?.patch(*id, &patch).await?;
            output_id(*id, "updated", json)
        }
        Command::Delete { id } => {
            cli.client()?.delete(*id).await?;
            output_id(*id, "deleted", json)
        }
    }
}

fn output_single<T: Serialize + PrettyPrint>(item: &T, json: bool) -> bookapi::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(item)?);
    } else {
        println!("{}", item.pretty_print());
    }
    Ok(())
}

fn output_id(id: u64, action: &'static str, json: bool) -> bookapi::Result<()> {
    if json {
        let status = serde_json::json!({ "id": id, "status": action });
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        println!("Book #{id} {action}");
    }
    Ok(())
}

// Table row type for non-JSON output

#[derive(Tabled)]
struct BookRow {
    id: String,
    title: String,
    author: String,
    edition: String,
}

impl From<&Book> for BookRow {
    fn from(b: &Book) -> Self {
        Self {
            id: b.id.map(|id| id.to_string()).unwrap_or_default(),
            title: b.title.clone().unwrap_or_default(),
            author: b.author.clone().unwrap_or_default(),
            edition: b.edition.clone().unwrap_or_default(),
        }
    }
}

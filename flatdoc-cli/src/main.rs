use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use flatdoc_core::document::{Document, DocumentId};
use flatdoc_core::Client;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "flatdoc")]
#[command(about = "flatdoc CLI - command-line interface for the flatdoc embedded document store")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import data from a JSON file into a database
    Import {
        /// JSON file to import
        file: PathBuf,
        /// Client root folder
        #[arg(long, default_value = "flatdoc-data")]
        store: PathBuf,
        /// Database name within the store
        #[arg(long, default_value = "main")]
        database: String,
    },
    /// Export a database to a JSON file
    Export {
        /// Output JSON file
        file: PathBuf,
        /// Client root folder
        #[arg(long, default_value = "flatdoc-data")]
        store: PathBuf,
        /// Database name within the store
        #[arg(long, default_value = "main")]
        database: String,
        /// Export only a specific collection
        #[arg(long)]
        collection: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Import { file, store, database } => import_data(&file, &store, &database),
        Commands::Export { file, store, database, collection } => {
            export_data(&file, &store, &database, collection.as_deref())
        }
    }
}

/// Import data from a JSON file. Format: `{ "collection_name": [documents...], ... }`.
fn import_data(file: &Path, store: &Path, database: &str) -> Result<()> {
    let content = fs::read_to_string(file)
        .with_context(|| format!("failed to read file: {}", file.display()))?;

    let data: Map<String, Value> = serde_json::from_str(&content)
        .with_context(|| format!("invalid JSON in file: {}", file.display()))?;

    let client = Client::open(store)
        .with_context(|| format!("failed to open store: {}", store.display()))?;
    let db = client
        .database(database)
        .with_context(|| format!("failed to open database: {database}"))?;

    let mut total_docs = 0;

    for (collection_name, documents) in data {
        let docs = documents
            .as_array()
            .with_context(|| format!("collection '{collection_name}' must be an array"))?;

        let collection = db.collection(&collection_name);

        for doc in docs {
            let obj = doc.as_object().with_context(|| "document must be an object")?;
            let id = obj
                .get("_id")
                .and_then(|v| v.as_str())
                .map(DocumentId::new)
                .unwrap_or_else(|| DocumentId::new(""));
            let fields: HashMap<String, Value> = obj
                .iter()
                .filter(|(k, _)| k.as_str() != "_id")
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect();

            collection
                .insert_one(Document::new(id, fields), false)
                .with_context(|| format!("failed to insert document into {collection_name}"))?;
            total_docs += 1;
        }

        println!("imported {} document(s) into '{}'", docs.len(), collection_name);
    }

    println!("total: {total_docs} document(s) imported into '{database}' at {}", store.display());
    Ok(())
}

/// Export a database to a JSON file.
fn export_data(file: &Path, store: &Path, database: &str, collection_filter: Option<&str>) -> Result<()> {
    let client = Client::open(store)
        .with_context(|| format!("failed to open store: {}", store.display()))?;
    let db = client
        .database(database)
        .with_context(|| format!("failed to open database: {database}"))?;

    let mut output: Map<String, Value> = Map::new();
    let mut total_docs = 0;

    for collection_name in db.collection_names() {
        if let Some(filter) = collection_filter {
            if collection_name != filter {
                continue;
            }
        }

        let collection = db.collection(&collection_name);
        let cursor = collection
            .find(&Value::Null, None, None, None)
            .with_context(|| format!("failed to query collection: {collection_name}"))?;
        let docs: Vec<Value> = cursor.into_vec().into_iter().map(Into::into).collect();

        println!("exporting {} document(s) from '{}'", docs.len(), collection_name);
        total_docs += docs.len();
        output.insert(collection_name, Value::Array(docs));
    }

    let json = serde_json::to_string_pretty(&output).with_context(|| "failed to serialize to JSON")?;
    fs::write(file, json).with_context(|| format!("failed to write to file: {}", file.display()))?;

    println!("total: {total_docs} document(s) exported to {}", file.display());
    Ok(())
}

//! WildLens frontend binary
//!
//! Command-line surface over the identification gateway and the local
//! collection: identify a photo, search species by name, check remaining
//! credits, browse the sample results, and manage saved species.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use base64::Engine;
use chrono::Utc;
use clap::{Parser, Subcommand};
use dialoguer::Confirm;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use wildlens_common::api::GeoTag;
use wildlens_common::config::{ensure_root_folder, load_toml_config, resolve_root_folder};
use wildlens_fg::client::{GatewayClient, DEFAULT_GATEWAY_URL, GATEWAY_URL_ENV};
use wildlens_fg::collection::{CollectionStore, SNAPSHOT_FILE};
use wildlens_fg::flow::{Event, Session, UploadState};
use wildlens_fg::view::{self, ResultsView};

#[derive(Parser)]
#[command(name = "wildlens")]
#[command(about = "Identify wildlife from photos and keep a local collection", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Gateway base URL (overrides wildlens.toml)
    #[arg(long, env = GATEWAY_URL_ENV, global = true)]
    gateway: Option<String>,

    /// Data folder holding the collection (overrides wildlens.toml)
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// Verbose log output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Identify the species in a photo
    Identify {
        /// Photo to analyze
        #[arg(required = true)]
        image: PathBuf,

        /// Latitude where the photo was taken
        #[arg(long)]
        latitude: Option<f64>,

        /// Longitude where the photo was taken
        #[arg(long)]
        longitude: Option<f64>,

        /// When the photo was taken (ISO 8601)
        #[arg(long)]
        taken_at: Option<String>,

        /// Save the match at this rank (1 = best) to the collection
        #[arg(long, value_name = "RANK")]
        save: Option<usize>,
    },

    /// Search species by name
    Search {
        /// Name or partial name to look up
        #[arg(required = true)]
        term: String,
    },

    /// Show remaining identification credits
    Usage,

    /// Show the built-in sample results
    Demo,

    /// Manage the saved collection
    Collection {
        #[command(subcommand)]
        command: CollectionCommands,
    },
}

#[derive(Subcommand)]
enum CollectionCommands {
    /// List saved species, oldest first
    List,

    /// Delete a saved species by record id
    Delete {
        /// Record id as shown by `collection list`
        #[arg(required = true)]
        id: String,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let toml_config = load_toml_config();

    let gateway_url = cli
        .gateway
        .clone()
        .or_else(|| toml_config.gateway_url.clone())
        .unwrap_or_else(|| DEFAULT_GATEWAY_URL.to_string());

    let root = resolve_root_folder(cli.root.as_deref(), &toml_config);
    ensure_root_folder(&root)?;
    let store = CollectionStore::open(root.join(SNAPSHOT_FILE));

    match cli.command {
        Commands::Identify {
            image,
            latitude,
            longitude,
            taken_at,
            save,
        } => {
            let client = GatewayClient::new(&gateway_url)?;
            run_identify(&client, &store, &image, latitude, longitude, taken_at, save).await
        }
        Commands::Search { term } => {
            let client = GatewayClient::new(&gateway_url)?;
            run_search(&client, &term).await
        }
        Commands::Usage => {
            let client = GatewayClient::new(&gateway_url)?;
            run_usage(&client).await
        }
        Commands::Demo => {
            print_results(&view::present(None));
            Ok(())
        }
        Commands::Collection { command } => match command {
            CollectionCommands::List => {
                run_collection_list(&store);
                Ok(())
            }
            CollectionCommands::Delete { id, yes } => run_collection_delete(&store, &id, yes),
        },
    }
}

async fn run_identify(
    client: &GatewayClient,
    store: &CollectionStore,
    image_path: &Path,
    latitude: Option<f64>,
    longitude: Option<f64>,
    taken_at: Option<String>,
    save: Option<usize>,
) -> anyhow::Result<()> {
    let bytes = std::fs::read(image_path)
        .with_context(|| format!("Failed to read {}", image_path.display()))?;

    let content_type = infer::get(&bytes)
        .map(|kind| kind.mime_type())
        .unwrap_or("application/octet-stream");
    if !content_type.starts_with("image/") {
        warn!(
            path = %image_path.display(),
            content_type,
            "File does not look like an image"
        );
    }

    let filename = image_path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload".to_string());

    // Data URL preview, carried through the session so a saved record keeps
    // the analyzed photo
    let preview = format!(
        "data:{};base64,{}",
        content_type,
        base64::engine::general_purpose::STANDARD.encode(&bytes)
    );

    let geo_tag = GeoTag {
        latitude,
        longitude,
        datetime: taken_at,
    };
    let geo = (!geo_tag.is_empty()).then_some(&geo_tag);

    let session = Session::new()
        .apply(Event::Start, Utc::now())
        .apply(
            Event::PreviewReady {
                preview: preview.clone(),
            },
            Utc::now(),
        )
        .apply(Event::BeginAnalysis, Utc::now());

    println!("Analyzing {}...", image_path.display());

    let session = match client.identify(bytes, &filename, content_type, geo).await {
        Ok(response) => session.apply(
            Event::AnalysisSucceeded {
                candidates: response.results,
                access_token: response.access_token,
            },
            Utc::now(),
        ),
        Err(error) => session.apply(
            Event::AnalysisFailed {
                message: error.to_string(),
            },
            Utc::now(),
        ),
    };

    if let UploadState::Failed { message, .. } = &session.upload {
        bail!("{message}");
    }
    let outcome = session
        .outcome
        .as_ref()
        .context("Analysis produced no outcome")?;
    debug!(access_token = %outcome.access_token, "Identification complete");

    let results = view::present(Some(&outcome.candidates));
    print_results(&results);

    if let Some(rank) = save {
        if results.cards.is_empty() {
            bail!("No results to save");
        }
        if rank == 0 || rank > results.cards.len() {
            bail!("No result at rank {rank}; choose 1..={}", results.cards.len());
        }

        let card = &results.cards[rank - 1];
        let now = Utc::now();
        let record = store.save(card, &outcome.uploaded_image, now)?;
        debug!(id = %record.id, "Record written");

        let session = session.apply(Event::SpeciesSaved, now);
        if let Some(notice) = session.notice_visible(Utc::now()) {
            println!();
            println!("{}", notice.message);
        }
    }

    Ok(())
}

async fn run_search(client: &GatewayClient, term: &str) -> anyhow::Result<()> {
    let candidates = client.search(term).await?;
    if candidates.is_empty() {
        println!("No species found for \"{term}\"");
        return Ok(());
    }
    print_results(&view::present(Some(&candidates)));
    Ok(())
}

async fn run_usage(client: &GatewayClient) -> anyhow::Result<()> {
    let usage = client.usage().await?;
    println!(
        "Remaining credits: {} of {}",
        usage.remaining_credit, usage.total_credit
    );
    Ok(())
}

fn print_results(results: &ResultsView) {
    if results.is_sample() {
        println!("Showing sample results (no identification data)");
        println!();
    }

    if results.cards.is_empty() {
        println!("No species matched. Try a clearer photo.");
        return;
    }

    for (index, card) in results.cards.iter().enumerate() {
        println!(
            "{}. {} ({})",
            index + 1,
            card.common_name,
            card.scientific_name
        );
        println!(
            "   Confidence: {}%  Class: {}",
            card.confidence, card.taxon_class
        );
        if let Some(url) = &card.url {
            println!("   More: {url}");
        }
    }

    // Detail text for the best match, like the detail dialog shows
    if let Some(card) = results.cards.first() {
        println!();
        println!("{}", view::detail_description(card));
    }
}

fn run_collection_list(store: &CollectionStore) {
    let records = store.records();
    if records.is_empty() {
        println!("Your collection is empty. Identify a species and save it to start.");
        return;
    }

    println!("{} saved species", records.len());
    println!();
    for record in &records {
        println!(
            "{}  {} ({})",
            record.saved_at.format("%b %-d, %Y"),
            record.common_name,
            record.name
        );
        println!(
            "    id: {}  confidence: {}%  class: {}",
            record.id, record.confidence, record.taxon_class
        );
    }
}

fn run_collection_delete(store: &CollectionStore, id: &str, yes: bool) -> anyhow::Result<()> {
    let record = store.records().into_iter().find(|record| record.id == id);

    let Some(record) = record else {
        bail!("No saved species with id {id}");
    };

    if !yes {
        let confirmed = Confirm::new()
            .with_prompt(format!(
                "Delete \"{}\" from your collection?",
                record.common_name
            ))
            .default(false)
            .interact()?;
        if !confirmed {
            println!("Kept {}", record.common_name);
            return Ok(());
        }
    }

    store.delete(id)?;
    println!("Deleted {}", record.common_name);
    Ok(())
}

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use game_catalog::storage::CatalogStore;
use game_catalog::sync::merge_catalog;
use game_catalog::{CatalogConfig, CatalogItem, CatalogView, ItemId, RefreshOutcome, SyncCoordinator};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "game-catalog", version, about = "Browse and edit an offline copy of the game catalog")]
struct Cli {
    /// Catalog endpoint (overrides CATALOG_URL)
    #[arg(long, global = true)]
    url: Option<String>,

    /// Snapshot directory (overrides CATALOG_DATA_DIR)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Request timeout in seconds (overrides CATALOG_REQUEST_TIMEOUT_SECS)
    #[arg(long, global = true)]
    timeout: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List stored games, fetching the remote catalog first if nothing is stored
    List {
        /// Only show games whose title or genre contains this text
        #[arg(short, long)]
        search: Option<String>,

        /// Never contact the remote catalog
        #[arg(long)]
        offline: bool,
    },
    /// Fetch the remote catalog and add games not stored yet
    Refresh,
    /// Show every field of one game
    Show { id: ItemId },
    /// Overwrite fields of a stored game
    Edit {
        id: ItemId,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        genre: Option<String>,
        #[arg(long)]
        platform: Option<String>,
        #[arg(long)]
        publisher: Option<String>,
        #[arg(long)]
        developer: Option<String>,
        #[arg(long)]
        release_date: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },
    /// Delete a stored game
    Delete { id: ItemId },
    /// Store the preview fixture without contacting the remote catalog
    Seed {
        #[arg(default_value_t = 10)]
        count: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let mut config = CatalogConfig::from_env().context("failed to load catalog configuration")?;
    if let Some(url) = cli.url {
        config = config.catalog_url(url);
    }
    if let Some(dir) = cli.data_dir {
        config = config.data_dir(dir);
    }
    if let Some(secs) = cli.timeout {
        if secs == 0 {
            bail!("--timeout must be greater than zero");
        }
        config = config.request_timeout(Duration::from_secs(secs));
    }

    let store = Arc::new(config.open_store().context("failed to open local catalog store")?);
    let remote = Arc::new(config.fetcher().context("failed to build catalog client")?);
    let catalog = SyncCoordinator::builder(store.clone(), remote)
        .delete_policy(config.delete_policy)
        .build();

    info!(
        url = %config.catalog_url,
        snapshot = ?store.snapshot_path(),
        "game catalog ready"
    );

    match cli.command {
        Command::List { search, offline } => {
            // Failures land in the view's error and are printed in place of the list.
            let loaded = if offline {
                catalog.load_local()
            } else {
                catalog.bootstrap().await.map(report_refresh)
            };
            if let Err(err) = loaded {
                debug!(error = %err, "catalog listed with a surfaced error");
            }
            if let Some(text) = search {
                catalog.set_search_text(text);
            }
            print_list(&catalog.view());
        }
        Command::Refresh => {
            catalog.load_local()?;
            report_refresh(catalog.refresh().await?);
        }
        Command::Show { id } => {
            catalog.load_local()?;
            let item = find(&catalog, id)?;
            print_item(&item);
        }
        Command::Edit {
            id,
            title,
            genre,
            platform,
            publisher,
            developer,
            release_date,
            description,
        } => {
            catalog.load_local()?;
            let mut item = find(&catalog, id)?;
            if let Some(title) = title {
                item.title = title;
            }
            if let Some(genre) = genre {
                item.genre = genre;
            }
            if let Some(platform) = platform {
                item.platform = platform;
            }
            if let Some(publisher) = publisher {
                item.publisher = publisher;
            }
            if let Some(developer) = developer {
                item.developer = developer;
            }
            if let Some(release_date) = release_date {
                item.release_date = release_date;
            }
            if let Some(description) = description {
                item.short_description = description;
            }
            catalog.save(item.clone())?;
            print_item(&item);
        }
        Command::Delete { id } => {
            catalog.load_local()?;
            let item = find(&catalog, id)?;
            catalog.delete(&item)?;
            println!("Deleted {} ({})", item.title, item.id);
        }
        Command::Seed { count } => {
            let report = merge_catalog(store.as_ref(), CatalogItem::preview_set(count))?;
            println!(
                "Seeded {} games ({} already present), {} stored",
                report.inserted,
                report.skipped,
                store.count()?
            );
        }
    }

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("game_catalog=info")),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn find(catalog: &SyncCoordinator, id: ItemId) -> Result<CatalogItem> {
    match catalog.item(id) {
        Some(item) => Ok(item),
        None => bail!("no game with id {} is stored", id),
    }
}

fn report_refresh(outcome: RefreshOutcome) {
    match outcome {
        RefreshOutcome::Merged(report) => println!(
            "Fetched {} games: {} new, {} already stored",
            report.fetched, report.inserted, report.skipped
        ),
        RefreshOutcome::Skipped(reason) => info!(?reason, "remote refresh skipped"),
    }
}

fn print_list(view: &CatalogView) {
    for line in render_list(view) {
        println!("{}", line);
    }
}

/// A surfaced error replaces the listing.
fn render_list(view: &CatalogView) -> Vec<String> {
    if let Some(error) = &view.error {
        return vec![error.clone()];
    }
    if view.filtered.is_empty() {
        return vec!["No games found.".to_string()];
    }
    let mut lines: Vec<String> = view
        .filtered
        .iter()
        .map(|item| format!("{:>6}  {}  [{} / {}]", item.id, item.title, item.genre, item.platform))
        .collect();
    lines.push(format!("{} of {} games", view.filtered.len(), view.items.len()));
    lines
}

fn print_item(item: &CatalogItem) {
    println!("{} ({})", item.title, item.id);
    let fields = [
        ("Genre", &item.genre),
        ("Platform", &item.platform),
        ("Publisher", &item.publisher),
        ("Developer", &item.developer),
        ("Released", &item.release_date),
        ("Description", &item.short_description),
        ("Play", &item.detail_url),
        ("Profile", &item.profile_url),
        ("Thumbnail", &item.thumbnail_url),
    ];
    for (label, value) in fields {
        if !value.is_empty() {
            println!("  {:<12} {}", label, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_surfaced_error_replaces_listing() {
        let items = vec![CatalogItem::new(1, "Halo")];
        let view = CatalogView {
            filtered: items.clone(),
            items,
            error: Some("Transport error: connection refused".to_string()),
            ..CatalogView::default()
        };
        assert_eq!(render_list(&view), vec!["Transport error: connection refused"]);
    }

    #[test]
    fn test_listing_ends_with_totals() {
        let items = vec![
            CatalogItem::new(1, "Halo").with_genre("Shooter").with_platform("PC (Windows)"),
            CatalogItem::new(2, "Chess"),
        ];
        let view = CatalogView {
            filtered: items[..1].to_vec(),
            items,
            ..CatalogView::default()
        };
        let lines = render_list(&view);
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("Halo  [Shooter / PC (Windows)]"));
        assert_eq!(lines[1], "1 of 2 games");
    }

    #[test]
    fn test_empty_listing() {
        assert_eq!(render_list(&CatalogView::default()), vec!["No games found."]);
    }
}

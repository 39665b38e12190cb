use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use dom_anchor::actions::remap_actions;
use dom_anchor::core::config::DomConfig;
use dom_anchor::dom::raw::RawSnapshot;
use dom_anchor::dom::{DomProcessor, DomTree, HtmlSnapshotBuilder};
use dom_anchor::history::{AgentHistoryList, HistoryElement, HistoryTreeProcessor};
use dom_anchor::Config;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Inspect DOM snapshots and remap recorded agent history onto them.
#[derive(Parser)]
#[command(name = "dom-anchor")]
#[command(version)]
struct Cli {
    /// JSON configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the interactive elements of a snapshot
    Inspect { snapshot: PathBuf },

    /// Print the locator for an element index
    Selector {
        snapshot: PathBuf,
        index: usize,
        /// Leave class names and test ids out of the selector
        #[arg(long)]
        no_dynamic: bool,
    },

    /// Print the history record for an element index
    Capture { snapshot: PathBuf, index: usize },

    /// Look up a recorded element in a snapshot
    Find {
        history_element: PathBuf,
        snapshot: PathBuf,
    },

    /// Rewrite the element indices of a recorded history for a new snapshot
    Remap {
        history: PathBuf,
        snapshot: PathBuf,
        #[arg(short, long, value_name = "PATH")]
        out: Option<PathBuf>,
    },

    /// Convert an HTML page into a snapshot payload
    FromHtml { page: PathBuf },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("failed to read config at {}", path.display()))?,
        None => Config::default(),
    };
    let processor = DomProcessor::new(config.dom.clone());

    match cli.command {
        Commands::Inspect { snapshot } => {
            let tree = load_tree(&snapshot, &config.dom)?;
            info!(
                "{}: {} nodes, {} interactive",
                snapshot.display(),
                tree.len(),
                tree.selector_map().len()
            );
            println!("{}", processor.describe(&tree));
        }
        Commands::Selector {
            snapshot,
            index,
            no_dynamic,
        } => {
            let mut dom = config.dom.clone();
            if no_dynamic {
                dom.include_dynamic_attributes = false;
            }
            let tree = load_tree(&snapshot, &dom)?;
            let locator = DomProcessor::new(dom)
                .locator_for_index(&tree, index)
                .with_context(|| format!("no element with index {}", index))?;
            println!("{}", locator);
        }
        Commands::Capture { snapshot, index } => {
            let tree = load_tree(&snapshot, &config.dom)?;
            let element = processor
                .history_element_for_index(&tree, index)
                .with_context(|| format!("no element with index {}", index))?;
            println!("{}", serde_json::to_string_pretty(&element.to_record()?)?);
        }
        Commands::Find {
            history_element,
            snapshot,
        } => {
            let content = std::fs::read_to_string(&history_element)
                .with_context(|| format!("failed to read {}", history_element.display()))?;
            let element = HistoryElement::from_record(serde_json::from_str(&content)?)?;
            let tree = load_tree(&snapshot, &config.dom)?;

            let Some(id) = HistoryTreeProcessor::find_history_element_in_tree(&element, &tree)
            else {
                bail!("{} not found in {}", element, snapshot.display());
            };
            if let Some(found) = tree.element(id) {
                println!("{}", found);
                if let Some(locator) = found
                    .interaction_index
                    .and_then(|index| processor.locator_for_index(&tree, index))
                {
                    println!("{}", locator);
                }
            }
        }
        Commands::Remap {
            history,
            snapshot,
            out,
        } => {
            let mut list = AgentHistoryList::load_from_file(&history)?;
            let tree = load_tree(&snapshot, &config.dom)?;

            let mut failed = 0;
            for (i, item) in list.history.iter_mut().enumerate() {
                match remap_actions(item, &tree) {
                    Ok(actions) => {
                        if let Some(output) = item.model_output.as_mut() {
                            output.action = actions;
                        }
                    }
                    Err(e) => {
                        failed += 1;
                        warn!("Step {}: {}", i + 1, e);
                    }
                }
            }
            info!("Remapped {} steps ({} unmatched)", list.len(), failed);

            match out {
                Some(path) => list.save_to_file(&path)?,
                None => println!("{}", serde_json::to_string_pretty(&list)?),
            }
        }
        Commands::FromHtml { page } => {
            let raw = read_html(&page, &config.dom)?;
            println!("{}", serde_json::to_string_pretty(&raw)?);
        }
    }

    Ok(())
}

fn is_html(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("html") || ext.eq_ignore_ascii_case("htm"))
}

fn read_html(path: &Path, dom: &DomConfig) -> Result<RawSnapshot> {
    let html = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    Ok(HtmlSnapshotBuilder::new(dom.clone()).build(&html)?)
}

fn load_tree(path: &Path, dom: &DomConfig) -> Result<DomTree> {
    if is_html(path) {
        return Ok(DomTree::from_raw(&read_html(path, dom)?)?);
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    DomTree::from_json_str(&content)
        .with_context(|| format!("invalid snapshot {}", path.display()))
}

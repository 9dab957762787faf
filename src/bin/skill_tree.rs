//! Skill Tree command-line host.
//!
//! Drives the kernel against a file-backed store so a tree can be built
//! and progressed from a terminal.
//!
//! ## Configuration
//!
//! Environment variables:
//! - `SKILL_TREE_DATA_DIR`: directory holding the tree file (default: `.skill-tree`)
//! - `SKILL_TREE_STORAGE_KEY`: record key (default: `skill-tree-builder`)
//! - `SKILL_TREE_DEFAULT_POINTS`: budget for new trees (default: 10)
//! - `RUST_LOG`: Log level filter (default: info)
//! - `LOG_FORMAT`: "json" for structured logs, "pretty" for development (default: pretty)
//!
//! ## Usage
//!
//! ```bash
//! cargo run --bin skill_tree --features cli -- add "Archery" --cost 2
//! cargo run --bin skill_tree --features cli -- connect "Root Skill" Archery
//! ```

use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use skill_tree_kernel::{
    EngineConfig, FileStore, Position, SkillDraft, SkillNode, SkillTree, TreeSession,
};

/// Build and progress a prerequisite skill tree.
#[derive(Parser)]
#[command(name = "skill_tree", version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Output machine-readable JSON instead of text.
    #[arg(long, global = true)]
    json: bool,

    /// Directory holding the tree file.
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Storage key of the tree record.
    #[arg(long, global = true)]
    key: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show every skill, its status and the point readout.
    #[command(alias = "ls")]
    Show,

    /// Create a skill.
    Add {
        /// Skill title (must be unique).
        title: String,
        /// Optional description.
        #[arg(long)]
        description: Option<String>,
        /// Point cost per level.
        #[arg(long)]
        cost: Option<f64>,
        /// Level multiplier.
        #[arg(long)]
        level: Option<f64>,
    },

    /// Create a placeholder skill that requires an existing one.
    Branch {
        /// Prerequisite skill (id or title).
        source: String,
        /// Canvas x position.
        #[arg(long, default_value_t = 0.0)]
        x: f64,
        /// Canvas y position.
        #[arg(long, default_value_t = 0.0)]
        y: f64,
    },

    /// Edit a skill's title, description, cost and level.
    Edit {
        /// Skill (id or title).
        skill: String,
        /// New title.
        title: String,
        /// New description.
        #[arg(long)]
        description: Option<String>,
        /// New cost.
        #[arg(long)]
        cost: Option<f64>,
        /// New level.
        #[arg(long)]
        level: Option<f64>,
    },

    /// Delete a skill and its prerequisites.
    #[command(alias = "rm")]
    Remove {
        /// Skill (id or title).
        skill: String,
    },

    /// Require `source` before `target`.
    Connect {
        /// Prerequisite skill (id or title).
        source: String,
        /// Dependent skill (id or title).
        target: String,
    },

    /// Remove a prerequisite by edge id.
    Disconnect {
        /// Edge id.
        edge_id: String,
    },

    /// Spend points on an unlockable skill.
    Unlock {
        /// Skill (id or title).
        skill: String,
    },

    /// Mark an unlocked skill completed.
    Complete {
        /// Skill (id or title).
        skill: String,
    },

    /// Set the total point budget.
    Budget {
        /// New total.
        #[arg(allow_negative_numbers = true)]
        total: f64,
    },

    /// Highlight skills whose title contains a query.
    Search {
        /// Query text.
        query: String,
    },

    /// Clear the tree back to a single root skill.
    Reset,

    /// Write the serialized tree to stdout or a file.
    Export {
        /// Output file.
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Replace the tree with a serialized document.
    Import {
        /// Input file.
        path: PathBuf,
    },
}

/// Initialize the tracing subscriber with JSON or pretty format
fn init_tracing() {
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string());

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "skill_tree=info,skill_tree_kernel=info".into());

    if log_format == "json" {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .flatten_event(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .init();
    }
}

/// Resolve a skill reference: exact id first, then case-insensitive title.
fn resolve(tree: &SkillTree, reference: &str) -> Result<String> {
    if let Some(node) = tree.node(reference) {
        return Ok(node.id.clone());
    }

    let wanted = reference.trim().to_lowercase();
    let matches: Vec<&SkillNode> = tree
        .nodes()
        .iter()
        .filter(|node| node.data.title.trim().to_lowercase() == wanted)
        .collect();

    match matches.as_slice() {
        [node] => Ok(node.id.clone()),
        [] => bail!("No skill matches \"{reference}\""),
        _ => bail!("\"{reference}\" matches several skills, use an id"),
    }
}

fn format_points(points: f64) -> String {
    if points.fract() == 0.0 {
        format!("{points}")
    } else {
        format!("{points:.1}")
    }
}

fn print_tree(tree: &SkillTree, json: bool) -> Result<()> {
    if json {
        let value = serde_json::json!({
            "pointsSpent": tree.points_spent(),
            "pointsTotal": tree.points_total(),
            "nodes": tree.nodes(),
            "edges": tree.edges(),
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!(
        "Skill points: {} / {}",
        format_points(tree.points_spent()),
        tree.points_total()
    );
    for node in tree.nodes() {
        let points = skill_tree_kernel::required_points(Some(&node.data));
        println!(
            "  [{:<10}] {}  ({} pts)  id={}",
            node.status(),
            node.data.title,
            format_points(points),
            node.id
        );
    }
    for edge in tree.edges() {
        let title = |id: &str| tree.node(id).map_or(id.to_string(), |n| n.data.title.clone());
        println!("  {} -> {}  id={}", title(&edge.source), title(&edge.target), edge.id);
    }
    Ok(())
}

fn draft(title: String, description: Option<String>, cost: Option<f64>, level: Option<f64>) -> SkillDraft {
    let mut draft = SkillDraft::new(title).with_points(cost, level);
    draft.description = description;
    draft
}

fn run(cli: Cli) -> Result<()> {
    let mut config = EngineConfig::from_env();
    if let Some(dir) = cli.data_dir {
        config = config.with_data_dir(dir);
    }
    if let Some(key) = cli.key {
        config = config.with_storage_key(key);
    }

    let store = FileStore::open(&config.data_dir)
        .with_context(|| format!("Cannot use data directory {}", config.data_dir.display()))?;
    let mut session = TreeSession::from_config(store, &config);

    match cli.command {
        Command::Show => {}
        Command::Add { title, description, cost, level } => {
            let id = session.apply(|tree| tree.add_skill(draft(title, description, cost, level)))?;
            info!(skill_id = %id, "Created skill");
        }
        Command::Branch { source, x, y } => {
            let source = resolve(session.tree(), &source)?;
            let id = session.apply(|tree| tree.add_dependent_skill(&source, Position::new(x, y)))?;
            info!(skill_id = %id, "Created dependent skill");
        }
        Command::Edit { skill, title, description, cost, level } => {
            let id = resolve(session.tree(), &skill)?;
            session.apply(|tree| tree.update_skill(&id, draft(title, description, cost, level)))?;
        }
        Command::Remove { skill } => {
            let id = resolve(session.tree(), &skill)?;
            session.apply(|tree| tree.remove_skill(&id))?;
        }
        Command::Connect { source, target } => {
            let source = resolve(session.tree(), &source)?;
            let target = resolve(session.tree(), &target)?;
            session.apply(|tree| tree.connect(&source, &target))?;
        }
        Command::Disconnect { edge_id } => {
            session.apply(|tree| tree.disconnect(&edge_id))?;
        }
        Command::Unlock { skill } => {
            let id = resolve(session.tree(), &skill)?;
            session.apply(|tree| tree.unlock(&id))?;
        }
        Command::Complete { skill } => {
            let id = resolve(session.tree(), &skill)?;
            session.apply(|tree| tree.complete(&id))?;
        }
        Command::Budget { total } => {
            let adjustment = session.apply(|tree| tree.set_points_total(total))?;
            if adjustment.clamped {
                eprintln!(
                    "Total skill points cannot be less than spent points; set to {}.",
                    adjustment.total
                );
            }
        }
        Command::Search { query } => {
            let highlight = session.tree().search(&query);
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&highlight)?);
            } else {
                for node in session.tree().nodes() {
                    let marker = if highlight.match_ids.contains(&node.id) {
                        "*"
                    } else if highlight.highlighted_ids.contains(&node.id) {
                        "+"
                    } else {
                        continue;
                    };
                    println!("{marker} {}", node.data.title);
                }
            }
            return Ok(());
        }
        Command::Reset => {
            if !session.reset() {
                bail!("Tree was reset but could not be saved");
            }
        }
        Command::Export { output } => {
            let text = session.export();
            match output {
                Some(path) => fs::write(&path, text)
                    .with_context(|| format!("Cannot write {}", path.display()))?,
                None => println!("{text}"),
            }
            return Ok(());
        }
        Command::Import { path } => {
            let text = fs::read_to_string(&path)
                .with_context(|| format!("Cannot read {}", path.display()))?;
            if !session.import(&text)? {
                bail!("Imported tree could not be saved");
            }
        }
    }

    if session.is_dirty() && !session.persist() {
        bail!("Skill tree could not be saved to {}", config.data_dir.display());
    }
    print_tree(session.tree(), cli.json)
}

fn main() -> Result<()> {
    init_tracing();
    run(Cli::parse())
}

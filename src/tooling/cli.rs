//! CLI Tooling
//!
//! Command-line interface over a workspace's node store. Every mutating
//! command goes through `HierarchyCache`, so ancestor caches stay current.

use crate::cache::{verify_all, CacheRecord, HierarchyCache, RecordingObserver};
use crate::config::{CanopyConfig, ConfigLoader, WORKSPACE_CONFIG_FILE};
use crate::error::ApiError;
use crate::store::{Node, NodeStore, SledNodeStore};
use crate::tooling::format::{
    format_descendant_table, format_node_text, format_rebuild_text, format_ripple_summary,
    format_tree, format_verify_text,
};
use crate::types::NodeID;
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Canopy CLI - materialized descendant caches for node trees
#[derive(Parser)]
#[command(name = "canopy")]
#[command(about = "Maintain cached descendant snapshots for a stored node tree")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace root directory
    #[arg(long, default_value = ".")]
    pub workspace: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file, file+stderr, both)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output includes "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

/// Output format of the inspection commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a default canopy.toml into the workspace
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Create a node
    Create {
        /// Display name
        title: String,
        /// Parent node id (omit for top level)
        #[arg(long)]
        parent: Option<NodeID>,
        /// Short name (defaults to the title, lowercased)
        #[arg(long)]
        alias: Option<String>,
        /// Sibling ordering key
        #[arg(long, default_value = "0")]
        position: i64,
        /// Create the node unpublished
        #[arg(long)]
        unpublished: bool,
    },
    /// Edit a node's own fields
    Update {
        id: NodeID,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        alias: Option<String>,
        #[arg(long)]
        position: Option<i64>,
        #[arg(long)]
        published: Option<bool>,
    },
    /// Give a node a new parent
    Move {
        id: NodeID,
        /// New parent id
        #[arg(long, conflicts_with = "top")]
        parent: Option<NodeID>,
        /// Move to the top level
        #[arg(long)]
        top: bool,
    },
    /// Delete a node, cleaning its parent's cache first
    Delete { id: NodeID },
    /// Show a node and its cache record
    Show {
        id: NodeID,
        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// List every cached descendant of a node
    Descendants {
        id: NodeID,
        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Render a node's cached subtree
    Tree { id: NodeID },
    /// Check every cache record against the stored tree
    Verify {
        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Recompute every cache record from parent pointers
    Rebuild {
        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
}

/// Everything a command needs: configuration, store and cache
pub struct CliContext {
    workspace_root: PathBuf,
    config: CanopyConfig,
    cache: HierarchyCache,
    observer: Arc<RecordingObserver>,
}

impl CliContext {
    pub fn new(workspace_root: PathBuf, config_path: Option<PathBuf>) -> Result<Self, ApiError> {
        let config = match config_path {
            Some(path) => ConfigLoader::load_from_file(&path)?,
            None => ConfigLoader::load(&workspace_root)?,
        };
        let store_path = config.storage.resolve_store_path(&workspace_root)?;
        let store: Arc<dyn NodeStore> = Arc::new(SledNodeStore::open(&store_path)?);
        Ok(Self::with_store(workspace_root, config, store))
    }

    /// Build a context over an already opened store
    pub fn with_store(
        workspace_root: PathBuf,
        config: CanopyConfig,
        store: Arc<dyn NodeStore>,
    ) -> Self {
        let observer = Arc::new(RecordingObserver::new());
        let cache = HierarchyCache::with_config(store, &config.propagation)
            .with_observer(observer.clone());
        Self {
            workspace_root,
            config,
            cache,
            observer,
        }
    }

    pub fn config(&self) -> &CanopyConfig {
        &self.config
    }

    pub fn cache(&self) -> &HierarchyCache {
        &self.cache
    }

    fn load(&self, id: NodeID) -> Result<Node, ApiError> {
        self.cache
            .store()
            .get(id)?
            .ok_or(ApiError::NodeNotFound(id))
    }

    fn save_and_report(&self, verb: &str, node: &mut Node) -> Result<String, ApiError> {
        self.observer.drain();
        let id = self.cache.save(node)?;
        self.cache.store().flush()?;
        info!(node_id = id, verb, "node saved");
        Ok(format!(
            "{} node {}\n{}",
            verb,
            id,
            format_ripple_summary(&self.observer.drain())
        ))
    }

    pub fn execute(&self, command: &Commands) -> Result<String, ApiError> {
        match command {
            Commands::Init { force } => self.init(*force),
            Commands::Create {
                title,
                parent,
                alias,
                position,
                unpublished,
            } => {
                let mut node = Node::new(title.clone())
                    .with_parent(*parent)
                    .with_position(*position)
                    .with_published(!unpublished);
                if let Some(alias) = alias {
                    node.alias = alias.clone();
                }
                self.save_and_report("Created", &mut node)
            }
            Commands::Update {
                id,
                title,
                alias,
                position,
                published,
            } => {
                let mut node = self.load(*id)?;
                if let Some(title) = title {
                    node.title = title.clone();
                }
                if let Some(alias) = alias {
                    node.alias = alias.clone();
                }
                if let Some(position) = position {
                    node.position = *position;
                }
                if let Some(published) = published {
                    node.published = *published;
                }
                self.save_and_report("Updated", &mut node)
            }
            Commands::Move { id, parent, top } => {
                if parent.is_none() && !top {
                    return Err(ApiError::InvalidArgument(
                        "move needs --parent <id> or --top".to_string(),
                    ));
                }
                if let Some(parent) = parent {
                    if self.cache.is_descendant(*id, *parent)? {
                        return Err(ApiError::InvalidArgument(format!(
                            "node {} is a descendant of {}",
                            parent, id
                        )));
                    }
                    self.load(*parent)?;
                }
                let mut node = self.load(*id)?;
                node.parent = *parent;
                self.save_and_report("Moved", &mut node)
            }
            Commands::Delete { id } => {
                let node = self.load(*id)?;
                self.observer.drain();
                self.cache.remove(&node)?;
                self.cache.store().flush()?;
                Ok(format!(
                    "Deleted node {}\n{}",
                    id,
                    format_ripple_summary(&self.observer.drain())
                ))
            }
            Commands::Show { id, format } => {
                let node = self.load(*id)?;
                let record = CacheRecord::from_node(&node)?;
                match format {
                    OutputFormat::Json => to_json(&node),
                    OutputFormat::Text => Ok(format_node_text(&node, &record)),
                }
            }
            Commands::Descendants { id, format } => match format {
                OutputFormat::Json => {
                    let ids = self.cache.descendant_ids(*id)?;
                    to_json(&json!({ "id": id, "descendants": ids }))
                }
                OutputFormat::Text => {
                    Ok(format_descendant_table(&self.cache.descendant_snapshot(*id)?))
                }
            },
            Commands::Tree { id } => {
                let node = self.load(*id)?;
                let record = CacheRecord::from_node(&node)?;
                Ok(format_tree(&node, &record.descendants))
            }
            Commands::Verify { format } => {
                let report = verify_all(self.cache.store().as_ref())?;
                match format {
                    OutputFormat::Json => to_json(&report),
                    OutputFormat::Text => Ok(format_verify_text(&report)),
                }
            }
            Commands::Rebuild { format } => {
                let report = self.cache.rebuild_all()?;
                match format {
                    OutputFormat::Json => to_json(&report),
                    OutputFormat::Text => Ok(format_rebuild_text(&report)),
                }
            }
        }
    }

    fn init(&self, force: bool) -> Result<String, ApiError> {
        let path = self.workspace_root.join(WORKSPACE_CONFIG_FILE);
        if path.exists() && !force {
            return Ok(format!(
                "{} already exists (use --force to overwrite)",
                path.display()
            ));
        }
        let text = toml::to_string_pretty(&CanopyConfig::default())
            .map_err(|e| ApiError::ConfigError(format!("Failed to render config: {}", e)))?;
        std::fs::write(&path, text).map_err(|e| {
            ApiError::ConfigError(format!("Failed to write {}: {}", path.display(), e))
        })?;
        Ok(format!("Wrote {}", path.display()))
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, ApiError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| ApiError::InvalidArgument(format!("Failed to render JSON: {}", e)))
}

use anyhow::Context;
use colored::Colorize;
use serde_json::json;
use tracing::debug;
use valya_format::Compressed;
use valya_sdk::{
    BlockId, BlockStore, Decoded, DirectoryBlockStore, InMemoryBlockStore, ValyaBlockStore,
    ValyaConfig,
};

use crate::cli::*;

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = resolve_config(&cli)?;
    match cli.command {
        Command::Put(args) => cmd_put(&config, args, &cli.format).await,
        Command::Plan(args) => cmd_plan(&config, args, &cli.format).await,
        Command::Inspect(args) => cmd_inspect(&config, args, &cli.format).await,
        Command::List => cmd_list(&config, &cli.format).await,
    }
}

/// Config file values, then command-line overrides.
fn resolve_config(cli: &Cli) -> anyhow::Result<ValyaConfig> {
    let mut config = match &cli.config {
        Some(path) => ValyaConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => ValyaConfig::default(),
    };
    if let Some(store) = &cli.store {
        config.store_root = store.clone();
    }
    if let Some(version) = cli.version_format {
        config.version = version;
    }
    debug!(
        store = %config.store_root.display(),
        version = %config.version,
        max_block_size = ?config.max_block_size,
        "resolved config"
    );
    Ok(config)
}

async fn open_store(config: &ValyaConfig) -> anyhow::Result<ValyaBlockStore<DirectoryBlockStore>> {
    let source = DirectoryBlockStore::open(&config.store_root)
        .await
        .with_context(|| format!("opening store {}", config.store_root.display()))?;
    Ok(ValyaBlockStore::from_config(source, config)?)
}

async fn cmd_put(config: &ValyaConfig, args: PutArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let content = tokio::fs::read(&args.file)
        .await
        .with_context(|| format!("reading {}", args.file.display()))?;
    let store = open_store(config).await?;
    let root = store.put(&content).await?;

    match format {
        OutputFormat::Json => println!(
            "{}",
            json!({
                "file": args.file.display().to_string(),
                "bytes": content.len(),
                "version": config.version.label(),
                "root": root.to_string(),
            })
        ),
        OutputFormat::Text => {
            println!(
                "{} Stored {} ({} bytes)",
                "✓".green().bold(),
                args.file.display().to_string().bold(),
                content.len()
            );
            println!("  Root: {}", root.to_string().yellow());
        }
    }
    Ok(())
}

async fn cmd_plan(config: &ValyaConfig, args: PlanArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let content = tokio::fs::read(&args.file)
        .await
        .with_context(|| format!("reading {}", args.file.display()))?;
    let store = ValyaBlockStore::from_config(InMemoryBlockStore::new(), config)?;
    let plan = store.plan(content)?;
    let levels = match &plan.compressed {
        Compressed::Tree { levels, .. } => *levels,
        _ => 0,
    };
    let nodes = plan.compressed.nodes();

    match format {
        OutputFormat::Json => println!(
            "{}",
            json!({
                "file": args.file.display().to_string(),
                "version": config.version.label(),
                "leaves": plan.leaves.len(),
                "nodes": nodes.len(),
                "levels": levels,
                "root": plan.root().to_string(),
            })
        ),
        OutputFormat::Text => {
            println!("Plan for {}", args.file.display().to_string().bold());
            println!("  Version: {}", config.version.label().cyan());
            println!("  Leaves: {}", plan.leaves.len());
            println!("  Index nodes: {} over {} levels", nodes.len(), levels);
            println!("  Root: {}", plan.root().to_string().yellow());
        }
    }
    Ok(())
}

async fn cmd_inspect(
    config: &ValyaConfig,
    args: InspectArgs,
    format: &OutputFormat,
) -> anyhow::Result<()> {
    let id: BlockId = args
        .id
        .parse()
        .with_context(|| format!("parsing identifier {:?}", args.id))?;
    let store = open_store(config).await?;
    let bytes = store.source().fetch(&id).await?;
    let decoded = store.decode(&bytes);

    let kind = match &decoded {
        Decoded::Empty => "empty",
        Decoded::NotIndexNode => "leaf",
        Decoded::Corrupted(_) => "corrupted",
        Decoded::Index(_) => "index",
    };

    match format {
        OutputFormat::Json => {
            let mut out = json!({ "id": id.to_string(), "bytes": bytes.len(), "kind": kind });
            match &decoded {
                Decoded::Index(children) => {
                    out["children"] = children.iter().map(ToString::to_string).collect();
                }
                Decoded::Corrupted(e) => out["error"] = json!(e.to_string()),
                _ => {}
            }
            println!("{out}");
        }
        OutputFormat::Text => {
            println!("Block {} ({} bytes)", id.to_string().yellow().bold(), bytes.len());
            match decoded {
                Decoded::Empty => println!("  Kind: {}", "empty".dimmed()),
                Decoded::NotIndexNode => println!("  Kind: {}", "leaf".green()),
                Decoded::Corrupted(e) => {
                    println!("  Kind: {}", "corrupted index node".red().bold());
                    println!("  Error: {e}");
                }
                Decoded::Index(children) => {
                    println!("  Kind: {} with {} children", "index node".cyan(), children.len());
                    for child in &children {
                        println!("    {child}");
                    }
                }
            }
        }
    }
    Ok(())
}

async fn cmd_list(config: &ValyaConfig, format: &OutputFormat) -> anyhow::Result<()> {
    let store = open_store(config).await?;
    let mut ids: Vec<BlockId> = store.list().await?.into_iter().collect();
    ids.sort();

    match format {
        OutputFormat::Json => {
            let ids: Vec<String> = ids.iter().map(ToString::to_string).collect();
            println!("{}", json!({ "blocks": ids }));
        }
        OutputFormat::Text => {
            if ids.is_empty() {
                println!("No blocks.");
            }
            for id in &ids {
                println!("{id}");
            }
        }
    }
    Ok(())
}

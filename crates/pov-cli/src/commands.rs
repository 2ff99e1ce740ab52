use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context as _};
use chrono::{DateTime, SecondsFormat, Utc};
use colored::Colorize;
use pov_ledger::{parse_exact, Bootstrap, HashChain, LedgerConfig};
use pov_server::{PovServer, ServerConfig};
use pov_store::FileBlockStore;
use pov_types::Block;
use serde_json::json;

use crate::cli::*;

/// Options shared by every subcommand.
struct Context {
    data_dir: Option<PathBuf>,
    format: OutputFormat,
}

impl Context {
    fn data_dir(&self) -> PathBuf {
        self.data_dir
            .clone()
            .unwrap_or_else(|| ServerConfig::default().data_dir)
    }

    fn json(&self) -> bool {
        self.format == OutputFormat::Json
    }
}

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let runtime = tokio::runtime::Runtime::new().context("failed to start async runtime")?;
    let ctx = Context {
        data_dir: cli.data_dir,
        format: cli.format,
    };
    runtime.block_on(async move {
        match cli.command {
            Command::Init => cmd_init(&ctx).await,
            Command::Append(args) => cmd_append(&ctx, args).await,
            Command::Log(args) => cmd_log(&ctx, args).await,
            Command::Verify => cmd_verify(&ctx).await,
            Command::Serve(args) => cmd_serve(&ctx, args).await,
        }
    })
}

fn open_store(ctx: &Context) -> anyhow::Result<Arc<FileBlockStore>> {
    let dir = ctx.data_dir();
    tracing::debug!(dir = %dir.display(), "opening ledger directory");
    let store = FileBlockStore::open(&dir)
        .with_context(|| format!("failed to open ledger directory {}", dir.display()))?;
    Ok(Arc::new(store))
}

/// Open a ledger that `pov init` has already created.
async fn open_existing(ctx: &Context) -> anyhow::Result<HashChain> {
    let ledger = HashChain::new(open_store(ctx)?, LedgerConfig::default());
    if ledger.head().await?.is_none() {
        bail!(
            "no ledger in {}; run `pov init` first",
            ctx.data_dir().display()
        );
    }
    ledger.bootstrap().await?;
    Ok(ledger)
}

async fn cmd_init(ctx: &Context) -> anyhow::Result<()> {
    let ledger = HashChain::new(open_store(ctx)?, LedgerConfig::default());
    let dir = ctx.data_dir();
    match ledger.bootstrap().await? {
        Bootstrap::Created(genesis) => {
            if ctx.json() {
                println!("{}", serde_json::to_string_pretty(&genesis)?);
            } else {
                println!("{} Initialized ledger in {}", "✓".green().bold(), dir.display().to_string().bold());
                println!("  Genesis: {}", genesis.hash.cyan());
            }
        }
        Bootstrap::Existing => {
            let count = ledger.block_count().await?;
            if ctx.json() {
                println!("{}", json!({ "initialized": false, "blocks": count }));
            } else {
                println!("Ledger already initialized in {} ({} blocks)", dir.display().to_string().bold(), count);
            }
        }
    }
    Ok(())
}

async fn cmd_append(ctx: &Context, args: AppendArgs) -> anyhow::Result<()> {
    let payload = parse_exact(args.payload.as_bytes()).context("payload is not valid JSON")?;
    let ledger = open_existing(ctx).await?;
    let block = ledger.append(payload).await?;
    if ctx.json() {
        println!("{}", serde_json::to_string_pretty(&block)?);
    } else {
        println!("{} Appended block {}", "✓".green().bold(), format!("#{}", block.index).yellow());
        println!("  Hash: {}", block.hash.cyan());
        println!("  Previous: {}", block.previous_hash.dimmed());
    }
    Ok(())
}

async fn cmd_log(ctx: &Context, args: LogArgs) -> anyhow::Result<()> {
    let ledger = open_existing(ctx).await?;
    let blocks = ledger.read_all().collect_all().await?;
    let recent: Vec<&Block> = blocks.iter().rev().take(args.limit).collect();

    if ctx.json() {
        println!("{}", serde_json::to_string_pretty(&recent)?);
        return Ok(());
    }
    for block in recent {
        if args.oneline {
            println!("{} {} {}", format!("#{}", block.index).yellow(), short_hash(&block.hash).dimmed(), block.payload);
        } else {
            println!("{}  {}", format!("block #{}", block.index).yellow().bold(), block.hash.dimmed());
            println!("  Time:     {}", format_timestamp(block.timestamp));
            println!("  Previous: {}", short_hash(&block.previous_hash));
            println!("  Payload:  {}", block.payload);
            println!();
        }
    }
    Ok(())
}

async fn cmd_verify(ctx: &Context) -> anyhow::Result<()> {
    let ledger = open_existing(ctx).await?;
    let report = ledger.audit().await?;

    if ctx.json() {
        println!(
            "{}",
            json!({
                "valid": report.is_valid(),
                "first_invalid_index": report.fault.as_ref().map(|f| f.index),
                "blocks_checked": report.blocks_checked,
            })
        );
    } else if report.is_valid() {
        println!("{} Hash chain integrity verified", "✓".green().bold());
        println!("  Blocks: {}", report.blocks_checked.to_string().bold());
    }

    match report.fault {
        None => Ok(()),
        Some(fault) => {
            if !ctx.json() {
                println!("{} Hash chain broken at block {}", "✗".red().bold(), format!("#{}", fault.index).yellow());
                println!("  Problem: {:?}", fault.kind);
                println!("  Intact blocks before it: {}", report.blocks_checked);
            }
            bail!("ledger corrupted at block {}", fault.index)
        }
    }
}

async fn cmd_serve(ctx: &Context, args: ServeArgs) -> anyhow::Result<()> {
    let mut config = match &args.config {
        Some(path) => ServerConfig::from_toml_file(path)?,
        None => ServerConfig::default(),
    };
    if let Some(dir) = &ctx.data_dir {
        config.data_dir = dir.clone();
    }
    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }

    println!("Ledger server on {} (data: {})", config.bind_addr.to_string().bold(), config.data_dir.display());
    PovServer::new(config).serve().await?;
    Ok(())
}

fn short_hash(hash: &str) -> &str {
    hash.get(..12).unwrap_or(hash)
}

fn format_timestamp(secs: f64) -> String {
    let whole = secs.floor();
    let nanos = ((secs - whole) * 1e9) as u32;
    match DateTime::<Utc>::from_timestamp(whole as i64, nanos) {
        Some(t) => t.to_rfc3339_opts(SecondsFormat::Millis, true),
        None => secs.to_string(),
    }
}

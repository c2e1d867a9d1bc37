use std::path::Path;

use anyhow::Context;
use bytes::Bytes;
use colored::Colorize;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use zenea_server::{ServerConfig, SourceSpec, ZeneaServer};
use zenea_store::{sequence, BlockStorage, PutError, StorageList};
use zenea_types::{Block, BlockId};

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let runtime = tokio::runtime::Runtime::new().context("starting async runtime")?;
    runtime.block_on(async move {
        match cli.command {
            Command::Serve(args) => cmd_serve(args).await,
            Command::Put(args) => cmd_put(args).await,
            Command::Fetch(args) => cmd_fetch(args).await,
            Command::Check(args) => cmd_check(args).await,
            Command::List(args) => cmd_list(args).await,
        }
    })
}

fn open(args: &SourceArgs) -> StorageList<zenea_server::topology::Source> {
    sequence(args.sources.iter().map(SourceSpec::open))
}

fn server_config(args: ServeArgs) -> anyhow::Result<ServerConfig> {
    let mut config = match &args.config {
        Some(path) => ServerConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => ServerConfig::default(),
    };
    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }
    if let Some(dir) = args.data_dir {
        config.data_dir = dir;
    }
    if !args.upstream.is_empty() {
        config.upstreams = args.upstream.iter().map(ToString::to_string).collect();
    }
    if args.no_cache {
        config.cache = false;
    }
    Ok(config)
}

async fn cmd_serve(args: ServeArgs) -> anyhow::Result<()> {
    let config = server_config(args)?;
    let server = ZeneaServer::new(config)?;
    println!(
        "{} Serving {} on {}",
        "✓".green().bold(),
        server.storage().to_string().cyan(),
        server.config().bind_addr.to_string().bold()
    );
    server.serve().await?;
    Ok(())
}

/// Read the whole input, refusing anything that cannot be a block.
async fn read_input(file: Option<&Path>) -> anyhow::Result<Bytes> {
    let mut data = Vec::new();
    let limit = Block::MAX_BYTES as u64 + 1;
    match file {
        Some(path) if path != Path::new("-") => {
            let file = tokio::fs::File::open(path)
                .await
                .with_context(|| format!("opening {}", path.display()))?;
            file.take(limit).read_to_end(&mut data).await?;
        }
        _ => {
            tokio::io::stdin().take(limit).read_to_end(&mut data).await?;
        }
    }
    Ok(Bytes::from(data))
}

/// Store `data`, treating already-stored content as success.
///
/// Returns the block and whether it was newly stored.
async fn put(storage: &impl BlockStorage, data: Bytes) -> anyhow::Result<(Block, bool)> {
    match storage.put_data(data).await {
        Ok(block) => Ok((block, true)),
        Err(PutError::Exists(block)) => Ok((block, false)),
        Err(err) => Err(err).with_context(|| format!("storing in {storage}")),
    }
}

async fn cmd_put(args: PutArgs) -> anyhow::Result<()> {
    let data = read_input(args.file.as_deref()).await?;
    let storage = open(&args.source);
    let (block, created) = put(&storage, data).await?;
    if created {
        println!(
            "{} Stored {} ({} bytes)",
            "✓".green().bold(),
            block.id().to_string().yellow(),
            block.len()
        );
    } else {
        println!("{} Already stored {}", "✓".green(), block.id().to_string().yellow());
    }
    Ok(())
}

async fn cmd_fetch(args: FetchArgs) -> anyhow::Result<()> {
    let storage = open(&args.source);
    let block = storage
        .fetch_block(&args.id)
        .await
        .with_context(|| format!("fetching {} from {storage}", args.id))?;
    match &args.output {
        Some(path) => {
            tokio::fs::write(path, block.content())
                .await
                .with_context(|| format!("writing {}", path.display()))?;
            eprintln!("{} Wrote {} bytes to {}", "✓".green(), block.len(), path.display());
        }
        None => {
            let mut stdout = tokio::io::stdout();
            stdout.write_all(block.content()).await?;
            stdout.flush().await?;
        }
    }
    Ok(())
}

async fn check(storage: &impl BlockStorage, id: &BlockId) -> anyhow::Result<bool> {
    storage
        .check_block(id)
        .await
        .with_context(|| format!("checking {id} in {storage}"))
}

async fn cmd_check(args: CheckArgs) -> anyhow::Result<()> {
    let storage = open(&args.source);
    if check(&storage, &args.id).await? {
        println!("{} {}", "present".green().bold(), args.id);
    } else {
        println!("{} {}", "absent".red().bold(), args.id);
    }
    Ok(())
}

async fn cmd_list(args: ListArgs) -> anyhow::Result<()> {
    let storage = open(&args.source);
    let mut ids: Vec<_> = storage
        .list_blocks()
        .await
        .with_context(|| format!("listing {storage}"))?
        .into_iter()
        .collect();
    ids.sort();
    for id in &ids {
        println!("{id}");
    }
    eprintln!("{} blocks", ids.len().to_string().bold());
    Ok(())
}

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use colored::Colorize;
use serde_json::json;
use snap_core::{
    AddOutcome, Board, BoardConfig, ImageUpload, LikeOutcome, LocalIdentity, RemoveOutcome,
    Session,
};
use snap_server::{ServerConfig, SnapServer};
use snap_store::{FileBlobStore, FileItemStore, FileLocalStorage};
use snap_types::{DeviceId, InventoryItem, ItemName, UserProfile};

use crate::cli::{AddArgs, Cli, Command, NameArgs, OutputFormat, ServeArgs};

const DEVICE_ID_FILE: &str = "device-id";

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    if let Command::Serve(args) = &cli.command {
        return cmd_serve(&cli, args).await;
    }

    let device = resolve_device(&cli.data_dir, cli.device.as_deref())?;
    let board = open_board(&cli, &device)?;
    let identity = match &cli.user {
        Some(id) => {
            let name = cli.user_name.clone().unwrap_or_else(|| id.clone());
            LocalIdentity::signed_in(UserProfile::new(id.clone(), name))
        }
        None => LocalIdentity::new(),
    };
    let session = Session::follow(&identity);
    tracing::debug!(%device, user = ?cli.user, "session ready");

    match &cli.command {
        Command::List => cmd_list(&board, &cli.format).await,
        Command::Add(args) => cmd_add(&board, &session, args, &cli.format).await,
        Command::Remove(args) => cmd_remove(&board, &session, args, &cli.format).await,
        Command::Like(args) => {
            let name = ItemName::new(args.name.clone())?;
            let outcome = board.like(&session, &name).await?;
            print_like(&name, &outcome, &cli.format)
        }
        Command::Dislike(args) => {
            let name = ItemName::new(args.name.clone())?;
            let outcome = board.dislike(&session, &name).await?;
            print_like(&name, &outcome, &cli.format)
        }
        Command::Liked => cmd_liked(&board, &device, &cli.format),
        Command::Serve(_) => Ok(()),
    }
}

/// Use the given device id, or the one remembered under `data_dir`,
/// generating and remembering a fresh one on first use.
fn resolve_device(data_dir: &Path, explicit: Option<&str>) -> anyhow::Result<DeviceId> {
    if let Some(id) = explicit {
        return Ok(DeviceId::new(id)?);
    }
    let path = data_dir.join(DEVICE_ID_FILE);
    match std::fs::read_to_string(&path) {
        Ok(text) => DeviceId::new(text.trim())
            .with_context(|| format!("bad device id in {}", path.display())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            let id = DeviceId::generate();
            std::fs::create_dir_all(data_dir)
                .with_context(|| format!("creating {}", data_dir.display()))?;
            std::fs::write(&path, id.as_str())
                .with_context(|| format!("writing {}", path.display()))?;
            tracing::info!(device = %id, "new device id");
            Ok(id)
        }
        Err(e) => Err(e).with_context(|| format!("reading {}", path.display())),
    }
}

fn open_board(cli: &Cli, device: &DeviceId) -> anyhow::Result<Board> {
    let config = match &cli.config {
        Some(path) => BoardConfig::load(path)?,
        None => BoardConfig::default(),
    };
    let dir = &cli.data_dir;
    Ok(Board::new(
        Arc::new(FileItemStore::new(dir.join("items.json"))),
        Arc::new(FileBlobStore::new(dir.join("blobs"))),
        Arc::new(FileLocalStorage::new(
            dir.join("devices").join(format!("{}.json", device.as_str())),
        )),
        config,
    ))
}

async fn cmd_list(board: &Board, format: &OutputFormat) -> anyhow::Result<()> {
    let items = board.refresh().await?;
    match format {
        OutputFormat::Json => {
            let rows = items
                .iter()
                .map(|item| {
                    Ok(json!({
                        "item": item,
                        "likedHere": board.has_liked(&item.name)?,
                    }))
                })
                .collect::<anyhow::Result<Vec<_>>>()?;
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
        OutputFormat::Text => {
            if items.is_empty() {
                println!("No items yet.");
                return Ok(());
            }
            for item in &items {
                print_item(item, board.has_liked(&item.name)?);
            }
        }
    }
    Ok(())
}

fn print_item(item: &InventoryItem, liked_here: bool) {
    let marker = if liked_here { "♥".red().bold() } else { " ".normal() };
    let by = item
        .record
        .uploader_name
        .as_deref()
        .unwrap_or("unknown");
    println!(
        "{} {:<24} {:>5}  {}",
        marker,
        item.name.as_str().bold(),
        item.record.count.to_string().cyan(),
        format!("by {by}").dimmed(),
    );
    if item.record.has_image() {
        println!("    {}", item.record.image_url.blue());
    }
}

async fn cmd_add(
    board: &Board,
    session: &Session,
    args: &AddArgs,
    format: &OutputFormat,
) -> anyhow::Result<()> {
    let name = ItemName::new(args.name.clone())?;
    let image = match &args.image {
        Some(path) => {
            let bytes = std::fs::read(path)
                .with_context(|| format!("reading image {}", path.display()))?;
            let file_name = path
                .file_name()
                .and_then(|n| n.to_str())
                .with_context(|| format!("no usable file name in {}", path.display()))?;
            Some(ImageUpload::new(file_name, bytes))
        }
        None => None,
    };

    let outcome = board.add_item(session, &name, image).await?;
    if let OutputFormat::Json = format {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Ok(());
    }
    match outcome {
        AddOutcome::Created { record } => {
            println!("{} Posted {}", "✓".green().bold(), name.as_str().yellow());
            if record.has_image() {
                println!("  Image: {}", record.image_url.blue());
            }
        }
        AddOutcome::Incremented { count } => {
            println!(
                "{} {} already posted, count now {}",
                "✓".green(),
                name.as_str().yellow(),
                count.to_string().cyan()
            );
        }
    }
    Ok(())
}

async fn cmd_remove(
    board: &Board,
    session: &Session,
    args: &NameArgs,
    format: &OutputFormat,
) -> anyhow::Result<()> {
    let name = ItemName::new(args.name.clone())?;
    let outcome = board.remove_item(session, &name).await?;
    if let OutputFormat::Json = format {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Ok(());
    }
    match outcome {
        RemoveOutcome::Decremented { count } => println!(
            "{} {} count now {}",
            "✓".green(),
            name.as_str().yellow(),
            count.to_string().cyan()
        ),
        RemoveOutcome::Missing => println!("No item named {}", name.as_str().yellow()),
    }
    Ok(())
}

fn print_like(name: &ItemName, outcome: &LikeOutcome, format: &OutputFormat) -> anyhow::Result<()> {
    if let OutputFormat::Json = format {
        println!("{}", serde_json::to_string_pretty(outcome)?);
        return Ok(());
    }
    let name = name.as_str().yellow();
    match outcome {
        LikeOutcome::Liked { count } => {
            println!("{} Liked {} ({})", "♥".red().bold(), name, count.to_string().cyan())
        }
        LikeOutcome::Unliked { count } => {
            println!("{} Unliked {} ({})", "✓".green(), name, count.to_string().cyan())
        }
        LikeOutcome::AlreadyLiked => println!("Already liked {} on this device", name),
        LikeOutcome::NotLiked => println!("{} is not liked on this device", name),
    }
    Ok(())
}

fn cmd_liked(board: &Board, device: &DeviceId, format: &OutputFormat) -> anyhow::Result<()> {
    let liked = board.liked_items()?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&liked)?),
        OutputFormat::Text => {
            println!("Device {}", device.as_str().cyan());
            if liked.is_empty() {
                println!("  Nothing liked yet.");
            }
            for name in &liked {
                println!("  {} {}", "♥".red(), name.as_str());
            }
        }
    }
    Ok(())
}

async fn cmd_serve(cli: &Cli, args: &ServeArgs) -> anyhow::Result<()> {
    let mut config = match &args.server_config {
        Some(path) => ServerConfig::load(path)?,
        None => ServerConfig {
            data_dir: Some(cli.data_dir.clone()),
            device_state_dir: Some(cli.data_dir.join("devices")),
            ..ServerConfig::default()
        },
    };
    if let Some(path) = &cli.config {
        config.board = BoardConfig::load(path)?;
    }
    if let Some(bind) = &args.bind {
        config.bind_addr = bind
            .parse()
            .with_context(|| format!("bad bind address {bind}"))?;
        if args.public_url.is_none() && args.server_config.is_none() {
            config.public_url = format!("http://{}", config.bind_addr);
        }
    }
    if let Some(url) = &args.public_url {
        config.public_url = url.clone();
    }

    println!(
        "SnapShare server on {} (images at {})",
        config.bind_addr.to_string().bold(),
        config.blob_base_url().blue()
    );
    SnapServer::new(config).serve().await?;
    Ok(())
}

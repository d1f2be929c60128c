//! `natlog` - CLI for naturelog
//!
//! This binary provides the command-line interface for saving photo journal
//! entries and browsing them by calendar day.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::io::Write as _;
use std::sync::Arc;

use clap::Parser;

use naturelog::calendar::{self, Confirmation, DayGroups, DeleteOutcome};
use naturelog::cli::{
    CalendarCommand, Cli, Command, ConfigCommand, DayCommand, DeleteCommand, SaveCommand,
};
use naturelog::journal::Composer;
use naturelog::session::{HttpIdentityProvider, Identity, SessionHandle};
use naturelog::store::HttpDocumentStore;
use naturelog::upload::MediaUploader;
use naturelog::{init_logging, Config, LocalMediaPicker};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    // Load configuration
    let config = Config::load_from(cli.config.clone())?;

    // Execute the command
    match cli.command {
        Command::Save(save_cmd) => handle_save(&config, save_cmd).await,
        Command::Calendar(calendar_cmd) => handle_calendar(&config, &calendar_cmd).await,
        Command::Day(day_cmd) => handle_day(&config, &day_cmd).await,
        Command::Delete(delete_cmd) => handle_delete(&config, &delete_cmd).await,
        Command::Status(status_cmd) => handle_status(&config, status_cmd.json).await,
        Command::Config(config_cmd) => handle_config(&config, config_cmd),
    }
}

/// Bootstrap the anonymous session and wait for its identity.
async fn establish_identity(config: &Config) -> anyhow::Result<Identity> {
    let provider = Arc::new(HttpIdentityProvider::from_config(config));
    if !provider.cache_path().exists() {
        // No cached identity means the identity service will be called.
        config.require_auth()?;
    }

    let mut session = SessionHandle::bootstrap(provider);
    Ok(session.identity().await?)
}

async fn handle_save(config: &Config, cmd: SaveCommand) -> anyhow::Result<()> {
    let identity = establish_identity(config).await?;
    let uploader = MediaUploader::from_config(config)?;
    let store = HttpDocumentStore::from_config(config)?;
    let picker = LocalMediaPicker::new(config.capture.clone(), cmd.photo);

    let mut composer = Composer::new();
    composer.set_caption(&cmd.caption);

    composer.acquire_photo(&picker, cmd.from.into()).await?;
    if composer.staged_photo().is_none() {
        println!("No photo selected; nothing to save.");
        return Ok(());
    }

    let entry = composer
        .save(Some(&identity), &uploader, &store, &config.store.collection)
        .await?;

    println!("Saved entry {}", entry.id.as_deref().unwrap_or("?"));
    println!("  Image:   {}", entry.image_ref);
    println!("  Caption: {}", entry.caption);
    println!("  Day:     {}", entry.day_key());
    Ok(())
}

async fn fetch_groups(config: &Config) -> anyhow::Result<(Identity, DayGroups)> {
    let identity = establish_identity(config).await?;
    let store = HttpDocumentStore::from_config(config)?;
    let groups =
        calendar::fetch_day_groups(&store, &config.store.collection, &identity).await?;
    Ok((identity, groups))
}

async fn handle_calendar(config: &Config, cmd: &CalendarCommand) -> anyhow::Result<()> {
    let (_, groups) = fetch_groups(config).await?;

    if cmd.json {
        let days: Vec<_> = groups
            .iter()
            .map(|(day, entries)| {
                serde_json::json!({
                    "day": day.to_string(),
                    "entries": entries.len(),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&days)?);
    } else if groups.is_empty() {
        println!("No entries yet.");
    } else {
        println!("Marked days ({} entries):", groups.entry_count());
        for (day, entries) in groups.iter() {
            println!("  {day}  ({})", entries.len());
        }
    }
    Ok(())
}

async fn handle_day(config: &Config, cmd: &DayCommand) -> anyhow::Result<()> {
    let (_, groups) = fetch_groups(config).await?;
    let entries = groups.entries_for(cmd.date);

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(entries)?);
    } else if entries.is_empty() {
        println!("No entries on {}.", cmd.date);
    } else {
        println!("Entries on {}:", cmd.date);
        for entry in entries {
            println!(
                "  {}  {}  {}",
                entry.id.as_deref().unwrap_or("?"),
                entry.created_at.format("%H:%M:%S"),
                entry.caption
            );
            println!("      {}", entry.image_ref);
        }
    }
    Ok(())
}

async fn handle_delete(config: &Config, cmd: &DeleteCommand) -> anyhow::Result<()> {
    let identity = establish_identity(config).await?;
    let store = HttpDocumentStore::from_config(config)?;

    let confirmation = if cmd.yes {
        Confirmation::Confirmed
    } else {
        prompt_confirmation(&cmd.id)?
    };

    let outcome = calendar::delete_entry(
        &store,
        &config.store.collection,
        &identity,
        &cmd.id,
        confirmation,
    )
    .await?;

    match outcome {
        DeleteOutcome::Deleted(groups) => {
            println!(
                "Deleted {}. {} entries remain across {} days.",
                cmd.id,
                groups.entry_count(),
                groups.day_count()
            );
        }
        DeleteOutcome::Cancelled => println!("Delete cancelled."),
    }
    Ok(())
}

/// Ask on stdin whether the entry should really be deleted.
fn prompt_confirmation(id: &str) -> anyhow::Result<Confirmation> {
    print!("Delete entry {id}? This cannot be undone. [y/N] ");
    std::io::stdout().flush()?;

    let mut answer = String::new();
    std::io::stdin().read_line(&mut answer)?;
    if answer.trim().eq_ignore_ascii_case("y") {
        Ok(Confirmation::Confirmed)
    } else {
        Ok(Confirmation::Cancelled)
    }
}

async fn handle_status(config: &Config, json: bool) -> anyhow::Result<()> {
    let provider = HttpIdentityProvider::from_config(config);
    let cached = provider.cache_path().exists();

    let session = if cached || config.require_auth().is_ok() {
        let mut session = SessionHandle::bootstrap(Arc::new(provider));
        format!("{:?}", session.wait_settled().await)
    } else {
        "Unconfigured".to_string()
    };

    if json {
        let status = serde_json::json!({
            "session": session,
            "identity_cached": cached,
            "media_configured": config.require_media().is_ok(),
            "store_configured": config.require_store().is_ok(),
            "collection": config.store.collection,
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        println!("natlog status");
        println!("-------------");
        println!("Session:         {session}");
        println!("Identity cached: {cached}");
        println!(
            "Media host:      {}",
            if config.require_media().is_ok() {
                "configured"
            } else {
                "not configured"
            }
        );
        println!(
            "Document store:  {}",
            if config.require_store().is_ok() {
                "configured"
            } else {
                "not configured"
            }
        );
        println!("Collection:      {}", config.store.collection);
    }
    Ok(())
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Media]");
                println!("  Cloud name:    {}", config.media.cloud_name);
                println!("  Upload preset: {}", config.media.upload_preset);
                println!("  Folder:        {}", config.media.folder);
                println!("  API base:      {}", config.media.api_base);
                println!();
                println!("[Store]");
                println!("  Base URL:      {}", config.store.base_url);
                println!("  Collection:    {}", config.store.collection);
                println!();
                println!("[Auth]");
                println!("  Base URL:      {}", config.auth.base_url);
                println!(
                    "  Identity file: {}",
                    config.identity_cache_path().display()
                );
                println!();
                println!("[Capture]");
                println!("  Camera:        {}", config.capture.camera_allowed);
                println!("  Gallery:       {}", config.capture.gallery_allowed);
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => println!("Configuration error: {e}"),
            }
        }
    }
    Ok(())
}

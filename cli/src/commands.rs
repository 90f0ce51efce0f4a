use crate::Command;
use anyhow::{Context, Result};
use serde_json::{Value, json};
use std::fs::File;
use std::io::BufReader;
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;
use tokio_util::sync::CancellationToken;
use tracing::info;
use vanish_core::core::clock::SystemClock;
use vanish_core::core::retrieval::{Lookup, fetch_info, open_download};
use vanish_core::core::sweeper::Sweeper;
use vanish_core::core::{NewEntry, ShareStore};
use vanish_core::types::{AppConfig, Entry, EntryId, SweepConfig, TtlChoice};

pub(crate) fn run(command: Command, config: &AppConfig) -> Result<()> {
    let store = ShareStore::open(config.store_config()).with_context(|| {
        format!(
            "Failed to open store at {}",
            config.storage.data_dir.display()
        )
    })?;

    match command {
        Command::Serve => serve(store, config.sweep_config()),
        Command::Add {
            id,
            text,
            file,
            ttl,
            instant_expire,
            origin_ip,
        } => add(&store, id, text, file, &ttl, instant_expire, origin_ip),
        Command::Info { id } => {
            let id = EntryId::try_new(id)?;
            let lookup = fetch_info(&store, &id, SystemTime::now())?;
            let output = match lookup {
                Lookup::Absent => json!({ "id": id.as_str(), "status": "absent" }),
                Lookup::Expired => json!({ "id": id.as_str(), "status": "expired" }),
                Lookup::Live(entry) => {
                    let mut value = entry_json(&entry);
                    value["status"] = json!("live");
                    value
                }
            };
            print_json(&output)
        }
        Command::Download { id, dest } => download(&store, id, &dest),
        Command::Delete { id } => {
            let entry = store.delete(&EntryId::try_new(id)?)?;
            print_json(&entry_json(&entry))
        }
        Command::Sweep => {
            let outcome = store.sweep(SystemTime::now())?;
            let removed: Vec<&str> = outcome.entries_removed.iter().map(|id| id.as_str()).collect();
            print_json(&json!({
                "entries_removed": removed,
                "blobs_removed": outcome.blobs_removed,
                "retired_blobs_removed": outcome.retired_blobs_removed,
                "orphaned_blobs_removed": outcome.orphaned_blobs_removed,
                "failures": outcome.failures,
            }))
        }
    }
}

fn serve(store: ShareStore, sweep: SweepConfig) -> Result<()> {
    let runtime = tokio::runtime::Runtime::new().context("Failed to start tokio runtime")?;

    runtime.block_on(async move {
        let store = Arc::new(store);
        let cancel = CancellationToken::new();
        let sweeper = Sweeper::new(Arc::clone(&store), Arc::new(SystemClock), sweep)
            .spawn(cancel.clone());

        info!(data_dir = %store.data_dir().display(), "Serving, press Ctrl-C to stop");
        tokio::signal::ctrl_c()
            .await
            .context("Failed to listen for Ctrl-C")?;

        info!("Shutting down");
        cancel.cancel();
        sweeper.await.context("Sweeper task failed")?;
        Ok(())
    })
}

fn add(
    store: &ShareStore,
    id: String,
    text: Option<String>,
    file: Option<PathBuf>,
    ttl: &str,
    instant_expire: bool,
    origin_ip: Option<IpAddr>,
) -> Result<()> {
    let ttl: TtlChoice = ttl.parse()?;
    let mut entry = NewEntry::new(EntryId::try_new(id)?, ttl).with_instant_expire(instant_expire);
    if let Some(text) = text {
        entry = entry.with_text(text);
    }
    if let Some(ip) = origin_ip {
        entry = entry.with_origin_ip(ip);
    }

    let now = SystemTime::now();
    let created = match file {
        Some(path) => {
            let file_name = path
                .file_name()
                .and_then(|n| n.to_str())
                .with_context(|| format!("{} has no usable file name", path.display()))?
                .to_string();
            let reader = File::open(&path)
                .with_context(|| format!("Failed to open {}", path.display()))?;
            store.add(entry.with_file(file_name, BufReader::new(reader)), now)?
        }
        None => store.add(entry, now)?,
    };

    print_json(&entry_json(&created))
}

fn download(store: &ShareStore, id: String, dest: &Path) -> Result<()> {
    let id = EntryId::try_new(id)?;
    let download = open_download(store, &id, SystemTime::now())?;

    let copied = std::fs::copy(&download.location.path, dest)
        .with_context(|| format!("Failed to write {}", dest.display()))?;

    print_json(&json!({
        "id": id.as_str(),
        "file_name": download.location.file_name,
        "size": copied,
        "consumed": download.consumed,
        "dest": dest.display().to_string(),
    }))
}

fn entry_json(entry: &Entry) -> Value {
    json!({
        "id": entry.id.as_str(),
        "text": entry.text,
        "file": entry.file.as_ref().map(|f| json!({
            "file_name": f.file_name,
            "size": f.size,
        })),
        "created_at": epoch_secs(entry.created_at),
        "expires_at": epoch_secs(entry.expires_at),
        "instant_expire": entry.instant_expire,
    })
}

fn epoch_secs(t: SystemTime) -> u64 {
    t.duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

fn print_json(value: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

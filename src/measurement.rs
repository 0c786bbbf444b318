//! Measurement log
//!
//! Append-only record of completed measurements, ordered by response
//! arrival (which may differ from probe-send order under transport
//! reordering). Entries are mirrored line-by-line into a versioned JSON
//! Lines store so a crash never loses more than the entry being written.

use crate::error::{AppError, Result};
use crate::models::MeasurementEntry;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use std::sync::Mutex;
use uuid::Uuid;

/// On-disk schema version of the JSONL store
pub const STORE_SCHEMA: u32 = 1;

/// One line of the measurement store
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
enum StoreRecord {
    /// Run header, first line of every session
    Run {
        schema: u32,
        session: Uuid,
        started: DateTime<Utc>,
    },
    /// A single measurement
    Entry {
        schema: u32,
        #[serde(flatten)]
        entry: MeasurementEntry,
    },
}

/// Append-only JSONL sidecar for the measurement log
struct JsonlStore {
    file: File,
}

impl JsonlStore {
    fn open(path: &Path, session: Uuid) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| AppError::io(format!("Failed to create {}: {}", parent.display(), e)))?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| AppError::io(format!("Failed to open {}: {}", path.display(), e)))?;

        let mut store = Self { file };
        store.write_record(&StoreRecord::Run {
            schema: STORE_SCHEMA,
            session,
            started: Utc::now(),
        })?;
        Ok(store)
    }

    fn write_record(&mut self, record: &StoreRecord) -> Result<()> {
        let line = serde_json::to_string(record)
            .map_err(|e| AppError::internal(format!("Store record serialize failed: {}", e)))?;
        writeln!(self.file, "{}", line).map_err(|e| AppError::io(format!("Store write failed: {}", e)))?;
        self.file
            .flush()
            .map_err(|e| AppError::io(format!("Store flush failed: {}", e)))
    }
}

/// Read every measurement back out of a JSONL store
///
/// Run headers are skipped; records with an unknown schema are an error
/// rather than silently misread.
pub fn read_store(path: &Path) -> Result<Vec<MeasurementEntry>> {
    let file = File::open(path).map_err(|e| AppError::io(format!("Failed to open {}: {}", path.display(), e)))?;
    let reader = BufReader::new(file);

    let mut entries = Vec::new();
    for line in reader.lines() {
        let line = line.map_err(|e| AppError::io(format!("Store read failed: {}", e)))?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<StoreRecord>(&line)? {
            StoreRecord::Run { schema, .. } | StoreRecord::Entry { schema, .. } if schema != STORE_SCHEMA => {
                return Err(AppError::parse(format!(
                    "Unsupported store schema {} in {}",
                    schema,
                    path.display()
                )));
            }
            StoreRecord::Run { .. } => {}
            StoreRecord::Entry { entry, .. } => entries.push(entry),
        }
    }
    Ok(entries)
}

/// Synchronized append-only measurement log
pub struct MeasurementLog {
    session: Uuid,
    entries: Mutex<Vec<MeasurementEntry>>,
    store: Option<Mutex<JsonlStore>>,
}

impl MeasurementLog {
    /// Log without a backing store, for tests and dry runs
    pub fn in_memory() -> Self {
        Self {
            session: Uuid::new_v4(),
            entries: Mutex::new(Vec::new()),
            store: None,
        }
    }

    /// Log mirrored into a JSONL store at `path`
    pub fn with_store(path: &Path) -> Result<Self> {
        let session = Uuid::new_v4();
        let store = JsonlStore::open(path, session)?;
        Ok(Self {
            session,
            entries: Mutex::new(Vec::new()),
            store: Some(Mutex::new(store)),
        })
    }

    /// Session identifier written into the store's run header
    pub fn session(&self) -> Uuid {
        self.session
    }

    /// Append one measurement
    ///
    /// The in-memory log always grows; a store write failure is returned so
    /// the caller can report it, but never unwinds the append.
    pub fn append(&self, entry: MeasurementEntry) -> Result<()> {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(entry.clone());

        if let Some(store) = &self.store {
            store
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .write_record(&StoreRecord::Entry {
                    schema: STORE_SCHEMA,
                    entry,
                })?;
        }
        Ok(())
    }

    /// Copy of the current entries, in append order
    pub fn snapshot(&self) -> Vec<MeasurementEntry> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of entries carrying a geolocation fix
    pub fn geolocated_count(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .filter(|e| e.has_gps())
            .count()
    }
}

use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::config::config;
use crate::error::RegistryError;
use crate::interchange::normalize_document;

/// A saved display. `address` is the identity key.
///
/// Serialized with the keys `ip`, `id`, `site` and `description`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceRecord {
    #[serde(rename = "ip")]
    pub address: String,
    #[serde(rename = "id", default)]
    pub numeric_id: u8,
    #[serde(default)]
    pub site: String,
    #[serde(default)]
    pub description: String,
}

impl DeviceRecord {
    #[must_use]
    pub fn new(address: impl Into<String>, numeric_id: u8) -> Self {
        Self {
            address: address.into().trim().to_string(),
            numeric_id,
            site: String::new(),
            description: String::new(),
        }
    }

    #[must_use]
    pub fn with_site(mut self, site: impl Into<String>) -> Self {
        self.site = site.into().trim().to_string();
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into().trim().to_string();
        self
    }

    /// Picker label: `site | ip | ID n`, with `No Site` for an empty site.
    #[must_use]
    pub fn label(&self) -> String {
        let site = if self.site.is_empty() {
            "No Site"
        } else {
            self.site.as_str()
        };
        format!("{site} | {} | ID {}", self.address, self.numeric_id)
    }
}

/// Counts reported by a batch import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub added: usize,
    pub updated: usize,
}

/// Merge `incoming` into `existing` by address. A matching record is replaced
/// in place; a new address is appended. Returns the merged list with the
/// added and updated counts.
#[must_use]
pub fn merge_devices(
    existing: &[DeviceRecord],
    incoming: impl IntoIterator<Item = DeviceRecord>,
) -> (Vec<DeviceRecord>, usize, usize) {
    let mut merged = existing.to_vec();
    let (mut added, mut updated) = (0, 0);
    for record in incoming {
        match merged.iter().position(|d| d.address == record.address) {
            Some(idx) => {
                merged[idx] = record;
                updated += 1;
            }
            None => {
                merged.push(record);
                added += 1;
            }
        }
    }
    (merged, added, updated)
}

/// Trim every text field; `None` when the address ends up empty.
fn normalize_record(record: DeviceRecord) -> Option<DeviceRecord> {
    let record = DeviceRecord::new(record.address, record.numeric_id)
        .with_site(record.site)
        .with_description(record.description);
    (!record.address.is_empty()).then_some(record)
}

#[must_use]
pub fn find_device_by_address<'a>(
    devices: &'a [DeviceRecord],
    address: &str,
) -> Option<&'a DeviceRecord> {
    let address = address.trim();
    devices.iter().find(|d| d.address == address)
}

fn quarantine_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".corrupt");
    PathBuf::from(name)
}

/// Read a saved device list. A missing file is an empty list; entries that
/// do not normalize are dropped.
///
/// A file that is not valid JSON loads as empty. It is first renamed to
/// `<name>.corrupt` so the next persist cannot overwrite it.
pub fn load_devices(path: &Path) -> Result<Vec<DeviceRecord>, RegistryError> {
    let bytes = match fs::read(path) {
        Ok(b) => b,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };
    let doc: serde_json::Value = match serde_json::from_slice(&bytes) {
        Ok(doc) => doc,
        Err(e) => {
            let aside = quarantine_path(path);
            match fs::rename(path, &aside) {
                Ok(()) => tracing::warn!(
                    path = %path.display(),
                    moved_to = %aside.display(),
                    error = %e,
                    "unreadable device file set aside; starting empty"
                ),
                Err(rename_err) => tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    rename_error = %rename_err,
                    "unreadable device file could not be set aside; starting empty"
                ),
            }
            return Ok(Vec::new());
        }
    };
    if !doc.is_array() {
        tracing::warn!(path = %path.display(), "device file is not a JSON array; ignoring");
        return Ok(Vec::new());
    }
    let devices = normalize_document(&doc);
    let total = doc.as_array().map_or(0, Vec::len);
    if devices.len() < total {
        tracing::warn!(
            path = %path.display(),
            dropped = total - devices.len(),
            "malformed device entries dropped"
        );
    }
    Ok(devices)
}

/// Write the whole list to `path` through a temporary file in the same
/// directory, renamed over the destination.
pub fn persist_devices(path: &Path, devices: &[DeviceRecord]) -> Result<(), RegistryError> {
    let json =
        serde_json::to_string_pretty(devices).map_err(|e| RegistryError::Serialize(e.to_string()))?;
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(json.as_bytes())?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| RegistryError::Io(e.error))?;
    Ok(())
}

/// Ordered, persisted list of saved displays.
///
/// Every mutation rewrites the file while holding the registry lock; when the
/// write fails the in-memory list is left unchanged.
#[derive(Debug)]
pub struct DeviceRegistry {
    path: PathBuf,
    devices: Mutex<Vec<DeviceRecord>>,
}

impl DeviceRegistry {
    /// Open the registry stored at `path`, loading what is there.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, RegistryError> {
        let path = path.into();
        let devices = load_devices(&path)?;
        tracing::debug!(path = %path.display(), count = devices.len(), "device registry loaded");
        Ok(Self {
            path,
            devices: Mutex::new(devices),
        })
    }

    /// Open the registry at the configured `MDC_DEVICES_FILE`.
    pub fn open_default() -> Result<Self, RegistryError> {
        Self::open(config().mdc_devices_file.clone())
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self) -> MutexGuard<'_, Vec<DeviceRecord>> {
        self.devices.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn commit(
        &self,
        guard: &mut MutexGuard<'_, Vec<DeviceRecord>>,
        next: Vec<DeviceRecord>,
    ) -> Result<(), RegistryError> {
        persist_devices(&self.path, &next)?;
        **guard = next;
        Ok(())
    }

    #[must_use]
    pub fn list(&self) -> Vec<DeviceRecord> {
        self.lock().clone()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    #[must_use]
    pub fn find_by_address(&self, address: &str) -> Option<DeviceRecord> {
        find_device_by_address(&self.lock(), address).cloned()
    }

    /// Insert or replace by address. Returns `true` when the record was new.
    pub fn upsert(&self, record: DeviceRecord) -> Result<bool, RegistryError> {
        let record = normalize_record(record)
            .ok_or_else(|| RegistryError::InvalidRecord("empty address".into()))?;
        let mut guard = self.lock();
        let (next, added, _) = merge_devices(&guard, [record]);
        self.commit(&mut guard, next)?;
        Ok(added == 1)
    }

    /// Remove the record with `address`. Returns `false` (and writes nothing)
    /// when no such record exists.
    pub fn delete(&self, address: &str) -> Result<bool, RegistryError> {
        let address = address.trim();
        let mut guard = self.lock();
        if !guard.iter().any(|d| d.address == address) {
            return Ok(false);
        }
        let next: Vec<_> = guard.iter().filter(|d| d.address != address).cloned().collect();
        self.commit(&mut guard, next)?;
        Ok(true)
    }

    /// Merge a batch record by record and persist once. Records are trimmed
    /// like [`upsert`](Self::upsert); those left without an address are
    /// skipped.
    pub fn import_batch(
        &self,
        records: impl IntoIterator<Item = DeviceRecord>,
    ) -> Result<ImportSummary, RegistryError> {
        let mut skipped = 0usize;
        let records: Vec<_> = records
            .into_iter()
            .filter_map(|r| {
                let normalized = normalize_record(r);
                if normalized.is_none() {
                    skipped += 1;
                }
                normalized
            })
            .collect();
        if skipped > 0 {
            tracing::warn!(skipped, "imported devices without an address skipped");
        }
        let mut guard = self.lock();
        let (next, added, updated) = merge_devices(&guard, records);
        self.commit(&mut guard, next)?;
        tracing::debug!(added, updated, "device import merged");
        Ok(ImportSummary { added, updated })
    }

    /// Write the current list to disk.
    pub fn persist(&self) -> Result<(), RegistryError> {
        let guard = self.lock();
        persist_devices(&self.path, &guard)
    }

    /// Replace the in-memory list with what is on disk. The file is read
    /// under the registry lock so a concurrent mutation is never reverted.
    pub fn reload(&self) -> Result<(), RegistryError> {
        let mut guard = self.lock();
        *guard = load_devices(&self.path)?;
        Ok(())
    }
}

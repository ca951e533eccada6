//! Device list import and export (JSON and CSV).

use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;

use crate::device_registry::DeviceRecord;
use crate::error::RegistryError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportFormat {
    Json,
    Csv,
}

impl ImportFormat {
    /// Format from a file name's extension, case-insensitively.
    #[must_use]
    pub fn from_file_name(file_name: &str) -> Option<Self> {
        let ext = Path::new(file_name.trim())
            .extension()?
            .to_str()?
            .to_ascii_lowercase();
        match ext.as_str() {
            "json" => Some(Self::Json),
            "csv" => Some(Self::Csv),
            _ => None,
        }
    }
}

fn text_of(v: Option<&Value>) -> String {
    match v {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

/// Display id from a loosely typed value. Anything that is not an integer in
/// 0-255 yields 0.
#[must_use]
pub fn normalize_id(v: Option<&Value>) -> u8 {
    match v {
        Some(Value::Number(n)) => n.as_u64().and_then(|n| u8::try_from(n).ok()).unwrap_or(0),
        Some(Value::String(s)) => parse_id_text(s),
        _ => 0,
    }
}

fn parse_id_text(s: &str) -> u8 {
    s.trim().parse::<u8>().unwrap_or(0)
}

fn build_record(address: &str, numeric_id: u8, site: &str, description: &str) -> Option<DeviceRecord> {
    let address = address.trim();
    if address.is_empty() {
        return None;
    }
    Some(
        DeviceRecord::new(address, numeric_id)
            .with_site(site)
            .with_description(description),
    )
}

/// Normalize one JSON entry. Non-objects and entries without an address are
/// dropped (`None`).
#[must_use]
pub fn normalize_entry(item: &Value) -> Option<DeviceRecord> {
    let obj = item.as_object()?;
    build_record(
        &text_of(obj.get("ip")),
        normalize_id(obj.get("id")),
        &text_of(obj.get("site")),
        &text_of(obj.get("description")),
    )
}

/// Normalize every entry of a JSON document. A single object counts as a
/// one-element list; any other non-array document yields nothing.
#[must_use]
pub fn normalize_document(doc: &Value) -> Vec<DeviceRecord> {
    match doc {
        Value::Array(items) => items.iter().filter_map(normalize_entry).collect(),
        obj @ Value::Object(_) => normalize_entry(obj).into_iter().collect(),
        _ => Vec::new(),
    }
}

fn parse_json(raw: &[u8]) -> Result<Vec<DeviceRecord>, RegistryError> {
    let doc: Value =
        serde_json::from_slice(raw).map_err(|e| RegistryError::Import(format!("JSON: {e}")))?;
    Ok(normalize_document(&doc))
}

fn column<'r>(columns: &HashMap<String, usize>, row: &'r csv::StringRecord, name: &str) -> &'r str {
    columns
        .get(name)
        .and_then(|&i| row.get(i))
        .unwrap_or_default()
}

fn parse_csv(raw: &[u8]) -> Result<Vec<DeviceRecord>, RegistryError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(raw);
    let mut columns: HashMap<String, usize> = HashMap::new();
    for (idx, name) in reader
        .headers()
        .map_err(|e| RegistryError::Import(format!("CSV: {e}")))?
        .iter()
        .enumerate()
    {
        columns.entry(name.to_ascii_lowercase()).or_insert(idx);
    }

    let mut out = Vec::new();
    for row in reader.records() {
        let row = row.map_err(|e| RegistryError::Import(format!("CSV: {e}")))?;
        let cell = |name: &str| column(&columns, &row, name).to_string();
        match build_record(
            &cell("ip"),
            parse_id_text(&cell("id")),
            &cell("site"),
            &cell("description"),
        ) {
            Some(rec) => out.push(rec),
            None => tracing::warn!(
                line = row.position().map(csv::Position::line),
                "CSV row without ip dropped"
            ),
        }
    }
    Ok(out)
}

/// Parse an uploaded device list, choosing the format from `file_name`.
pub fn parse_import(file_name: &str, raw: &[u8]) -> Result<Vec<DeviceRecord>, RegistryError> {
    match ImportFormat::from_file_name(file_name) {
        Some(ImportFormat::Json) => parse_json(raw),
        Some(ImportFormat::Csv) => parse_csv(raw),
        None => Err(RegistryError::UnsupportedFormat(file_name.to_string())),
    }
}

/// Pretty-printed JSON array with the persisted key names.
pub fn export_json(devices: &[DeviceRecord]) -> Result<String, RegistryError> {
    serde_json::to_string_pretty(devices).map_err(|e| RegistryError::Serialize(e.to_string()))
}

/// CSV with header `ip,id,site,description`.
pub fn export_csv(devices: &[DeviceRecord]) -> Result<String, RegistryError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(["ip", "id", "site", "description"])
        .map_err(|e| RegistryError::Serialize(e.to_string()))?;
    for d in devices {
        let id = d.numeric_id.to_string();
        writer
            .write_record([
                d.address.as_str(),
                id.as_str(),
                d.site.as_str(),
                d.description.as_str(),
            ])
            .map_err(|e| RegistryError::Serialize(e.to_string()))?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| RegistryError::Serialize(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| RegistryError::Serialize(e.to_string()))
}

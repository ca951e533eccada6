use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs;
use std::path::Path;

use crate::error::CatalogError;
use crate::field::{Bounds, FieldDescriptor, FieldKind, Symbol};
use crate::toml_helpers::describe_toml_error;

#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(rename = "symbol_set", default)]
    pub symbol_sets: Vec<SymbolSetRaw>,
    #[serde(rename = "command")]
    pub commands: Vec<CommandRaw>,
}

#[derive(Debug, Deserialize)]
struct SymbolSetRaw {
    pub name: String,
    pub symbols: Vec<SymbolRaw>,
}

#[derive(Debug, Deserialize, Clone)]
struct SymbolRaw {
    pub name: String,
    pub code: u32,
}

#[derive(Debug, Deserialize)]
struct CommandRaw {
    pub id: String,
    pub label: Option<String>,
    /// "r", "w" or "rw"
    pub access: String,
    #[serde(default)]
    pub fields: Vec<FieldRaw>,
}

#[derive(Debug, Deserialize)]
struct FieldRaw {
    pub name: String,
    pub kind: String,
    pub range: Option<[i64; 2]>,
    pub symbols: Option<Vec<SymbolRaw>>,
    /// name of a `[[symbol_set]]` shared between commands
    pub symbol_set: Option<String>,
}

/// Read (query) or write (update).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Read,
    Write,
}

impl Operation {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Write => "write",
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandDescriptor {
    pub id: String,
    pub label: String,
    pub supports_read: bool,
    pub supports_write: bool,
    /// Consumed positionally by writes; empty for pure reads.
    pub fields: Vec<FieldDescriptor>,
}

impl CommandDescriptor {
    #[must_use]
    pub const fn supports(&self, op: Operation) -> bool {
        match op {
            Operation::Read => self.supports_read,
            Operation::Write => self.supports_write,
        }
    }

    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Picker choices for one-field enumerated commands, empty otherwise.
    #[must_use]
    pub fn argument_options(&self) -> Vec<&str> {
        match self.fields.as_slice() {
            [only] => match &only.kind {
                FieldKind::Enumeration { symbols } => {
                    symbols.iter().map(|s| s.name.as_str()).collect()
                }
                _ => Vec::new(),
            },
            _ => Vec::new(),
        }
    }
}

/// Immutable table of every supported display command, keyed by id.
///
/// Build it once at startup (usually [`CommandCatalog::builtin`]) and hand it
/// to the coercion engine and gateway behind an `Arc`.
#[derive(Debug)]
pub struct CommandCatalog {
    by_id: BTreeMap<String, CommandDescriptor>,
}

impl CommandCatalog {
    /// Parse the command table compiled into the crate.
    pub fn builtin() -> Result<Self, CatalogError> {
        include_str!("./commands.toml").parse::<Self>()
    }

    pub fn from_path(path: &Path) -> Result<Self, CatalogError> {
        let s = fs::read_to_string(path)?;
        s.parse::<Self>()
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(toml_str: &str) -> Result<Self, CatalogError> {
        let cf: CatalogFile = toml::from_str(toml_str)
            .map_err(|e| CatalogError::Parse(describe_toml_error(toml_str, &e)))?;
        let by_id = Self::build(cf)?;
        Ok(Self { by_id })
    }

    fn build(cf: CatalogFile) -> Result<BTreeMap<String, CommandDescriptor>, CatalogError> {
        let mut sets: HashMap<String, Vec<Symbol>> = HashMap::new();
        for set in cf.symbol_sets {
            let symbols = convert_symbols(&set.name, &set.symbols)?;
            if sets.insert(set.name.clone(), symbols).is_some() {
                return Err(CatalogError::Invalid(format!(
                    "duplicate symbol_set: {name}",
                    name = set.name
                )));
            }
        }

        let mut by_id = BTreeMap::new();
        for raw in cf.commands {
            let id = raw.id.trim().to_string();
            if id.is_empty() {
                return Err(CatalogError::Invalid("command id empty".into()));
            }
            let (supports_read, supports_write) = match raw.access.as_str() {
                "r" => (true, false),
                "w" => (false, true),
                "rw" => (true, true),
                other => {
                    return Err(CatalogError::Invalid(format!(
                        "command {id}: invalid access '{other}' (expected r, w or rw)"
                    )))
                }
            };
            let mut names = HashSet::new();
            let mut fields = Vec::with_capacity(raw.fields.len());
            for f in &raw.fields {
                if !names.insert(f.name.as_str()) {
                    return Err(CatalogError::Invalid(format!(
                        "command {id}: duplicate field name {name}",
                        name = f.name
                    )));
                }
                fields.push(build_field(&id, f, &sets)?);
            }
            let descriptor = CommandDescriptor {
                label: raw.label.unwrap_or_else(|| default_label(&id)),
                id: id.clone(),
                supports_read,
                supports_write,
                fields,
            };
            if by_id.insert(id.clone(), descriptor).is_some() {
                return Err(CatalogError::Invalid(format!("duplicate command id: {id}")));
            }
        }
        Ok(by_id)
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&CommandDescriptor> {
        self.by_id.get(id.trim())
    }

    pub fn lookup(&self, id: &str) -> Result<&CommandDescriptor, CatalogError> {
        self.get(id)
            .ok_or_else(|| CatalogError::NotFound(id.trim().to_string()))
    }

    /// Command ids in sorted order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.by_id.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CommandDescriptor> {
        self.by_id.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    #[must_use]
    pub fn argument_options(&self, id: &str) -> Vec<&str> {
        self.get(id)
            .map(CommandDescriptor::argument_options)
            .unwrap_or_default()
    }
}

impl std::str::FromStr for CommandCatalog {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CommandCatalog::from_str(s)
    }
}

fn default_label(id: &str) -> String {
    id.split('_')
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            chars.next().map_or_else(String::new, |c| {
                c.to_uppercase().chain(chars).collect::<String>()
            })
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn convert_symbols(owner: &str, raw: &[SymbolRaw]) -> Result<Vec<Symbol>, CatalogError> {
    if raw.is_empty() {
        return Err(CatalogError::Invalid(format!("{owner}: symbols empty")));
    }
    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(raw.len());
    for s in raw {
        let name = s.name.trim();
        if name.is_empty() {
            return Err(CatalogError::Invalid(format!("{owner}: symbol name empty")));
        }
        if !seen.insert(name.to_ascii_uppercase()) {
            return Err(CatalogError::Invalid(format!(
                "{owner}: duplicate symbol {name}"
            )));
        }
        out.push(Symbol::new(name, s.code));
    }
    Ok(out)
}

fn build_field(
    command: &str,
    f: &FieldRaw,
    sets: &HashMap<String, Vec<Symbol>>,
) -> Result<FieldDescriptor, CatalogError> {
    let owner = format!("command {command} field {name}", name = f.name);

    let range = match f.range {
        Some([lower, upper]) if lower > upper => {
            return Err(CatalogError::Invalid(format!(
                "{owner}: range lower {lower} exceeds upper {upper}"
            )))
        }
        Some([lower, upper]) => Some(Bounds::new(lower, upper)),
        None => None,
    };

    let symbols = match (&f.symbols, &f.symbol_set) {
        (Some(_), Some(_)) => {
            return Err(CatalogError::Invalid(format!(
                "{owner}: both symbols and symbol_set given"
            )))
        }
        (Some(list), None) => Some(convert_symbols(&owner, list)?),
        (None, Some(set)) => Some(
            sets.get(set)
                .cloned()
                .ok_or_else(|| CatalogError::Invalid(format!("{owner}: unknown symbol_set {set}")))?,
        ),
        (None, None) => None,
    };

    let takes_range = matches!(f.kind.as_str(), "integer" | "composite_xy");
    let takes_symbols = matches!(f.kind.as_str(), "enumeration" | "bitmask");
    if range.is_some() && !takes_range {
        return Err(CatalogError::Invalid(format!(
            "{owner}: range not allowed on {kind}",
            kind = f.kind
        )));
    }
    if symbols.is_some() && !takes_symbols {
        return Err(CatalogError::Invalid(format!(
            "{owner}: symbols not allowed on {kind}",
            kind = f.kind
        )));
    }

    let need_symbols = || {
        symbols
            .clone()
            .ok_or_else(|| CatalogError::Invalid(format!("{owner}: symbols required")))
    };
    let kind = match f.kind.as_str() {
        "integer" => FieldKind::Integer { range },
        "boolean" => FieldKind::Boolean,
        "enumeration" => FieldKind::Enumeration {
            symbols: need_symbols()?,
        },
        "bitmask" => FieldKind::Bitmask {
            symbols: need_symbols()?,
        },
        "time" => FieldKind::Time,
        "time12h" => FieldKind::Time12h,
        "datetime" => FieldKind::DateTime,
        "ip_address" => FieldKind::IpAddress,
        "composite_xy" => FieldKind::CompositeXy { range },
        "string" => FieldKind::Text,
        "string_coded" => FieldKind::TextCoded,
        other => {
            return Err(CatalogError::Invalid(format!(
                "{owner}: unsupported field kind {other}"
            )))
        }
    };
    Ok(FieldDescriptor::new(f.name.trim(), kind))
}

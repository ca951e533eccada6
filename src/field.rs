//! Field type model: the shape of one command argument or result field.

use serde::Serialize;

/// One named value of an enumeration or bitmask field. `code` is the protocol
/// byte; for bitmask members it is the member's bit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Symbol {
    pub name: String,
    pub code: u32,
}

impl Symbol {
    #[must_use]
    pub fn new(name: impl Into<String>, code: u32) -> Self {
        Self {
            name: name.into(),
            code,
        }
    }
}

/// Inclusive integer bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Bounds {
    pub lower: i64,
    pub upper: i64,
}

impl Bounds {
    #[must_use]
    pub const fn new(lower: i64, upper: i64) -> Self {
        Self { lower, upper }
    }
    #[must_use]
    pub const fn contains(&self, v: i64) -> bool {
        v >= self.lower && v <= self.upper
    }
}

/// Field kind with its kind-specific payload. Only the range-bearing kinds can
/// hold bounds and only enumerations/bitmasks can hold symbols.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldKind {
    Integer { range: Option<Bounds> },
    Boolean,
    Enumeration { symbols: Vec<Symbol> },
    Bitmask { symbols: Vec<Symbol> },
    Time,
    Time12h,
    DateTime,
    IpAddress,
    CompositeXy { range: Option<Bounds> },
    Text,
    TextCoded,
}

impl FieldKind {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Integer { .. } => "integer",
            Self::Boolean => "boolean",
            Self::Enumeration { .. } => "enumeration",
            Self::Bitmask { .. } => "bitmask",
            Self::Time => "time",
            Self::Time12h => "time12h",
            Self::DateTime => "datetime",
            Self::IpAddress => "ip_address",
            Self::CompositeXy { .. } => "composite_xy",
            Self::Text => "string",
            Self::TextCoded => "string_coded",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldDescriptor {
    pub name: String,
    #[serde(flatten)]
    pub kind: FieldKind,
}

impl FieldDescriptor {
    #[must_use]
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    #[must_use]
    pub const fn range(&self) -> Option<Bounds> {
        match &self.kind {
            FieldKind::Integer { range } | FieldKind::CompositeXy { range } => *range,
            _ => None,
        }
    }

    #[must_use]
    pub fn symbols(&self) -> Option<&[Symbol]> {
        match &self.kind {
            FieldKind::Enumeration { symbols } | FieldKind::Bitmask { symbols } => {
                Some(symbols.as_slice())
            }
            _ => None,
        }
    }

    #[must_use]
    pub const fn allows_multiple(&self) -> bool {
        matches!(self.kind, FieldKind::Bitmask { .. })
    }

    /// Case-insensitive symbol lookup.
    #[must_use]
    pub fn find_symbol(&self, token: &str) -> Option<&Symbol> {
        self.symbols()?
            .iter()
            .find(|s| s.name.eq_ignore_ascii_case(token))
    }
}

fn symbol_names(symbols: &[Symbol]) -> String {
    symbols
        .iter()
        .map(|s| s.name.as_str())
        .collect::<Vec<_>>()
        .join("|")
}

/// Human-readable input hint derived from the field's kind, range and symbols.
#[must_use]
pub fn placeholder_hint(field: &FieldDescriptor) -> String {
    match &field.kind {
        FieldKind::Integer { range: Some(b) } => format!("{}-{}", b.lower, b.upper),
        FieldKind::Integer { range: None } => "integer".to_string(),
        FieldKind::Boolean => "ON|OFF".to_string(),
        FieldKind::Enumeration { symbols } => symbol_names(symbols),
        FieldKind::Bitmask { symbols } => {
            format!("comma-separated {}", symbol_names(symbols))
        }
        FieldKind::Time => "HH:MM (00-23)".to_string(),
        FieldKind::Time12h => "HH:MM (01-12) [AM|PM]".to_string(),
        FieldKind::DateTime => "YYYY-MM-DD HH:MM[:SS]".to_string(),
        FieldKind::IpAddress => "IP address, e.g. 192.168.1.10".to_string(),
        FieldKind::CompositeXy { range: Some(b) } => {
            format!("X,Y ({}-{} each)", b.lower, b.upper)
        }
        FieldKind::CompositeXy { range: None } => "X,Y".to_string(),
        FieldKind::Text | FieldKind::TextCoded => "text".to_string(),
    }
}

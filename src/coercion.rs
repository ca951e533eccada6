//! Argument coercion: loosely typed user text in, protocol-ready values out.
//!
//! Every rejection is a [`CoercionError`] naming the field, so a front end can
//! put the message next to the input that caused it. Nothing here touches the
//! network; a failed coercion never reaches the gateway.

use chrono::{NaiveDateTime, NaiveTime, Timelike};
use serde::Serialize;
use std::fmt;
use std::net::IpAddr;

use crate::command_catalog::{CommandDescriptor, Operation};
use crate::error::CoercionError;
use crate::field::{placeholder_hint, Bounds, FieldDescriptor, FieldKind};

/// A validated argument value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum TypedValue {
    Integer(i64),
    Boolean(bool),
    Symbol { name: String, code: u32 },
    /// Members in declaration order; `bits` is the OR of their codes.
    Bitmask { members: Vec<String>, bits: u32 },
    Time { hour: u8, minute: u8 },
    /// `hour` is 1-12.
    Time12h { hour: u8, minute: u8, pm: bool },
    DateTime(NaiveDateTime),
    IpAddress(IpAddr),
    Xy { x: i64, y: i64 },
    Text(String),
    TextCoded(String),
}

impl fmt::Display for TypedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(v) => write!(f, "{v}"),
            Self::Boolean(b) => f.write_str(if *b { "ON" } else { "OFF" }),
            Self::Symbol { name, .. } => f.write_str(name),
            Self::Bitmask { members, .. } => f.write_str(&members.join(",")),
            Self::Time { hour, minute } => write!(f, "{hour:02}:{minute:02}"),
            Self::Time12h { hour, minute, pm } => {
                write!(f, "{hour:02}:{minute:02} {}", if *pm { "PM" } else { "AM" })
            }
            Self::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S")),
            Self::IpAddress(ip) => write!(f, "{ip}"),
            Self::Xy { x, y } => write!(f, "{x},{y}"),
            Self::Text(s) | Self::TextCoded(s) => f.write_str(s),
        }
    }
}

/// Arguments of one gateway call. The variant decides the operation:
/// `Query` reads, both other variants write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Arguments {
    Query,
    /// Checked values, one per descriptor field.
    Typed(Vec<TypedValue>),
    /// Manual raw override, passed to the protocol client without validation.
    Unchecked(Vec<String>),
}

impl Arguments {
    #[must_use]
    pub const fn operation(&self) -> Operation {
        match self {
            Self::Query => Operation::Read,
            Self::Typed(_) | Self::Unchecked(_) => Operation::Write,
        }
    }

    /// Raw override built from comma separated text.
    #[must_use]
    pub fn raw_override(input: &str) -> Self {
        Self::Unchecked(split_raw_override(input))
    }

    #[must_use]
    pub const fn is_unchecked(&self) -> bool {
        matches!(self, Self::Unchecked(_))
    }
}

/// Split manual argument text on commas, trimming each token and dropping
/// empty ones.
#[must_use]
pub fn split_raw_override(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

fn bad_time(field: &FieldDescriptor, raw: &str) -> CoercionError {
    CoercionError::BadTimeFormat {
        field: field.name.clone(),
        raw: raw.to_string(),
        hint: placeholder_hint(field),
    }
}

fn parse_bounded(
    field: &FieldDescriptor,
    raw: &str,
    range: Option<Bounds>,
) -> Result<i64, CoercionError> {
    let value: i64 = raw.trim().parse().map_err(|_| CoercionError::NotANumber {
        field: field.name.clone(),
        raw: raw.to_string(),
        hint: placeholder_hint(field),
    })?;
    match range {
        Some(b) if !b.contains(value) => Err(CoercionError::OutOfRange {
            field: field.name.clone(),
            value,
            lower: b.lower,
            upper: b.upper,
        }),
        _ => Ok(value),
    }
}

fn parse_boolean(field: &FieldDescriptor, raw: &str) -> Result<bool, CoercionError> {
    match raw.trim().to_ascii_uppercase().as_str() {
        "ON" | "1" | "TRUE" => Ok(true),
        "OFF" | "0" | "FALSE" => Ok(false),
        _ => Err(CoercionError::InvalidBoolean {
            field: field.name.clone(),
            raw: raw.to_string(),
        }),
    }
}

fn unknown_symbol(field: &FieldDescriptor, raw: &str) -> CoercionError {
    CoercionError::UnknownSymbol {
        field: field.name.clone(),
        raw: raw.to_string(),
        hint: placeholder_hint(field),
    }
}

fn parse_bitmask(field: &FieldDescriptor, raw: &str) -> Result<TypedValue, CoercionError> {
    let symbols = field.symbols().unwrap_or_default();
    let mut selected = vec![false; symbols.len()];
    for token in raw.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        let idx = symbols
            .iter()
            .position(|s| s.name.eq_ignore_ascii_case(token))
            .ok_or_else(|| unknown_symbol(field, token))?;
        selected[idx] = true;
    }
    let mut members = Vec::new();
    let mut bits = 0u32;
    for (sym, _) in symbols.iter().zip(&selected).filter(|(_, on)| **on) {
        members.push(sym.name.clone());
        bits |= sym.code;
    }
    Ok(TypedValue::Bitmask { members, bits })
}

fn parse_time24(field: &FieldDescriptor, raw: &str) -> Result<TypedValue, CoercionError> {
    let t = NaiveTime::parse_from_str(raw.trim(), "%H:%M").map_err(|_| bad_time(field, raw))?;
    Ok(TypedValue::Time {
        hour: t.hour() as u8,
        minute: t.minute() as u8,
    })
}

fn parse_time12(field: &FieldDescriptor, raw: &str) -> Result<TypedValue, CoercionError> {
    let s = raw.trim();
    let upper = s.to_ascii_uppercase();
    let (clock, pm) = if let Some(rest) = upper.strip_suffix("PM") {
        (rest.trim_end().to_string(), true)
    } else if let Some(rest) = upper.strip_suffix("AM") {
        (rest.trim_end().to_string(), false)
    } else {
        (upper, false)
    };
    let (h, m) = clock.split_once(':').ok_or_else(|| bad_time(field, raw))?;
    let well_formed = |part: &str| (1..=2).contains(&part.len()) && part.bytes().all(|b| b.is_ascii_digit());
    if !well_formed(h) || m.len() != 2 || !well_formed(m) {
        return Err(bad_time(field, raw));
    }
    let hour: u8 = h.parse().map_err(|_| bad_time(field, raw))?;
    let minute: u8 = m.parse().map_err(|_| bad_time(field, raw))?;
    if !(1..=12).contains(&hour) || minute > 59 {
        return Err(bad_time(field, raw));
    }
    Ok(TypedValue::Time12h { hour, minute, pm })
}

fn parse_datetime(field: &FieldDescriptor, raw: &str) -> Result<TypedValue, CoercionError> {
    let s = raw.trim();
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M"))
        .map(TypedValue::DateTime)
        .map_err(|_| bad_time(field, raw))
}

fn parse_xy(
    field: &FieldDescriptor,
    raw: &str,
    range: Option<Bounds>,
) -> Result<TypedValue, CoercionError> {
    let (x, y) = raw.split_once(',').ok_or_else(|| CoercionError::NotANumber {
        field: field.name.clone(),
        raw: raw.to_string(),
        hint: placeholder_hint(field),
    })?;
    Ok(TypedValue::Xy {
        x: parse_bounded(field, x, range)?,
        y: parse_bounded(field, y, range)?,
    })
}

/// Coerce one raw string against one field.
pub fn coerce(field: &FieldDescriptor, raw: &str) -> Result<TypedValue, CoercionError> {
    match &field.kind {
        FieldKind::Integer { range } => parse_bounded(field, raw, *range).map(TypedValue::Integer),
        FieldKind::Boolean => parse_boolean(field, raw).map(TypedValue::Boolean),
        FieldKind::Enumeration { .. } => field
            .find_symbol(raw.trim())
            .map(|s| TypedValue::Symbol {
                name: s.name.clone(),
                code: s.code,
            })
            .ok_or_else(|| unknown_symbol(field, raw)),
        FieldKind::Bitmask { .. } => parse_bitmask(field, raw),
        FieldKind::Time => parse_time24(field, raw),
        FieldKind::Time12h => parse_time12(field, raw),
        FieldKind::DateTime => parse_datetime(field, raw),
        FieldKind::IpAddress => raw
            .trim()
            .parse::<IpAddr>()
            .map(TypedValue::IpAddress)
            .map_err(|_| CoercionError::BadIpFormat {
                field: field.name.clone(),
                raw: raw.to_string(),
            }),
        FieldKind::CompositeXy { range } => parse_xy(field, raw, *range),
        FieldKind::Text => Ok(TypedValue::Text(raw.to_string())),
        FieldKind::TextCoded => Ok(TypedValue::TextCoded(raw.to_string())),
    }
}

/// Coerce `raw` positionally against the descriptor's fields. The first
/// failing field aborts the whole call.
pub fn coerce_arguments<S: AsRef<str>>(
    descriptor: &CommandDescriptor,
    raw: &[S],
) -> Result<Vec<TypedValue>, CoercionError> {
    if raw.len() != descriptor.fields.len() {
        return Err(CoercionError::ArityMismatch {
            command: descriptor.id.clone(),
            expected: descriptor.fields.len(),
            got: raw.len(),
        });
    }
    descriptor
        .fields
        .iter()
        .zip(raw)
        .map(|(field, value)| coerce(field, value.as_ref()))
        .collect()
}

/// Split manual argument text into one token per field, shell style:
/// whitespace separates fields and quotes group a value that contains spaces.
/// Commas stay inside a token, so `2,3 5` is the two values `2,3` and `5`.
pub fn split_manual_text(
    descriptor: &CommandDescriptor,
    manual: &str,
) -> Result<Vec<String>, CoercionError> {
    shlex::split(manual.trim()).ok_or_else(|| CoercionError::UnbalancedQuotes {
        command: descriptor.id.clone(),
        raw: manual.to_string(),
    })
}

/// Build write arguments from a dropdown choice and a free-text box.
///
/// Non-empty manual text wins and is split by [`split_manual_text`];
/// otherwise the picker choice (if any) is the single argument. The result is
/// always coerced.
pub fn coerce_selection(
    descriptor: &CommandDescriptor,
    picker: Option<&str>,
    manual: &str,
) -> Result<Arguments, CoercionError> {
    let manual_args = split_manual_text(descriptor, manual)?;
    let raw = if !manual_args.is_empty() {
        manual_args
    } else {
        picker
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(|p| vec![p.to_string()])
            .unwrap_or_default()
    };
    coerce_arguments(descriptor, &raw).map(Arguments::Typed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::Symbol;

    fn weekdays() -> FieldDescriptor {
        FieldDescriptor::new(
            "WEEKDAY",
            FieldKind::Bitmask {
                symbols: vec![
                    Symbol::new("MON", 0x01),
                    Symbol::new("TUE", 0x02),
                    Symbol::new("WED", 0x04),
                ],
            },
        )
    }

    #[test]
    fn bitmask_orders_by_declaration() {
        let v = coerce(&weekdays(), "wed, MON,mon").unwrap();
        assert_eq!(
            v,
            TypedValue::Bitmask {
                members: vec!["MON".into(), "WED".into()],
                bits: 0x05
            }
        );
        assert_eq!(v.to_string(), "MON,WED");
    }

    #[test]
    fn twelve_hour_clock() {
        let f = FieldDescriptor::new("ON_TIME", FieldKind::Time12h);
        assert_eq!(
            coerce(&f, "7:05 pm").unwrap(),
            TypedValue::Time12h {
                hour: 7,
                minute: 5,
                pm: true
            }
        );
        assert_eq!(
            coerce(&f, "12:00").unwrap(),
            TypedValue::Time12h {
                hour: 12,
                minute: 0,
                pm: false
            }
        );
        assert!(matches!(
            coerce(&f, "13:00"),
            Err(CoercionError::BadTimeFormat { .. })
        ));
        assert!(matches!(
            coerce(&f, "00:30"),
            Err(CoercionError::BadTimeFormat { .. })
        ));
    }

    #[test]
    fn datetime_with_and_without_seconds() {
        let f = FieldDescriptor::new("DATETIME", FieldKind::DateTime);
        let a = coerce(&f, "2024-03-01 08:15").unwrap();
        assert_eq!(a.to_string(), "2024-03-01 08:15:00");
        let b = coerce(&f, "2024-03-01 08:15:42").unwrap();
        assert_eq!(b.to_string(), "2024-03-01 08:15:42");
        assert!(coerce(&f, "03/01/2024").is_err());
    }

    #[test]
    fn raw_override_split() {
        assert_eq!(split_raw_override(" 1, ,x ,"), vec!["1", "x"]);
        assert!(split_raw_override("").is_empty());
        assert!(Arguments::raw_override("a").is_unchecked());
        assert_eq!(Arguments::Query.operation(), Operation::Read);
    }
}

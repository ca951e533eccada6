//! Status decoding: positional numeric reply values to named states.

use serde::{Serialize, Serializer};
use std::fmt;

use crate::error::StatusError;
use crate::protocol::{RawResult, RawValue};

/// A decoded state. `Unknown` keeps the raw code (or `None` when the reply was
/// too short to contain the position).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamedState {
    Known(&'static str),
    Unknown(Option<i64>),
}

impl NamedState {
    #[must_use]
    pub const fn is_known(&self) -> bool {
        matches!(self, Self::Known(_))
    }
}

impl fmt::Display for NamedState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Known(name) => f.write_str(name),
            Self::Unknown(Some(code)) => write!(f, "UNKNOWN (0x{code:02X})"),
            Self::Unknown(None) => f.write_str("UNKNOWN"),
        }
    }
}

impl Serialize for NamedState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

type Table = &'static [(i64, &'static str)];

const POWER: Table = &[(0x00, "OFF"), (0x01, "ON"), (0x02, "REBOOT")];

const MUTE: Table = &[(0x00, "OFF"), (0x01, "ON"), (0xFF, "UNAVAILABLE")];

const INPUT_SOURCE: Table = &[
    (0x04, "S_VIDEO"),
    (0x08, "COMPONENT"),
    (0x0C, "AV"),
    (0x0D, "AV2"),
    (0x0E, "SCART1"),
    (0x14, "PC"),
    (0x18, "DVI"),
    (0x1E, "BNC"),
    (0x1F, "DVI_VIDEO"),
    (0x20, "MAGIC_INFO"),
    (0x21, "HDMI1"),
    (0x22, "HDMI1_PC"),
    (0x23, "HDMI2"),
    (0x24, "HDMI2_PC"),
    (0x25, "DISPLAY_PORT_1"),
    (0x26, "DISPLAY_PORT_2"),
    (0x27, "DISPLAY_PORT_3"),
    (0x30, "RF_TV"),
    (0x31, "HDMI3"),
    (0x32, "HDMI3_PC"),
    (0x33, "HDMI4"),
    (0x34, "HDMI4_PC"),
    (0x40, "TV_DTV"),
    (0x50, "PLUG_IN_MODE"),
    (0x55, "HD_BASE_T"),
    (0x56, "OCM"),
    (0x60, "MEDIA_MAGIC_INFO_S"),
    (0x61, "WIDI_SCREEN_MIRRORING"),
    (0x62, "INTERNAL_USB"),
    (0x63, "URL_LAUNCHER"),
    (0x64, "IWB"),
    (0x65, "WEB_BROWSER"),
    (0x66, "REMOTE_WORKSPACE"),
];

const PICTURE_ASPECT: Table = &[
    (0x00, "VIDEO_AUTO_WIDE"),
    (0x01, "VIDEO_16_9"),
    (0x04, "VIDEO_ZOOM"),
    (0x05, "VIDEO_ZOOM_1"),
    (0x06, "VIDEO_ZOOM_2"),
    (0x09, "VIDEO_SCREEN_FIT"),
    (0x0B, "VIDEO_4_3"),
    (0x0C, "VIDEO_WIDE_FIT"),
    (0x0D, "VIDEO_CUSTOM"),
    (0x0E, "VIDEO_SMART_VIEW_1"),
    (0x0F, "VIDEO_SMART_VIEW_2"),
    (0x10, "PC_16_9"),
    (0x18, "PC_4_3"),
    (0x20, "PC_ORIGINAL_RATIO"),
    (0x21, "PC_21_9"),
    (0x22, "PC_CUSTOM"),
    (0x31, "VIDEO_WIDE_ZOOM"),
    (0x32, "VIDEO_21_9"),
];

fn lookup(table: Table, value: Option<i64>) -> NamedState {
    value
        .and_then(|v| table.iter().find(|(code, _)| *code == v))
        .map_or(NamedState::Unknown(value), |&(_, name)| NamedState::Known(name))
}

/// Decoded `status` reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusRecord {
    pub power: NamedState,
    /// Raw volume level, absent when the reply stopped before it.
    pub volume: Option<i64>,
    pub mute: NamedState,
    pub input_source: NamedState,
    pub picture_aspect: NamedState,
    /// Values past the known positions, unlabeled.
    pub trailing: Vec<i64>,
}

/// Decode a status reply. Missing positions decode to unknown or absent.
#[must_use]
pub fn decode(raw: &[i64]) -> StatusRecord {
    let slots: Vec<_> = raw.iter().copied().map(Some).collect();
    decode_slots(&slots)
}

fn decode_slots(slots: &[Option<i64>]) -> StatusRecord {
    let at = |i: usize| slots.get(i).copied().flatten();
    StatusRecord {
        power: lookup(POWER, at(0)),
        volume: at(1),
        mute: lookup(MUTE, at(2)),
        input_source: lookup(INPUT_SOURCE, at(3)),
        picture_aspect: lookup(PICTURE_ASPECT, at(4)),
        trailing: slots.iter().skip(5).flatten().copied().collect(),
    }
}

/// Decode a gateway result. A non-integer element decodes like a missing
/// one; only a reply with no integer at all is rejected.
pub fn decode_raw(raw: &RawResult) -> Result<StatusRecord, StatusError> {
    let slots: Vec<_> = raw
        .iter()
        .map(|v| match v {
            RawValue::Int(n) => Some(*n),
            _ => None,
        })
        .collect();
    if !raw.is_empty() && slots.iter().all(Option::is_none) {
        return Err(StatusError::NotNumeric { index: 0 });
    }
    if let Some(index) = slots.iter().position(Option::is_none) {
        tracing::debug!(index, "non-numeric status value decoded as unknown");
    }
    Ok(decode_slots(&slots))
}

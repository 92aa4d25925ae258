//! Correction of raw OCR text from a single field.
//!
//! Instrument overlays are read with a general-purpose English model, which
//! regularly returns `O` for `0`, sprinkles whitespace between glyphs and
//! tacks unit letters or noise onto numbers. The rules below repair the
//! readouts the layout knows about and leave everything else verbatim apart
//! from whitespace removal.

use crate::layout::{FieldKind, FieldSpec};

/// Character positions where a `HHMMSS` time gets its separators.
const TIME_SEPARATOR_POSITIONS: [usize; 2] = [2, 5];

/// Emitted value(s) for one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedField {
    /// Cleaned, corrected text
    pub primary: String,
    /// Numeric-only reading, temperature fields only
    pub secondary: Option<String>,
}

impl NormalizedField {
    /// Pushes this field's CSV column values onto `columns`, in output order.
    pub fn push_columns(self, columns: &mut Vec<String>) {
        columns.push(self.primary);
        if let Some(secondary) = self.secondary {
            columns.push(secondary);
        }
    }
}

/// Normalizes raw OCR output for `spec`. Never fails; garbage in gives a
/// (possibly empty) string out.
///
/// Steps, in order: drop line breaks, apply precision, apply the kind's
/// correction, drop all whitespace, then split off the numeric reading for
/// temperatures.
pub fn normalize(raw: &str, spec: &FieldSpec) -> NormalizedField {
    let mut text: String = raw.chars().filter(|c| !matches!(c, '\n' | '\r')).collect();

    if let Some(precision) = spec.precision {
        truncate_chars(&mut text, precision);
    }

    let text = match spec.kind {
        FieldKind::Date => fix_zeroes(&text).replace('.', "/"),
        FieldKind::Time => insert_time_separators(&fix_zeroes(&text)),
        FieldKind::Temperature | FieldKind::Generic => text,
    };

    let primary: String = text.chars().filter(|c| !c.is_whitespace()).collect();

    let secondary = match spec.kind {
        FieldKind::Temperature => Some(temperature_reading(&primary).to_string()),
        _ => None,
    };

    NormalizedField { primary, secondary }
}

/// Keeps at most `max_chars` characters. Shorter text is left as is (no padding).
fn truncate_chars(text: &mut String, max_chars: usize) {
    if let Some((byte_idx, _)) = text.char_indices().nth(max_chars) {
        text.truncate(byte_idx);
    }
}

/// Replaces letter O (either case) with the digit zero.
fn fix_zeroes(text: &str) -> String {
    text.replace(['O', 'o'], "0")
}

/// Turns `HHMMSS` into `HH:MM:SS`.
///
/// A separator is inserted at each position only when a character exists
/// there and it is not already a `:`, so `12:04:56` passes through unchanged.
fn insert_time_separators(text: &str) -> String {
    let mut chars: Vec<char> = text.chars().collect();
    for pos in TIME_SEPARATOR_POSITIONS {
        if pos < chars.len() && chars[pos] != ':' {
            chars.insert(pos, ':');
        }
    }
    chars.into_iter().collect()
}

/// Returns the numeric prefix of a temperature readout, e.g. `72` from `72.3F`.
///
/// Accepts one leading minus sign followed by ASCII digits and stops at the
/// first character that does not fit.
pub fn temperature_reading(text: &str) -> &str {
    let digits_start = if text.starts_with('-') { 1 } else { 0 };
    let end = text[digits_start..]
        .find(|c: char| !c.is_ascii_digit())
        .map_or(text.len(), |offset| digits_start + offset);
    &text[..end]
}

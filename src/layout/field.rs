//! Camera layout data model.
//!
//! A layout is the camera type label plus an ordered list of fields. Each
//! field is a named pixel rectangle whose meaning (date, time, temperature
//! or anything else) is resolved from its name once, when the layout is
//! loaded.

/// What a field's readout means, which decides how its text is corrected.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldKind {
    Date,
    Time,
    Temperature,
    Generic,
}

/// Field names with special handling. Anything not listed is `Generic`.
const KIND_BY_NAME: &[(&str, FieldKind)] = &[
    ("date", FieldKind::Date),
    ("time", FieldKind::Time),
    ("temperature", FieldKind::Temperature),
    ("temp", FieldKind::Temperature),
];

impl FieldKind {
    /// Resolves the kind from an exact (case-sensitive) field name.
    pub fn from_name(name: &str) -> Self {
        KIND_BY_NAME
            .iter()
            .find(|(known, _)| *known == name)
            .map(|(_, kind)| *kind)
            .unwrap_or(FieldKind::Generic)
    }
}

/// A rectangle in absolute pixel coordinates of the source image.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct PixelRect {
    /// X position of top-left corner
    pub x: u32,
    /// Y position of top-left corner
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// One named readout region of the layout.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: String,
    pub kind: FieldKind,
    pub rect: PixelRect,
    /// Keep only this many characters of the cleaned OCR text
    pub precision: Option<usize>,
}

impl FieldSpec {
    pub fn new(name: impl Into<String>, rect: PixelRect, precision: Option<usize>) -> Self {
        let name = name.into();
        let kind = FieldKind::from_name(&name);
        Self {
            name,
            kind,
            rect,
            precision,
        }
    }

    /// Number of CSV columns this field produces.
    pub fn column_count(&self) -> usize {
        match self.kind {
            FieldKind::Temperature => 2,
            _ => 1,
        }
    }
}

/// The full layout for one class of camera images.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LayoutConfig {
    pub camera_type: String,
    pub fields: Vec<FieldSpec>,
}

impl LayoutConfig {
    /// Returns the CSV header row, without a trailing newline.
    ///
    /// Column order follows field order; every temperature field is followed
    /// by a `<name>_corrected` column.
    pub fn csv_header(&self) -> String {
        let mut header = String::from("filepath,cameraType");
        for field in &self.fields {
            header.push(',');
            header.push_str(&field.name);
            if field.kind == FieldKind::Temperature {
                header.push(',');
                header.push_str(&field.name);
                header.push_str("_corrected");
            }
        }
        header
    }

    /// Number of value columns in a data row (excluding filepath and camera type).
    pub fn column_count(&self) -> usize {
        self.fields.iter().map(FieldSpec::column_count).sum()
    }
}

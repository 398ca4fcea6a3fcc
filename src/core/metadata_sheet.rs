/// Metadata tab mapping: key/value rows or a columnar header block.

use crate::core::tabular::Row;
use crate::error::SheetError;
use crate::schema::metadata::{Metadata, MetadataField};

/// Literal header token of a key/value sheet's first column.
const KEY_HEADER: &str = "key";

/// How a metadata tab is laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataLayout {
    /// One `(key, value)` pair per row.
    KeyValue,
    /// Row 0 holds header labels, row 1 the values.
    Columnar,
}

/// Pick the layout for a metadata tab.
///
/// Key/value only when the first row is exactly two cells wide and its
/// first cell is a known field alias or the `key` header token. Trailing
/// empty padding is tolerated only when the second row is a padded pair
/// that starts with an alias too. Everything else is columnar.
pub fn detect_layout(rows: &[Row]) -> MetadataLayout {
    let Some(first) = rows.first() else {
        return MetadataLayout::Columnar;
    };
    let first_cell = first.first().map(String::as_str).unwrap_or("");
    let keyish = MetadataField::from_alias(first_cell).is_some()
        || first_cell.trim().eq_ignore_ascii_case(KEY_HEADER);
    if !keyish {
        return MetadataLayout::Columnar;
    }

    let padded_pairs = is_padded_pair(first)
        && rows.get(1).is_some_and(|second| {
            is_padded_pair(second)
                && second
                    .first()
                    .is_some_and(|key| MetadataField::from_alias(key).is_some())
        });
    if first.len() == 2 || padded_pairs {
        MetadataLayout::KeyValue
    } else {
        MetadataLayout::Columnar
    }
}

/// At least two cells, with nothing but blanks past the second.
fn is_padded_pair(row: &[String]) -> bool {
    row.len() >= 2 && row[2..].iter().all(|c| c.trim().is_empty())
}

fn is_blank(row: &[String]) -> bool {
    row.iter().all(|c| c.trim().is_empty())
}

/// True when a sheet detected as key/value could just as well be a 2x2
/// columnar block: exactly two non-blank rows and both cells of row 0
/// are aliases.
///
/// Detection still picks key/value; callers should surface the warning.
pub fn is_layout_ambiguous(rows: &[Row]) -> bool {
    rows.iter().filter(|row| !is_blank(row)).count() == 2
        && detect_layout(rows) == MetadataLayout::KeyValue
        && rows[0].iter().take(2).all(|c| MetadataField::from_alias(c).is_some())
}

/// Map metadata rows to a [`Metadata`] record.
///
/// Fails only when no title can be found. A missing start node is not an
/// error here; the book loader defaults it.
pub fn map_metadata_rows(rows: &[Row]) -> Result<Metadata, SheetError> {
    let metadata = match detect_layout(rows) {
        MetadataLayout::KeyValue => map_key_value(rows),
        MetadataLayout::Columnar => map_columnar(rows),
    };

    if metadata.title.is_empty() {
        return Err(SheetError::MissingTitle);
    }
    Ok(metadata)
}

fn map_key_value(rows: &[Row]) -> Metadata {
    let mut metadata = Metadata::default();
    for row in rows {
        let key = row.first().map(|k| k.trim()).unwrap_or("");
        if key.is_empty() || key.eq_ignore_ascii_case(KEY_HEADER) {
            continue;
        }
        if let Some(field) = MetadataField::from_alias(key) {
            let value = row.get(1).map(String::as_str).unwrap_or("");
            metadata.set(field, strip_html(value));
        }
    }
    metadata
}

fn map_columnar(rows: &[Row]) -> Metadata {
    let mut metadata = Metadata::default();
    let (Some(headers), values) = (rows.first(), rows.get(1)) else {
        return metadata;
    };
    for (i, header) in headers.iter().enumerate() {
        if let Some(field) = MetadataField::from_alias(header) {
            let value = values
                .and_then(|row| row.get(i))
                .map(String::as_str)
                .unwrap_or("");
            metadata.set(field, strip_html(value));
        }
    }
    metadata
}

/// Remove every closed `<...>` span and trim the result. A `<` with no
/// closing `>` after it is kept as text.
pub fn strip_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(open) = rest.find('<') {
        let Some(close) = rest[open..].find('>') else {
            break;
        };
        out.push_str(&rest[..open]);
        rest = &rest[open + close + 1..];
    }
    out.push_str(rest);
    out.trim().to_string()
}

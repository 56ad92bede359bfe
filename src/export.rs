//! Ordered `(label, rendered value)` export rows. Consumers (tables, CSV,
//! snapshot tests) rely on the ordering being stable: rows sort ascending by
//! their member key, and labels prefer the field title when one exists.

use crate::fields::Field;

/// One exported cell of an entry or attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportRow {
    /// The member key the row sorts by.
    pub key: &'static str,
    /// The display label: the field title when present, otherwise the key.
    pub label: &'static str,
    /// `value (0x…)` rendering of the field.
    pub value: String,
}

/// Structures that expose their decoded fields as ordered rows. The raw
/// buffer, content slices and the fixup tail are never exported.
pub trait Export {
    fn export(&self) -> Vec<ExportRow>;
}

pub(crate) fn push_field(rows: &mut Vec<ExportRow>, key: &'static str, field: &Field<'_>) {
    rows.push(ExportRow {
        key,
        label: field.title().unwrap_or(key),
        value: field.to_string(),
    });
}

pub(crate) fn sorted(mut rows: Vec<ExportRow>) -> Vec<ExportRow> {
    rows.sort_by(|a, b| a.key.cmp(b.key));
    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_sort_by_key_not_label() {
        let a = [0x01u8, 0x00];
        let b = [0x02u8, 0x00, 0x00, 0x00];
        let mut rows = Vec::new();
        push_field(&mut rows, "zeta", &Field::integer(&a, Some("Alpha title")));
        push_field(&mut rows, "alpha", &Field::integer(&b, None));
        let rows = sorted(rows);
        assert_eq!(rows[0].key, "alpha");
        assert_eq!(rows[0].label, "alpha");
        assert_eq!(rows[1].label, "Alpha title");
        assert_eq!(rows[1].value, "1 (0x0100)");
    }
}

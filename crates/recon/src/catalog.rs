use std::collections::HashMap;

use crate::config::CodeTieBreak;
use crate::model::CatalogRow;
use crate::normalize::normalize_display;

/// Read-only lookup structures over one catalog snapshot.
///
/// Built once per pass; the rows it borrows cannot change while it lives.
pub struct CatalogIndex<'a> {
    rows: &'a [CatalogRow],
    by_code_key: HashMap<&'a str, Vec<usize>>,
    /// Distinct non-empty code keys in first-seen row order.
    code_keys: Vec<&'a str>,
    combined_texts: Vec<String>,
}

impl<'a> CatalogIndex<'a> {
    pub fn build(rows: &'a [CatalogRow]) -> Self {
        let mut by_code_key: HashMap<&'a str, Vec<usize>> = HashMap::new();
        let mut code_keys = Vec::new();
        let mut combined_texts = Vec::with_capacity(rows.len());

        for (i, row) in rows.iter().enumerate() {
            let key = row.code_key();
            let slots = by_code_key.entry(key).or_default();
            if slots.is_empty() && !key.is_empty() {
                code_keys.push(key);
            }
            slots.push(i);
            combined_texts.push(normalize_display(&format!("{} {}", row.code(), row.attribute())));
        }

        Self {
            rows,
            by_code_key,
            code_keys,
            combined_texts,
        }
    }

    pub fn rows(&self) -> &'a [CatalogRow] {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row(&self, index: usize) -> Option<&'a CatalogRow> {
        self.rows.get(index)
    }

    /// Row indices sharing `code_key`, in catalog order.
    pub fn rows_by_code_key(&self, code_key: &str) -> &[usize] {
        self.by_code_key.get(code_key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// `code + " " + attribute`, display-normalized.
    pub fn combined_text(&self, index: usize) -> &str {
        &self.combined_texts[index]
    }

    pub fn all_combined_texts(&self) -> &[String] {
        &self.combined_texts
    }

    /// Catalog code key occurring inside `key`, picked per `tie_break`.
    /// Empty code keys never match.
    pub fn find_code_in(&self, key: &str, tie_break: CodeTieBreak) -> Option<&'a str> {
        let mut hits = self.code_keys.iter().copied().filter(|code| key.contains(code));
        match tie_break {
            CodeTieBreak::CatalogOrder => hits.next(),
            CodeTieBreak::Longest => hits.fold(None, |best: Option<&'a str>, code| match best {
                Some(b) if b.chars().count() >= code.chars().count() => Some(b),
                _ => Some(code),
            }),
        }
    }

    /// Rows whose combined key repeats an earlier row.
    pub fn duplicate_rows(&self) -> Vec<usize> {
        let mut seen: HashMap<&str, usize> = HashMap::new();
        let mut dups = Vec::new();
        for (i, row) in self.rows.iter().enumerate() {
            if row.code_key().is_empty() {
                continue;
            }
            if seen.insert(row.combined_key(), i).is_some() {
                dups.push(i);
            }
        }
        dups
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows() -> Vec<CatalogRow> {
        vec![
            CatalogRow::new("AB-12", "ดำ", 1),
            CatalogRow::new("AB-123", "แดง", 5),
            CatalogRow::new("ab 123", "ดำ", 0),
            CatalogRow::new("", "", 0),
            CatalogRow::new("CD-9", "", 2),
        ]
    }

    #[test]
    fn groups_rows_by_code_key() {
        let rows = rows();
        let index = CatalogIndex::build(&rows);
        assert_eq!(index.len(), 5);
        assert_eq!(index.rows_by_code_key("ab123"), &[1, 2]);
        assert_eq!(index.rows_by_code_key("ab12"), &[0]);
        assert!(index.rows_by_code_key("zz").is_empty());
    }

    #[test]
    fn combined_texts_align_with_rows() {
        let rows = rows();
        let index = CatalogIndex::build(&rows);
        assert_eq!(index.combined_text(1), "AB-123 แดง");
        assert_eq!(index.combined_text(3), "");
        assert_eq!(index.combined_text(4), "CD-9");
        assert_eq!(index.all_combined_texts().len(), rows.len());
    }

    #[test]
    fn longest_code_wins_by_default() {
        let rows = rows();
        let index = CatalogIndex::build(&rows);
        assert_eq!(index.find_code_in("itemab123red", CodeTieBreak::Longest), Some("ab123"));
        assert_eq!(index.find_code_in("itemab123red", CodeTieBreak::CatalogOrder), Some("ab12"));
        assert_eq!(index.find_code_in("ab12", CodeTieBreak::Longest), Some("ab12"));
        assert_eq!(index.find_code_in("nothing", CodeTieBreak::Longest), None);
    }

    #[test]
    fn equal_length_codes_fall_back_to_catalog_order() {
        let rows = vec![CatalogRow::new("XY1", "", 0), CatalogRow::new("AB1", "", 0)];
        let index = CatalogIndex::build(&rows);
        assert_eq!(index.find_code_in("ab1xy1", CodeTieBreak::Longest), Some("xy1"));
    }

    #[test]
    fn empty_code_never_matches() {
        let rows = vec![CatalogRow::new("  ", "red", 0)];
        let index = CatalogIndex::build(&rows);
        assert_eq!(index.find_code_in("anything", CodeTieBreak::Longest), None);
        assert_eq!(index.find_code_in("", CodeTieBreak::CatalogOrder), None);
    }

    #[test]
    fn duplicates_by_combined_key() {
        let rows = vec![
            CatalogRow::new("AB-123", "แดง", 1),
            CatalogRow::new("ab123", "แดง", 2),
            CatalogRow::new("AB-123", "ดำ", 3),
            CatalogRow::new("", "", 0),
            CatalogRow::new("", "", 0),
        ];
        let index = CatalogIndex::build(&rows);
        assert_eq!(index.duplicate_rows(), vec![1]);
    }

    #[test]
    fn empty_catalog() {
        let index = CatalogIndex::build(&[]);
        assert!(index.is_empty());
        assert!(index.all_combined_texts().is_empty());
        assert_eq!(index.find_code_in("ab123", CodeTieBreak::Longest), None);
    }
}

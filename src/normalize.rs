//! Column normalization: maps arbitrary spreadsheet headers onto the three
//! canonical contact fields.
//!
//! Both parser variants feed rows through [`normalize_row`], so header
//! handling is identical for CSV and workbook uploads.

use crate::models::ContactRecord;

/// The canonical fields every accepted record must resolve to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CanonicalField {
    Name,
    Phone,
    Notes,
}

const NAME_HINTS: [&str; 3] = ["firstname", "first_name", "first name"];
const PHONE_HINTS: [&str; 3] = ["phone", "mobile", "number"];
const NOTES_HINTS: [&str; 3] = ["notes", "note", "comments"];

/// Classifies a raw header by case-insensitive substring containment.
///
/// Priority order is name, then phone, then notes; the first family that
/// matches wins. Headers matching none are ignored by the caller.
pub fn classify_header(header: &str) -> Option<CanonicalField> {
    let header = header.trim().to_lowercase();
    if NAME_HINTS.iter().any(|hint| header.contains(hint)) {
        Some(CanonicalField::Name)
    } else if PHONE_HINTS.iter().any(|hint| header.contains(hint)) {
        Some(CanonicalField::Phone)
    } else if NOTES_HINTS.iter().any(|hint| header.contains(hint)) {
        Some(CanonicalField::Notes)
    } else {
        None
    }
}

/// Builds a [`ContactRecord`] from one row of (header, value) cells.
///
/// Cell values are trimmed. When two headers classify to the same field the
/// first one wins and later duplicates are ignored. Returns `None` when the
/// row lacks a non-empty name or phone; such rows are dropped silently.
pub fn normalize_row(cells: &[(String, String)]) -> Option<ContactRecord> {
    let mut name: Option<&str> = None;
    let mut phone: Option<&str> = None;
    let mut notes: Option<&str> = None;

    for (header, value) in cells {
        let Some(field) = classify_header(header) else {
            continue;
        };
        let slot = match field {
            CanonicalField::Name => &mut name,
            CanonicalField::Phone => &mut phone,
            CanonicalField::Notes => &mut notes,
        };
        if slot.is_none() {
            *slot = Some(value.trim());
        }
    }

    let name = name.filter(|v| !v.is_empty())?;
    let phone = phone.filter(|v| !v.is_empty())?;
    Some(ContactRecord {
        name: name.to_string(),
        phone: phone.to_string(),
        notes: notes.unwrap_or_default().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[(&str, &str)]) -> Vec<(String, String)> {
        cells
            .iter()
            .map(|(h, v)| (h.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn classifies_headers_case_insensitively() {
        assert_eq!(classify_header("FirstName"), Some(CanonicalField::Name));
        assert_eq!(classify_header("  first name "), Some(CanonicalField::Name));
        assert_eq!(classify_header("Customer_First_Name"), Some(CanonicalField::Name));
        assert_eq!(classify_header("Mobile Number"), Some(CanonicalField::Phone));
        assert_eq!(classify_header("PHONE"), Some(CanonicalField::Phone));
        assert_eq!(classify_header("Comments"), Some(CanonicalField::Notes));
        assert_eq!(classify_header("Note"), Some(CanonicalField::Notes));
        assert_eq!(classify_header("Email"), None);
        assert_eq!(classify_header("Ph#"), None);
    }

    #[test]
    fn name_hint_outranks_phone_hint() {
        // "first name" is checked before "number", so a header containing
        // both classifies as a name column.
        assert_eq!(
            classify_header("First Name Number"),
            Some(CanonicalField::Name)
        );
    }

    #[test]
    fn complete_row_yields_record_with_default_notes() {
        let record = normalize_row(&row(&[("First Name", "Bob"), ("Mobile Number", "+1555")]));
        assert_eq!(
            record,
            Some(ContactRecord {
                name: "Bob".to_string(),
                phone: "+1555".to_string(),
                notes: String::new(),
            })
        );
    }

    #[test]
    fn row_without_phone_match_is_dropped() {
        // "Ph#" matches no phone hint, so the row never gets a phone.
        assert_eq!(normalize_row(&row(&[("Firstname", "Alice"), ("Ph#", "123")])), None);
    }

    #[test]
    fn row_with_empty_required_value_is_dropped() {
        assert_eq!(
            normalize_row(&row(&[("Firstname", "Alice"), ("Phone", "   ")])),
            None
        );
        assert_eq!(normalize_row(&row(&[("Firstname", ""), ("Phone", "+1555")])), None);
    }

    #[test]
    fn values_are_trimmed() {
        let record = normalize_row(&row(&[
            ("FirstName", "  Carol "),
            ("Phone", " +1444 "),
            ("Notes", "  follow up "),
        ]))
        .unwrap();
        assert_eq!(record.name, "Carol");
        assert_eq!(record.phone, "+1444");
        assert_eq!(record.notes, "follow up");
    }

    #[test]
    fn duplicate_headers_first_match_wins() {
        let record = normalize_row(&row(&[
            ("Phone", "+111"),
            ("Mobile", "+222"),
            ("FirstName", "Dave"),
        ]))
        .unwrap();
        assert_eq!(record.phone, "+111");

        // First wins even when the first occurrence is empty.
        assert_eq!(
            normalize_row(&row(&[("Phone", ""), ("Mobile", "+222"), ("FirstName", "Dave")])),
            None
        );
    }

    #[test]
    fn unrecognized_headers_are_ignored() {
        let record = normalize_row(&row(&[
            ("Email", "x@example.com"),
            ("FirstName", "Eve"),
            ("Number", "+333"),
            ("Region", "EMEA"),
        ]))
        .unwrap();
        assert_eq!(record.name, "Eve");
        assert_eq!(record.phone, "+333");
        assert_eq!(record.notes, "");
    }
}

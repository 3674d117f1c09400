//! Template file name specialisation
//!
//! The rules here describe the documents, not the customers, so they are fixed
//! per form number instead of living in the rule tables.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::rules::tables::FormNumber;

/// Deed forms, specialised by jurisdiction and marital status
pub const DEED_FORMS: [FormNumber; 3] = [11, 12, 21];
/// Note forms, specialised by jurisdiction and amortisation variant
pub const NOTE_FORMS: [FormNumber; 3] = [13, 14, 20];

const SPECIAL_VARIANT_TOKEN: &str = "_Chacot";
const MARRIED_TOKEN: &str = "(Married).docx";
const SINGLE_TOKEN: &str = "(Single).docx";
const AMORTIZATION_TOKEN: &str = "(Amortization).docx";

static PARENTHESIZED_DOCX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\(.+?\)\.docx").expect("valid regex"));

/// Insert `token` before the first `.docx`/`.xlsx` extension.
///
/// Names without either extension are returned unchanged.
pub fn insert_before_extension(file_name: &str, token: &str) -> String {
    let position = [".docx", ".xlsx"]
        .iter()
        .filter_map(|ext| file_name.find(ext))
        .min();
    match position {
        Some(at) => format!("{}{}{}", &file_name[..at], token, &file_name[at..]),
        None => file_name.to_string(),
    }
}

/// Replace the first `(...).docx` token
fn replace_parenthesized(file_name: &str, replacement: &str) -> String {
    PARENTHESIZED_DOCX
        .replace(file_name, regex::NoExpand(replacement))
        .into_owned()
}

/// Replace every `(...).docx` token
fn replace_all_parenthesized(file_name: &str, replacement: &str) -> String {
    PARENTHESIZED_DOCX
        .replace_all(file_name, regex::NoExpand(replacement))
        .into_owned()
}

/// Apply the per-form file name rules.
pub fn specialize_file_name(
    file_name: &str,
    form: FormNumber,
    jurisdiction: &str,
    has_spouse: bool,
) -> String {
    let jurisdiction_token = format!("_{}", jurisdiction);

    if DEED_FORMS.contains(&form) {
        let mut name = file_name.to_string();
        if jurisdiction == "OH" {
            let marital = if has_spouse { MARRIED_TOKEN } else { SINGLE_TOKEN };
            name = replace_parenthesized(&name, marital);
        }
        name = insert_before_extension(&name, &jurisdiction_token);
        if form == 21 {
            name = insert_before_extension(&name, SPECIAL_VARIANT_TOKEN);
        }
        name
    } else if NOTE_FORMS.contains(&form) {
        let mut name = file_name.to_string();
        if jurisdiction == "CA" {
            name = replace_all_parenthesized(&name, AMORTIZATION_TOKEN);
        }
        name = insert_before_extension(&name, &jurisdiction_token);
        if form == 20 {
            name = insert_before_extension(&name, SPECIAL_VARIANT_TOKEN);
        }
        name
    } else {
        file_name.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_before_extension() {
        assert_eq!(insert_before_extension("bill.docx", "_x"), "bill_x.docx");
        assert_eq!(insert_before_extension("total.xlsx", "1"), "total1.xlsx");
        assert_eq!(insert_before_extension("readme.txt", "_x"), "readme.txt");
    }

    #[test]
    fn test_deed_in_ohio_uses_marital_status() {
        assert_eq!(
            specialize_file_name("Deed(Template).docx", 11, "OH", true),
            "Deed(Married)_OH.docx"
        );
        assert_eq!(
            specialize_file_name("Deed(Template).docx", 12, "OH", false),
            "Deed(Single)_OH.docx"
        );
        assert_eq!(
            specialize_file_name("Deed(Template).docx", 11, "HI", true),
            "Deed(Template)_HI.docx"
        );
    }

    #[test]
    fn test_special_variants() {
        assert_eq!(specialize_file_name("Deed.docx", 21, "GA", false), "Deed_GA_Chacot.docx");
        assert_eq!(specialize_file_name("Note.docx", 20, "TX", false), "Note_TX_Chacot.docx");
        assert_eq!(
            specialize_file_name("Note(Plain).docx", 13, "CA", false),
            "Note(Amortization)_CA.docx"
        );
    }

    #[test]
    fn test_note_replaces_every_parenthesized_token() {
        assert_eq!(
            specialize_file_name("Note(A).docx(B).docx", 14, "CA", false),
            "Note(Amortization)_CA.docx(Amortization).docx"
        );
        // Deeds only rewrite the first token
        assert_eq!(
            specialize_file_name("Deed(A).docx(B).docx", 11, "OH", false),
            "Deed(Single)_OH.docx(B).docx"
        );
    }

    #[test]
    fn test_other_forms_unchanged() {
        assert_eq!(specialize_file_name("Bill.docx", 1, "OH", true), "Bill.docx");
    }
}

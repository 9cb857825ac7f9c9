//! Dictionary completeness validation.
//!
//! Every bundle is compared against the default locale's bundle: keys missing
//! from a translation are errors (the UI would silently show default-locale
//! text), extra keys and `{placeholder}` mismatches are warnings.

use crate::i18n::{Dictionary, Locale};
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::OnceLock;

/// Validation report for one locale's bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    /// Locale code the report refers to
    pub locale: String,

    /// Critical problems (keys missing from the translation)
    pub errors: Vec<String>,

    /// Non-critical problems (extra keys, placeholder drift)
    pub warnings: Vec<String>,
}

impl ValidationReport {
    pub fn new(locale: &str) -> Self {
        Self {
            locale: locale.to_string(),
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    pub fn is_clean(&self) -> bool {
        !self.has_errors() && !self.has_warnings()
    }
}

/// Validator for dictionary bundles.
pub struct DictionaryValidator;

static PLACEHOLDER_REGEX: OnceLock<Regex> = OnceLock::new();

impl DictionaryValidator {
    /// Compare `translated` (the bundle for `locale`) against `reference`.
    pub fn validate(locale: Locale, reference: &Dictionary, translated: &Dictionary) -> ValidationReport {
        let mut report = ValidationReport::new(locale.code());
        let reference_keys = reference.keys();
        let translated_keys = translated.keys();

        for key in reference_keys.difference(&translated_keys) {
            report.errors.push(format!("Missing key: {}", key));
        }

        for key in translated_keys.difference(&reference_keys) {
            report.warnings.push(format!("Unknown key: {}", key));
        }

        for key in reference_keys.intersection(&translated_keys) {
            let expected = Self::extract_placeholders(reference.get(key).unwrap_or_default());
            let found = Self::extract_placeholders(translated.get(key).unwrap_or_default());
            if expected != found {
                report.warnings.push(format!(
                    "Placeholder mismatch in {}: expected {:?}, found {:?}",
                    key, expected, found
                ));
            }
        }

        report
    }

    /// Validate every non-default locale against the default bundle.
    ///
    /// `bundles` yields `(locale, dictionary)`; the default locale's entry is
    /// used as the reference and is not reported on. Without a default entry
    /// every other bundle is checked against an empty reference.
    pub fn validate_all<'a, I>(bundles: I) -> Vec<ValidationReport>
    where
        I: IntoIterator<Item = (Locale, &'a Dictionary)>,
    {
        let bundles: Vec<_> = bundles.into_iter().collect();
        let empty = Dictionary::default();
        let reference = bundles
            .iter()
            .find(|(locale, _)| locale.is_default())
            .map(|(_, dictionary)| *dictionary)
            .unwrap_or(&empty);

        bundles
            .iter()
            .filter(|(locale, _)| !locale.is_default())
            .map(|(locale, dictionary)| Self::validate(*locale, reference, dictionary))
            .collect()
    }

    /// Extract `{name}` placeholders from a string.
    fn extract_placeholders(text: &str) -> BTreeSet<String> {
        let regex = PLACEHOLDER_REGEX
            .get_or_init(|| Regex::new(r"\{([A-Za-z0-9_]+)\}").expect("placeholder pattern is valid"));

        regex
            .captures_iter(text)
            .filter_map(|cap| cap.get(1).map(|m| m.as_str().to_string()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn dict(value: serde_json::Value) -> Dictionary {
        Dictionary::from_value(value, "test").unwrap()
    }

    fn locale(code: &str) -> Locale {
        Locale::from_code(code).unwrap()
    }

    // ==================== validate Tests ====================

    #[test]
    fn test_identical_bundles_are_clean() {
        let en = dict(json!({ "a": "A", "b": { "c": "C {n}" } }));
        let th = dict(json!({ "a": "ก", "b": { "c": "ค {n}" } }));
        let report = DictionaryValidator::validate(locale("th"), &en, &th);
        assert!(report.is_clean(), "{:?}", report);
        assert_eq!(report.locale, "th");
    }

    #[test]
    fn test_missing_keys_are_errors() {
        let en = dict(json!({ "a": "A", "b": { "c": "C" } }));
        let th = dict(json!({ "a": "ก", "b": { "c": "" } }));
        let report = DictionaryValidator::validate(locale("th"), &en, &th);
        assert!(report.has_errors());
        assert_eq!(report.errors, vec!["Missing key: b.c".to_string()]);
    }

    #[test]
    fn test_extra_keys_are_warnings() {
        let en = dict(json!({ "a": "A" }));
        let zh = dict(json!({ "a": "甲", "z": "乙" }));
        let report = DictionaryValidator::validate(locale("zh"), &en, &zh);
        assert!(!report.has_errors());
        assert_eq!(report.warnings, vec!["Unknown key: z".to_string()]);
    }

    #[test]
    fn test_placeholder_mismatch_is_warning() {
        let en = dict(json!({ "count": "Based on {count} reviews" }));
        let zh = dict(json!({ "count": "基于 {total} 条评论" }));
        let report = DictionaryValidator::validate(locale("zh"), &en, &zh);
        assert!(!report.has_errors());
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].contains("count"));
    }

    // ==================== validate_all Tests ====================

    #[test]
    fn test_validate_all_skips_default() {
        let en = dict(json!({ "a": "A" }));
        let th = dict(json!({}));
        let zh = dict(json!({ "a": "甲" }));
        let reports = DictionaryValidator::validate_all(vec![
            (locale("en"), &en),
            (locale("th"), &th),
            (locale("zh"), &zh),
        ]);

        assert_eq!(reports.len(), 2);
        assert!(reports[0].has_errors());
        assert!(reports[1].is_clean());
    }

    #[test]
    fn test_extract_placeholders() {
        let found = DictionaryValidator::extract_placeholders("{a} and {b_2} but not { c }");
        let expected: BTreeSet<String> = ["a", "b_2"].iter().map(|s| s.to_string()).collect();
        assert_eq!(found, expected);
    }
}

//! Field-level dispatch and weighted record aggregation.

use std::collections::BTreeMap;

use coalesce_core::fields::StandardField;
use coalesce_core::types::CustomerRecord;

use crate::normalize::{normalize_email, normalize_phone, normalize_text, normalize_website};
use crate::similarity;

/// Default per-field weights for the overall score.
pub fn default_field_weights() -> BTreeMap<StandardField, f64> {
    BTreeMap::from([
        (StandardField::CompanyName, 0.25),
        (StandardField::Email, 0.20),
        (StandardField::Phone, 0.10),
        (StandardField::FirstName, 0.10),
        (StandardField::LastName, 0.10),
        (StandardField::AddressLine1, 0.05),
        (StandardField::City, 0.05),
        (StandardField::PostalCode, 0.05),
        (StandardField::TaxId, 0.05),
        (StandardField::Website, 0.05),
    ])
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

/// Compare two raw field values with the best algorithm for the field.
/// Returns a similarity in `[0, 1]`; an empty or absent side scores 0.0.
pub fn compare_field(field: StandardField, value_a: Option<&str>, value_b: Option<&str>) -> f64 {
    let blank = |v: Option<&str>| v.is_none_or(str::is_empty);
    if blank(value_a) || blank(value_b) {
        return 0.0;
    }

    match field {
        StandardField::Email => {
            similarity::exact(&normalize_email(value_a), &normalize_email(value_b))
        }
        StandardField::TaxId => {
            similarity::exact(&normalize_text(value_a), &normalize_text(value_b))
        }
        StandardField::Phone => {
            let a = normalize_phone(value_a);
            let b = normalize_phone(value_b);
            if a.is_empty() || b.is_empty() {
                return 0.0;
            }
            if a == b {
                1.0
            } else if a.ends_with(&b) || b.ends_with(&a) {
                // Country-code vs local representation: close, but the
                // prefix mismatch is real signal.
                0.95
            } else {
                similarity::edit(&a, &b)
            }
        }
        StandardField::FirstName | StandardField::LastName => {
            let a = normalize_text(value_a);
            let b = normalize_text(value_b);
            similarity::jaro_winkler(&a, &b).max(similarity::phonetic(&a, &b))
        }
        StandardField::CompanyName => {
            let a = normalize_text(value_a);
            let b = normalize_text(value_b);
            similarity::jaro_winkler(&a, &b)
                .max(similarity::token_sort_ratio(&a, &b))
                .max(similarity::edit(&a, &b))
        }
        StandardField::AddressLine1 | StandardField::AddressLine2 => {
            let a = normalize_text(value_a);
            let b = normalize_text(value_b);
            similarity::token_sort_ratio(&a, &b).max(similarity::edit(&a, &b))
        }
        StandardField::Website => {
            let a = normalize_website(value_a);
            let b = normalize_website(value_b);
            if a.is_empty() || b.is_empty() {
                0.0
            } else {
                similarity::exact(&a, &b)
            }
        }
        _ => similarity::jaro_winkler(&normalize_text(value_a), &normalize_text(value_b)),
    }
}

/// Compare two customer records across the weighted fields. Fields where
/// both sides are empty are skipped entirely, so sparse records are scored
/// on the evidence actually present. Returns the overall score and the
/// per-field scores, both rounded to 4 decimals.
pub fn compare_records(
    record_a: &CustomerRecord,
    record_b: &CustomerRecord,
    weights: &BTreeMap<StandardField, f64>,
) -> (f64, BTreeMap<StandardField, f64>) {
    let mut field_scores = BTreeMap::new();
    let mut weighted_sum = 0.0;
    let mut total_weight = 0.0;

    for (&field, &weight) in weights {
        let value_a = record_a.field(field);
        let value_b = record_b.field(field);
        if !record_a.has_value(field) && !record_b.has_value(field) {
            continue;
        }

        let score = compare_field(field, value_a, value_b);
        field_scores.insert(field, round4(score));
        weighted_sum += score * weight;
        total_weight += weight;
    }

    let overall = if total_weight > 0.0 {
        round4(weighted_sum / total_weight)
    } else {
        0.0
    };
    (overall, field_scores)
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn record(fields: &[(StandardField, &str)]) -> CustomerRecord {
        let mut r = CustomerRecord::new(Uuid::new_v4(), None);
        for (field, value) in fields {
            r.set_field(*field, Some((*value).to_string()));
        }
        r
    }

    #[test]
    fn test_email_is_exact_after_normalization() {
        let score = compare_field(StandardField::Email, Some("a@x.com"), Some("A@X.com"));
        assert_eq!(score, 1.0);
        let miss = compare_field(StandardField::Email, Some("a@x.com"), Some("b@x.com"));
        assert_eq!(miss, 0.0);
    }

    #[test]
    fn test_phone_suffix_rule_scores_095() {
        let score = compare_field(StandardField::Phone, Some("+1-555-0101"), Some("555-0101"));
        assert_eq!(score, 0.95);
    }

    #[test]
    fn test_identical_phone_scores_10() {
        let score = compare_field(StandardField::Phone, Some("+1 555 0101"), Some("15550101"));
        assert_eq!(score, 1.0);
    }

    #[test]
    fn test_company_name_matches_through_max_of_kernels() {
        let score = compare_field(
            StandardField::CompanyName,
            Some("Acme Corporation"),
            Some("ACME CORPORATION "),
        );
        assert_eq!(score, 1.0);
    }

    #[test]
    fn test_empty_side_scores_zero() {
        assert_eq!(compare_field(StandardField::Email, Some("a@x.com"), None), 0.0);
        assert_eq!(compare_field(StandardField::Email, Some(""), Some("a@x.com")), 0.0);
        assert_eq!(compare_field(StandardField::Email, None, None), 0.0);
    }

    #[test]
    fn test_record_compare_is_symmetric() {
        let a = record(&[
            (StandardField::FirstName, "John"),
            (StandardField::LastName, "Smith"),
            (StandardField::Email, "john.smith@acme.com"),
            (StandardField::CompanyName, "Acme Corp"),
        ]);
        let b = record(&[
            (StandardField::FirstName, "Jon"),
            (StandardField::LastName, "Smith"),
            (StandardField::Email, "john.smith@acme.com"),
        ]);
        let weights = default_field_weights();
        let (ab, ab_fields) = compare_records(&a, &b, &weights);
        let (ba, ba_fields) = compare_records(&b, &a, &weights);
        assert_eq!(ab, ba);
        assert_eq!(ab_fields, ba_fields);
    }

    #[test]
    fn test_record_compare_identity_is_one() {
        let a = record(&[
            (StandardField::Email, "john.smith@acme.com"),
            (StandardField::Phone, "+31 20 555 0303"),
            (StandardField::City, "Amsterdam"),
        ]);
        let (score, _) = compare_records(&a, &a, &default_field_weights());
        assert_eq!(score, 1.0);
    }

    #[test]
    fn test_both_empty_fields_do_not_change_the_score() {
        let a = record(&[(StandardField::Email, "a@x.com")]);
        let b = record(&[(StandardField::Email, "a@x.com")]);
        let (baseline, baseline_fields) = compare_records(&a, &b, &default_field_weights());

        let mut a2 = a.clone();
        let mut b2 = b.clone();
        a2.set_field(StandardField::City, Some(String::new()));
        b2.set_field(StandardField::City, None);
        let (with_blank, blank_fields) = compare_records(&a2, &b2, &default_field_weights());

        assert_eq!(baseline, with_blank);
        assert_eq!(baseline_fields, blank_fields);
        assert!(!blank_fields.contains_key(&StandardField::City));
    }

    #[test]
    fn test_typo_in_first_name_stays_above_default_threshold() {
        let a = record(&[
            (StandardField::FirstName, "John"),
            (StandardField::LastName, "Smith"),
            (StandardField::Email, "john.smith@acme.com"),
        ]);
        let b = record(&[
            (StandardField::FirstName, "Jon"),
            (StandardField::LastName, "Smith"),
            (StandardField::Email, "john.smith@acme.com"),
        ]);
        let (score, fields) = compare_records(&a, &b, &default_field_weights());
        assert_eq!(fields[&StandardField::Email], 1.0);
        assert_eq!(fields[&StandardField::LastName], 1.0);
        assert!(fields[&StandardField::FirstName] > 0.9);
        assert!(score > 0.75);
    }

    #[test]
    fn test_sparse_records_use_dynamic_denominator() {
        let a = record(&[(StandardField::Email, "a@x.com")]);
        let b = record(&[(StandardField::Email, "A@X.com")]);
        let (score, fields) = compare_records(&a, &b, &default_field_weights());
        assert_eq!(score, 1.0);
        assert_eq!(fields.len(), 1);
    }
}

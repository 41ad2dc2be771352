//! Merge planning: pick the surviving value for each standard field.

use std::collections::BTreeMap;

use coalesce_core::fields::StandardField;
use coalesce_core::types::CustomerRecord;

/// Surviving values keyed by field; `None` means the golden record carries
/// no value for that field.
pub type SurvivingValues = BTreeMap<StandardField, Option<String>>;

/// Pick the best value per field: the present one, or the longer of two
/// present values (ties keep record a's value).
pub fn auto_select_best_values(
    record_a: &CustomerRecord,
    record_b: &CustomerRecord,
) -> SurvivingValues {
    let mut best = SurvivingValues::new();
    for field in StandardField::ALL {
        let value_a = record_a.field(field).filter(|v| !v.is_empty());
        let value_b = record_b.field(field).filter(|v| !v.is_empty());
        let winner = match (value_a, value_b) {
            (Some(a), None) => Some(a),
            (None, Some(b)) => Some(b),
            (Some(a), Some(b)) => Some(if a.len() >= b.len() { a } else { b }),
            (None, None) => None,
        };
        best.insert(field, winner.map(str::to_owned));
    }
    best
}

/// Operator-supplied values override the auto-plan field by field; fields
/// the operator does not name keep the auto-planned value.
pub fn resolve_surviving_values(
    record_a: &CustomerRecord,
    record_b: &CustomerRecord,
    overrides: Option<&SurvivingValues>,
) -> SurvivingValues {
    let mut values = auto_select_best_values(record_a, record_b);
    if let Some(overrides) = overrides {
        for (field, value) in overrides {
            values.insert(*field, value.clone().filter(|v| !v.is_empty()));
        }
    }
    values
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn record(company: Option<&str>, email: Option<&str>) -> CustomerRecord {
        let mut r = CustomerRecord::new(Uuid::new_v4(), None);
        r.company_name = company.map(str::to_owned);
        r.email = email.map(str::to_owned);
        r
    }

    #[test]
    fn test_single_present_value_wins() {
        let a = record(Some("Acme"), None);
        let b = record(None, Some("ops@acme.com"));
        let best = auto_select_best_values(&a, &b);
        assert_eq!(best[&StandardField::CompanyName].as_deref(), Some("Acme"));
        assert_eq!(best[&StandardField::Email].as_deref(), Some("ops@acme.com"));
        assert_eq!(best[&StandardField::Phone], None);
    }

    #[test]
    fn test_longer_value_wins_and_ties_keep_a() {
        let a = record(Some("Acme"), Some("a@acme.com"));
        let b = record(Some("Acme Corporation"), Some("b@acme.com"));
        let best = auto_select_best_values(&a, &b);
        assert_eq!(
            best[&StandardField::CompanyName].as_deref(),
            Some("Acme Corporation")
        );
        // Equal length: record a wins.
        assert_eq!(best[&StandardField::Email].as_deref(), Some("a@acme.com"));
    }

    #[test]
    fn test_empty_string_counts_as_absent() {
        let a = record(Some(""), None);
        let b = record(Some("Acme"), None);
        let best = auto_select_best_values(&a, &b);
        assert_eq!(best[&StandardField::CompanyName].as_deref(), Some("Acme"));
    }

    #[test]
    fn test_operator_overrides_apply_field_by_field() {
        let a = record(Some("Acme"), Some("a@acme.com"));
        let b = record(Some("Acme Corporation"), None);
        let overrides = SurvivingValues::from([
            (StandardField::CompanyName, Some("Acme".to_string())),
        ]);
        let values = resolve_surviving_values(&a, &b, Some(&overrides));
        assert_eq!(values[&StandardField::CompanyName].as_deref(), Some("Acme"));
        // Untouched field keeps the auto-planned value.
        assert_eq!(values[&StandardField::Email].as_deref(), Some("a@acme.com"));
    }
}

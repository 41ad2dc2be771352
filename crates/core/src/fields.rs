//! The Standard Field Set — the 13-field canonical customer schema shared
//! by source records and golden records.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

use crate::error::MdmError;

/// A field of the canonical customer schema. Declaration order is the
/// canonical order used for exports and deterministic iteration.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum StandardField {
    CompanyName,
    FirstName,
    LastName,
    Email,
    Phone,
    AddressLine1,
    AddressLine2,
    City,
    State,
    PostalCode,
    Country,
    TaxId,
    Website,
}

impl StandardField {
    /// All standard fields in canonical order.
    pub const ALL: [StandardField; 13] = [
        StandardField::CompanyName,
        StandardField::FirstName,
        StandardField::LastName,
        StandardField::Email,
        StandardField::Phone,
        StandardField::AddressLine1,
        StandardField::AddressLine2,
        StandardField::City,
        StandardField::State,
        StandardField::PostalCode,
        StandardField::Country,
        StandardField::TaxId,
        StandardField::Website,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StandardField::CompanyName => "company_name",
            StandardField::FirstName => "first_name",
            StandardField::LastName => "last_name",
            StandardField::Email => "email",
            StandardField::Phone => "phone",
            StandardField::AddressLine1 => "address_line1",
            StandardField::AddressLine2 => "address_line2",
            StandardField::City => "city",
            StandardField::State => "state",
            StandardField::PostalCode => "postal_code",
            StandardField::Country => "country",
            StandardField::TaxId => "tax_id",
            StandardField::Website => "website",
        }
    }
}

impl fmt::Display for StandardField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StandardField {
    type Err = MdmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StandardField::ALL
            .iter()
            .copied()
            .find(|f| f.as_str() == s)
            .ok_or_else(|| MdmError::InvalidInput(format!("Unknown standard field: {s}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_fields_round_trip_through_names() {
        for field in StandardField::ALL {
            assert_eq!(field.as_str().parse::<StandardField>().unwrap(), field);
        }
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        assert!("middle_name".parse::<StandardField>().is_err());
    }

    #[test]
    fn test_canonical_order_starts_with_company_name() {
        assert_eq!(StandardField::ALL[0], StandardField::CompanyName);
        assert_eq!(StandardField::ALL[12], StandardField::Website);
    }
}

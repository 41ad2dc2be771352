//! Column auto-mapping: common source column names for each standard
//! field, matched exactly after lowercasing and normalizing separators.

use std::collections::HashMap;

use coalesce_core::fields::StandardField;

const AUTO_MAP_HINTS: &[(StandardField, &[&str])] = &[
    (
        StandardField::CompanyName,
        &["company", "company_name", "companyname", "organization", "org", "business", "firm"],
    ),
    (
        StandardField::FirstName,
        &["first_name", "firstname", "first", "given_name", "givenname"],
    ),
    (
        StandardField::LastName,
        &["last_name", "lastname", "last", "surname", "family_name", "familyname"],
    ),
    (
        StandardField::Email,
        &["email", "e_mail", "email_address", "emailaddress", "mail"],
    ),
    (
        StandardField::Phone,
        &["phone", "telephone", "tel", "phone_number", "phonenumber", "mobile", "cell"],
    ),
    (
        StandardField::AddressLine1,
        &["address", "address_line1", "address1", "street", "street_address", "addressline1"],
    ),
    (
        StandardField::AddressLine2,
        &["address_line2", "address2", "addressline2", "suite", "apt", "unit"],
    ),
    (StandardField::City, &["city", "town", "municipality"]),
    (
        StandardField::State,
        &["state", "province", "region", "state_province"],
    ),
    (
        StandardField::PostalCode,
        &["postal_code", "postalcode", "zip", "zipcode", "zip_code", "postcode"],
    ),
    (
        StandardField::Country,
        &["country", "nation", "country_code"],
    ),
    (
        StandardField::TaxId,
        &["tax_id", "taxid", "vat", "vat_number", "ein", "tax_number", "kvk", "coc"],
    ),
    (
        StandardField::Website,
        &["website", "web", "url", "homepage", "site"],
    ),
];

/// Suggest a mapping from source columns to standard fields. Matching is
/// exact against the hint lists after lowercasing and replacing spaces
/// and hyphens with underscores.
pub fn auto_map_columns(columns: &[String]) -> HashMap<String, StandardField> {
    let mut mapping = HashMap::new();
    for column in columns {
        let normalized = column
            .to_lowercase()
            .trim()
            .replace([' ', '-'], "_");
        for (field, hints) in AUTO_MAP_HINTS {
            if hints.contains(&normalized.as_str()) {
                mapping.insert(column.clone(), *field);
                break;
            }
        }
    }
    mapping
}

#[cfg(test)]
mod tests {
    use super::*;

    fn columns(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_common_variants_map() {
        let mapping = auto_map_columns(&columns(&["Organization", "E-Mail", "Zip Code"]));
        assert_eq!(mapping["Organization"], StandardField::CompanyName);
        assert_eq!(mapping["E-Mail"], StandardField::Email);
        assert_eq!(mapping["Zip Code"], StandardField::PostalCode);
    }

    #[test]
    fn test_unknown_columns_are_left_unmapped() {
        let mapping = auto_map_columns(&columns(&["internal_ref", "email"]));
        assert_eq!(mapping.len(), 1);
        assert_eq!(mapping["email"], StandardField::Email);
    }

    #[test]
    fn test_dutch_tax_registry_columns_map_to_tax_id() {
        let mapping = auto_map_columns(&columns(&["KvK", "coc"]));
        assert_eq!(mapping["KvK"], StandardField::TaxId);
        assert_eq!(mapping["coc"], StandardField::TaxId);
    }
}

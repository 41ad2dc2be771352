//! Core entities: data sources, customer records, match candidates, and
//! golden records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::fields::StandardField;

// ─── Data Sources ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SourceStatus {
    Uploaded,
    Processing,
    Processed,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum FileType {
    Csv,
    Xlsx,
    Xls,
}

impl FileType {
    /// Map a lowercased file extension (without the dot) to a supported type.
    pub fn from_extension(ext: &str) -> Option<FileType> {
        match ext {
            "csv" => Some(FileType::Csv),
            "xlsx" => Some(FileType::Xlsx),
            "xls" => Some(FileType::Xls),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            FileType::Csv => "csv",
            FileType::Xlsx => "xlsx",
            FileType::Xls => "xls",
        }
    }
}

/// An uploaded file and the records imported from it. Deleting a source
/// deletes its records.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DataSource {
    pub id: Uuid,
    pub name: String,
    pub file_name: String,
    pub file_type: FileType,
    pub record_count: u64,
    pub uploaded_at: DateTime<Utc>,
    pub status: SourceStatus,
    /// Source column name -> standard field, saved at import time.
    pub column_mapping: Option<HashMap<String, StandardField>>,
}

impl DataSource {
    pub fn new(name: String, file_name: String, file_type: FileType) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            file_name,
            file_type,
            record_count: 0,
            uploaded_at: Utc::now(),
            status: SourceStatus::Uploaded,
            column_mapping: None,
        }
    }
}

// ─── Customer Records ───────────────────────────────────────────────────

/// One row imported from one source. An empty string and an absent value
/// are equivalent for every standard field.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CustomerRecord {
    pub id: Uuid,
    pub source_id: Uuid,
    pub source_row_number: Option<u32>,

    pub company_name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address_line1: Option<String>,
    pub address_line2: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
    pub tax_id: Option<String>,
    pub website: Option<String>,

    /// Original unmapped row, retained for provenance.
    pub raw_data: HashMap<String, String>,
    pub golden_record_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl CustomerRecord {
    pub fn new(source_id: Uuid, source_row_number: Option<u32>) -> Self {
        Self {
            id: Uuid::new_v4(),
            source_id,
            source_row_number,
            company_name: None,
            first_name: None,
            last_name: None,
            email: None,
            phone: None,
            address_line1: None,
            address_line2: None,
            city: None,
            state: None,
            postal_code: None,
            country: None,
            tax_id: None,
            website: None,
            raw_data: HashMap::new(),
            golden_record_id: None,
            created_at: Utc::now(),
        }
    }

    pub fn field(&self, field: StandardField) -> Option<&str> {
        let value = match field {
            StandardField::CompanyName => &self.company_name,
            StandardField::FirstName => &self.first_name,
            StandardField::LastName => &self.last_name,
            StandardField::Email => &self.email,
            StandardField::Phone => &self.phone,
            StandardField::AddressLine1 => &self.address_line1,
            StandardField::AddressLine2 => &self.address_line2,
            StandardField::City => &self.city,
            StandardField::State => &self.state,
            StandardField::PostalCode => &self.postal_code,
            StandardField::Country => &self.country,
            StandardField::TaxId => &self.tax_id,
            StandardField::Website => &self.website,
        };
        value.as_deref()
    }

    pub fn set_field(&mut self, field: StandardField, value: Option<String>) {
        let slot = match field {
            StandardField::CompanyName => &mut self.company_name,
            StandardField::FirstName => &mut self.first_name,
            StandardField::LastName => &mut self.last_name,
            StandardField::Email => &mut self.email,
            StandardField::Phone => &mut self.phone,
            StandardField::AddressLine1 => &mut self.address_line1,
            StandardField::AddressLine2 => &mut self.address_line2,
            StandardField::City => &mut self.city,
            StandardField::State => &mut self.state,
            StandardField::PostalCode => &mut self.postal_code,
            StandardField::Country => &mut self.country,
            StandardField::TaxId => &mut self.tax_id,
            StandardField::Website => &mut self.website,
        };
        *slot = value;
    }

    /// True when the field carries a non-empty value.
    pub fn has_value(&self, field: StandardField) -> bool {
        self.field(field).is_some_and(|v| !v.is_empty())
    }
}

// ─── Match Candidates ───────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    Pending,
    Approved,
    Rejected,
    Merged,
}

impl MatchStatus {
    /// Terminal states reject any further review or merge.
    pub fn is_terminal(&self) -> bool {
        matches!(self, MatchStatus::Rejected | MatchStatus::Merged)
    }
}

/// An unordered pair of customer records flagged as potential duplicates.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MatchCandidate {
    pub id: Uuid,
    pub record_a_id: Uuid,
    pub record_b_id: Uuid,
    pub overall_score: f64,
    /// Per-field scores; only fields where at least one side had a value.
    pub field_scores: BTreeMap<StandardField, f64>,
    pub match_method: String,
    pub status: MatchStatus,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

// ─── Golden Records ─────────────────────────────────────────────────────

/// The canonical merged entity representing one real-world customer.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GoldenRecord {
    pub id: Uuid,

    pub company_name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address_line1: Option<String>,
    pub address_line2: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
    pub tax_id: Option<String>,
    pub website: Option<String>,

    /// Number of customer records linked to this golden record.
    pub source_count: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl GoldenRecord {
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            company_name: None,
            first_name: None,
            last_name: None,
            email: None,
            phone: None,
            address_line1: None,
            address_line2: None,
            city: None,
            state: None,
            postal_code: None,
            country: None,
            tax_id: None,
            website: None,
            source_count: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn field(&self, field: StandardField) -> Option<&str> {
        let value = match field {
            StandardField::CompanyName => &self.company_name,
            StandardField::FirstName => &self.first_name,
            StandardField::LastName => &self.last_name,
            StandardField::Email => &self.email,
            StandardField::Phone => &self.phone,
            StandardField::AddressLine1 => &self.address_line1,
            StandardField::AddressLine2 => &self.address_line2,
            StandardField::City => &self.city,
            StandardField::State => &self.state,
            StandardField::PostalCode => &self.postal_code,
            StandardField::Country => &self.country,
            StandardField::TaxId => &self.tax_id,
            StandardField::Website => &self.website,
        };
        value.as_deref()
    }

    pub fn set_field(&mut self, field: StandardField, value: Option<String>) {
        let slot = match field {
            StandardField::CompanyName => &mut self.company_name,
            StandardField::FirstName => &mut self.first_name,
            StandardField::LastName => &mut self.last_name,
            StandardField::Email => &mut self.email,
            StandardField::Phone => &mut self.phone,
            StandardField::AddressLine1 => &mut self.address_line1,
            StandardField::AddressLine2 => &mut self.address_line2,
            StandardField::City => &mut self.city,
            StandardField::State => &mut self.state,
            StandardField::PostalCode => &mut self.postal_code,
            StandardField::Country => &mut self.country,
            StandardField::TaxId => &mut self.tax_id,
            StandardField::Website => &mut self.website,
        };
        *slot = value;
    }

    /// Solo golden record for an unmatched customer record, every standard
    /// field copied verbatim.
    pub fn from_customer(record: &CustomerRecord) -> Self {
        let mut golden = GoldenRecord::new();
        for field in StandardField::ALL {
            golden.set_field(field, record.field(field).map(str::to_owned));
        }
        golden.source_count = 1;
        golden
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_accessors_cover_every_standard_field() {
        let mut record = CustomerRecord::new(Uuid::new_v4(), Some(1));
        for (i, field) in StandardField::ALL.iter().enumerate() {
            record.set_field(*field, Some(format!("value-{i}")));
        }
        for (i, field) in StandardField::ALL.iter().enumerate() {
            assert_eq!(record.field(*field), Some(format!("value-{i}").as_str()));
        }
    }

    #[test]
    fn test_blank_and_absent_are_both_without_value() {
        let mut record = CustomerRecord::new(Uuid::new_v4(), None);
        assert!(!record.has_value(StandardField::Email));
        record.set_field(StandardField::Email, Some(String::new()));
        assert!(!record.has_value(StandardField::Email));
        record.set_field(StandardField::Email, Some("a@x.com".into()));
        assert!(record.has_value(StandardField::Email));
    }

    #[test]
    fn test_golden_from_customer_copies_fields_verbatim() {
        let mut record = CustomerRecord::new(Uuid::new_v4(), Some(3));
        record.company_name = Some("Acme Corporation".into());
        record.email = Some("ops@acme.com".into());

        let golden = GoldenRecord::from_customer(&record);
        assert_eq!(golden.company_name.as_deref(), Some("Acme Corporation"));
        assert_eq!(golden.email.as_deref(), Some("ops@acme.com"));
        assert_eq!(golden.source_count, 1);
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(!MatchStatus::Pending.is_terminal());
        assert!(!MatchStatus::Approved.is_terminal());
        assert!(MatchStatus::Rejected.is_terminal());
        assert!(MatchStatus::Merged.is_terminal());
    }
}

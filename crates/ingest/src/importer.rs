//! Import parsed rows into customer records through a column mapping.

use std::collections::HashMap;

use tracing::info;
use uuid::Uuid;

use coalesce_core::error::{MdmError, MdmResult};
use coalesce_core::fields::StandardField;
use coalesce_core::types::{CustomerRecord, SourceStatus};
use coalesce_store::MemoryStore;

use crate::reader::TableData;

/// Create one customer record per row, keeping the mapped cells as
/// provenance in `raw_data`. Marks the source processed and stores the
/// mapping on it. Returns the number of records imported.
pub fn import_records(
    store: &MemoryStore,
    source_id: Uuid,
    table: &TableData,
    mapping: &HashMap<String, StandardField>,
) -> MdmResult<u64> {
    if mapping.is_empty() {
        return Err(MdmError::InvalidInput(
            "Column mapping must map at least one column".to_string(),
        ));
    }

    let count = store.transaction(|state| {
        if state.source(source_id).is_none() {
            return Err(MdmError::NotFound(format!(
                "Data source {source_id} not found"
            )));
        }

        let mut count = 0u64;
        for (index, row) in table.rows.iter().enumerate() {
            let mut record = CustomerRecord::new(source_id, Some(index as u32 + 1));
            for (source_column, field) in mapping {
                if let Some(value) = row.get(source_column) {
                    let value = value.trim();
                    if !value.is_empty() {
                        record.set_field(*field, Some(value.to_string()));
                        record
                            .raw_data
                            .insert(source_column.clone(), value.to_string());
                    }
                }
            }
            state.insert_record(record);
            count += 1;
        }

        let source = state
            .source_mut(source_id)
            .ok_or_else(|| MdmError::Storage(format!("Data source {source_id} missing")))?;
        source.record_count = count;
        source.status = SourceStatus::Processed;
        source.column_mapping = Some(mapping.clone());
        Ok(count)
    })?;

    info!(source_id = %source_id, record_count = count, "Records imported");
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::read_csv_bytes;
    use coalesce_core::types::{DataSource, FileType};

    #[test]
    fn test_import_maps_columns_and_keeps_provenance() {
        let store = MemoryStore::new();
        let source = DataSource::new("CRM".into(), "crm.csv".into(), FileType::Csv);
        let source_id = source.id;
        store
            .transaction(|state| {
                state.insert_source(source);
                Ok(())
            })
            .unwrap();

        let table =
            read_csv_bytes(b"Organization,Mail,Notes\nAcme,ops@acme.com,ignored\n").unwrap();
        let mapping = HashMap::from([
            ("Organization".to_string(), StandardField::CompanyName),
            ("Mail".to_string(), StandardField::Email),
        ]);

        let count = import_records(&store, source_id, &table, &mapping).unwrap();
        assert_eq!(count, 1);

        store.read(|state| {
            let records = state.records_for_source(source_id);
            assert_eq!(records.len(), 1);
            let record = &records[0];
            assert_eq!(record.company_name.as_deref(), Some("Acme"));
            assert_eq!(record.email.as_deref(), Some("ops@acme.com"));
            assert_eq!(record.source_row_number, Some(1));
            assert_eq!(record.raw_data["Organization"], "Acme");
            assert!(!record.raw_data.contains_key("Notes"));

            let source = state.source(source_id).unwrap();
            assert_eq!(source.record_count, 1);
            assert_eq!(source.status, SourceStatus::Processed);
            assert!(source.column_mapping.is_some());
        });
    }

    #[test]
    fn test_import_into_unknown_source_fails() {
        let store = MemoryStore::new();
        let table = read_csv_bytes(b"email\na@x.com\n").unwrap();
        let mapping = HashMap::from([("email".to_string(), StandardField::Email)]);
        let result = import_records(&store, Uuid::new_v4(), &table, &mapping);
        assert!(matches!(result, Err(MdmError::NotFound(_))));
        assert_eq!(store.read(|state| state.record_count()), 0);
    }

    #[test]
    fn test_empty_mapping_is_invalid() {
        let store = MemoryStore::new();
        let table = read_csv_bytes(b"email\na@x.com\n").unwrap();
        let result = import_records(&store, Uuid::new_v4(), &table, &HashMap::new());
        assert!(matches!(result, Err(MdmError::InvalidInput(_))));
    }
}

//! CSV export of golden records (RFC 4180, UTF-8).

use coalesce_core::error::{MdmError, MdmResult};
use coalesce_core::fields::StandardField;
use coalesce_core::types::GoldenRecord;

/// Render golden records as CSV: `id`, the standard fields in canonical
/// order, then `source_count`, `created_at`, `updated_at`.
pub fn goldens_to_csv(goldens: &[GoldenRecord]) -> MdmResult<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    let mut header = vec!["id".to_string()];
    header.extend(StandardField::ALL.iter().map(|f| f.as_str().to_string()));
    header.extend(
        ["source_count", "created_at", "updated_at"]
            .iter()
            .map(|s| s.to_string()),
    );
    writer
        .write_record(&header)
        .map_err(|e| MdmError::Storage(e.to_string()))?;

    for golden in goldens {
        let mut row = vec![golden.id.to_string()];
        for field in StandardField::ALL {
            row.push(golden.field(field).unwrap_or_default().to_string());
        }
        row.push(golden.source_count.to_string());
        row.push(golden.created_at.to_rfc3339());
        row.push(golden.updated_at.to_rfc3339());
        writer
            .write_record(&row)
            .map_err(|e| MdmError::Storage(e.to_string()))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| MdmError::Storage(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| MdmError::Storage(e.to_string()))
}

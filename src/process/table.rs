use anyhow::{bail, Context, Result};
use arrow::{
    array::{ArrayRef, Float64Array, Int64Array, StringArray},
    datatypes::{DataType, Field, Schema, SchemaRef},
    record_batch::{RecordBatch, RecordBatchOptions},
    util::pretty::pretty_format_batches,
};
use csv::StringRecord;
use std::{collections::HashSet, sync::Arc};

use crate::process::utils::{clean_str, infer_column_dtype};

/// One sub-table of a NEM CSV file.
#[derive(Debug, Clone)]
pub struct NemTable {
    /// `<report>_<subtype>` taken from the “I” row, e.g. `FPP_FORECAST_DEFAULT_CF`.
    pub id: String,
    /// Version column of the “I” row, when the file carries one.
    pub version: Option<String>,
    /// Rows between this “I” row and the next, row-type column dropped.
    pub batch: RecordBatch,
}

impl NemTable {
    /// Build a table from its “I” row and the data rows that follow it.
    ///
    /// Column 0 (the row-type marker) is dropped from the header and every row.
    /// Short rows are padded with nulls; a row carrying a non-empty value past
    /// the last header column is rejected.
    pub fn from_records(
        header: &StringRecord,
        rows: &[StringRecord],
        infer_types: bool,
    ) -> Result<Self> {
        let names: Vec<String> = header.iter().skip(1).map(clean_str).collect();
        let width = names.len();

        let mut cells: Vec<Vec<Option<String>>> = vec![Vec::with_capacity(rows.len()); width];
        for (idx, row) in rows.iter().enumerate() {
            if let Some(extra) = row.iter().skip(1 + width).find(|v| !v.trim().is_empty()) {
                bail!(
                    "data row {} has {} fields but the header has {} (unexpected value {:?})",
                    idx + 1,
                    row.len().saturating_sub(1),
                    width,
                    extra
                );
            }
            for (col, column) in cells.iter_mut().enumerate() {
                let value = row.get(col + 1).map(clean_str).filter(|s| !s.is_empty());
                column.push(value);
            }
        }

        let mut fields = Vec::with_capacity(width);
        let mut arrays = Vec::with_capacity(width);
        for (name, column) in dedupe_names(&names).into_iter().zip(&cells) {
            let dtype = if infer_types {
                infer_column_dtype(column.iter().map(|c| c.as_deref()))
            } else {
                DataType::Utf8
            };
            arrays.push(build_array(column, &dtype));
            fields.push(Field::new(name, dtype, true));
        }

        let options = RecordBatchOptions::new().with_row_count(Some(rows.len()));
        let batch = RecordBatch::try_new_with_options(Arc::new(Schema::new(fields)), arrays, &options)
            .context("building record batch")?;

        let id = match (names.first(), names.get(1)) {
            (Some(report), Some(subtype)) => format!("{}_{}", report, subtype),
            (Some(report), None) => report.clone(),
            _ => "UNKNOWN".to_string(),
        };

        Ok(Self {
            id,
            version: names.get(2).cloned(),
            batch,
        })
    }

    pub fn num_rows(&self) -> usize {
        self.batch.num_rows()
    }

    pub fn num_columns(&self) -> usize {
        self.batch.num_columns()
    }

    pub fn schema(&self) -> SchemaRef {
        self.batch.schema()
    }

    pub fn column_names(&self) -> Vec<String> {
        self.batch
            .schema()
            .fields()
            .iter()
            .map(|f| f.name().clone())
            .collect()
    }

    /// Pretty-printed view of the first `limit` rows.
    pub fn preview(&self, limit: usize) -> Result<String> {
        let head = self.batch.slice(0, limit.min(self.num_rows()));
        Ok(pretty_format_batches(&[head])?.to_string())
    }
}

fn build_array(column: &[Option<String>], dtype: &DataType) -> ArrayRef {
    match dtype {
        DataType::Int64 => Arc::new(
            column
                .iter()
                .map(|c| c.as_deref().and_then(|s| s.parse::<i64>().ok()))
                .collect::<Int64Array>(),
        ),
        DataType::Float64 => Arc::new(
            column
                .iter()
                .map(|c| c.as_deref().and_then(|s| s.parse::<f64>().ok()))
                .collect::<Float64Array>(),
        ),
        _ => Arc::new(column.iter().map(|c| c.as_deref()).collect::<StringArray>()),
    }
}

/// Repeated header names get a `.N` suffix so every column stays addressable.
fn dedupe_names(names: &[String]) -> Vec<String> {
    let mut taken: HashSet<String> = HashSet::with_capacity(names.len());
    let mut out = Vec::with_capacity(names.len());
    for name in names {
        let mut candidate = name.clone();
        let mut n = 0;
        while taken.contains(&candidate) {
            n += 1;
            candidate = format!("{}.{}", name, n);
        }
        taken.insert(candidate.clone());
        out.push(candidate);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::Array;

    fn record(fields: &[&str]) -> StringRecord {
        StringRecord::from(fields.to_vec())
    }

    #[test]
    fn pads_short_rows_with_nulls() -> Result<()> {
        let header = record(&["I", "DISPATCH", "PRICE", "1", "REGIONID", "RRP"]);
        let rows = vec![
            record(&["D", "DISPATCH", "PRICE", "1", "NSW1", "101.5"]),
            record(&["D", "DISPATCH", "PRICE", "1", "QLD1"]),
        ];
        let table = NemTable::from_records(&header, &rows, true)?;

        assert_eq!(table.id, "DISPATCH_PRICE");
        assert_eq!(table.version.as_deref(), Some("1"));
        assert_eq!(table.num_rows(), 2);
        let rrp = table.batch.column(4);
        assert_eq!(rrp.data_type(), &DataType::Float64);
        assert!(rrp.is_null(1));
        Ok(())
    }

    #[test]
    fn rejects_values_past_the_header() {
        let header = record(&["I", "DISPATCH", "PRICE", "1", "RRP"]);
        let rows = vec![record(&["D", "DISPATCH", "PRICE", "1", "10", "oops"])];
        assert!(NemTable::from_records(&header, &rows, true).is_err());
    }

    #[test]
    fn tolerates_trailing_empty_fields() -> Result<()> {
        let header = record(&["I", "DISPATCH", "PRICE", "1", "RRP"]);
        let rows = vec![record(&["D", "DISPATCH", "PRICE", "1", "10", ""])];
        let table = NemTable::from_records(&header, &rows, true)?;
        assert_eq!(table.num_columns(), 4);
        Ok(())
    }

    #[test]
    fn duplicate_headers_are_suffixed() -> Result<()> {
        let header = record(&["I", "X", "Y", "1", "A", "A"]);
        let table = NemTable::from_records(&header, &[], false)?;
        assert_eq!(table.column_names(), vec!["X", "Y", "1", "A", "A.1"]);
        assert_eq!(table.num_rows(), 0);
        Ok(())
    }

    #[test]
    fn suffixed_names_never_collide_with_real_headers() -> Result<()> {
        let header = record(&["I", "X", "Y", "1", "A", "A", "A.1"]);
        let table = NemTable::from_records(&header, &[], false)?;
        let names = table.column_names();
        assert_eq!(names, vec!["X", "Y", "1", "A", "A.1", "A.1.1"]);
        let unique: HashSet<&String> = names.iter().collect();
        assert_eq!(unique.len(), names.len());
        Ok(())
    }

    #[test]
    fn bare_sentinel_header_yields_empty_schema() -> Result<()> {
        let rows = vec![record(&["D"]), record(&["D"])];
        let table = NemTable::from_records(&record(&["I"]), &rows, true)?;
        assert_eq!(table.id, "UNKNOWN");
        assert_eq!(table.num_columns(), 0);
        assert_eq!(table.num_rows(), 2);
        Ok(())
    }
}

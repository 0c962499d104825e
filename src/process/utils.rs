use arrow::datatypes::DataType;

/// 1) Trim whitespace + strip outer quotes if present.
pub fn clean_str(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.starts_with('"') && trimmed.ends_with('"') && trimmed.len() >= 2 {
        trimmed[1..trimmed.len() - 1].to_string()
    } else {
        trimmed.to_string()
    }
}

/// 2) Infer Arrow dtype from a cleaned string: Int64, then Float64, else Utf8.
pub fn infer_arrow_dtype_from_str(s: &str) -> DataType {
    if s.parse::<i64>().is_ok() {
        DataType::Int64
    } else if s.parse::<f64>().is_ok() {
        DataType::Float64
    } else {
        DataType::Utf8
    }
}

/// 3) Widen over every non-null cell of a column.
///
/// Integers mixed with floats become Float64; anything non-numeric makes the
/// whole column Utf8. A column with no values at all stays Utf8.
pub fn infer_column_dtype<'a, I>(cells: I) -> DataType
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    let mut inferred: Option<DataType> = None;
    for cell in cells.into_iter().flatten() {
        let dtype = infer_arrow_dtype_from_str(cell);
        inferred = Some(match (inferred, dtype) {
            (_, DataType::Utf8) => return DataType::Utf8,
            (None, dt) => dt,
            (Some(DataType::Int64), DataType::Int64) => DataType::Int64,
            _ => DataType::Float64,
        });
    }
    inferred.unwrap_or(DataType::Utf8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_str_strips_quotes_and_whitespace() {
        assert_eq!(clean_str("  \"2024/12/22 00:05:00\" "), "2024/12/22 00:05:00");
        assert_eq!(clean_str("\""), "\"");
        assert_eq!(clean_str(" SA1 "), "SA1");
    }

    #[test]
    fn column_dtype_widens() {
        assert_eq!(
            infer_column_dtype([Some("1"), None, Some("2")]),
            DataType::Int64
        );
        assert_eq!(
            infer_column_dtype([Some("1"), Some("-0.00011729")]),
            DataType::Float64
        );
        assert_eq!(
            infer_column_dtype([Some("1.5"), Some("RAISEREG"), Some("3")]),
            DataType::Utf8
        );
        assert_eq!(infer_column_dtype([None, None]), DataType::Utf8);
    }
}

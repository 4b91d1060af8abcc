//! Write serde-serializable rows as CSV tables
//!

use camino::Utf8Path;
use csv::WriterBuilder;
use log::info;
use serde::Serialize;
use simple_error::{SimpleResult, try_with};

/// Write all rows to a new CSV file with a header line, returning the number of rows written
///
/// The header line is derived from the first row, so an empty table produces an empty file.
///
pub fn write_csv_table<T: Serialize>(filename: &Utf8Path, rows: &[T]) -> SimpleResult<usize> {
    info!("Writing {} rows to table: '{filename}'", rows.len());

    let mut writer = try_with!(
        WriterBuilder::new()
            .delimiter(b',')
            .has_headers(true)
            .from_path(filename),
        "Unable to create CSV file '{filename}'"
    );
    for row in rows.iter() {
        try_with!(writer.serialize(row), "Failed to write CSV file '{filename}'");
    }
    try_with!(writer.flush(), "Failed to write CSV file '{filename}'");

    Ok(rows.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct TestRow {
        #[serde(rename = "ID")]
        id: String,
        count: usize,
    }

    #[test]
    fn test_write_csv_table() {
        let dir = std::env::temp_dir().join(format!("oncosv_csv_test_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let filename = camino::Utf8PathBuf::from_path_buf(dir.join("table.csv")).unwrap();

        let rows = vec![
            TestRow {
                id: "a,b".to_string(),
                count: 2,
            },
            TestRow {
                id: "c".to_string(),
                count: 3,
            },
        ];
        assert_eq!(write_csv_table(&filename, &rows).unwrap(), 2);

        let content = std::fs::read_to_string(&filename).unwrap();
        assert_eq!(content, "ID,count\n\"a,b\",2\nc,3\n");
        std::fs::remove_dir_all(&dir).unwrap();
    }
}

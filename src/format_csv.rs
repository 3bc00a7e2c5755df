use std::io::Write;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::backend::QueryResult;
use crate::error::ReportError;

pub const CSV_FILE_NAME: &str = "product_report.csv";
pub const CSV_MIME: &str = "text/csv";

/// Write query results as RFC 4180 CSV: a header row of column names, then
/// one record per row. NULL cells become empty fields. No index column.
pub fn write_csv_to_writer<W: Write>(result: &QueryResult, writer: W) -> Result<(), ReportError> {
    let mut wtr = csv::WriterBuilder::new()
        .terminator(csv::Terminator::CRLF)
        .from_writer(writer);

    wtr.write_record(result.column_names()).map_err(csv_error)?;
    for row in &result.rows {
        wtr.write_record(row.iter().map(|cell| cell.as_str()))
            .map_err(csv_error)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Encode query results as UTF-8 CSV bytes.
pub fn to_csv_bytes(result: &QueryResult) -> Result<Vec<u8>, ReportError> {
    let mut buf = Vec::new();
    write_csv_to_writer(result, &mut buf)?;
    Ok(buf)
}

/// A `data:` URI carrying the CSV snapshot of `result`, for a download link.
pub fn to_data_uri(result: &QueryResult) -> Result<String, ReportError> {
    let bytes = to_csv_bytes(result)?;
    Ok(format!(
        "data:{};charset=utf-8;base64,{}",
        CSV_MIME,
        STANDARD.encode(bytes)
    ))
}

fn csv_error(e: csv::Error) -> ReportError {
    ReportError::Format {
        message: format!("csv encoding failed: {}", e),
    }
}

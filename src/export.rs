//! Turns export data into downloadable files.

use chrono::NaiveDateTime;
use rust_xlsxwriter::{Workbook, XlsxError};
use thiserror::Error;

use crate::domain::export::{ExportCell, ExportData};
use crate::domain::types::ExportFormat;

/// MIME type of delimited exports.
pub const EXPORT_MIME_TYPE: &str = "application/vnd.ms-excel";
/// MIME type of workbook exports. The bytes are OOXML while the filename
/// keeps the `.xls` extension, so Excel asks before opening them.
pub const WORKBOOK_MIME_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

const FILENAME_DATE_FORMAT: &str = "%B %-d, %Y %-I:%M %p";
const WORKSHEET_NAME: &str = "transactions";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("workbook error: {0}")]
    Workbook(#[from] XlsxError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("export does not fit into a worksheet")]
    TooLarge,

    #[error("download failed: {0}")]
    Sink(String),
}

/// A finished file ready to be handed to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Download {
    pub filename: String,
    pub mime_type: &'static str,
    pub bytes: Vec<u8>,
}

/// Receives finished files.
pub trait DownloadSink {
    fn deliver(&mut self, download: Download) -> Result<(), ExportError>;
}

/// Keeps delivered files in memory until the owner takes them.
#[derive(Debug, Default)]
pub struct BufferedSink {
    downloads: Vec<Download>,
}

impl BufferedSink {
    pub fn downloads(&self) -> &[Download] {
        &self.downloads
    }

    pub fn take_last(&mut self) -> Option<Download> {
        self.downloads.pop()
    }

    pub fn into_downloads(self) -> Vec<Download> {
        self.downloads
    }
}

impl DownloadSink for BufferedSink {
    fn deliver(&mut self, download: Download) -> Result<(), ExportError> {
        self.downloads.push(download);
        Ok(())
    }
}

/// `"<product> - <Month D, YYYY H:MM AM>."`; the extension is appended by
/// [`ExportEmitter::emit`].
pub fn export_filename_base(product: &str, now: NaiveDateTime) -> String {
    format!("{product} - {}.", now.format(FILENAME_DATE_FORMAT))
}

pub struct ExportEmitter<S> {
    sink: S,
}

impl<S: DownloadSink> ExportEmitter<S> {
    pub fn new(sink: S) -> Self {
        Self { sink }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Builds the file for `format` and hands it to the sink as
    /// `filename_base` followed by the format extension.
    pub fn emit(
        &mut self,
        format: ExportFormat,
        data: &ExportData,
        filename_base: &str,
    ) -> Result<(), ExportError> {
        let (mime_type, bytes) = match format {
            ExportFormat::Csv => (EXPORT_MIME_TYPE, delimited_bytes(data)?),
            ExportFormat::Xls => (WORKBOOK_MIME_TYPE, workbook_bytes(&table_rows(data)?)?),
        };

        let filename = format!("{filename_base}{}", format.extension());
        log::info!("Delivering export {filename} ({} bytes)", bytes.len());

        self.sink.deliver(Download {
            filename,
            mime_type,
            bytes,
        })
    }
}

/// Delimited text of `data`; tables are written row by row.
pub fn delimited_bytes(data: &ExportData) -> Result<Vec<u8>, ExportError> {
    match data {
        ExportData::Delimited(text) => Ok(text.clone().into_bytes()),
        ExportData::Table(rows) => {
            let mut writer = csv::Writer::from_writer(Vec::new());
            for row in rows {
                writer.write_record(row.iter().map(ExportCell::to_field))?;
            }
            writer.into_inner().map_err(|err| err.into_error().into())
        }
    }
}

fn table_rows(data: &ExportData) -> Result<Vec<Vec<ExportCell>>, ExportError> {
    match data {
        ExportData::Table(rows) => Ok(rows.clone()),
        ExportData::Delimited(text) => {
            let mut reader = csv::ReaderBuilder::new()
                .has_headers(false)
                .flexible(true)
                .from_reader(text.as_bytes());
            let mut rows = Vec::new();
            for record in reader.records() {
                rows.push(record?.iter().map(ExportCell::from).collect());
            }
            Ok(rows)
        }
    }
}

fn workbook_bytes(rows: &[Vec<ExportCell>]) -> Result<Vec<u8>, ExportError> {
    let mut workbook = Workbook::new();
    {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(WORKSHEET_NAME)?;

        for (row_index, cells) in rows.iter().enumerate() {
            let row = u32::try_from(row_index).map_err(|_| ExportError::TooLarge)?;
            for (col_index, cell) in cells.iter().enumerate() {
                let col = u16::try_from(col_index).map_err(|_| ExportError::TooLarge)?;
                match cell {
                    ExportCell::Number(value) => {
                        worksheet.write_number(row, col, *value)?;
                    }
                    ExportCell::Text(value) => {
                        worksheet.write_string(row, col, value)?;
                    }
                    ExportCell::Empty => {}
                }
            }
        }
    }

    Ok(workbook.save_to_buffer()?)
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn at(hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, 16)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    fn emitter() -> ExportEmitter<BufferedSink> {
        ExportEmitter::new(BufferedSink::default())
    }

    #[test]
    fn filename_base_formats_product_and_time() {
        assert_eq!(
            export_filename_base("Pilot", at(15, 5)),
            "Pilot - October 16, 2026 3:05 PM."
        );
        assert_eq!(
            export_filename_base("Pilot", at(0, 30)),
            "Pilot - October 16, 2026 12:30 AM."
        );
    }

    #[test]
    fn csv_keeps_payload_and_mime() {
        let mut emitter = emitter();

        emitter
            .emit(
                ExportFormat::Csv,
                &ExportData::Delimited("a,b\n1,2\n".into()),
                "report.",
            )
            .unwrap();

        let download = &emitter.sink().downloads()[0];
        assert_eq!(download.filename, "report.csv");
        assert_eq!(download.mime_type, EXPORT_MIME_TYPE);
        assert_eq!(download.bytes, b"a,b\n1,2\n");
    }

    #[test]
    fn table_requested_as_csv_is_written_with_quoting() {
        let mut emitter = emitter();
        let table = ExportData::Table(vec![
            vec!["name".into(), "amount".into()],
            vec!["Ana, Maria".into(), ExportCell::Number(10.5)],
            vec![ExportCell::Empty, ExportCell::Number(3.0)],
        ]);

        emitter.emit(ExportFormat::Csv, &table, "t.").unwrap();

        let text = String::from_utf8(emitter.sink_mut().take_last().unwrap().bytes).unwrap();
        assert_eq!(text, "name,amount\n\"Ana, Maria\",10.5\n,3\n");
    }

    #[test]
    fn xls_builds_a_workbook() {
        let mut emitter = emitter();
        let table = ExportData::Table(vec![
            vec!["id".into(), "amount".into()],
            vec![ExportCell::Number(1.0), ExportCell::Number(12.34)],
        ]);

        emitter.emit(ExportFormat::Xls, &table, "Pilot - x.").unwrap();

        let download = emitter.into_sink().into_downloads().remove(0);
        assert_eq!(download.filename, "Pilot - x.xls");
        assert_eq!(download.mime_type, WORKBOOK_MIME_TYPE);
        assert_ne!(download.mime_type, EXPORT_MIME_TYPE);
        assert!(download.bytes.starts_with(b"PK"));
    }

    #[test]
    fn delimited_requested_as_xls_is_split_into_rows() {
        let rows = table_rows(&ExportData::Delimited("a,b\n\"x, y\",2\n3\n".into())).unwrap();

        assert_eq!(
            rows,
            vec![
                vec![ExportCell::from("a"), ExportCell::from("b")],
                vec![ExportCell::from("x, y"), ExportCell::from("2")],
                vec![ExportCell::from("3")],
            ]
        );
        assert!(workbook_bytes(&rows).is_ok());
    }
}

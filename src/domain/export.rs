use serde::{Deserialize, Serialize};

/// Single spreadsheet cell.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ExportCell {
    Number(f64),
    Text(String),
    Empty,
}

impl ExportCell {
    /// Text written into delimited output.
    pub fn to_field(&self) -> String {
        match self {
            ExportCell::Number(value) => value.to_string(),
            ExportCell::Text(value) => value.clone(),
            ExportCell::Empty => String::new(),
        }
    }
}

impl From<&str> for ExportCell {
    fn from(value: &str) -> Self {
        ExportCell::Text(value.to_string())
    }
}

impl From<String> for ExportCell {
    fn from(value: String) -> Self {
        ExportCell::Text(value)
    }
}

impl<T: Into<ExportCell>> From<Option<T>> for ExportCell {
    fn from(value: Option<T>) -> Self {
        value.map_or(ExportCell::Empty, Into::into)
    }
}

/// Raw payload returned by the export endpoint.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum ExportData {
    /// Comma-separated text, header line first.
    Delimited(String),
    /// Rows of cells, header row first.
    Table(Vec<Vec<ExportCell>>),
}

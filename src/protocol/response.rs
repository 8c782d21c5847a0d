use serde_json::{Map, Value};
use thiserror::Error;

/// List of possible errors raised while decoding a response body.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("failed to decode response body: {0}")]
    Json(#[from] serde_json::Error),

    #[error("response body is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("expected a JSON array of rows")]
    UnexpectedShape,

    #[error("row of width {found} does not match the {expected} column names")]
    MismatchedRow { expected: usize, found: usize },
}

/// One framed response: status code, declared body length and body payload.
///
/// Transient; consumed while decoding into a [`ResultSet`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseEnvelope {
    pub status: u16,
    pub length: usize,
    pub body: Vec<u8>,
}

impl ResponseEnvelope {
    /// Decode the body per the requested output format.
    ///
    /// The default format is json; any other format is passed through
    /// undecoded.
    pub fn decode(self, format: Option<&str>) -> Result<ResultSet, DecodeError> {
        match format.unwrap_or("json") {
            "json" => Ok(ResultSet::Rows(decode_rows(&self.body)?)),
            _ => Ok(ResultSet::Raw(String::from_utf8(self.body)?)),
        }
    }
}

/// Decoded query results.
#[derive(Debug, Clone, PartialEq)]
pub enum ResultSet {
    /// Positional rows, in daemon column order.
    Rows(Vec<Vec<Value>>),
    /// One column-name to value mapping per row.
    AssocRows(Vec<Map<String, Value>>),
    /// Undecoded body, for output formats other than json.
    Raw(String),
}

fn decode_rows(body: &[u8]) -> Result<Vec<Vec<Value>>, DecodeError> {
    let value: Value = serde_json::from_slice(body)?;
    let Value::Array(rows) = value else {
        return Err(DecodeError::UnexpectedShape);
    };

    rows.into_iter()
        .map(|row| match row {
            Value::Array(cells) => Ok(cells),
            _ => Err(DecodeError::UnexpectedShape),
        })
        .collect()
}

/// Pair every row value with its column name.
///
/// `columns` is the caller's explicit projection; when it is empty the first
/// row is consumed as the daemon-emitted header row. A row whose width does
/// not match the column names is a decode failure.
pub(crate) fn associate(
    mut rows: Vec<Vec<Value>>,
    columns: &[String],
) -> Result<Vec<Map<String, Value>>, DecodeError> {
    let names: Vec<String> = if !columns.is_empty() {
        columns.to_vec()
    } else if rows.is_empty() {
        return Ok(Vec::new());
    } else {
        rows.remove(0)
            .into_iter()
            .map(|cell| match cell {
                Value::String(name) => Ok(name),
                _ => Err(DecodeError::UnexpectedShape),
            })
            .collect::<Result<_, _>>()?
    };

    rows.into_iter()
        .map(|row| {
            if row.len() != names.len() {
                return Err(DecodeError::MismatchedRow {
                    expected: names.len(),
                    found: row.len(),
                });
            }
            Ok(names.iter().cloned().zip(row).collect())
        })
        .collect()
}

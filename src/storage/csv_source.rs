use crate::model::{InputError, Record};
use csv::{Reader, ReaderBuilder, StringRecord};
use serde_json::{Map, Value};
use std::fs::File;
use std::path::Path;

/// Streams catalog rows keyed by the header line.
///
/// Short rows are tolerated: missing trailing fields come out as `null`.
/// Values past the last header column are gathered into an array under
/// `overflow_key`, prefixed with underscores until it names no real column.
pub struct CsvSource<R = File> {
    reader: Reader<R>,
    headers: Vec<String>,
    overflow_key: String,
    row: usize,
    buf: StringRecord,
}

impl CsvSource<File> {
    /// Opens the file and reads its header. Both failures are fatal for a run.
    pub fn open(path: &Path, overflow_key: &str) -> Result<Self, InputError> {
        let reader = builder().from_path(path).map_err(|source| InputError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        Self::with_reader(reader, overflow_key).map_err(|source| InputError::Header {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl<R: std::io::Read> CsvSource<R> {
    #[cfg(test)]
    pub fn from_reader(rdr: R, overflow_key: &str) -> Result<Self, csv::Error> {
        Self::with_reader(builder().from_reader(rdr), overflow_key)
    }

    fn with_reader(mut reader: Reader<R>, overflow_key: &str) -> Result<Self, csv::Error> {
        let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
        let mut overflow_key = overflow_key.to_string();
        while headers.contains(&overflow_key) {
            overflow_key.insert(0, '_');
        }
        Ok(Self {
            reader,
            headers,
            overflow_key,
            row: 0,
            buf: StringRecord::new(),
        })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    fn to_record(&self) -> Record {
        let mut fields = Map::new();
        for (i, name) in self.headers.iter().enumerate() {
            let value = match self.buf.get(i) {
                Some(v) => Value::String(v.to_string()),
                None => Value::Null,
            };
            fields.insert(name.clone(), value);
        }

        if self.buf.len() > self.headers.len() {
            let extra = self
                .buf
                .iter()
                .skip(self.headers.len())
                .map(|v| Value::String(v.to_string()))
                .collect();
            fields.insert(self.overflow_key.clone(), Value::Array(extra));
        }

        Record::new(fields)
    }
}

impl<R: std::io::Read> Iterator for CsvSource<R> {
    type Item = Result<Record, InputError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.row += 1;
        match self.reader.read_record(&mut self.buf) {
            Ok(true) => Some(Ok(self.to_record())),
            Ok(false) => None,
            Err(source) => Some(Err(InputError::Row {
                row: self.row,
                source,
            })),
        }
    }
}

fn builder() -> ReaderBuilder {
    let mut builder = ReaderBuilder::new();
    builder.has_headers(true).flexible(true);
    builder
}

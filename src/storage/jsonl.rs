use crate::model::{OutputError, Record};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Append-only JSON Lines writer. Each record is one `write_all` of a full line, then a flush.
pub struct JsonlSink<W: Write = BufWriter<File>> {
    out: W,
    written: usize,
}

impl JsonlSink {
    pub fn create(path: &Path) -> Result<Self, OutputError> {
        let file = File::create(path).map_err(|source| OutputError::Create {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write> JsonlSink<W> {
    pub fn new(out: W) -> Self {
        Self { out, written: 0 }
    }

    pub fn write(&mut self, record: &Record) -> Result<(), OutputError> {
        let mut line = serde_json::to_vec(&record.fields)?;
        line.push(b'\n');
        self.out.write_all(&line)?;
        self.out.flush()?;
        self.written += 1;
        Ok(())
    }

    pub fn written(&self) -> usize {
        self.written
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }
}

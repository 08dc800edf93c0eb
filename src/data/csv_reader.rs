use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord};
use tracing::debug;

use crate::error::Result;

/// Reads delimited text into raw records, dropping a fixed number of
/// leading records (typically the header line).
#[derive(Debug, Clone, Copy)]
pub struct CsvRecordReader {
    pub skip_lines: usize,
    pub delimiter: u8,
}

impl Default for CsvRecordReader {
    fn default() -> Self {
        CsvRecordReader { skip_lines: 1, delimiter: b',' }
    }
}

impl CsvRecordReader {
    pub fn new(skip_lines: usize, delimiter: u8) -> CsvRecordReader {
        CsvRecordReader { skip_lines, delimiter }
    }

    /// A missing file surfaces as `SeqError::Io`.
    pub fn read_path<P: AsRef<Path>>(&self, path: P) -> Result<Vec<StringRecord>> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let records = self.read_from(file)?;
        debug!(path = %path.display(), records = records.len(), "read csv");
        Ok(records)
    }

    pub fn read_from<R: Read>(&self, reader: R) -> Result<Vec<StringRecord>> {
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .delimiter(self.delimiter)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut records = Vec::new();
        for result in reader.records().skip(self.skip_lines) {
            records.push(result?);
        }
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SeqError;

    #[test]
    fn skips_header_and_keeps_rows() {
        let text = "id,cycle,value\n1,1,0.5\n1,2,0.7\n";
        let records = CsvRecordReader::default().read_from(text.as_bytes()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(&records[1][2], "0.7");
    }

    #[test]
    fn honours_custom_delimiter() {
        let text = "1;2\n3;4\n";
        let records = CsvRecordReader::new(0, b';').read_from(text.as_bytes()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(&records[0][1], "2");
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = CsvRecordReader::default().read_path("/definitely/not/here.csv").unwrap_err();
        assert!(matches!(err, SeqError::Io(_)));
    }
}

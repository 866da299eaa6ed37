// Record store - flat CSV file, written incrementally.
//
// The fetch loop appends each page as soon as it arrives so partial
// progress survives a crash. The analyzer treats a finished store as
// read-only input. Header first, then one row per record, UTF-8.

use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::fetch::client::RawPost;

/// Column order of the store file. Matches the Record field order so
/// serde-serialized rows line up with the header.
const HEADER: [&str; 6] = [
    "sequence_number",
    "author",
    "text",
    "created_at",
    "retweet_count",
    "like_count",
];

/// One normalized social-media post with engagement counts.
/// Immutable once written; sequence numbers are strictly increasing
/// within a single fetch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Record {
    pub sequence_number: u64,
    pub author: String,
    pub text: String,
    /// Raw provider timestamp - parsed fallibly by the analyzer.
    pub created_at: String,
    pub retweet_count: u64,
    pub like_count: u64,
}

impl Record {
    pub fn from_raw(sequence_number: u64, post: RawPost) -> Self {
        Self {
            sequence_number,
            author: post.author,
            text: post.text,
            created_at: post.created_at,
            retweet_count: post.retweet_count,
            like_count: post.like_count,
        }
    }
}

/// Incremental CSV writer. Creating one truncates the target file and
/// writes the header immediately, so even a zero-record run leaves a
/// well-formed store behind.
pub struct RecordWriter {
    writer: csv::Writer<File>,
    written: u64,
}

impl RecordWriter {
    pub fn create(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
        }

        let file = File::create(path)
            .with_context(|| format!("Failed to create record store {}", path.display()))?;

        // Headers are written by hand so they exist before the first row
        // (serde would defer them until the first serialize call).
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        writer.write_record(HEADER)?;
        writer.flush()?;

        Ok(Self { writer, written: 0 })
    }

    /// Append one record and flush, so it survives a crash mid-run.
    pub fn append(&mut self, record: &Record) -> Result<()> {
        self.writer.serialize(record)?;
        self.writer.flush()?;
        self.written += 1;
        Ok(())
    }

    /// How many records this writer has appended.
    pub fn written(&self) -> u64 {
        self.written
    }
}

/// Read a finished store back into memory, in insertion order.
pub fn read_records(path: &Path) -> Result<Vec<Record>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open record store {}", path.display()))?;

    let mut records = Vec::new();
    for row in reader.deserialize() {
        let record: Record = row.context("Malformed row in record store")?;
        records.push(record);
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(seq: u64, text: &str) -> Record {
        Record {
            sequence_number: seq,
            author: "dogelord".to_string(),
            text: text.to_string(),
            created_at: "2024-03-05 14:00:00".to_string(),
            retweet_count: 3,
            like_count: 42,
        }
    }

    #[test]
    fn create_writes_header_immediately() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tweets.csv");

        let writer = RecordWriter::create(&path).unwrap();
        drop(writer);

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            contents.trim(),
            "sequence_number,author,text,created_at,retweet_count,like_count"
        );
    }

    #[test]
    fn append_then_read_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tweets.csv");

        let mut writer = RecordWriter::create(&path).unwrap();
        writer.append(&record(1, "to the moon")).unwrap();
        writer.append(&record(2, "diamond hands, ser")).unwrap();
        assert_eq!(writer.written(), 2);
        drop(writer);

        let records = read_records(&path).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].sequence_number, 1);
        assert_eq!(records[1].text, "diamond hands, ser");
        assert_eq!(records[1].like_count, 42);
    }

    #[test]
    fn text_with_commas_and_quotes_survives() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tweets.csv");

        let tricky = "wen \"moon\", anon? newline:\nstill one field";
        let mut writer = RecordWriter::create(&path).unwrap();
        writer.append(&record(1, tricky)).unwrap();
        drop(writer);

        let records = read_records(&path).unwrap();
        assert_eq!(records[0].text, tricky);
    }

    #[test]
    fn empty_store_reads_as_no_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tweets.csv");
        drop(RecordWriter::create(&path).unwrap());

        assert!(read_records(&path).unwrap().is_empty());
    }

    #[test]
    fn read_missing_file_is_an_error() {
        assert!(read_records(Path::new("/nonexistent/tweets.csv")).is_err());
    }
}

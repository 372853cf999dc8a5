//! Zip packaging for CourseDocs output.
//!
//! Rendered documents stream into a single zip archive as they are
//! produced. Entry names are disambiguated on the way in, and every entry
//! is checksummed so the run report can state exactly what was packaged.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufWriter, Cursor, Seek, Write};
use std::path::Path;

use chrono::{DateTime, Utc};
use coursedocs_shared::{CourseDocsError, Result};
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::debug;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

// ---------------------------------------------------------------------------
// Report types
// ---------------------------------------------------------------------------

/// Metadata for a single archive entry.
#[derive(Debug, Clone, Serialize)]
pub struct ArchiveEntry {
    pub name: String,
    pub sha256: String,
    pub size_bytes: usize,
}

/// Summary of a finished archive.
#[derive(Debug, Clone, Serialize)]
pub struct ArchiveReport {
    pub entries: Vec<ArchiveEntry>,
    pub total_bytes: usize,
    pub generated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// ZipSink
// ---------------------------------------------------------------------------

/// Streaming zip sink for rendered documents.
pub struct ZipSink<W: Write + Seek> {
    zip: ZipWriter<W>,
    options: FileOptions<'static, ()>,
    name_counts: HashMap<String, u32>,
    entries: Vec<ArchiveEntry>,
}

impl ZipSink<Cursor<Vec<u8>>> {
    /// Sink writing to an in-memory buffer.
    pub fn in_memory() -> Self {
        Self::from_writer(Cursor::new(Vec::new()))
    }
}

impl ZipSink<BufWriter<File>> {
    /// Sink writing to a file on disk.
    pub fn create(path: &Path) -> Result<Self> {
        let file = File::create(path).map_err(|e| CourseDocsError::io(path, e))?;
        Ok(Self::from_writer(BufWriter::new(file)))
    }
}

impl<W: Write + Seek> ZipSink<W> {
    /// Sink writing to an arbitrary writer.
    pub fn from_writer(writer: W) -> Self {
        let options: FileOptions<'static, ()> =
            FileOptions::default().compression_method(CompressionMethod::Deflated);
        Self {
            zip: ZipWriter::new(writer),
            options,
            name_counts: HashMap::new(),
            entries: Vec::new(),
        }
    }

    /// Add one document. A name seen before gets a ` (N)` suffix before
    /// its extension, so earlier entries are never overwritten.
    pub fn add(&mut self, name: &str, bytes: &[u8]) -> Result<()> {
        let unique = self.unique_name(name);

        self.zip.start_file(unique.clone(), self.options).map_err(|e| {
            CourseDocsError::Archive(format!("failed to start entry {unique:?}: {e}"))
        })?;
        self.zip.write_all(bytes).map_err(|e| {
            CourseDocsError::Archive(format!("failed to write entry {unique:?}: {e}"))
        })?;

        let mut hasher = Sha256::new();
        hasher.update(bytes);
        let hash = format!("{:x}", hasher.finalize());

        debug!(entry = %unique, size = bytes.len(), "added archive entry");

        self.entries.push(ArchiveEntry {
            name: unique,
            sha256: hash,
            size_bytes: bytes.len(),
        });
        Ok(())
    }

    /// Number of entries added so far.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no entries have been added yet.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Close the archive and hand back the writer plus the entry report.
    pub fn finish(self) -> Result<(W, ArchiveReport)> {
        let mut writer = self
            .zip
            .finish()
            .map_err(|e| CourseDocsError::Archive(format!("failed to finish archive: {e}")))?;
        writer
            .flush()
            .map_err(|e| CourseDocsError::Archive(format!("failed to flush archive: {e}")))?;

        let total_bytes = self.entries.iter().map(|e| e.size_bytes).sum();
        let report = ArchiveReport {
            entries: self.entries,
            total_bytes,
            generated_at: Utc::now(),
        };
        Ok((writer, report))
    }

    fn unique_name(&mut self, name: &str) -> String {
        let seen = self.name_counts.entry(name.to_string()).or_insert(0);
        *seen += 1;
        if *seen == 1 {
            return name.to_string();
        }

        // "doc.docx" becomes "doc (1).docx" on its second occurrence
        let suffix = *seen - 1;
        match name.rsplit_once('.') {
            Some((stem, ext)) => format!("{stem} ({suffix}).{ext}"),
            None => format!("{name} ({suffix})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    use zip::ZipArchive;

    fn read_entry(bytes: &[u8], name: &str) -> Vec<u8> {
        let mut archive = ZipArchive::new(Cursor::new(bytes.to_vec())).expect("open archive");
        let mut file = archive.by_name(name).expect("entry exists");
        let mut content = Vec::new();
        file.read_to_end(&mut content).expect("read entry");
        content
    }

    #[test]
    fn entries_written_and_readable() {
        let mut sink = ZipSink::in_memory();
        sink.add("a.docx", b"alpha").expect("add a");
        sink.add("b.docx", b"beta").expect("add b");
        let (writer, report) = sink.finish().expect("finish");
        let bytes = writer.into_inner();

        assert_eq!(report.entries.len(), 2);
        assert_eq!(read_entry(&bytes, "a.docx"), b"alpha");
        assert_eq!(read_entry(&bytes, "b.docx"), b"beta");
    }

    #[test]
    fn duplicate_names_disambiguated() {
        let mut sink = ZipSink::in_memory();
        sink.add("doc.docx", b"one").expect("add");
        sink.add("doc.docx", b"two").expect("add");
        sink.add("doc.docx", b"three").expect("add");
        let (writer, report) = sink.finish().expect("finish");
        let bytes = writer.into_inner();

        let names: Vec<_> = report.entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["doc.docx", "doc (1).docx", "doc (2).docx"]);
        assert_eq!(read_entry(&bytes, "doc (1).docx"), b"two");
        assert_eq!(read_entry(&bytes, "doc (2).docx"), b"three");
    }

    #[test]
    fn report_carries_checksums_and_sizes() {
        let mut sink = ZipSink::in_memory();
        sink.add("a.docx", b"alpha").expect("add");
        sink.add("b.docx", b"beta").expect("add");
        let (_, report) = sink.finish().expect("finish");

        assert_eq!(report.total_bytes, 9);
        assert_eq!(report.entries[0].size_bytes, 5);
        assert_eq!(report.entries[0].sha256.len(), 64);
        assert_ne!(report.entries[0].sha256, report.entries[1].sha256);
    }

    #[test]
    fn create_writes_archive_to_disk() {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("clock")
            .as_nanos();
        let dir = std::env::temp_dir().join(format!("coursedocs-archive-{nanos}"));
        std::fs::create_dir_all(&dir).expect("create temp dir");
        let path = dir.join("out.zip");

        let mut sink = ZipSink::create(&path).expect("create sink");
        sink.add("a.docx", b"alpha").expect("add");
        let (_, report) = sink.finish().expect("finish");
        assert_eq!(report.entries.len(), 1);

        let bytes = std::fs::read(&path).expect("read archive");
        assert_eq!(read_entry(&bytes, "a.docx"), b"alpha");

        let _ = std::fs::remove_dir_all(&dir);
    }
}

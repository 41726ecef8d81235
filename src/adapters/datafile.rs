//! CSV record files on the data volume.
//!
//! Implements [`RecordStore`] with one append-only file per
//! [`RecordStream`], named
//! `{save_path}/{%Y-%m-%d_%H_%M_%S}_{site}_{suffix}`.  Every file opens with
//! its stream's preamble; when a file outgrows `max_file_size` a fresh one,
//! stamped with the rotation time, takes over.

use std::collections::HashMap;
use std::ffi::CString;
use std::fs::{self, File, OpenOptions};
use std::io::{LineWriter, Write};
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};

use chrono::DateTime;
use log::{info, warn};

use crate::app::ports::{RecordStore, RecordStream};
use crate::error::StorageError;

/// Timestamp prefix of every file name.
const FILE_STAMP: &str = "%Y-%m-%d_%H_%M_%S";

struct StreamFile {
    path: PathBuf,
    writer: LineWriter<File>,
    size: u64,
    preamble: Vec<String>,
}

/// File-backed [`RecordStore`].
pub struct DataFileStore {
    dir: PathBuf,
    site: String,
    max_file_size: u64,
    streams: HashMap<RecordStream, StreamFile>,
}

impl DataFileStore {
    /// Create `dir` if needed.  No file is opened until
    /// [`RecordStore::begin_stream`].
    pub fn new(dir: &Path, site: &str, max_file_size: u64) -> Result<Self, StorageError> {
        fs::create_dir_all(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
            site: site.to_owned(),
            max_file_size,
            streams: HashMap::new(),
        })
    }

    /// Path of the active file of `stream`.
    pub fn current_path(&self, stream: RecordStream) -> Option<&Path> {
        self.streams.get(&stream).map(|f| f.path.as_path())
    }

    fn file_name(&self, stream: RecordStream, now: i64) -> PathBuf {
        let stamp = DateTime::from_timestamp(now, 0)
            .map(|t| t.format(FILE_STAMP).to_string())
            .unwrap_or_else(|| now.to_string());
        self.dir
            .join(format!("{}_{}_{}", stamp, self.site, stream.suffix()))
    }

    fn open(&self, stream: RecordStream, now: i64, preamble: Vec<String>) -> Result<StreamFile, StorageError> {
        let path = self.file_name(stream, now);
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let mut size = file.metadata()?.len();
        let mut writer = LineWriter::new(file);
        if size == 0 {
            for line in &preamble {
                writeln!(writer, "{line}")?;
                size += line.len() as u64 + 1;
            }
        }
        info!("{:?} file: {}", stream, path.display());
        Ok(StreamFile {
            path,
            writer,
            size,
            preamble,
        })
    }
}

impl RecordStore for DataFileStore {
    fn begin_stream(
        &mut self,
        stream: RecordStream,
        now: i64,
        preamble: &[String],
    ) -> Result<(), StorageError> {
        let file = self.open(stream, now, preamble.to_vec())?;
        self.streams.insert(stream, file);
        Ok(())
    }

    fn append_record_line(&mut self, stream: RecordStream, line: &str) -> Result<(), StorageError> {
        let file = self
            .streams
            .get_mut(&stream)
            .ok_or_else(|| StorageError::Io(format!("{stream:?} stream not open")))?;
        writeln!(file.writer, "{line}")?;
        file.size += line.len() as u64 + 1;
        Ok(())
    }

    fn current_file_size(&self, stream: RecordStream) -> u64 {
        self.streams.get(&stream).map_or(0, |f| f.size)
    }

    fn rotate_file_if_oversize(&mut self, stream: RecordStream, now: i64) -> Result<bool, StorageError> {
        let next_path = self.file_name(stream, now);
        let Some(current) = self.streams.get_mut(&stream) else {
            return Ok(false);
        };
        if current.size <= self.max_file_size {
            return Ok(false);
        }
        current.writer.flush()?;
        if next_path == current.path {
            warn!("{:?}: rotation due within the same second, deferred", stream);
            return Ok(false);
        }
        let preamble = std::mem::take(&mut current.preamble);
        let next = self.open(stream, now, preamble)?;
        self.streams.insert(stream, next);
        Ok(true)
    }

    fn free_disk_bytes(&self) -> Result<u64, StorageError> {
        let c_path = CString::new(self.dir.as_os_str().as_bytes())
            .map_err(|_| StorageError::Io("save path contains NUL".into()))?;
        let mut stat = std::mem::MaybeUninit::<libc::statvfs>::uninit();
        // SAFETY: `c_path` is NUL-terminated and `stat` is valid for writes;
        // it is only read after statvfs reports success.
        let rc = unsafe { libc::statvfs(c_path.as_ptr(), stat.as_mut_ptr()) };
        if rc != 0 {
            return Err(std::io::Error::last_os_error().into());
        }
        // SAFETY: statvfs returned 0, so `stat` is initialised.
        let stat = unsafe { stat.assume_init() };
        Ok(u64::from(stat.f_bavail) * u64::from(stat.f_frsize))
    }

    fn flush(&mut self) -> Result<(), StorageError> {
        for file in self.streams.values_mut() {
            file.writer.flush()?;
            file.writer.get_ref().sync_data()?;
        }
        Ok(())
    }
}

//! Sidecar timing file parsing.
//!
//! A sidecar shares its media file's stem and lists one range per line:
//!
//! ```text
//! 00:01:30-00:02:45
//! 0:10:00-0:10:30
//! ```
//!
//! Lines that are not a single `start-end` pair are ignored. A pair whose
//! halves are not `H:M:S` integers is a parse error.

use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::domain::Section;
use crate::error::{PipelineError, Result};

/// Extension of sidecar timing files
pub const SIDECAR_EXTENSION: &str = "cue";

/// Path of the sidecar that would belong to `media`
pub fn sidecar_path(media: &Path) -> PathBuf {
    media.with_extension(SIDECAR_EXTENSION)
}

/// Whether `path` is itself a sidecar file
pub fn is_sidecar(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(SIDECAR_EXTENSION))
}

/// Convert `H:M:S` to milliseconds
pub fn parse_timestamp(segment: &str) -> std::result::Result<u64, String> {
    let parts: Vec<&str> = segment.trim().split(':').collect();
    if parts.len() != 3 {
        return Err(format!("expected H:M:S, got {} field(s)", parts.len()));
    }

    let mut fields = [0u64; 3];
    for (slot, part) in fields.iter_mut().zip(&parts) {
        *slot = part
            .trim()
            .parse::<u64>()
            .map_err(|e| format!("'{}' is not an integer: {}", part, e))?;
    }

    let [h, m, s] = fields;
    h.checked_mul(3600)
        .and_then(|secs| secs.checked_add(m.checked_mul(60)?))
        .and_then(|secs| secs.checked_add(s))
        .and_then(|secs| secs.checked_mul(1000))
        .ok_or_else(|| "timestamp out of range".to_string())
}

/// Lazy reader over the sections of one sidecar file.
///
/// Indices count valid ranges in file order, so skipped lines never leave
/// gaps. The iterator is single-pass.
pub struct SectionTimings<R: BufRead> {
    path: PathBuf,
    lines: Lines<R>,
    next_index: usize,
}

impl SectionTimings<BufReader<File>> {
    /// Open a sidecar file for reading
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        Ok(Self::from_reader(path, BufReader::new(file)))
    }
}

impl<R: BufRead> SectionTimings<R> {
    /// Read sections from any buffered source (`path` is used in errors only)
    pub fn from_reader(path: &Path, reader: R) -> Self {
        Self {
            path: path.to_path_buf(),
            lines: reader.lines(),
            next_index: 0,
        }
    }

    fn parse_error(&self, segment: &str, reason: String) -> PipelineError {
        PipelineError::Parse {
            path: self.path.clone(),
            segment: segment.to_string(),
            reason,
        }
    }
}

impl<R: BufRead> Iterator for SectionTimings<R> {
    type Item = Result<Section>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(e) => return Some(Err(e.into())),
            };

            let halves: Vec<&str> = line.trim().split('-').collect();
            let [start, end] = halves.as_slice() else {
                continue;
            };

            let start_ms = match parse_timestamp(start) {
                Ok(ms) => ms,
                Err(reason) => return Some(Err(self.parse_error(start, reason))),
            };
            let end_ms = match parse_timestamp(end) {
                Ok(ms) => ms,
                Err(reason) => return Some(Err(self.parse_error(end, reason))),
            };

            if end_ms <= start_ms {
                warn!(
                    path = %self.path.display(),
                    line = %line.trim(),
                    "Ignoring empty or inverted range"
                );
                continue;
            }

            let section = Section::new(self.next_index, start_ms, end_ms);
            self.next_index += 1;
            return Some(Ok(section));
        }
    }
}

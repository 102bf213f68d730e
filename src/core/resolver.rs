//! Filesystem resolvers that turn an input tree into operations.
//!
//! Both resolvers walk depth-first with an explicit stack instead of
//! recursion, and are lazy: each call to `next()` expands directories only
//! as far as needed to produce the next operation. Sibling order follows
//! `read_dir` and is not sorted.

use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::domain::{
    actions_for_phase, file_stem, Action, Phase, RawSourceOperation, Section,
    SeparatedSourceOperation,
};
use crate::error::Result;

use super::timing::{is_sidecar, sidecar_path, SectionTimings};

/// File name (without extension) the separation tool gives the vocal stem
pub const VOCALS_STEM: &str = "vocals";

/// Complementary stem written in two-stem mode; never a vocal source
pub const NO_VOCALS_STEM: &str = "no_vocals";

/// Extension of separated stems and of every working file
pub const WAV_EXTENSION: &str = "wav";

/// Audio and video containers accepted as raw sources
pub const MEDIA_EXTENSIONS: &[&str] = &[
    "aac", "aif", "aiff", "avi", "flac", "m4a", "m4v", "mka", "mkv", "mov", "mp3", "mp4", "mpeg",
    "mpg", "oga", "ogg", "opus", "wav", "webm", "wma", "wmv",
];

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with('.'))
}

fn has_wav_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(WAV_EXTENSION))
}

/// Whether `path` has an audio or video container extension
pub fn is_media_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| MEDIA_EXTENSIONS.iter().any(|m| e.eq_ignore_ascii_case(m)))
}

/// Depth-first walk yielding non-directory entries.
///
/// Hidden directories are pruned. Symlinks below the root are yielded as
/// leaves and never descended into; only the root itself is followed.
struct TreeWalk {
    stack: Vec<(PathBuf, bool)>,
}

impl TreeWalk {
    fn new(root: &Path) -> Self {
        Self {
            stack: vec![(root.to_path_buf(), root.is_dir())],
        }
    }

    /// Next file in the walk, expanding directories on the way
    fn next_file(&mut self) -> Option<Result<PathBuf>> {
        while let Some((path, is_dir)) = self.stack.pop() {
            if !is_dir {
                return Some(Ok(path));
            }

            let entries = match fs::read_dir(&path) {
                Ok(entries) => entries,
                Err(e) => return Some(Err(e.into())),
            };

            let mut children = Vec::new();
            for entry in entries {
                let entry = match entry {
                    Ok(entry) => entry,
                    Err(e) => return Some(Err(e.into())),
                };
                let file_type = match entry.file_type() {
                    Ok(file_type) => file_type,
                    Err(e) => return Some(Err(e.into())),
                };
                let child = entry.path();
                if file_type.is_dir() && is_hidden(&child) {
                    debug!(dir = %child.display(), "Skipping hidden directory");
                    continue;
                }
                children.push((child, file_type.is_dir()));
            }

            // Reverse so the first listed child is visited first
            self.stack.extend(children.into_iter().rev());
        }
        None
    }
}

/// Resolves original recordings into raw-phase operations
pub struct RawSourceResolver {
    walk: TreeWalk,
    actions: Vec<Action>,
    output_dir: PathBuf,
    pending: VecDeque<RawSourceOperation>,
}

impl RawSourceResolver {
    /// Walk `root`; `requested` is projected onto the raw phase
    pub fn new(root: &Path, requested: &[Action], output_dir: &Path) -> Self {
        Self {
            walk: TreeWalk::new(root),
            actions: actions_for_phase(requested, Phase::Raw),
            output_dir: output_dir.to_path_buf(),
            pending: VecDeque::new(),
        }
    }

    fn operation(&self, source: &Path, section: Option<Section>) -> RawSourceOperation {
        RawSourceOperation {
            actions: self.actions.clone(),
            source: source.to_path_buf(),
            output_dir: self.output_dir.clone(),
            section,
        }
    }

    /// Queue the operations for one media file
    fn expand(&mut self, source: &Path) -> Result<()> {
        if !self.actions.contains(&Action::Extract) {
            let op = self.operation(source, None);
            self.pending.push_back(op);
            return Ok(());
        }

        let sidecar = sidecar_path(source);
        if !sidecar.is_file() {
            debug!(source = %source.display(), "No sidecar timing file, skipping");
            return Ok(());
        }

        for section in SectionTimings::open(&sidecar)? {
            match section {
                Ok(section) => {
                    let op = self.operation(source, Some(section));
                    self.pending.push_back(op);
                }
                Err(e) => {
                    warn!(sidecar = %sidecar.display(), error = %e, "Abandoning sidecar");
                    break;
                }
            }
        }
        Ok(())
    }
}

impl Iterator for RawSourceResolver {
    type Item = Result<RawSourceOperation>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(op) = self.pending.pop_front() {
                return Some(Ok(op));
            }

            let path = match self.walk.next_file()? {
                Ok(path) => path,
                Err(e) => return Some(Err(e)),
            };

            if is_hidden(&path) || is_sidecar(&path) {
                continue;
            }
            if !is_media_file(&path) {
                debug!(path = %path.display(), "Not a media file, skipping");
                continue;
            }

            if let Err(e) = self.expand(&path) {
                return Some(Err(e));
            }
        }
    }
}

/// Canonical name of a separated stem.
///
/// The separation tool writes `<stem>/vocals.wav`, so a file literally
/// called `vocals` takes its parent directory's name.
pub fn canonical_name(path: &Path) -> String {
    let stem = file_stem(path);
    if stem == VOCALS_STEM {
        if let Some(parent) = path.parent().and_then(|p| p.file_name()) {
            return parent.to_string_lossy().into_owned();
        }
    }
    stem
}

/// Whether `path` looks like a vocal stem produced by separation.
///
/// Inside a separation output directory (one holding `vocals.wav`) only the
/// vocal artifact qualifies; its drum, bass and other siblings do not.
pub fn is_vocal_stem(path: &Path) -> bool {
    if is_hidden(path) || !has_wav_extension(path) {
        return false;
    }
    let stem = file_stem(path);
    if stem == VOCALS_STEM {
        return true;
    }
    if stem == NO_VOCALS_STEM {
        return false;
    }
    !path
        .parent()
        .is_some_and(|dir| dir.join(wav_file(VOCALS_STEM)).is_file())
}

fn wav_file(stem: &str) -> String {
    format!("{}.{}", stem, WAV_EXTENSION)
}

/// Resolves separated vocal stems into separated-phase operations
pub struct SeparatedSourceResolver {
    walk: TreeWalk,
    actions: Vec<Action>,
    output_dir: PathBuf,
}

impl SeparatedSourceResolver {
    /// Walk `root`; `requested` is projected onto the separated phase
    pub fn new(root: &Path, requested: &[Action], output_dir: &Path) -> Self {
        Self {
            walk: TreeWalk::new(root),
            actions: actions_for_phase(requested, Phase::Separated),
            output_dir: output_dir.to_path_buf(),
        }
    }

}

impl Iterator for SeparatedSourceResolver {
    type Item = Result<SeparatedSourceOperation>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let path = match self.walk.next_file()? {
                Ok(path) => path,
                Err(e) => return Some(Err(e)),
            };

            if !is_vocal_stem(&path) {
                continue;
            }

            return Some(Ok(SeparatedSourceOperation {
                actions: self.actions.clone(),
                source_name: canonical_name(&path),
                source: path,
                output_dir: self.output_dir.clone(),
            }));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_name_from_parent() {
        assert_eq!(canonical_name(Path::new("out/htdemucs/track7/vocals.wav")), "track7");
        assert_eq!(canonical_name(Path::new("out/drums.wav")), "drums");
        assert_eq!(canonical_name(Path::new("vocals.wav")), "vocals");
    }

    #[test]
    fn test_media_file_predicate() {
        assert!(is_media_file(Path::new("in/song.wav")));
        assert!(is_media_file(Path::new("in/Clip.MP4")));
        assert!(is_media_file(Path::new("in/take.flac")));
        assert!(!is_media_file(Path::new("in/notes.txt")));
        assert!(!is_media_file(Path::new("in/cover.jpg")));
        assert!(!is_media_file(Path::new("in/README")));
    }

    #[test]
    fn test_vocal_stem_predicate() {
        assert!(is_vocal_stem(Path::new("a/vocals.wav")));
        assert!(is_vocal_stem(Path::new("a/take.WAV")));
        assert!(!is_vocal_stem(Path::new("a/no_vocals.wav")));
        assert!(!is_vocal_stem(Path::new("a/vocals.mp3")));
        assert!(!is_vocal_stem(Path::new("a/.hidden.wav")));
    }
}

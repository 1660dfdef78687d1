//! The transfer engine: walk the source tree, derive each file's dated
//! destination, and create, overwrite, merge or skip it.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use ignore::WalkBuilder;

use crate::datepath;
use crate::error::ImportError;
use crate::options::Options;
use crate::transfer::{copy_file, DeltaTransfer};

/// Above this size a mismatched destination is delta-merged instead of fully
/// overwritten; a camera appending to a large video should not cost a full
/// recopy.
pub const LARGE_FILE_BYTES: u64 = 10 * 1024 * 1024;

/// One discovered source file. Immutable; dropped once its transfer decision
/// is resolved.
pub struct CameraItem {
    pub path: PathBuf,
    pub mod_time: SystemTime,
    pub size: u64,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct TransferStats {
    pub created: u64,
    pub overwritten: u64,
    pub skipped: u64,
    pub merged: u64,
}

impl fmt::Display for TransferStats {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "\n{} new files, {} overwritten, {} skipped, {} merged",
            self.created, self.overwritten, self.skipped, self.merged
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Create,
    Identical,
    Skip,
    Overwrite,
    Merge,
}

/// The transfer decision for one file, given the source size and the size of
/// any existing destination.
pub fn decide(src_size: u64, dst_size: Option<u64>, force: bool) -> Action {
    match dst_size {
        None => Action::Create,
        Some(d) if d == src_size => Action::Identical,
        Some(_) if !force => Action::Skip,
        Some(_) if src_size > LARGE_FILE_BYTES => Action::Merge,
        Some(_) => Action::Overwrite,
    }
}

#[derive(PartialEq, Eq)]
enum MediaKind {
    Photo,
    Video,
}

/// Case-insensitive suffix classification; anything that is neither photo nor
/// video is ignored by the walk.
fn classify(path: &Path) -> Option<MediaKind> {
    let name = path.file_name()?.to_str()?.to_lowercase();
    if name.ends_with(".jpg") || name.ends_with(".jpeg") {
        Some(MediaKind::Photo)
    } else if name.ends_with(".mov") || name.ends_with(".mp4") {
        Some(MediaKind::Video)
    } else {
        None
    }
}

pub struct TransferTask {
    opts: Options,
    delta: Box<dyn DeltaTransfer>,
}

impl TransferTask {
    pub fn new(opts: Options, delta: Box<dyn DeltaTransfer>) -> TransferTask {
        TransferTask { opts, delta }
    }

    /// Run the whole import. The statistics are returned unconditionally so
    /// the caller can print the summary even when the walk failed partway.
    pub fn run(&self) -> (TransferStats, Result<(), ImportError>) {
        let mut stats = TransferStats::default();
        let result = self.walk(&mut stats);
        (stats, result)
    }

    fn walk(&self, stats: &mut TransferStats) -> Result<(), ImportError> {
        // Camera trees hide media under dot-directories, so the walker's
        // gitignore/hidden filtering must be off.
        let walker = WalkBuilder::new(&self.opts.src_dir)
            .standard_filters(false)
            .build();
        for entry in walker {
            let entry = entry?;
            match entry.file_type() {
                Some(ft) if ft.is_file() => (),
                _ => continue,
            }
            match classify(entry.path()) {
                None => continue,
                Some(MediaKind::Video) if self.opts.skip_videos => {
                    println!("Ignoring video file {}", entry.path().display());
                    continue;
                }
                Some(_) => (),
            }
            let meta = match entry.metadata() {
                Ok(m) => m,
                Err(e) => {
                    eprintln!("{}", ImportError::Walk(e));
                    continue;
                }
            };
            let item = CameraItem {
                mod_time: meta.modified().unwrap_or(SystemTime::UNIX_EPOCH),
                size: meta.len(),
                path: entry.into_path(),
            };
            // A single broken file must not halt the whole import.
            if let Err(e) = self.import_item(&item, stats) {
                eprintln!("{}", e);
            }
        }
        Ok(())
    }

    fn import_item(&self, item: &CameraItem, stats: &mut TransferStats) -> Result<(), ImportError> {
        let dp = datepath::date_path(&item.path, &self.opts.date_format).map_err(|source| {
            ImportError::Metadata {
                path: item.path.clone(),
                source,
            }
        })?;
        let base = match item.path.file_name() {
            Some(name) => name,
            None => return Ok(()), // classify() already required a file name
        };
        let dst = self.opts.dst_dir.join(dp).join(base);

        let dst_size = match fs::metadata(&dst) {
            Ok(m) => Some(m.len()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => {
                return Err(ImportError::Stat {
                    path: dst,
                    source: e,
                })
            }
        };

        match decide(item.size, dst_size, self.opts.force) {
            Action::Create => {
                if self.opts.verbosity.verbose() {
                    println!("Copying new file: {} ==> {}", item.path.display(), dst.display());
                }
                copy_file(&item.path, &dst).map_err(|source| ImportError::Copy {
                    path: item.path.clone(),
                    source,
                })?;
                stats.created += 1;
            }
            Action::Identical => {
                if self.opts.verbosity.super_verbose() {
                    println!("Already identical {} == {}", item.path.display(), dst.display());
                }
            }
            Action::Skip => {
                if self.opts.verbosity.verbose() {
                    println!(
                        "Warning: Skipping {} ==> {} ({} bytes vs {} bytes)",
                        item.path.display(),
                        dst.display(),
                        item.size,
                        dst_size.unwrap_or(0)
                    );
                }
                stats.skipped += 1;
            }
            Action::Merge => {
                if self.opts.verbosity.verbose() {
                    println!("Merging: {} ==> {}", item.path.display(), dst.display());
                }
                self.delta.attempt(&item.path, &dst)?;
                stats.merged += 1;
            }
            Action::Overwrite => {
                if self.opts.verbosity.verbose() {
                    println!("Overwriting: {} ==> {}", item.path.display(), dst.display());
                }
                copy_file(&item.path, &dst).map_err(|source| ImportError::Copy {
                    path: item.path.clone(),
                    source,
                })?;
                stats.overwritten += 1;
            }
        }
        Ok(())
    }
}

//! Byte transfer: full copies with timestamp propagation, and delta merges
//! through an external rsync when one is available.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use filetime::FileTime;
use indicatif::{ProgressBar, ProgressStyle};

use crate::error::ImportError;

/// Copy `src` to `dst` byte for byte, creating missing parent directories and
/// carrying the source mtime over to the destination (atime too) so external
/// sync tools see a faithful mirror. Partial output is left in place on
/// failure. A byte progress bar is shown while copying; it hides itself when
/// stderr is not a terminal.
pub fn copy_file(src: &Path, dst: &Path) -> io::Result<()> {
    let mut s = File::open(src)?;
    if let Some(parent) = dst.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut d = File::create(dst)?;

    let meta = src.metadata()?;
    let bar = ProgressBar::new(meta.len());
    bar.set_style(
        ProgressStyle::default_bar()
            .template("{bar:40.cyan/blue} {bytes}/{total_bytes} {bytes_per_sec}")
            .expect("progress template"),
    );
    io::copy(&mut bar.wrap_read(&mut s), &mut d)?;
    bar.finish_and_clear();

    let mtime = FileTime::from_last_modification_time(&meta);
    filetime::set_file_times(dst, mtime, mtime)?;
    Ok(())
}

/// Capability for reconciling an existing destination file with a changed
/// source. Selected once at startup, never re-probed per file.
pub trait DeltaTransfer {
    fn attempt(&self, src: &Path, dst: &Path) -> Result<(), ImportError>;
}

/// Delta merge backed by an external rsync binary, invoked synchronously with
/// in-place, time-preserving flags.
pub struct RsyncDelta {
    program: PathBuf,
    verbose: bool,
}

impl DeltaTransfer for RsyncDelta {
    fn attempt(&self, src: &Path, dst: &Path) -> Result<(), ImportError> {
        let mut cmd = Command::new(&self.program);
        cmd.arg("-tP").arg("--inplace").arg(src).arg(dst);
        if self.verbose {
            cmd.stdout(Stdio::inherit()).stderr(Stdio::inherit());
        } else {
            cmd.stdout(Stdio::null()).stderr(Stdio::null());
        }
        let status = cmd.status().map_err(|e| ImportError::Merge {
            path: src.to_path_buf(),
            source: e,
        })?;
        if !status.success() {
            return Err(ImportError::Tool { status });
        }
        Ok(())
    }
}

/// Fallback when no delta tool exists: a plain full copy.
pub struct CopyFallback;

impl DeltaTransfer for CopyFallback {
    fn attempt(&self, src: &Path, dst: &Path) -> Result<(), ImportError> {
        copy_file(src, dst).map_err(|e| ImportError::Merge {
            path: src.to_path_buf(),
            source: e,
        })
    }
}

/// One-time startup probe for rsync on PATH.
pub fn detect_delta_tool(verbose: bool) -> Box<dyn DeltaTransfer> {
    match which::which("rsync") {
        Ok(program) => Box::new(RsyncDelta { program, verbose }),
        Err(_) => {
            eprintln!("Warning: rsync not found. Falling back to simple copy");
            Box::new(CopyFallback)
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::io::Write;

    fn write_file(path: &Path, bytes: &[u8]) {
        let mut f = File::create(path).expect("create");
        f.write_all(bytes).expect("write");
    }

    #[test]
    fn t_copy_creates_parents_and_content() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let src = tmp.path().join("src.jpg");
        write_file(&src, b"pixels pixels pixels");

        let dst = tmp.path().join("2023-03-05/deep/src.jpg");
        copy_file(&src, &dst).expect("copy");

        assert_eq!(fs::read(&dst).expect("read dst"), b"pixels pixels pixels");
    }

    #[test]
    fn t_copy_propagates_mtime() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let src = tmp.path().join("src.jpg");
        write_file(&src, b"abc");
        let stamp = FileTime::from_unix_time(1_234_567_890, 0);
        filetime::set_file_times(&src, stamp, stamp).expect("set src times");

        let dst = tmp.path().join("out/src.jpg");
        copy_file(&src, &dst).expect("copy");

        let dmeta = fs::metadata(&dst).expect("stat dst");
        assert_eq!(FileTime::from_last_modification_time(&dmeta), stamp);
    }

    #[test]
    fn t_copy_overwrites_existing() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let src = tmp.path().join("src.jpg");
        let dst = tmp.path().join("dst.jpg");
        write_file(&src, b"new content");
        write_file(&dst, b"old, longer content here");

        copy_file(&src, &dst).expect("copy");
        assert_eq!(fs::read(&dst).expect("read dst"), b"new content");
    }

    #[test]
    fn t_fallback_merge_is_a_full_copy() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let src = tmp.path().join("src.mp4");
        let dst = tmp.path().join("dst.mp4");
        write_file(&src, b"full video bytes");
        write_file(&dst, b"truncated");

        CopyFallback.attempt(&src, &dst).expect("merge");
        assert_eq!(fs::read(&dst).expect("read dst"), b"full video bytes");
    }

    #[test]
    fn t_missing_source_fails_without_touching_dst() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let dst = tmp.path().join("never/created.jpg");
        assert!(copy_file(&tmp.path().join("absent.jpg"), &dst).is_err());
        assert!(!dst.exists());
    }
}

use bar_core::{BarError, Restarter, Result};
use std::fs::File;
use std::io::{ErrorKind, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Size by which the read buffer grows.
const CHUNK: usize = 512;

/// A cached handle on a small pseudo-file that is re-read from the start on
/// every poll.
///
/// Keeping the file open avoids an `open(2)` per tick for files like
/// `/proc/stat`. The buffer only ever grows, so a file whose size is stable
/// stops allocating after the first couple of reads.
pub struct ProcFile {
    path:      Option<PathBuf>,
    file:      Option<File>,
    buf:       Vec<u8>,
    restarter: Restarter,
}

impl ProcFile {
    pub fn new(restarter: Restarter) -> Self {
        Self {
            path: None,
            file: None,
            buf: Vec::new(),
            restarter,
        }
    }

    /// Read the whole of `path`. The handle is reopened when `path` differs
    /// from the previous call.
    pub fn read(&mut self, path: impl AsRef<Path>) -> Result<&[u8]> {
        let path = path.as_ref();
        if self.path.as_deref() != Some(path) {
            self.path = Some(path.to_path_buf());
            self.file = None;
        }

        let file = match &mut self.file {
            Some(file) => file,
            slot => {
                let file = File::open(path).map_err(|e| BarError::read(path, e))?;
                self.restarter.close_on_restart(&file)?;
                debug!("opened {}", path.display());
                slot.insert(file)
            }
        };

        match fill(file, &mut self.buf) {
            Ok(len) => Ok(&self.buf[..len]),
            Err(e) => {
                // Reopen on the next call; the file may have been replaced.
                self.file = None;
                Err(BarError::read(path, e))
            }
        }
    }
}

/// Seek `file` to the start and read it to the end into `buf`, growing the
/// buffer in [`CHUNK`] steps. Returns the number of bytes read.
fn fill(file: &mut File, buf: &mut Vec<u8>) -> std::io::Result<usize> {
    file.seek(SeekFrom::Start(0))?;

    let mut read = 0;
    loop {
        if read == buf.len() {
            buf.resize(buf.len() + CHUNK, 0);
        }
        match file.read(&mut buf[read..]) {
            Ok(0) => return Ok(read),
            Ok(n) => read += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn proc_file() -> ProcFile {
        ProcFile::new(Restarter::default())
    }

    #[test]
    fn rereads_from_the_start() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("counter");
        std::fs::write(&path, "1 2 3\n").unwrap();

        let mut pf = proc_file();
        assert_eq!(pf.read(&path).unwrap(), b"1 2 3\n");

        // Rewrite in place so the cached handle sees the new contents.
        let mut f = std::fs::OpenOptions::new().write(true).open(&path).unwrap();
        f.write_all(b"4 5 6\n").unwrap();
        drop(f);

        assert_eq!(pf.read(&path).unwrap(), b"4 5 6\n");
    }

    #[test]
    fn grows_past_one_chunk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("big");
        let contents: Vec<u8> = (0..CHUNK * 3 + 17).map(|i| b'a' + (i % 26) as u8).collect();
        std::fs::write(&path, &contents).unwrap();

        let mut pf = proc_file();
        assert_eq!(pf.read(&path).unwrap(), contents.as_slice());
        assert!(pf.buf.len() >= contents.len());
        assert_eq!(pf.buf.len() % CHUNK, 0);
    }

    #[test]
    fn shrinking_file_keeps_buffer() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("f");
        std::fs::write(&path, vec![b'x'; CHUNK * 2]).unwrap();

        let mut pf = proc_file();
        pf.read(&path).unwrap();
        let cap = pf.buf.len();

        std::fs::OpenOptions::new()
            .write(true)
            .open(&path)
            .unwrap()
            .set_len(3)
            .unwrap();
        assert_eq!(pf.read(&path).unwrap(), b"xxx");
        assert_eq!(pf.buf.len(), cap);
    }

    #[test]
    fn switches_path() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a");
        let b = dir.path().join("b");
        std::fs::write(&a, "a").unwrap();
        std::fs::write(&b, "bb").unwrap();

        let mut pf = proc_file();
        assert_eq!(pf.read(&a).unwrap(), b"a");
        assert_eq!(pf.read(&b).unwrap(), b"bb");
        assert_eq!(pf.read(&a).unwrap(), b"a");
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let mut pf = proc_file();
        let err = pf.read("/definitely/not/here").unwrap_err();
        assert!(matches!(err, BarError::Read { .. }));
    }

    #[test]
    fn reads_real_proc_stat() {
        let mut pf = proc_file();
        let raw = pf.read(crate::PROC_STAT).unwrap();
        assert!(raw.starts_with(b"cpu"));
    }
}

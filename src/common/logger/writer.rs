use std::{
    collections::VecDeque,
    fs::{self, File, OpenOptions},
    io::{self, BufRead, BufReader, Write},
    path::PathBuf,
    sync::Arc,
};

use parking_lot::Mutex;

/// Log file capped at the newest `max_lines` lines. Trimming runs once a
/// tenth of the cap (at least 50 lines) has been appended since the last trim.
#[derive(Clone)]
pub struct CircularFileWriter {
    path: PathBuf,
    max_lines: usize,
    appended: Arc<Mutex<usize>>,
}

impl CircularFileWriter {
    pub fn new(path: impl Into<PathBuf>, max_lines: u32) -> Self {
        Self {
            path: path.into(),
            max_lines: max_lines.max(1) as usize,
            appended: Arc::new(Mutex::new(0)),
        }
    }

    fn trim_every(&self) -> usize {
        (self.max_lines / 10).max(50)
    }

    /// Rewrites the file with only its last `max_lines` lines.
    fn trim(&self) -> io::Result<()> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e),
        };

        let mut tail = VecDeque::with_capacity(self.max_lines + 1);
        let mut total = 0usize;
        for line in BufReader::new(file).lines() {
            tail.push_back(line?);
            if tail.len() > self.max_lines {
                tail.pop_front();
            }
            total += 1;
        }
        if total <= self.max_lines {
            return Ok(());
        }

        let mut kept = String::new();
        for line in tail {
            kept.push_str(&line);
            kept.push('\n');
        }
        fs::write(&self.path, kept)
    }
}

impl io::Write for CircularFileWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?
            .write_all(buf)?;

        let mut appended = self.appended.lock();
        *appended += buf.iter().filter(|&&b| b == b'\n').count();
        if *appended >= self.trim_every() {
            *appended = 0;
            if let Err(e) = self.trim() {
                eprintln!("Failed to trim log file {}: {}", self.path.display(), e);
            }
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for CircularFileWriter {
    type Writer = Self;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

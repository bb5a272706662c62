use std::path::{Path, PathBuf};

/// One playing instance of an asset: decoded samples plus a read cursor.
pub struct AudioClip {
    source: PathBuf,
    samples: Vec<i16>,
    cursor: usize,
}

impl AudioClip {
    pub fn new(source: impl Into<PathBuf>, samples: Vec<i16>) -> Self {
        Self {
            source: source.into(),
            samples,
            cursor: 0,
        }
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn remaining(&self) -> usize {
        self.samples.len() - self.cursor
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining() == 0
    }

    /// Adds the next `base.len()` samples (fewer near the end) onto `base`
    /// and consumes them.
    pub fn overlay_next(&mut self, base: &mut [i16]) {
        let take = base.len().min(self.remaining());
        let slice = &self.samples[self.cursor..self.cursor + take];
        for (out, &s) in base.iter_mut().zip(slice) {
            *out = out.saturating_add(s);
        }
        self.cursor += take;
    }
}

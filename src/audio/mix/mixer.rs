//! Overlays every triggered clip into one encoded stream.
//!
//! The transport pulls one frame every 20 ms through [`FrameSource`]. Clips
//! can be added at any time from the control path; they start sounding on
//! the next pulled frame and are dropped once their samples run out. Once a
//! frame comes back empty the session has ended and accepts no more clips.

use std::{collections::HashMap, path::Path, sync::Arc};

use bytes::Bytes;
use parking_lot::Mutex;
use tracing::{debug, error};

use super::{AudioClip, FrameSource};
use crate::{
    audio::{ClipDecoder, FrameEncoder, constants::FRAME_SIZE_SAMPLES},
    common::{AudioError, ClipHandle},
};

/// Frame-production state. Only the transport's polling context touches it,
/// apart from `release`.
struct FrameState {
    encoder: Option<Box<dyn FrameEncoder>>,
    pcm: Vec<i16>,
    packet: Vec<u8>,
}

#[derive(Default)]
struct ClipSet {
    playing: HashMap<ClipHandle, AudioClip>,
    /// Set once end-of-stream has been reported or the session released.
    ended: bool,
}

pub struct FrameMixer {
    clips: Mutex<ClipSet>,
    frame: Mutex<FrameState>,
    decoder: Arc<dyn ClipDecoder>,
}

impl FrameMixer {
    pub fn new(decoder: Arc<dyn ClipDecoder>, encoder: Box<dyn FrameEncoder>) -> Self {
        let input_len = encoder.required_input_len();
        Self {
            clips: Mutex::new(ClipSet::default()),
            frame: Mutex::new(FrameState {
                encoder: Some(encoder),
                pcm: Vec::with_capacity(input_len.max(FRAME_SIZE_SAMPLES)),
                packet: Vec::new(),
            }),
            decoder,
        }
    }

    /// Decodes `path` and starts it on the next frame.
    ///
    /// Decoding happens before the clip set is locked, so a slow asset never
    /// stalls frame production.
    pub fn add_clip(&self, path: &Path) -> Result<ClipHandle, AudioError> {
        if self.has_ended() {
            return Err(AudioError::SessionEnded);
        }

        let samples = self.decoder.decode(path)?;
        let handle = ClipHandle::next();
        let frames = samples.len().div_ceil(FRAME_SIZE_SAMPLES);
        let clip = AudioClip::new(path, samples);

        {
            let mut clips = self.clips.lock();
            if clips.ended {
                return Err(AudioError::SessionEnded);
            }
            clips.playing.insert(handle, clip);
        }
        debug!("Added {} ({}, {} frames)", handle, path.display(), frames);
        Ok(handle)
    }

    pub fn active_clips(&self) -> usize {
        self.clips.lock().playing.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clips.lock().playing.is_empty()
    }

    pub fn has_ended(&self) -> bool {
        self.clips.lock().ended
    }

    /// Whether `release` has run. A released mixer never yields audio again.
    pub fn is_released(&self) -> bool {
        self.frame.lock().encoder.is_none()
    }

    fn end(&self) -> usize {
        let mut clips = self.clips.lock();
        clips.ended = true;
        let dropped = clips.playing.len();
        clips.playing.clear();
        dropped
    }

    /// Overlays the next frame-duration slice of every clip onto silence and
    /// retires exhausted clips. Returns `false`, ending the session, if
    /// nothing was playing.
    fn overlay_frame(&self, pcm: &mut Vec<i16>) -> bool {
        pcm.clear();
        pcm.resize(FRAME_SIZE_SAMPLES, 0);

        let mut clips = self.clips.lock();
        if clips.playing.is_empty() {
            clips.ended = true;
            return false;
        }
        clips.playing.retain(|handle, clip| {
            clip.overlay_next(pcm.as_mut_slice());
            if clip.is_exhausted() {
                debug!("Retired {} ({})", handle, clip.source().display());
                return false;
            }
            true
        });
        true
    }
}

impl FrameSource for FrameMixer {
    fn next_frame(&self) -> Bytes {
        let mut state = self.frame.lock();
        let FrameState {
            encoder,
            pcm,
            packet,
        } = &mut *state;

        let Some(encoder) = encoder.as_mut() else {
            return Bytes::new();
        };

        if !self.overlay_frame(pcm) {
            return Bytes::new();
        }

        // Zero-pad or truncate to exactly what the codec consumes per call.
        pcm.resize(encoder.required_input_len(), 0);

        match encoder.encode(pcm, packet) {
            Ok(()) => Bytes::copy_from_slice(packet),
            Err(e) => {
                error!("Dropping mix after encoder failure: {}", e);
                self.end();
                Bytes::new()
            }
        }
    }

    fn is_encoded(&self) -> bool {
        true
    }

    fn release(&self) {
        // Taking the frame lock waits out an in-flight `next_frame`.
        let Some(encoder) = self.frame.lock().encoder.take() else {
            return;
        };
        drop(encoder);
        let dropped = self.end();
        debug!("Released mix session ({} clips dropped)", dropped);
    }
}

impl Drop for FrameMixer {
    fn drop(&mut self) {
        self.release();
    }
}

/// Linear-interpolation sample-rate converter for interleaved i16 PCM.
pub struct LinearResampler {
    /// Input frames consumed per output frame.
    step: f64,
    /// Read head, in input frames, relative to the start of the next block.
    position: f64,
    /// Last input frame of the previous block.
    previous: Vec<i16>,
    channels: usize,
}

impl LinearResampler {
    pub fn new(source_rate: u32, target_rate: u32, channels: usize) -> Self {
        Self {
            step: source_rate as f64 / target_rate as f64,
            position: 0.0,
            previous: vec![0; channels],
            channels,
        }
    }

    pub fn is_passthrough(&self) -> bool {
        (self.step - 1.0).abs() < f64::EPSILON
    }

    /// Resamples one block and appends the output to `output`.
    pub fn process(&mut self, input: &[i16], output: &mut Vec<i16>) {
        let frames = input.len() / self.channels;
        if frames == 0 {
            return;
        }

        let frame_at = |idx: isize, ch: usize| -> f64 {
            if idx < 0 {
                self.previous[ch] as f64
            } else {
                input[idx as usize * self.channels + ch] as f64
            }
        };

        // Interpolate between frame `floor(pos) - 1` and `floor(pos)`, so the
        // first output of a block can lean on the tail of the previous one.
        while self.position < frames as f64 {
            let whole = self.position.floor();
            let fract = self.position - whole;
            let right = whole as isize;
            for ch in 0..self.channels {
                let a = frame_at(right - 1, ch);
                let b = frame_at(right, ch);
                output.push((a + (b - a) * fract).round() as i16);
            }
            self.position += self.step;
        }

        self.position -= frames as f64;
        let last = (frames - 1) * self.channels;
        self.previous
            .copy_from_slice(&input[last..last + self.channels]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upsampling_doubles_the_frame_count() {
        let mut r = LinearResampler::new(24_000, 48_000, 2);
        let input: Vec<i16> = (0..200).map(|i| i as i16).collect();
        let mut out = Vec::new();
        r.process(&input, &mut out);
        assert_eq!(out.len(), 400);
    }

    #[test]
    fn downsampling_halves_the_frame_count() {
        let mut r = LinearResampler::new(96_000, 48_000, 1);
        let input = vec![100i16; 1000];
        let mut out = Vec::new();
        r.process(&input, &mut out);
        assert_eq!(out.len(), 500);
    }

    #[test]
    fn constant_signal_stays_constant_across_blocks() {
        let mut r = LinearResampler::new(44_100, 48_000, 2);
        let mut out = Vec::new();
        r.process(&vec![1000i16; 882], &mut out);
        r.process(&vec![1000i16; 882], &mut out);
        // The first two output frames still lean on the zeroed history.
        assert!(out[4..].iter().all(|&s| s == 1000));
    }
}

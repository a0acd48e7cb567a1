//! Streaming sample converter using rubato
//!
//! Down-mixes to mono, resamples to the target rate and quantizes to i16.
//! The resampler works on fixed input chunks; frames that do not fill a
//! chunk are carried over to the next buffer and pushed out by `flush`.
//! The resampler's output delay is trimmed from the start of each stream.

use rubato::{FftFixedIn, Resampler};

use crate::application::ports::{ConversionError, SampleConverter};
use crate::domain::audio::{AudioBuffer, AudioFormat};

/// Resampler input chunk size (frames)
const CHUNK_FRAMES: usize = 1024;

/// Resampler sub-chunks
const SUB_CHUNKS: usize = 2;

/// Upper bound on zero-fed chunks when draining the delay line
const MAX_FLUSH_CHUNKS: usize = 8;

pub struct RubatoConverter {
    target: AudioFormat,
    /// Resampler and the source rate it was built for
    resampler: Option<(u32, FftFixedIn<f32>)>,
    /// Mono frames waiting for a full resampler chunk
    pending: Vec<f32>,
    mono: Vec<f32>,
    /// Delay-line frames still to drop from the output
    skip: usize,
    /// Source frames received since the resampler was built
    frames_in: u64,
    /// Frames emitted since the resampler was built
    frames_out: u64,
}

impl RubatoConverter {
    pub fn new(target: AudioFormat) -> Self {
        Self {
            target,
            resampler: None,
            pending: Vec::new(),
            mono: Vec::new(),
            skip: 0,
            frames_in: 0,
            frames_out: 0,
        }
    }

    /// Frames held back until the next chunk fills up
    pub fn pending_frames(&self) -> usize {
        self.pending.len()
    }

    fn ensure_resampler(&mut self, source_rate: u32) -> Result<(), ConversionError> {
        if matches!(&self.resampler, Some((rate, _)) if *rate == source_rate) {
            return Ok(());
        }

        let resampler = FftFixedIn::<f32>::new(
            source_rate as usize,
            self.target.sample_rate as usize,
            CHUNK_FRAMES,
            SUB_CHUNKS,
            1,
        )
        .map_err(|e| ConversionError::UnsupportedFormat(format!("Resampler init failed: {}", e)))?;

        log::debug!(
            "Resampling {} Hz -> {} Hz",
            source_rate,
            self.target.sample_rate
        );
        self.pending.clear();
        self.skip = resampler.output_delay();
        self.frames_in = 0;
        self.frames_out = 0;
        self.resampler = Some((source_rate, resampler));
        Ok(())
    }

    /// Append resampled frames, dropping the leading delay
    fn emit(&mut self, frames: &[f32], output: &mut Vec<i16>) {
        let skipped = self.skip.min(frames.len());
        self.skip -= skipped;
        let kept = &frames[skipped..];
        self.frames_out += kept.len() as u64;
        self.push_frames(kept, output);
    }

    fn push_frames(&self, frames: &[f32], output: &mut Vec<i16>) {
        let channels = self.target.channels as usize;
        for &sample in frames {
            let value = quantize(sample);
            output.extend(std::iter::repeat(value).take(channels));
        }
    }
}

impl Default for RubatoConverter {
    fn default() -> Self {
        Self::new(AudioFormat::TARGET)
    }
}

/// Average interleaved channels into one
fn downmix(input: &AudioBuffer<'_>, mono: &mut Vec<f32>) {
    mono.clear();
    let channels = input.format.channels as usize;
    if channels == 1 {
        mono.extend_from_slice(input.samples);
        return;
    }
    mono.extend(
        input
            .samples
            .chunks_exact(channels)
            .map(|frame| frame.iter().sum::<f32>() / channels as f32),
    );
}

/// f32 in [-1, 1] to i16, clamping out-of-range input
fn quantize(sample: f32) -> i16 {
    if sample.is_nan() {
        return 0;
    }
    (sample.clamp(-1.0, 1.0) * i16::MAX as f32).round() as i16
}

impl SampleConverter for RubatoConverter {
    fn target(&self) -> AudioFormat {
        self.target
    }

    fn convert(
        &mut self,
        input: &AudioBuffer<'_>,
        output: &mut Vec<i16>,
    ) -> Result<usize, ConversionError> {
        if !input.format.is_valid() {
            return Err(ConversionError::UnsupportedFormat(input.format.to_string()));
        }
        if !self.target.is_valid() {
            return Err(ConversionError::UnsupportedFormat(format!(
                "target {}",
                self.target
            )));
        }

        let mut mono = std::mem::take(&mut self.mono);
        downmix(input, &mut mono);
        let before = output.len();

        if input.format.sample_rate == self.target.sample_rate {
            self.push_frames(&mono, output);
        } else {
            self.ensure_resampler(input.format.sample_rate)?;
            self.pending.extend_from_slice(&mono);
            self.frames_in += mono.len() as u64;

            let mut resampled: Vec<f32> = Vec::new();
            if let Some((_, resampler)) = self.resampler.as_mut() {
                let mut consumed = 0;
                loop {
                    let needed = resampler.input_frames_next();
                    if self.pending.len() - consumed < needed {
                        break;
                    }
                    let chunk = [&self.pending[consumed..consumed + needed]];
                    let out = resampler
                        .process(&chunk[..], None)
                        .map_err(|e| ConversionError::Failed(format!("Resampling failed: {}", e)))?;
                    resampled.extend_from_slice(&out[0]);
                    consumed += needed;
                }
                self.pending.drain(..consumed);
            }
            self.emit(&resampled, output);
        }

        self.mono = mono;
        Ok((output.len() - before) / self.target.channels as usize)
    }

    fn flush(&mut self, output: &mut Vec<i16>) -> Result<usize, ConversionError> {
        let Some((source_rate, resampler)) = self.resampler.as_mut() else {
            return Ok(0);
        };

        let expected = expected_frames(self.frames_in, *source_rate, self.target.sample_rate);
        let wanted = expected.saturating_sub(self.frames_out) as usize + self.skip;

        let mut tail: Vec<f32> = Vec::with_capacity(wanted);
        if !self.pending.is_empty() {
            let chunk = [&self.pending[..]];
            let out = resampler
                .process_partial(Some(&chunk[..]), None)
                .map_err(|e| ConversionError::Failed(format!("Resampling failed: {}", e)))?;
            tail.extend_from_slice(&out[0]);
        }
        let mut rounds = 0;
        while tail.len() < wanted && rounds < MAX_FLUSH_CHUNKS {
            let out = resampler
                .process_partial(None::<&[&[f32]]>, None)
                .map_err(|e| ConversionError::Failed(format!("Resampling failed: {}", e)))?;
            tail.extend_from_slice(&out[0]);
            rounds += 1;
        }
        tail.truncate(wanted);

        let before = output.len();
        self.emit(&tail, output);
        self.reset();
        Ok((output.len() - before) / self.target.channels as usize)
    }

    fn reset(&mut self) {
        self.resampler = None;
        self.pending.clear();
        self.skip = 0;
        self.frames_in = 0;
        self.frames_out = 0;
    }
}

/// Output length matching `frames` input frames, rounded to the nearest frame
fn expected_frames(frames: u64, from: u32, to: u32) -> u64 {
    if from == 0 {
        return 0;
    }
    (frames * to as u64 + from as u64 / 2) / from as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quantize_clamps_and_scales() {
        assert_eq!(quantize(0.0), 0);
        assert_eq!(quantize(1.0), i16::MAX);
        assert_eq!(quantize(-1.0), -i16::MAX);
        assert_eq!(quantize(2.5), i16::MAX);
        assert_eq!(quantize(-7.0), -i16::MAX);
        assert_eq!(quantize(f32::NAN), 0);
    }

    #[test]
    fn passthrough_at_target_rate() {
        let mut converter = RubatoConverter::default();
        let samples = [0.0f32, 0.5, -0.5, 1.0];
        let buffer = AudioBuffer::new(AudioFormat::new(44_100, 1), &samples);
        let mut out = Vec::new();

        let frames = converter.convert(&buffer, &mut out).unwrap();
        assert_eq!(frames, 4);
        assert_eq!(out, vec![0, 16384, -16384, i16::MAX]);
    }

    #[test]
    fn stereo_is_averaged_to_mono() {
        let mut converter = RubatoConverter::default();
        let samples = [1.0f32, 0.0, -0.5, -0.5];
        let buffer = AudioBuffer::new(AudioFormat::new(44_100, 2), &samples);
        let mut out = Vec::new();

        converter.convert(&buffer, &mut out).unwrap();
        assert_eq!(out, vec![16384, -16384]);
    }

    fn tone_48k(frames: usize) -> Vec<f32> {
        (0..frames)
            .map(|i| (i as f32 * 440.0 * std::f32::consts::TAU / 48_000.0).sin() * 0.5)
            .collect()
    }

    #[test]
    fn resamples_48k_to_44k() {
        let mut converter = RubatoConverter::default();
        let samples = tone_48k(4800);
        let mut out = Vec::new();

        for _ in 0..10 {
            let buffer = AudioBuffer::new(AudioFormat::new(48_000, 1), &samples);
            converter.convert(&buffer, &mut out).unwrap();
        }

        // One second of input, minus what is still buffered
        assert!(out.len() > 38_000, "too few frames: {}", out.len());
        assert!(out.len() <= 44_100, "too many frames: {}", out.len());
    }

    #[test]
    fn flush_completes_one_second_at_48k() {
        let mut converter = RubatoConverter::default();
        let samples = [0.5f32; 480];
        let mut out = Vec::new();

        for _ in 0..100 {
            let buffer = AudioBuffer::new(AudioFormat::new(48_000, 1), &samples);
            converter.convert(&buffer, &mut out).unwrap();
        }
        let flushed = converter.flush(&mut out).unwrap();

        assert!(flushed > 0);
        assert_eq!(out.len(), 44_100);
        assert_eq!(converter.pending_frames(), 0);
    }

    #[test]
    fn output_starts_without_delay_line_silence() {
        let mut converter = RubatoConverter::default();
        let samples = [0.5f32; 4800];
        let buffer = AudioBuffer::new(AudioFormat::new(48_000, 1), &samples);
        let mut out = Vec::new();
        converter.convert(&buffer, &mut out).unwrap();
        converter.flush(&mut out).unwrap();

        // Past the filter's onset ramp the constant input comes straight through
        let expected = quantize(0.5) as i32;
        for &sample in &out[64..256] {
            assert!((sample as i32 - expected).abs() < 1000, "{}", sample);
        }
    }

    #[test]
    fn flush_without_input_is_empty() {
        let mut converter = RubatoConverter::default();
        let mut out = Vec::new();
        assert_eq!(converter.flush(&mut out).unwrap(), 0);
        assert!(out.is_empty());
    }

    #[test]
    fn flush_at_target_rate_has_nothing_held_back() {
        let mut converter = RubatoConverter::default();
        let samples = [0.25f32; 300];
        let buffer = AudioBuffer::new(AudioFormat::TARGET, &samples);
        let mut out = Vec::new();
        converter.convert(&buffer, &mut out).unwrap();

        assert_eq!(converter.flush(&mut out).unwrap(), 0);
        assert_eq!(out.len(), 300);
    }

    #[test]
    fn converter_restarts_cleanly_after_flush() {
        let mut converter = RubatoConverter::default();
        let samples = tone_48k(9600);
        let buffer = AudioBuffer::new(AudioFormat::new(48_000, 1), &samples);

        let mut first = Vec::new();
        converter.convert(&buffer, &mut first).unwrap();
        converter.flush(&mut first).unwrap();

        let mut second = Vec::new();
        converter.convert(&buffer, &mut second).unwrap();
        converter.flush(&mut second).unwrap();

        assert_eq!(first.len(), 8_820);
        assert_eq!(first, second);
    }

    #[test]
    fn short_buffers_are_carried_over() {
        let mut converter = RubatoConverter::default();
        let samples = [0.1f32; 100];
        let buffer = AudioBuffer::new(AudioFormat::new(48_000, 1), &samples);
        let mut out = Vec::new();

        let frames = converter.convert(&buffer, &mut out).unwrap();
        assert_eq!(frames, 0);
        assert!(out.is_empty());
        assert_eq!(converter.pending_frames(), 100);
    }

    #[test]
    fn reset_drops_pending_frames() {
        let mut converter = RubatoConverter::default();
        let samples = [0.1f32; 100];
        let buffer = AudioBuffer::new(AudioFormat::new(48_000, 1), &samples);
        converter.convert(&buffer, &mut Vec::new()).unwrap();

        converter.reset();
        assert_eq!(converter.pending_frames(), 0);
    }

    #[test]
    fn invalid_input_format_is_an_error() {
        let mut converter = RubatoConverter::default();
        let samples = [0.1f32; 16];
        let buffer = AudioBuffer::new(AudioFormat::new(0, 1), &samples);
        let err = converter.convert(&buffer, &mut Vec::new()).unwrap_err();
        assert!(matches!(err, ConversionError::UnsupportedFormat(_)));
    }
}

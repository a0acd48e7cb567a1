//! Audio format value objects

use std::fmt;

/// Bit depth of the samples written to the output file
pub const TARGET_BITS_PER_SAMPLE: u16 = 16;

/// Sample rate of the output file (Hz)
pub const TARGET_SAMPLE_RATE: u32 = 44_100;

/// Sample rate and channel layout of a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AudioFormat {
    pub sample_rate: u32,
    pub channels: u16,
}

impl AudioFormat {
    /// Mono 16-bit PCM at 44.1kHz, the format every recording is stored in
    pub const TARGET: Self = Self {
        sample_rate: TARGET_SAMPLE_RATE,
        channels: 1,
    };

    pub const fn new(sample_rate: u32, channels: u16) -> Self {
        Self {
            sample_rate,
            channels,
        }
    }

    /// Whether the format can carry audio at all
    pub const fn is_valid(&self) -> bool {
        self.sample_rate > 0 && self.channels > 0
    }
}

impl fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let layout = match self.channels {
            1 => "mono".to_string(),
            2 => "stereo".to_string(),
            n => format!("{} ch", n),
        };
        write!(f, "{} Hz {}", self.sample_rate, layout)
    }
}

/// One buffer delivered by the input tap.
///
/// Samples are interleaved f32 in [-1.0, 1.0]. The buffer only lives for the
/// duration of the tap callback.
#[derive(Debug, Clone, Copy)]
pub struct AudioBuffer<'a> {
    pub format: AudioFormat,
    pub samples: &'a [f32],
}

impl<'a> AudioBuffer<'a> {
    pub fn new(format: AudioFormat, samples: &'a [f32]) -> Self {
        Self { format, samples }
    }

    /// Number of frames (samples per channel)
    pub fn frames(&self) -> usize {
        if self.format.channels == 0 {
            return 0;
        }
        self.samples.len() / self.format.channels as usize
    }

    pub fn is_empty(&self) -> bool {
        self.frames() == 0
    }

    /// Iterate over the samples of a single channel
    pub fn channel(&self, index: usize) -> impl Iterator<Item = f32> + 'a {
        let channels = self.format.channels.max(1) as usize;
        self.samples.iter().skip(index).step_by(channels).copied()
    }
}

/// Frame count of a converted buffer, proportional to the sample-rate ratio.
pub fn output_frame_capacity(input_frames: usize, from: AudioFormat, to: AudioFormat) -> usize {
    if from.sample_rate == 0 {
        return 0;
    }
    (input_frames as f64 * to.sample_rate as f64 / from.sample_rate as f64) as usize
}

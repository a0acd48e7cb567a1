//! WAV file output using hound
//!
//! One recording lives at a fixed path and is replaced on every session.

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::time::Duration;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};

use crate::application::ports::{RecordingStore, SampleSink, SinkError};
use crate::domain::audio::{AudioFormat, TARGET_BITS_PER_SAMPLE};

/// Recording store at a single fixed path
#[derive(Debug, Clone)]
pub struct WavFileStore {
    path: PathBuf,
}

impl WavFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn spec(format: AudioFormat) -> WavSpec {
        WavSpec {
            channels: format.channels,
            sample_rate: format.sample_rate,
            bits_per_sample: TARGET_BITS_PER_SAMPLE,
            sample_format: SampleFormat::Int,
        }
    }
}

impl RecordingStore for WavFileStore {
    fn create(&self, format: AudioFormat) -> Result<Box<dyn SampleSink>, SinkError> {
        if self.path.exists() {
            fs::remove_file(&self.path).map_err(|e| SinkError::RemoveFailed(e.to_string()))?;
        }
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| SinkError::CreateFailed(e.to_string()))?;
            }
        }

        let writer = WavWriter::create(&self.path, Self::spec(format))
            .map_err(|e| SinkError::CreateFailed(e.to_string()))?;
        log::debug!("Created {} ({})", self.path.display(), format);

        Ok(Box::new(WavFileSink { writer }))
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

/// An open WAV file
pub struct WavFileSink {
    writer: WavWriter<BufWriter<File>>,
}

impl SampleSink for WavFileSink {
    fn write(&mut self, samples: &[i16]) -> Result<(), SinkError> {
        if samples.is_empty() {
            return Ok(());
        }
        let len = u32::try_from(samples.len())
            .map_err(|_| SinkError::WriteFailed(format!("{} samples in one write", samples.len())))?;

        let mut batch = self.writer.get_i16_writer(len);
        for &sample in samples {
            batch.write_sample(sample);
        }
        batch
            .flush()
            .map_err(|e| SinkError::WriteFailed(e.to_string()))
    }

    fn finish(self: Box<Self>) -> Result<(), SinkError> {
        self.writer
            .finalize()
            .map_err(|e| SinkError::FinalizeFailed(e.to_string()))
    }
}

/// Summary of a finished recording
#[derive(Debug, Clone, PartialEq)]
pub struct RecordingInfo {
    pub format: AudioFormat,
    pub bits_per_sample: u16,
    pub frames: u32,
}

impl RecordingInfo {
    /// Read the header of a WAV file
    pub fn read(path: impl AsRef<Path>) -> Result<Self, hound::Error> {
        let reader = WavReader::open(path.as_ref())?;
        let spec = reader.spec();
        Ok(Self {
            format: AudioFormat::new(spec.sample_rate, spec.channels),
            bits_per_sample: spec.bits_per_sample,
            frames: reader.duration(),
        })
    }

    pub fn duration(&self) -> Duration {
        if self.format.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.frames as f64 / self.format.sample_rate as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_mono_16_bit_pcm() {
        let dir = tempfile::tempdir().unwrap();
        let store = WavFileStore::new(dir.path().join("simple.wav"));

        let mut sink = store.create(AudioFormat::TARGET).unwrap();
        sink.write(&[0, 1000, -1000, i16::MAX]).unwrap();
        sink.finish().unwrap();

        let mut reader = WavReader::open(store.path()).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.channels, 1);
        assert_eq!(spec.sample_rate, 44_100);
        assert_eq!(spec.bits_per_sample, 16);
        assert_eq!(spec.sample_format, SampleFormat::Int);
        let samples: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(samples, vec![0, 1000, -1000, i16::MAX]);
    }

    #[test]
    fn consecutive_writes_append() {
        let dir = tempfile::tempdir().unwrap();
        let store = WavFileStore::new(dir.path().join("simple.wav"));

        let mut sink = store.create(AudioFormat::TARGET).unwrap();
        sink.write(&[1, 2, 3]).unwrap();
        sink.write(&[]).unwrap();
        sink.write(&vec![-4; 4096]).unwrap();
        sink.write(&[5]).unwrap();
        sink.finish().unwrap();

        let mut reader = WavReader::open(store.path()).unwrap();
        let samples: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(samples.len(), 4100);
        assert_eq!(&samples[..3], &[1, 2, 3]);
        assert!(samples[3..4099].iter().all(|&s| s == -4));
        assert_eq!(samples[4099], 5);
    }

    #[test]
    fn create_replaces_previous_recording() {
        let dir = tempfile::tempdir().unwrap();
        let store = WavFileStore::new(dir.path().join("simple.wav"));

        let mut first = store.create(AudioFormat::TARGET).unwrap();
        first.write(&[7; 1000]).unwrap();
        first.finish().unwrap();

        let second = store.create(AudioFormat::TARGET).unwrap();
        second.finish().unwrap();

        let info = RecordingInfo::read(store.path()).unwrap();
        assert_eq!(info.frames, 0);
    }

    #[test]
    fn create_makes_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let store = WavFileStore::new(dir.path().join("nested/deeper/simple.wav"));
        store.create(AudioFormat::TARGET).unwrap().finish().unwrap();
        assert!(store.exists());
    }

    #[test]
    fn recording_info_duration() {
        let dir = tempfile::tempdir().unwrap();
        let store = WavFileStore::new(dir.path().join("simple.wav"));
        let mut sink = store.create(AudioFormat::TARGET).unwrap();
        sink.write(&vec![0; 22_050]).unwrap();
        sink.finish().unwrap();

        let info = RecordingInfo::read(store.path()).unwrap();
        assert_eq!(info.format, AudioFormat::TARGET);
        assert_eq!(info.frames, 22_050);
        assert_eq!(info.duration(), Duration::from_millis(500));
    }
}

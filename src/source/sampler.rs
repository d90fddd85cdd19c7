use super::{Frame, VideoBackend, VideoSource};
use crate::error::ExtractError;
use std::iter::FusedIterator;
use std::path::Path;

/// Most frames one run may emit; keeps sequence numbers within three digits
pub const MAX_SAMPLES: u32 = 1000;

/// Which stream ordinals a sampling run selects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplingPlan {
    max_frames: u32,
    interval: u64,
}

impl SamplingPlan {
    /// Derive the stride from the reported frame count.
    ///
    /// `interval = max(1, total_frame_count / max_frames)`, so a short or
    /// unknown-length stream falls back to taking every frame.
    pub fn new(total_frame_count: u64, max_frames: u32) -> Result<Self, ExtractError> {
        if max_frames == 0 {
            return Err(ExtractError::InvalidConfig(
                "max_frames must be at least 1".to_string(),
            ));
        }
        let interval = (total_frame_count / u64::from(max_frames)).max(1);
        Ok(Self {
            max_frames,
            interval,
        })
    }

    pub fn max_frames(&self) -> u32 {
        self.max_frames
    }

    pub fn interval(&self) -> u64 {
        self.interval
    }

    pub fn selects(&self, ordinal: u64) -> bool {
        ordinal % self.interval == 0
    }
}

/// A frame picked by the sampler
#[derive(Debug)]
pub struct SampledFrame {
    /// Position among the emitted frames (0, 1, 2, ...)
    pub sequence: u32,
    /// Zero-based position of the frame in the original stream
    pub ordinal: u64,
    pub frame: Frame,
}

/// Opens videos and samples up to `max_frames` evenly spaced frames from them
#[derive(Debug, Clone, Copy)]
pub struct FrameSampler {
    max_frames: u32,
}

impl FrameSampler {
    pub fn new(max_frames: u32) -> Result<Self, ExtractError> {
        if max_frames == 0 || max_frames > MAX_SAMPLES {
            return Err(ExtractError::InvalidConfig(format!(
                "max_frames must be between 1 and {MAX_SAMPLES}, got {max_frames}"
            )));
        }
        Ok(Self { max_frames })
    }

    /// Open `path` and start a sampling run over it
    pub fn open(
        &self,
        backend: &dyn VideoBackend,
        path: &Path,
    ) -> Result<SampledFrames, ExtractError> {
        let source = backend
            .open(path)
            .map_err(|source| ExtractError::SourceUnavailable {
                path: path.to_path_buf(),
                source,
            })?;
        self.sample(source)
    }

    /// Start a sampling run over an already opened source
    pub fn sample(&self, source: Box<dyn VideoSource>) -> Result<SampledFrames, ExtractError> {
        let total_frame_count = source.frame_count();
        let plan = SamplingPlan::new(total_frame_count, self.max_frames)?;
        Ok(SampledFrames {
            frame_rate: source.frame_rate(),
            total_frame_count,
            source,
            plan,
            ordinal: 0,
            emitted: 0,
            finished: false,
            released: false,
        })
    }
}

/// Lazy, single-pass iterator over the frames selected by a [`SamplingPlan`].
///
/// Every frame is decoded in order, selected or not, so ordinals stay aligned
/// with the stream even when the reported frame count is wrong. The source is
/// released exactly once: when the run ends, or when the iterator is dropped.
pub struct SampledFrames {
    source: Box<dyn VideoSource>,
    plan: SamplingPlan,
    total_frame_count: u64,
    frame_rate: f64,
    ordinal: u64,
    emitted: u32,
    finished: bool,
    released: bool,
}

impl SampledFrames {
    pub fn plan(&self) -> SamplingPlan {
        self.plan
    }

    pub fn total_frame_count(&self) -> u64 {
        self.total_frame_count
    }

    pub fn frame_rate(&self) -> f64 {
        self.frame_rate
    }

    /// Frames emitted so far
    pub fn emitted(&self) -> u32 {
        self.emitted
    }

    fn finish(&mut self) {
        self.finished = true;
        if !self.released {
            self.released = true;
            self.source.release();
        }
    }
}

impl Iterator for SampledFrames {
    type Item = Result<SampledFrame, ExtractError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.finished {
                return None;
            }
            if self.emitted >= self.plan.max_frames() {
                self.finish();
                return None;
            }

            let frame = match self.source.read_frame() {
                Ok(Some(frame)) => frame,
                Ok(None) => {
                    tracing::debug!("Stream exhausted after {} frames", self.ordinal);
                    self.finish();
                    return None;
                }
                Err(source) => {
                    self.finish();
                    return Some(Err(ExtractError::Decode {
                        ordinal: self.ordinal,
                        source,
                    }));
                }
            };

            let ordinal = self.ordinal;
            self.ordinal += 1;
            if !self.plan.selects(ordinal) {
                continue;
            }

            let sequence = self.emitted;
            self.emitted += 1;
            if self.emitted >= self.plan.max_frames() {
                // Nothing further will be selected
                self.finish();
            }
            return Some(Ok(SampledFrame {
                sequence,
                ordinal,
                frame,
            }));
        }
    }
}

impl FusedIterator for SampledFrames {}

impl Drop for SampledFrames {
    fn drop(&mut self) {
        self.finish();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::synthetic::{SyntheticBackend, SyntheticSource};
    use std::rc::Rc;

    fn ordinals(source: SyntheticSource, max_frames: u32) -> Vec<u64> {
        FrameSampler::new(max_frames)
            .unwrap()
            .sample(Box::new(source))
            .unwrap()
            .map(|s| s.unwrap().ordinal)
            .collect()
    }

    #[test]
    fn test_interval_formula() {
        assert_eq!(SamplingPlan::new(150, 15).unwrap().interval(), 10);
        assert_eq!(SamplingPlan::new(149, 15).unwrap().interval(), 9);
        assert_eq!(SamplingPlan::new(5, 15).unwrap().interval(), 1);
        assert_eq!(SamplingPlan::new(0, 15).unwrap().interval(), 1);
        assert_eq!(SamplingPlan::new(7, 1).unwrap().interval(), 7);
    }

    #[test]
    fn test_zero_max_frames_rejected() {
        assert!(matches!(
            SamplingPlan::new(100, 0),
            Err(ExtractError::InvalidConfig(_))
        ));
        assert!(matches!(
            FrameSampler::new(0),
            Err(ExtractError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_max_frames_capped_at_three_digit_names() {
        assert!(FrameSampler::new(MAX_SAMPLES).is_ok());
        assert!(matches!(
            FrameSampler::new(MAX_SAMPLES + 1),
            Err(ExtractError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_150_frames_sample_every_tenth() {
        let source = SyntheticSource::new(150).with_fps(0.0);
        let expected: Vec<u64> = (0..15).map(|i| i * 10).collect();
        assert_eq!(ordinals(source, 15), expected);
    }

    #[test]
    fn test_short_stream_yields_every_frame() {
        assert_eq!(ordinals(SyntheticSource::new(5), 15), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_unknown_frame_count_stops_at_max_frames() {
        let source = SyntheticSource::new(1_000).reporting(0);
        let decoded = Rc::clone(&source.decoded);
        assert_eq!(ordinals(source, 15), (0..15).collect::<Vec<_>>());
        assert_eq!(decoded.get(), 15);
    }

    #[test]
    fn test_overreported_count_stops_at_true_end() {
        // Metadata claims 300 frames, only 45 decode
        let source = SyntheticSource::new(45).reporting(300);
        assert_eq!(ordinals(source, 15), vec![0, 20, 40]);
    }

    #[test]
    fn test_emitted_count_matches_formula() {
        for total in [0u64, 1, 2, 5, 14, 15, 16, 29, 30, 31, 100, 149, 150, 151, 1000] {
            for max_frames in [1u32, 2, 3, 7, 15, 16, 50] {
                let interval = (total / u64::from(max_frames)).max(1);
                let expected = (u64::from(max_frames)).min(total.div_ceil(interval));
                let got = ordinals(SyntheticSource::new(total), max_frames);

                assert_eq!(got.len() as u64, expected, "T={total} M={max_frames}");
                assert!(got.len() <= max_frames as usize);
                for (i, ordinal) in got.iter().enumerate() {
                    assert_eq!(*ordinal, i as u64 * interval);
                }
            }
        }
    }

    #[test]
    fn test_sequence_numbers_are_dense() {
        let sequences: Vec<u32> = FrameSampler::new(15)
            .unwrap()
            .sample(Box::new(SyntheticSource::new(150)))
            .unwrap()
            .map(|s| s.unwrap().sequence)
            .collect();
        assert_eq!(sequences, (0..15).collect::<Vec<_>>());
    }

    #[test]
    fn test_frames_carry_stream_content() {
        let sampled: Vec<SampledFrame> = FrameSampler::new(3)
            .unwrap()
            .sample(Box::new(SyntheticSource::new(9)))
            .unwrap()
            .map(Result::unwrap)
            .collect();
        for s in &sampled {
            let expected = SyntheticSource::fill_value(s.ordinal);
            assert!(s.frame.as_raw().iter().all(|&b| b == expected));
        }
    }

    #[test]
    fn test_stops_decoding_after_last_selection() {
        let source = SyntheticSource::new(150);
        let decoded = Rc::clone(&source.decoded);
        let releases = Rc::clone(&source.releases);
        let count = ordinals(source, 15).len();
        assert_eq!(count, 15);
        assert_eq!(decoded.get(), 141);
        assert_eq!(releases.get(), 1);
    }

    #[test]
    fn test_released_once_on_exhaustion() {
        let source = SyntheticSource::new(5);
        let releases = Rc::clone(&source.releases);
        let mut frames = FrameSampler::new(15)
            .unwrap()
            .sample(Box::new(source))
            .unwrap();
        while frames.next().is_some() {}
        assert_eq!(releases.get(), 1);
        assert!(frames.next().is_none());
        drop(frames);
        assert_eq!(releases.get(), 1);
    }

    #[test]
    fn test_released_when_consumer_stops_early() {
        let source = SyntheticSource::new(150);
        let releases = Rc::clone(&source.releases);
        let mut frames = FrameSampler::new(15)
            .unwrap()
            .sample(Box::new(source))
            .unwrap();
        assert!(frames.next().is_some());
        assert_eq!(releases.get(), 0);
        drop(frames);
        assert_eq!(releases.get(), 1);
    }

    #[test]
    fn test_decode_error_ends_run() {
        let source = SyntheticSource::new(150).failing_at(25);
        let releases = Rc::clone(&source.releases);
        let results: Vec<_> = FrameSampler::new(15)
            .unwrap()
            .sample(Box::new(source))
            .unwrap()
            .collect();

        assert_eq!(results.len(), 4);
        assert!(results[..3].iter().all(Result::is_ok));
        assert!(matches!(
            results[3],
            Err(ExtractError::Decode { ordinal: 25, .. })
        ));
        assert_eq!(releases.get(), 1);
    }

    #[test]
    fn test_open_failure_is_source_unavailable() {
        let backend = SyntheticBackend::default();
        let result = FrameSampler::new(15)
            .unwrap()
            .open(&backend, Path::new("missing.mp4"));
        assert!(matches!(
            result,
            Err(ExtractError::SourceUnavailable { .. })
        ));
    }

    #[test]
    fn test_metadata_exposed() {
        let frames = FrameSampler::new(15)
            .unwrap()
            .sample(Box::new(SyntheticSource::new(150).with_fps(24.0)))
            .unwrap();
        assert_eq!(frames.total_frame_count(), 150);
        assert_eq!(frames.frame_rate(), 24.0);
        assert_eq!(frames.plan().interval(), 10);
        assert_eq!(frames.emitted(), 0);
    }
}

//! 视频采样 - 按固定采样率把时间片段抽成静帧序列

use super::error::MediaError;
use super::frame::{Frame, RawFrame};

/// 半开时间区间 [start_ms, end_ms)
///
/// 时长非正的区间是合法输入：采样直接产出空序列，不算错误。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    pub start_ms: u64,
    pub end_ms: u64,
}

impl Segment {
    pub fn new(start_ms: u64, end_ms: u64) -> Self {
        Self { start_ms, end_ms }
    }

    pub fn from_secs(start: f64, end: f64) -> Self {
        Self {
            start_ms: (start.max(0.0) * 1000.0).round() as u64,
            end_ms: (end.max(0.0) * 1000.0).round() as u64,
        }
    }

    pub fn duration_ms(&self) -> u64 {
        self.end_ms.saturating_sub(self.start_ms)
    }

    pub fn is_empty(&self) -> bool {
        self.end_ms <= self.start_ms
    }
}

/// 可解码的视频源
///
/// 句柄归调用方所有，采样器在一次运行期间独占借用。
pub trait MediaSource: Send {
    /// 总时长。元数据读取失败对整次运行是致命的。
    fn duration_ms(&self) -> Result<u64, MediaError>;

    /// 原始像素尺寸
    fn dimensions(&self) -> (u32, u32);

    /// 定位到时间点、等待解码稳定，然后截取当前画面。
    /// 单个时间点的失败可跳过，不应中止整批。
    fn decode_at(&mut self, timestamp_ms: u64) -> Result<Frame, MediaError>;
}

/// 惰性、有限、有序的帧快照序列
///
/// 采样点均匀覆盖 [start, end)：第 i 个时间戳 =
/// `start + i * duration / count`，首个采样点落在 start，
/// 不会越过 end。序列不可回退，重采样需要新的 `VideoSampler`。
pub struct VideoSampler<'a> {
    source: &'a mut dyn MediaSource,
    segment: Segment,
    sample_count: u64,
    next_index: u64,
    jpeg_quality: u8,
}

impl<'a> VideoSampler<'a> {
    pub const DEFAULT_JPEG_QUALITY: u8 = 92;

    pub fn new(
        source: &'a mut dyn MediaSource,
        segment: Segment,
        fps: u32,
    ) -> Result<Self, MediaError> {
        let duration_ms = source.duration_ms()?;

        // 区间钳制到视频时长之内
        let segment = Segment::new(
            segment.start_ms.min(duration_ms),
            segment.end_ms.min(duration_ms),
        );

        let sample_count = if segment.is_empty() || fps == 0 {
            0
        } else {
            segment.duration_ms() * fps as u64 / 1000
        };

        Ok(Self {
            source,
            segment,
            sample_count,
            next_index: 0,
            jpeg_quality: Self::DEFAULT_JPEG_QUALITY,
        })
    }

    pub fn with_quality(mut self, quality: u8) -> Self {
        self.jpeg_quality = quality;
        self
    }

    pub fn sample_count(&self) -> u64 {
        self.sample_count
    }

    /// 第 index 个采样点的时间戳（仅对 index < sample_count 有意义）
    pub fn timestamp_for(&self, index: u64) -> u64 {
        self.segment.start_ms + index * self.segment.duration_ms() / self.sample_count.max(1)
    }
}

impl Iterator for VideoSampler<'_> {
    type Item = Result<RawFrame, MediaError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next_index >= self.sample_count {
            return None;
        }

        let timestamp_ms = self.timestamp_for(self.next_index);
        self.next_index += 1;

        match self.source.decode_at(timestamp_ms) {
            // 快照始终带采样点时间戳，解码器的实际落点不影响帧身份
            Ok(frame) => Some(frame.to_jpeg(self.jpeg_quality).map(|jpeg_data| RawFrame {
                timestamp_ms,
                width: frame.width,
                height: frame.height,
                jpeg_data,
            })),
            Err(e) => Some(Err(e)),
        }
    }
}

/// 测试用合成视频源
pub struct MockMediaSource {
    duration_ms: u64,
    width: u32,
    height: u32,
    decode_calls: u64,
    fail_at: Vec<u64>,
    metadata_broken: bool,
}

impl MockMediaSource {
    pub fn new(duration_ms: u64) -> Self {
        Self {
            duration_ms,
            width: 64,
            height: 64,
            decode_calls: 0,
            fail_at: Vec::new(),
            metadata_broken: false,
        }
    }

    pub fn with_dimensions(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// 在给定时间戳上模拟解码失败
    pub fn failing_at(mut self, timestamps: Vec<u64>) -> Self {
        self.fail_at = timestamps;
        self
    }

    /// 模拟元数据读取失败
    pub fn broken_metadata(mut self) -> Self {
        self.metadata_broken = true;
        self
    }

    pub fn decode_calls(&self) -> u64 {
        self.decode_calls
    }
}

impl MediaSource for MockMediaSource {
    fn duration_ms(&self) -> Result<u64, MediaError> {
        if self.metadata_broken {
            return Err(MediaError::Metadata("synthetic metadata failure".into()));
        }
        Ok(self.duration_ms)
    }

    fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn decode_at(&mut self, timestamp_ms: u64) -> Result<Frame, MediaError> {
        self.decode_calls += 1;

        if self.fail_at.contains(&timestamp_ms) {
            return Err(MediaError::DecodeAt {
                timestamp_ms,
                reason: "synthetic decode failure".into(),
            });
        }

        // 亮度随时间变化，让相邻快照可区分
        let fill = (timestamp_ms / 10 % 256) as u8;
        let data = vec![fill; (self.width * self.height * 4) as usize];
        Ok(Frame::new(self.width, self.height, data, timestamp_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_count_is_floored() {
        let mut source = MockMediaSource::new(10_000);
        let sampler = VideoSampler::new(&mut source, Segment::new(0, 2000), 4).unwrap();
        assert_eq!(sampler.sample_count(), 8);

        let mut source = MockMediaSource::new(10_000);
        let sampler = VideoSampler::new(&mut source, Segment::new(0, 1500), 1).unwrap();
        assert_eq!(sampler.sample_count(), 1);

        let mut source = MockMediaSource::new(10_000);
        let sampler = VideoSampler::new(&mut source, Segment::new(0, 900), 1).unwrap();
        assert_eq!(sampler.sample_count(), 0);
    }

    #[test]
    fn test_timestamps_evenly_cover_segment() {
        let mut source = MockMediaSource::new(10_000);
        let frames: Vec<_> = VideoSampler::new(&mut source, Segment::new(0, 2000), 4)
            .unwrap()
            .map(|r| r.unwrap())
            .collect();

        let timestamps: Vec<u64> = frames.iter().map(|f| f.timestamp_ms).collect();
        assert_eq!(timestamps, vec![0, 250, 500, 750, 1000, 1250, 1500, 1750]);
    }

    #[test]
    fn test_timestamps_monotonic_and_in_range() {
        let mut source = MockMediaSource::new(10_000);
        let segment = Segment::new(500, 1500);
        let frames: Vec<_> = VideoSampler::new(&mut source, segment, 3)
            .unwrap()
            .map(|r| r.unwrap())
            .collect();

        assert_eq!(frames.len(), 3);
        assert_eq!(frames[0].timestamp_ms, segment.start_ms);

        let mut prev = None;
        for frame in &frames {
            assert!(frame.timestamp_ms >= segment.start_ms);
            assert!(frame.timestamp_ms < segment.end_ms);
            if let Some(p) = prev {
                assert!(frame.timestamp_ms > p);
            }
            prev = Some(frame.timestamp_ms);
        }
    }

    #[test]
    fn test_empty_segment_never_decodes() {
        let mut source = MockMediaSource::new(10_000);
        {
            let sampler = VideoSampler::new(&mut source, Segment::new(1000, 1000), 4).unwrap();
            assert_eq!(sampler.sample_count(), 0);
            assert_eq!(sampler.count(), 0);
        }
        assert_eq!(source.decode_calls(), 0);

        // 倒置区间同样产出空序列
        let mut source = MockMediaSource::new(10_000);
        {
            let sampler = VideoSampler::new(&mut source, Segment::new(2000, 1000), 4).unwrap();
            assert_eq!(sampler.sample_count(), 0);
        }
        assert_eq!(source.decode_calls(), 0);
    }

    #[test]
    fn test_segment_clamped_to_duration() {
        let mut source = MockMediaSource::new(1000);
        let sampler = VideoSampler::new(&mut source, Segment::new(0, 5000), 2).unwrap();
        // 钳制到 [0, 1000) 后：floor(1.0 * 2) = 2
        assert_eq!(sampler.sample_count(), 2);
    }

    #[test]
    fn test_decode_failure_is_per_sample() {
        let mut source = MockMediaSource::new(10_000).failing_at(vec![250]);
        let results: Vec<_> = VideoSampler::new(&mut source, Segment::new(0, 1000), 4)
            .unwrap()
            .collect();

        assert_eq!(results.len(), 4);
        assert!(results[0].is_ok());
        assert!(results[1].is_err());
        assert!(results[2].is_ok());
        assert!(results[3].is_ok());
    }

    #[test]
    fn test_metadata_failure_is_fatal() {
        let mut source = MockMediaSource::new(10_000).broken_metadata();
        let result = VideoSampler::new(&mut source, Segment::new(0, 1000), 4);
        assert!(matches!(result, Err(MediaError::Metadata(_))));
    }

    #[test]
    fn test_segment_from_secs() {
        let segment = Segment::from_secs(0.5, 2.25);
        assert_eq!(segment.start_ms, 500);
        assert_eq!(segment.end_ms, 2250);
        assert_eq!(segment.duration_ms(), 1750);
    }
}

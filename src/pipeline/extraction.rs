//! 提取管线 - 采样、逐帧分类、累积命中帧
//!
//! 严格串行：每个采样点都要等上一个的解码和远程分类结束
//! 才开始。这是有意的背压选择，解码器和远程服务都只承受
//! 单路负载，代价是总耗时。

use log::{info, warn};

use super::face_classifier::{FaceClassifier, FrameFilter};
use crate::core::cancel::CancelFlag;
use crate::core::progress::ProgressReporter;
use crate::core::video::{AcceptedFrame, MediaError, MediaSource, Segment, VideoSampler};

#[derive(Debug, Clone)]
pub struct ExtractionConfig {
    /// 快照 JPEG 质量
    pub jpeg_quality: u8,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self { jpeg_quality: 92 }
    }
}

#[derive(Debug)]
pub struct ExtractionOutcome {
    /// 命中帧，时间戳升序（即采样顺序），不重排也不去重
    pub frames: Vec<AcceptedFrame>,
    pub cancelled: bool,
    /// 走完的采样点数（含解码失败被跳过的）
    pub processed: u32,
}

pub struct ExtractionPipeline<'a> {
    classifier: &'a dyn FaceClassifier,
    progress: ProgressReporter,
    cancel: CancelFlag,
    config: ExtractionConfig,
}

impl<'a> ExtractionPipeline<'a> {
    pub fn new(
        classifier: &'a dyn FaceClassifier,
        progress: ProgressReporter,
        cancel: CancelFlag,
    ) -> Self {
        Self::with_config(classifier, progress, cancel, ExtractionConfig::default())
    }

    pub fn with_config(
        classifier: &'a dyn FaceClassifier,
        progress: ProgressReporter,
        cancel: CancelFlag,
        config: ExtractionConfig,
    ) -> Self {
        Self {
            classifier,
            progress,
            cancel,
            config,
        }
    }

    /// 跑完整个片段或跑到取消为止
    ///
    /// 元数据读不出来是整轮致命错误；单帧的解码失败或远程
    /// 分类失败只跳过那一帧。
    pub fn run(
        &self,
        source: &mut dyn MediaSource,
        segment: Segment,
        fps: u32,
        filter: &FrameFilter,
    ) -> Result<ExtractionOutcome, MediaError> {
        let (width, height) = source.dimensions();

        let mut sampler = match VideoSampler::new(source, segment, fps) {
            Ok(sampler) => sampler.with_quality(self.config.jpeg_quality),
            Err(e) => {
                // 对用户只给笼统提示，内部错误进日志
                warn!("Extraction aborted, media unreadable: {}", e);
                self.progress.set_message("Could not read the video");
                return Err(e);
            }
        };

        let total = sampler.sample_count() as u32;
        if total == 0 {
            info!("🎞️ Extraction: empty segment, nothing to sample");
            self.progress.begin(0, "Extracting frames...");
            self.progress.set_message("Found 0 frames");
            return Ok(ExtractionOutcome {
                frames: Vec::new(),
                cancelled: false,
                processed: 0,
            });
        }

        info!(
            "🎞️ Extraction started: {} samples @ {} fps ({}x{})",
            total, fps, width, height
        );
        self.progress.begin(total, "Extracting frames...");

        let mut frames: Vec<AcceptedFrame> = Vec::new();
        let mut processed: u32 = 0;
        let mut cancelled = false;

        loop {
            // 取消只在帧边界生效，进行中的调用照常收尾
            if self.cancel.is_cancelled() {
                cancelled = true;
                break;
            }

            let raw = match sampler.next() {
                None => break,
                Some(Ok(raw)) => raw,
                Some(Err(e)) => {
                    warn!("Skipping sample: {}", e);
                    processed += 1;
                    self.progress.step(processed);
                    continue;
                }
            };

            // 无论最终是否命中，先给观察者看当前帧
            self.progress.set_preview(&raw.jpeg_data);

            let answer = match self.classifier.classify(&raw, filter) {
                Ok(answer) => answer,
                Err(e) => {
                    // 远程失败按未命中处理，不中止整批
                    warn!("Classifier failed at {}ms: {}", raw.timestamp_ms, e);
                    String::new()
                }
            };

            if filter.matches(&answer) {
                frames.push(AcceptedFrame::new(raw, answer));
                self.progress.set_accepted(frames.len() as u32);
            }

            processed += 1;
            self.progress.step(processed);
        }

        let summary = if cancelled {
            format!("Extraction cancelled - found {} frames", frames.len())
        } else {
            format!("Found {} frames", frames.len())
        };
        self.progress.set_message(&summary);
        info!(
            "🎞️ Extraction finished: {} accepted / {} processed (cancelled: {})",
            frames.len(),
            processed,
            cancelled
        );

        Ok(ExtractionOutcome {
            frames,
            cancelled,
            processed,
        })
    }
}

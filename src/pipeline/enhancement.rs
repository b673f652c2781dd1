//! 增强管线 - 逐帧调用远程增强，身份参考帧全轮共用
//!
//! 与提取同样严格串行、同样的取消纪律。单帧"无图"或远程
//! 失败只跳过该帧，整轮照常跑完。

use log::{debug, info, warn};

use super::frame_enhancer::FrameEnhancer;
use crate::core::cancel::CancelFlag;
use crate::core::progress::ProgressReporter;
use crate::core::video::{AcceptedFrame, EnhancedImage};

#[derive(Debug)]
pub struct EnhancementOutcome {
    /// 产出图，处理顺序追加
    pub images: Vec<EnhancedImage>,
    pub cancelled: bool,
    pub processed: u32,
}

pub struct EnhancementPipeline<'a> {
    enhancer: &'a dyn FrameEnhancer,
    progress: ProgressReporter,
    cancel: CancelFlag,
}

impl<'a> EnhancementPipeline<'a> {
    pub fn new(
        enhancer: &'a dyn FrameEnhancer,
        progress: ProgressReporter,
        cancel: CancelFlag,
    ) -> Self {
        Self {
            enhancer,
            progress,
            cancel,
        }
    }

    /// 跑完选中帧或跑到取消为止
    ///
    /// 空选择本应由调用方拦住；真的进来就直接给零结果。
    pub fn run(&self, selected: &[AcceptedFrame], colorize: bool) -> EnhancementOutcome {
        if selected.is_empty() {
            debug!("Enhancement invoked with empty selection");
            self.progress.set_message("Produced 0 images");
            return EnhancementOutcome {
                images: Vec::new(),
                cancelled: false,
                processed: 0,
            };
        }

        // 参考帧固定取存储顺序的中间一帧，整轮不再重选
        let reference = &selected[selected.len() / 2].frame;

        let total = selected.len() as u32;
        info!(
            "✨ Enhancement started: {} frames (reference at {}ms, colorize: {})",
            total, reference.timestamp_ms, colorize
        );
        self.progress.begin(total, "Enhancing frames...");

        let mut images: Vec<EnhancedImage> = Vec::new();
        let mut processed: u32 = 0;
        let mut cancelled = false;

        for (position, accepted) in selected.iter().enumerate() {
            if self.cancel.is_cancelled() {
                cancelled = true;
                break;
            }

            let target = &accepted.frame;
            match self.enhancer.enhance(target, Some(reference), colorize) {
                Ok(Some(payload)) => {
                    let image = EnhancedImage::new(
                        position,
                        target.timestamp_ms,
                        payload.mime_type,
                        payload.data,
                    );
                    self.progress.set_preview(&image.image_data);
                    images.push(image);
                    self.progress.set_accepted(images.len() as u32);
                }
                Ok(None) => {
                    warn!("Enhancer produced no image for {}ms", target.timestamp_ms);
                }
                Err(e) => {
                    warn!("Enhancer failed at {}ms: {}", target.timestamp_ms, e);
                }
            }

            processed += 1;
            self.progress.step(processed);
        }

        let summary = if cancelled {
            format!("Enhancement cancelled - produced {} images", images.len())
        } else {
            format!("Produced {} images", images.len())
        };
        self.progress.set_message(&summary);
        info!(
            "✨ Enhancement finished: {} produced / {} processed (cancelled: {})",
            images.len(),
            processed,
            cancelled
        );

        EnhancementOutcome {
            images,
            cancelled,
            processed,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::core::video::RawFrame;
    use crate::pipeline::frame_enhancer::{EnhancedPayload, EnhancerError, MockFrameEnhancer};

    fn accepted(timestamp_ms: u64) -> AcceptedFrame {
        AcceptedFrame::new(
            RawFrame {
                timestamp_ms,
                width: 4,
                height: 4,
                jpeg_data: vec![0xFF],
            },
            "Yes".to_string(),
        )
    }

    fn pipeline_parts() -> (ProgressReporter, CancelFlag) {
        (ProgressReporter::new(), CancelFlag::new())
    }

    #[test]
    fn test_three_frames_use_middle_reference() {
        let seen_refs = Arc::new(Mutex::new(Vec::new()));
        let refs = seen_refs.clone();
        let enhancer = MockFrameEnhancer::with_behavior(move |_, reference, _| {
            refs.lock().unwrap().push(reference.unwrap().timestamp_ms);
            Ok(Some(EnhancedPayload {
                mime_type: "image/png".to_string(),
                data: vec![1],
            }))
        });

        let (progress, cancel) = pipeline_parts();
        let pipeline = EnhancementPipeline::new(&enhancer, progress, cancel);

        let selected = vec![accepted(250), accepted(500), accepted(750)];
        let outcome = pipeline.run(&selected, true);

        // 3 帧的参考帧是第 1 号（t=500），三次调用都用它
        assert_eq!(*seen_refs.lock().unwrap(), vec![500, 500, 500]);

        assert_eq!(outcome.images.len(), 3);
        let originals: Vec<u64> = outcome
            .images
            .iter()
            .map(|i| i.original_timestamp_ms)
            .collect();
        assert_eq!(originals, vec![250, 500, 750]);
    }

    #[test]
    fn test_reference_index_is_floor_half() {
        for (n, expected_index) in [(1usize, 0usize), (2, 1), (4, 2), (8, 4)] {
            let seen_refs = Arc::new(Mutex::new(Vec::new()));
            let refs = seen_refs.clone();
            let enhancer = MockFrameEnhancer::with_behavior(move |_, reference, _| {
                refs.lock().unwrap().push(reference.unwrap().timestamp_ms);
                Ok(None)
            });

            let (progress, cancel) = pipeline_parts();
            let pipeline = EnhancementPipeline::new(&enhancer, progress, cancel);

            let selected: Vec<AcceptedFrame> =
                (0..n as u64).map(|i| accepted(i * 100)).collect();
            pipeline.run(&selected, false);

            let expected = (expected_index as u64) * 100;
            assert!(
                seen_refs.lock().unwrap().iter().all(|&t| t == expected),
                "n={}: expected reference {}",
                n,
                expected
            );
        }
    }

    #[test]
    fn test_ids_derive_from_timestamp_and_position() {
        let enhancer = MockFrameEnhancer::always_producing();
        let (progress, cancel) = pipeline_parts();
        let pipeline = EnhancementPipeline::new(&enhancer, progress, cancel);

        let selected = vec![accepted(250), accepted(500), accepted(750)];
        let outcome = pipeline.run(&selected, false);

        let ids: Vec<&str> = outcome.images.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["enh-250-0", "enh-500-1", "enh-750-2"]);
    }

    #[test]
    fn test_no_image_for_every_call_still_completes() {
        let enhancer = MockFrameEnhancer::never_producing();
        let (progress, cancel) = pipeline_parts();
        let pipeline = EnhancementPipeline::new(&enhancer, progress.clone(), cancel);

        let selected = vec![accepted(0), accepted(100), accepted(200)];
        let outcome = pipeline.run(&selected, false);

        assert!(outcome.images.is_empty());
        assert_eq!(outcome.processed, 3);
        assert!(!outcome.cancelled);
        assert_eq!(progress.snapshot().message, "Produced 0 images");
    }

    #[test]
    fn test_remote_failure_skips_frame_only() {
        let calls = Arc::new(AtomicU32::new(0));
        let calls_seen = calls.clone();
        let enhancer = MockFrameEnhancer::with_behavior(move |_, _, _| {
            let n = calls_seen.fetch_add(1, Ordering::SeqCst) + 1;
            if n == 2 {
                Err(EnhancerError::Payload(base64::DecodeError::InvalidPadding))
            } else {
                Ok(Some(EnhancedPayload {
                    mime_type: "image/png".to_string(),
                    data: vec![n as u8],
                }))
            }
        });

        let (progress, cancel) = pipeline_parts();
        let pipeline = EnhancementPipeline::new(&enhancer, progress, cancel);

        let selected = vec![accepted(0), accepted(100), accepted(200)];
        let outcome = pipeline.run(&selected, false);

        assert_eq!(outcome.processed, 3);
        assert_eq!(outcome.images.len(), 2);
        let originals: Vec<u64> = outcome
            .images
            .iter()
            .map(|i| i.original_timestamp_ms)
            .collect();
        assert_eq!(originals, vec![0, 200]);
    }

    #[test]
    fn test_cancellation_keeps_finished_prefix() {
        let (progress, cancel) = pipeline_parts();

        let cancel_from_remote = cancel.clone();
        let calls = Arc::new(AtomicU32::new(0));
        let calls_seen = calls.clone();
        let enhancer = MockFrameEnhancer::with_behavior(move |_, _, _| {
            let n = calls_seen.fetch_add(1, Ordering::SeqCst) + 1;
            if n == 2 {
                cancel_from_remote.cancel();
            }
            Ok(Some(EnhancedPayload {
                mime_type: "image/png".to_string(),
                data: vec![n as u8],
            }))
        });

        let pipeline = EnhancementPipeline::new(&enhancer, progress, cancel);
        let selected: Vec<AcceptedFrame> = (0..5).map(|i| accepted(i * 100)).collect();
        let outcome = pipeline.run(&selected, false);

        // 第 2 帧途中取消：它照常落账，第 3 帧起不再处理
        assert!(outcome.cancelled);
        assert_eq!(outcome.processed, 2);
        assert_eq!(outcome.images.len(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_empty_selection_is_noop() {
        let enhancer = MockFrameEnhancer::always_producing();
        let (progress, cancel) = pipeline_parts();
        let pipeline = EnhancementPipeline::new(&enhancer, progress, cancel);

        let outcome = pipeline.run(&[], true);

        assert!(outcome.images.is_empty());
        assert_eq!(outcome.processed, 0);
        assert!(!outcome.cancelled);
    }
}

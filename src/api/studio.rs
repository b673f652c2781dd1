//! 门面 - 一次完整的提取 / 选择 / 裁剪 / 增强会话
//!
//! ```no_run
//! use portrait_lib::api::PortraitStudio;
//! use portrait_lib::core::video::{MockMediaSource, Segment};
//! use portrait_lib::pipeline::{FrameFilter, ServiceConfig};
//!
//! let mut studio = PortraitStudio::with_remote(ServiceConfig::new("api-key"));
//! let mut source = MockMediaSource::new(10_000);
//! studio.extract(&mut source, Segment::new(0, 2000), 4, &FrameFilter::AnyFace).unwrap();
//! studio.select_all();
//! let images = studio.enhance_selection(false).unwrap();
//! ```

use log::info;
use thiserror::Error;

use crate::core::cancel::CancelFlag;
use crate::core::progress::{ProgressReporter, ProgressSnapshot};
use crate::core::selection::{SelectionError, SelectionStore};
use crate::core::video::{
    AcceptedFrame, CropError, CropRect, EnhancedImage, MediaError, MediaSource, Segment,
};
use crate::pipeline::{
    EnhancementPipeline, ExtractionConfig, ExtractionPipeline, FaceClassifier, FrameEnhancer,
    FrameFilter, GeminiFaceClassifier, GeminiFrameEnhancer, RunState, ServiceConfig,
};

#[derive(Debug, Error)]
pub enum StudioError {
    #[error("A run is already in progress")]
    Busy,
    #[error("No frames selected")]
    NothingSelected,
    #[error("No extracted frame at {timestamp_ms}ms")]
    UnknownFrame { timestamp_ms: u64 },
    #[error("Media error: {0}")]
    Media(#[from] MediaError),
    #[error("Selection error: {0}")]
    Selection(#[from] SelectionError),
    #[error("Crop error: {0}")]
    Crop(#[from] CropError),
}

/// 提取 / 增强会话
///
/// 同一时刻最多一条管线在跑；提取、选择、裁剪、增强的结果
/// 都留在会话里，新一轮提取开始时整体清空。
pub struct PortraitStudio {
    classifier: Box<dyn FaceClassifier>,
    enhancer: Box<dyn FrameEnhancer>,
    progress: ProgressReporter,
    cancel: CancelFlag,
    state: RunState,
    config: ExtractionConfig,
    accepted: Vec<AcceptedFrame>,
    selection: SelectionStore,
    enhanced: Vec<EnhancedImage>,
}

impl PortraitStudio {
    pub fn new(classifier: Box<dyn FaceClassifier>, enhancer: Box<dyn FrameEnhancer>) -> Self {
        info!("🎬 PortraitStudio: created");
        Self {
            classifier,
            enhancer,
            progress: ProgressReporter::new(),
            cancel: CancelFlag::new(),
            state: RunState::new(),
            config: ExtractionConfig::default(),
            accepted: Vec::new(),
            selection: SelectionStore::new(),
            enhanced: Vec::new(),
        }
    }

    /// 用同一份服务配置建两个远程客户端
    pub fn with_remote(config: ServiceConfig) -> Self {
        Self::new(
            Box::new(GeminiFaceClassifier::new(config.clone())),
            Box::new(GeminiFrameEnhancer::new(config)),
        )
    }

    /// 提取入口：采样 + 逐帧分类，结果留在会话里
    ///
    /// 视频源在运行期间被独占借用，返回即归还，所有退出
    /// 路径都一样。
    pub fn extract(
        &mut self,
        source: &mut dyn MediaSource,
        segment: Segment,
        fps: u32,
        filter: &FrameFilter,
    ) -> Result<&[AcceptedFrame], StudioError> {
        if !self.state.can_start() {
            return Err(StudioError::Busy);
        }

        // 新一轮运行清掉上一轮的全部结果
        self.accepted.clear();
        self.selection.clear();
        self.enhanced.clear();
        self.cancel.reset();

        self.state = RunState::Extracting;
        let pipeline = ExtractionPipeline::with_config(
            self.classifier.as_ref(),
            self.progress.clone(),
            self.cancel.clone(),
            self.config.clone(),
        );

        match pipeline.run(source, segment, fps, filter) {
            Ok(outcome) => {
                self.accepted = outcome.frames;
                self.state = RunState::Idle;
                Ok(&self.accepted)
            }
            Err(e) => {
                self.state = RunState::Error;
                Err(e.into())
            }
        }
    }

    /// 把一个已提取帧替换成它的裁剪版（时间戳不变）
    pub fn crop_frame(&mut self, timestamp_ms: u64, rect: &CropRect) -> Result<(), StudioError> {
        if self.state.is_active() {
            return Err(StudioError::Busy);
        }

        let quality = self.config.jpeg_quality;
        let entry = self
            .accepted
            .iter_mut()
            .find(|f| f.frame.timestamp_ms == timestamp_ms)
            .ok_or(StudioError::UnknownFrame { timestamp_ms })?;

        entry.frame = entry.frame.cropped(rect, quality)?;
        Ok(())
    }

    /// 切换一帧的选中状态；满 8 帧后返回容量错误
    pub fn toggle_selection(&mut self, timestamp_ms: u64) -> Result<bool, StudioError> {
        if !self
            .accepted
            .iter()
            .any(|f| f.timestamp_ms() == timestamp_ms)
        {
            return Err(StudioError::UnknownFrame { timestamp_ms });
        }
        Ok(self.selection.toggle(timestamp_ms)?)
    }

    /// 选中前 8 个已提取帧（超出部分静默截断）
    pub fn select_all(&mut self) {
        let candidates: Vec<u64> = self.accepted.iter().map(|f| f.timestamp_ms()).collect();
        self.selection.select_all(&candidates);
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    /// 增强入口：逐帧调远程增强，结果留在会话里
    pub fn enhance_selection(
        &mut self,
        colorize: bool,
    ) -> Result<&[EnhancedImage], StudioError> {
        if !self.state.can_start() {
            return Err(StudioError::Busy);
        }
        if self.selection.is_empty() {
            return Err(StudioError::NothingSelected);
        }

        // 按选择的存储顺序取帧；重复时间戳取第一个匹配
        let selected: Vec<AcceptedFrame> = self
            .selection
            .timestamps()
            .iter()
            .filter_map(|&ts| {
                self.accepted
                    .iter()
                    .find(|f| f.timestamp_ms() == ts)
                    .cloned()
            })
            .collect();

        self.enhanced.clear();
        self.cancel.reset();
        self.state = RunState::Enhancing;

        let pipeline = EnhancementPipeline::new(
            self.enhancer.as_ref(),
            self.progress.clone(),
            self.cancel.clone(),
        );
        let outcome = pipeline.run(&selected, colorize);

        self.enhanced = outcome.images;
        self.state = RunState::Done;
        Ok(&self.enhanced)
    }

    /// 取消入口：当前帧收尾后两条管线都会停
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// 读取进度快照
    pub fn progress(&self) -> ProgressSnapshot {
        self.progress.snapshot()
    }

    pub fn run_state(&self) -> RunState {
        self.state
    }

    pub fn accepted_frames(&self) -> &[AcceptedFrame] {
        &self.accepted
    }

    pub fn enhanced_images(&self) -> &[EnhancedImage] {
        &self.enhanced
    }

    pub fn selection(&self) -> &SelectionStore {
        &self.selection
    }
}

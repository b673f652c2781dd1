//! 帧提取与增强管线
//!
//! 核心流程：
//! 1. 视频采样 - 按固定 fps 把选定片段抽成 JPEG 快照
//! 2. 逐帧分类 - 远程判定人脸/性别，命中才保留
//! 3. 帧选择 - 最多 8 帧进入增强（可先裁剪）
//! 4. 逐帧增强 - 以选择的中间帧为身份参考做修复/上色
//!
//! 两条管线都严格串行执行，一次只有一条在跑；
//! 取消是协作式的，只在帧边界生效。

pub mod enhancement;
pub mod extraction;
pub mod face_classifier;
pub mod frame_enhancer;
pub mod remote;
pub mod run_state;

pub use enhancement::{EnhancementOutcome, EnhancementPipeline};
pub use extraction::{ExtractionConfig, ExtractionOutcome, ExtractionPipeline};
pub use face_classifier::{
    ClassifierError, FaceClassifier, FrameFilter, GeminiFaceClassifier, MockFaceClassifier,
};
pub use frame_enhancer::{
    EnhancedPayload, EnhancerError, FrameEnhancer, GeminiFrameEnhancer, MockFrameEnhancer,
};
pub use remote::ServiceConfig;
pub use run_state::RunState;

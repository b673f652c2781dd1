pub mod crop;
pub mod error;
pub mod frame;
pub mod sampler;

pub use crop::{CropError, CropRect};
pub use error::MediaError;
pub use frame::{AcceptedFrame, EnhancedImage, Frame, RawFrame};
pub use sampler::{MediaSource, MockMediaSource, Segment, VideoSampler};

pub mod api;
pub mod core;
pub mod pipeline;

pub use crate::api::{PortraitStudio, StudioError};
pub use crate::core::video::{RawFrame, Segment};
pub use crate::pipeline::{FrameFilter, ServiceConfig};

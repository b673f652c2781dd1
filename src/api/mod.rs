pub mod studio;

pub use studio::{PortraitStudio, StudioError};

pub mod cancel;
pub mod progress;
pub mod selection;
pub mod video;

pub use cancel::CancelFlag;
pub use progress::{ProgressReporter, ProgressSnapshot};
pub use selection::{SelectionError, SelectionStore, MAX_SELECTED};

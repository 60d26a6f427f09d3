//! Small helpers shared by the viewer and the demo.

pub mod text;
pub mod time;

pub use text::slugify;
pub use time::{FrameClock, Timer};

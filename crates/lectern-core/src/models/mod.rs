//! Data models for the application
//!
//! Lesson-facing records and the video metadata value produced by the
//! extraction pipeline.

mod lesson;
mod video;

pub use lesson::*;
pub use video::*;

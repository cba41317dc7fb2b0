//! Prompt geometry and cursor-position mathematics.
//!
//! Both pieces are pure functions with no I/O — the Display Engine is the
//! only caller that touches a terminal. Keeping them in one crate below
//! `core-render` mirrors the teacher's `core-model::layout` placement:
//! geometry is a leaf that higher layers consult, never the reverse.

pub mod cursor;
pub mod prompt;

pub use cursor::{CursorPosition, footprint, offset_for, position_at};
pub use prompt::Prompt;

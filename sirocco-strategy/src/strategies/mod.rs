//! Bundled reference strategies.

mod ma_cross;

pub use ma_cross::{MaCrossParams, MaCrossStrategy};

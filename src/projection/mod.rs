
pub mod diff;
pub mod sorted_index;
pub mod window;

pub mod derived;
pub mod diff_log;

pub use derived::{DerivedView, ViewConfig, ViewOptions};

pub mod item;
pub mod vec;

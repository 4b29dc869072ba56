//! Data models for Open House

mod guest;
mod owner;
mod property;
mod settings;

pub use guest::*;
pub use owner::*;
pub use property::*;
pub use settings::*;

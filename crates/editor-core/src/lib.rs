mod core;
mod edit;
pub mod html;
pub mod inline;
mod ops;
mod plugin;

pub use crate::core::*;
pub use crate::ops::*;
pub use crate::plugin::*;

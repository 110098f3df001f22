// trs-inspect: pull translation, rotation and scale back out of a world matrix

pub mod config;
pub mod error;
pub mod frame;
pub mod math;
pub mod renderer;
pub mod scene;

pub use error::{DecomposeError, DecomposeResult};
pub use math::{Decomposition, Transform};

pub mod engine;
pub mod indicators;
pub mod scoring;


pub use engine::*;
pub use indicators::*;
pub use scoring::*;

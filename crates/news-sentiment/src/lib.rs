pub mod lexicon;
pub mod window;

pub use lexicon::HeadlineScorer;
pub use window::{mean_or_zero, window_average};

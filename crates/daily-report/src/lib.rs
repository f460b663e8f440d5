mod assembler;
mod narrator;
mod renderer;

pub use assembler::{build_report_text, narrative_prompt, REPORT_NEWS_LIMIT};
pub use narrator::{narrate_or_fallback, NarratorClient};
pub use renderer::render_to_file;

use chrono::NaiveDate;
use digest_core::DigestError;
use std::path::{Path, PathBuf};

/// Write the final report to `daily-report-YYYY-MM-DD.md` under `dir` and
/// return the path.
pub fn render_to_file(day: NaiveDate, report: &str, dir: &Path) -> Result<PathBuf, DigestError> {
    let path = dir.join(format!("daily-report-{}.md", day.format("%Y-%m-%d")));
    std::fs::write(&path, report).map_err(|e| DigestError::Io(e.to_string()))?;
    Ok(path)
}

//! Candidate enumeration: the `.srt` files directly inside one directory.

use crate::naming::SubtitleFile;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::{trace, warn};

/// List regular files in `dir` (no recursion) whose extension is `srt` in
/// any case, ordered case-insensitively by name.
pub fn list_candidates(dir: &Path) -> Result<Vec<SubtitleFile>> {
    trace!("list_candidates dir={}", dir.display());
    let mut files = Vec::new();
    let entries = fs::read_dir(dir).with_context(|| format!("listing {}", dir.display()))?;
    for entry in entries {
        let path = entry
            .with_context(|| format!("listing {}", dir.display()))?
            .path();
        let is_srt = path
            .extension()
            .map(|e| e.eq_ignore_ascii_case("srt"))
            .unwrap_or(false);
        if !is_srt || !path.is_file() {
            continue;
        }
        match SubtitleFile::from_path(&path) {
            Some(file) => files.push(file),
            None => warn!("skipping {}: name is not valid UTF-8", path.display()),
        }
    }
    files.sort_by(|a, b| {
        a.name
            .to_lowercase()
            .cmp(&b.name.to_lowercase())
            .then_with(|| a.name.cmp(&b.name))
    });
    Ok(files)
}

//! Discovery of cached profile artifacts in the scratch directory.

use globset::{Glob, GlobMatcher};
use serde::Serialize;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::{PprofError, PprofResult, RUN_ARTIFACT_PREFIX};

#[derive(Debug, Clone, Serialize)]
pub struct CacheEntry {
    pub path: PathBuf,
    pub tag: String,
    pub function: String,
    pub digest: String,
    pub bytes: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified: Option<String>,
}

/// Lists run artifacts directly inside `scratch_dir`, sorted by path.
pub fn find_cached_runs(scratch_dir: &Path) -> PprofResult<Vec<CacheEntry>> {
    if !scratch_dir.is_dir() {
        return Ok(Vec::new());
    }
    let matcher = run_artifact_matcher()?;
    let mut out = Vec::new();
    for entry in WalkDir::new(scratch_dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|e| {
            let msg = e.to_string();
            PprofError::Io(
                e.into_io_error()
                    .unwrap_or_else(|| std::io::Error::other(msg)),
            )
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(name) = entry.file_name().to_str() else {
            continue;
        };
        if !matcher.is_match(name) {
            continue;
        }
        let Some((tag, function, digest)) = parse_run_artifact_name(name) else {
            tracing::debug!("skipping unrecognised artifact name {name}");
            continue;
        };
        let meta = entry.metadata().map_err(|e| {
            let msg = e.to_string();
            PprofError::Io(
                e.into_io_error()
                    .unwrap_or_else(|| std::io::Error::other(msg)),
            )
        })?;
        let modified = meta
            .modified()
            .ok()
            .and_then(|t| OffsetDateTime::from(t).format(&Rfc3339).ok());
        out.push(CacheEntry {
            path: entry.path().to_path_buf(),
            tag,
            function,
            digest,
            bytes: meta.len(),
            modified,
        });
    }
    out.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(out)
}

fn run_artifact_matcher() -> PprofResult<GlobMatcher> {
    let pattern = format!("{RUN_ARTIFACT_PREFIX}-*(*).json");
    let glob = Glob::new(&pattern)
        .map_err(|e| PprofError::InvalidArgument(format!("invalid glob {pattern:?}: {e}")))?;
    Ok(glob.compile_matcher())
}

/// Splits `pprofiler-save-<tag>-<function>(<digest>).json`. The function is
/// taken as the last dash-separated segment, so tags may contain dashes.
pub fn parse_run_artifact_name(name: &str) -> Option<(String, String, String)> {
    let rest = name
        .strip_prefix(RUN_ARTIFACT_PREFIX)?
        .strip_prefix('-')?
        .strip_suffix(").json")?;
    let (label, digest) = rest.rsplit_once('(')?;
    let (tag, function) = label.rsplit_once('-')?;
    Some((tag.to_string(), function.to_string(), digest.to_string()))
}

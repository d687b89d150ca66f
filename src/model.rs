//! Line-level profile data model and its JSON artifact format.
//!
//! A [`ProfileRun`] is produced once, either by a profiling engine or by
//! reading a persisted artifact, and is treated as read-only afterwards.
//! Accessors that hand out a single file return an owned [`FileProfile`].

use serde::{Deserialize, Serialize};

use std::path::Path;

use crate::PprofResult;

/// One profiled execution: total wall time plus the per-file breakdown.
///
/// `files` is expected to be sorted by descending `duration`; nothing here
/// enforces it, but [`crate::Renderer::ls`] relies on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileRun {
    pub duration: f64,
    #[serde(rename = "command_profile")]
    pub files: Vec<FileProfile>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileProfile {
    pub file_name: String,
    pub duration: f64,
    /// Ordered by ascending `line_no`.
    #[serde(rename = "file_profile")]
    pub lines: Vec<LineProfile>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineProfile {
    pub line_no: u32,
    /// Source text captured at profiling time; may be stale.
    pub line: String,
    pub duration: f64,
    pub hits: u64,
    #[serde(default)]
    pub block_id: Vec<i64>,
}

impl LineProfile {
    /// Key used to group contiguous lines of the same block.
    pub fn block_key(&self) -> String {
        self.block_id
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(":")
    }
}

impl FileProfile {
    /// `"<file_name>:<line_no>"` address of one of this file's lines.
    pub fn address_of(&self, line: &LineProfile) -> String {
        format!("{}:{}", self.file_name, line.line_no)
    }

    pub fn source_text(&self) -> String {
        self.lines
            .iter()
            .map(|l| l.line.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl ProfileRun {
    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    pub fn line_count(&self) -> usize {
        self.files.iter().map(|f| f.lines.len()).sum()
    }

    pub fn write_json(&self, path: &Path) -> PprofResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let bytes = serde_json::to_vec(self)?;
        std::fs::write(path, bytes)?;
        Ok(())
    }

    pub fn read_json(path: &Path) -> PprofResult<Self> {
        let bytes = std::fs::read(path)?;
        let run: ProfileRun = serde_json::from_slice(&bytes)?;
        Ok(run)
    }
}

//! Addressing a single file of a run, by ordinal or by path.

use serde::ser::SerializeMap as _;
use serde::{Serialize, Serializer};

use std::fmt;
use std::str::FromStr;

use crate::{FileProfile, LineProfile, PprofError, PprofResult, ProfileRun};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileDescriptor {
    Index(usize),
    Path(String),
}

impl From<usize> for FileDescriptor {
    fn from(value: usize) -> Self {
        Self::Index(value)
    }
}

impl From<&str> for FileDescriptor {
    fn from(value: &str) -> Self {
        Self::Path(value.to_string())
    }
}

impl From<String> for FileDescriptor {
    fn from(value: String) -> Self {
        Self::Path(value)
    }
}

/// Prefix forcing the rest of the text to be read as a path.
pub const PATH_DESCRIPTOR_PREFIX: &str = "path:";

/// All-digit text is an ordinal; anything else is a path. A `path:` prefix
/// selects a file whose name is itself all digits.
impl FromStr for FileDescriptor {
    type Err = PprofError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(path) = s.strip_prefix(PATH_DESCRIPTOR_PREFIX) {
            return Ok(Self::Path(path.to_string()));
        }
        if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) {
            let index = s
                .parse::<usize>()
                .map_err(|e| PprofError::InvalidArgument(format!("file index {s:?}: {e}")))?;
            return Ok(Self::Index(index));
        }
        Ok(Self::Path(s.to_string()))
    }
}

impl fmt::Display for FileDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(i) => write!(f, "#{i}"),
            Self::Path(p) => f.write_str(p),
        }
    }
}

/// Lines of one file that share a block key and are adjacent in source order.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockGroup {
    pub key: String,
    pub lines: Vec<LineProfile>,
}

impl Serialize for BlockGroup {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(&self.key, &self.lines)?;
        map.end()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DumpLines {
    Flat(Vec<LineProfile>),
    Blocks(Vec<BlockGroup>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileDump {
    pub file_name: String,
    pub duration: f64,
    pub file_profile: DumpLines,
}

/// Splits `lines` into runs of consecutive lines with the same block key.
///
/// A key that reappears after a different one starts a new group.
pub fn group_contiguous_blocks(lines: Vec<LineProfile>) -> Vec<BlockGroup> {
    let mut groups: Vec<BlockGroup> = Vec::new();
    for line in lines {
        let key = line.block_key();
        match groups.last_mut() {
            Some(current) if current.key == key => current.lines.push(line),
            _ => groups.push(BlockGroup {
                key,
                lines: vec![line],
            }),
        }
    }
    groups
}

impl ProfileRun {
    /// Returns the file's ordinal and an owned copy of its profile.
    pub fn resolve(&self, descriptor: &FileDescriptor) -> PprofResult<(usize, FileProfile)> {
        let index = match descriptor {
            FileDescriptor::Index(i) => *i,
            FileDescriptor::Path(path) => self
                .files
                .iter()
                .position(|f| &f.file_name == path)
                .ok_or_else(|| PprofError::NotFound(format!("no such file `{path}'")))?,
        };
        let file = self.files.get(index).ok_or_else(|| {
            PprofError::NotFound(format!(
                "file index {index} out of range ({} files)",
                self.files.len()
            ))
        })?;
        Ok((index, file.clone()))
    }

    pub fn get_dump(&self, descriptor: &FileDescriptor, block_mode: bool) -> PprofResult<FileDump> {
        let (_, file) = self.resolve(descriptor)?;
        let file_profile = if block_mode {
            DumpLines::Blocks(group_contiguous_blocks(file.lines))
        } else {
            DumpLines::Flat(file.lines)
        };
        Ok(FileDump {
            file_name: file.file_name,
            duration: file.duration,
            file_profile,
        })
    }
}

//! Disk-backed memoization of expensive profiling invocations.
//!
//! A profiled call is identified by a tag, the function name and the text of
//! its arguments. The first call runs the function under a
//! [`ProfilingEngine`] and persists both the resulting [`ProfileRun`] and the
//! function's return value in the scratch directory; later calls with the same
//! signature replay them from disk without re-executing anything.
//!
//! There is no locking. Two processes profiling the same key at once may both
//! run the function and the last writer wins; a reader racing a writer can see
//! a truncated artifact and fail to decode it.

use serde::Serialize;
use serde::de::DeserializeOwned;

use std::collections::BTreeMap;
use std::fmt::Display;
use std::path::{Path, PathBuf};

use crate::{Config, PprofError, PprofResult, ProfileRun};

pub const RUN_ARTIFACT_PREFIX: &str = "pprofiler-save";
pub const OUTPUT_ARTIFACT_PREFIX: &str = "pprofiler-output";

/// Executes a callable under instrumentation.
pub trait ProfilingEngine {
    fn profile<T, F>(&mut self, f: F) -> PprofResult<(T, ProfileRun)>
    where
        F: FnOnce() -> T;
}

/// The text signature of a profiled call.
///
/// Keyword arguments are held sorted by name so that semantically identical
/// calls derive the same key regardless of the order they were supplied in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Invocation {
    function: String,
    args: Vec<String>,
    kwargs: BTreeMap<String, String>,
}

impl Invocation {
    pub fn new(function: impl Into<String>) -> Self {
        Self {
            function: function.into(),
            ..Self::default()
        }
    }

    pub fn arg(mut self, value: impl Display) -> Self {
        self.args.push(value.to_string());
        self
    }

    pub fn kwarg(mut self, name: impl Into<String>, value: impl Display) -> Self {
        self.kwargs.insert(name.into(), value.to_string());
        self
    }

    pub fn function(&self) -> &str {
        &self.function
    }

    /// Positional texts followed by `name=value` texts, joined with `", "`.
    pub fn signature(&self) -> String {
        self.args
            .iter()
            .cloned()
            .chain(self.kwargs.iter().map(|(k, v)| format!("{k}={v}")))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheKey {
    tag: String,
    function: String,
    digest: String,
}

impl CacheKey {
    /// Fails when the tag or function name could not be embedded in a single
    /// file name inside the scratch directory.
    pub fn derive(tag: &str, invocation: &Invocation) -> PprofResult<Self> {
        check_name_part("tag", tag)?;
        check_name_part("function", &invocation.function)?;
        let digest = blake3::hash(invocation.signature().as_bytes())
            .to_hex()
            .to_string();
        Ok(Self {
            tag: tag.to_string(),
            function: invocation.function.clone(),
            digest,
        })
    }

    pub fn digest(&self) -> &str {
        &self.digest
    }

    pub fn run_file_name(&self) -> String {
        self.file_name(RUN_ARTIFACT_PREFIX)
    }

    pub fn output_file_name(&self) -> String {
        self.file_name(OUTPUT_ARTIFACT_PREFIX)
    }

    fn file_name(&self, prefix: &str) -> String {
        format!("{prefix}-{}-{}({}).json", self.tag, self.function, self.digest)
    }
}

fn check_name_part(what: &str, value: &str) -> PprofResult<()> {
    if value.contains(['/', '\\', '\0']) {
        return Err(PprofError::InvalidArgument(format!(
            "{what} {value:?} must not contain path separators"
        )));
    }
    Ok(())
}

/// A run together with the profiled function's return value.
#[derive(Debug, Clone)]
pub struct CachedProfile<T> {
    pub key: CacheKey,
    pub run: ProfileRun,
    pub output: T,
    pub from_cache: bool,
}

#[derive(Debug, Clone)]
pub struct ProfileCache {
    scratch_dir: PathBuf,
}

impl ProfileCache {
    pub fn new(scratch_dir: impl Into<PathBuf>) -> Self {
        Self {
            scratch_dir: scratch_dir.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.scratch_dir.clone())
    }

    pub fn scratch_dir(&self) -> &Path {
        &self.scratch_dir
    }

    pub fn run_path(&self, key: &CacheKey) -> PathBuf {
        self.scratch_dir.join(key.run_file_name())
    }

    pub fn output_path(&self, key: &CacheKey) -> PathBuf {
        self.scratch_dir.join(key.output_file_name())
    }

    pub fn contains(&self, tag: &str, invocation: &Invocation) -> PprofResult<bool> {
        Ok(self.run_path(&CacheKey::derive(tag, invocation)?).is_file())
    }

    /// Returns the cached run for this call, profiling `f` only on a miss.
    ///
    /// Only a missing run artifact counts as a miss. An artifact that exists
    /// but does not decode is reported as [`PprofError::Json`] rather than
    /// silently recomputed. On a miss the output artifact is written before
    /// the run artifact, so a present run artifact marks a complete entry.
    pub fn profile<E, T, F>(
        &self,
        engine: &mut E,
        tag: &str,
        invocation: &Invocation,
        f: F,
    ) -> PprofResult<CachedProfile<T>>
    where
        E: ProfilingEngine,
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> T,
    {
        let key = CacheKey::derive(tag, invocation)?;
        let run_path = self.run_path(&key);
        let output_path = self.output_path(&key);

        match std::fs::read(&run_path) {
            Ok(bytes) => {
                let run: ProfileRun = serde_json::from_slice(&bytes)?;
                let output: T = serde_json::from_slice(&std::fs::read(&output_path)?)?;
                tracing::debug!("profile cache hit: {}", run_path.display());
                Ok(CachedProfile {
                    key,
                    run,
                    output,
                    from_cache: true,
                })
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(
                    "profile cache miss for {tag}/{}; running under profiler",
                    invocation.function()
                );
                let (output, run) = engine.profile(f)?;
                let run_bytes = serde_json::to_vec(&run)?;
                let output_bytes = serde_json::to_vec(&output)?;
                std::fs::create_dir_all(&self.scratch_dir)?;
                std::fs::write(&output_path, output_bytes)?;
                std::fs::write(&run_path, run_bytes)?;
                tracing::debug!("profile cache wrote {}", run_path.display());
                Ok(CachedProfile {
                    key,
                    run,
                    output,
                    from_cache: false,
                })
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Removes both artifacts for this call. Returns whether a run was cached.
    pub fn evict(&self, tag: &str, invocation: &Invocation) -> PprofResult<bool> {
        let key = CacheKey::derive(tag, invocation)?;
        let existed = remove_if_present(&self.run_path(&key))?;
        remove_if_present(&self.output_path(&key))?;
        Ok(existed)
    }
}

fn remove_if_present(path: &Path) -> PprofResult<bool> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(err) => Err(err.into()),
    }
}

//! Profile cache commands (`pprofiler cache ...`).

use clap::{Args, Subcommand};

use crate::{CacheKey, Config, Invocation, PprofResult, ProfileCache, find_cached_runs};

#[derive(Debug, Subcommand)]
pub enum CacheCommand {
    /// List cached runs in the scratch directory.
    List,
    /// Show where a call's artifacts live and whether they are cached.
    Path(InvocationArgs),
    /// Delete a call's cached artifacts so the next profile re-runs it.
    Evict(InvocationArgs),
}

#[derive(Debug, Clone, Args)]
pub struct InvocationArgs {
    #[arg(long)]
    pub tag: String,
    #[arg(long)]
    pub function: String,
    /// Positional argument text; repeatable, in call order.
    #[arg(long = "arg")]
    pub args: Vec<String>,
    /// Keyword argument as NAME=VALUE; repeatable, any order.
    #[arg(long = "kwarg", value_name = "NAME=VALUE", value_parser = parse_kwarg)]
    pub kwargs: Vec<(String, String)>,
}

impl InvocationArgs {
    pub fn invocation(&self) -> Invocation {
        let inv = self
            .args
            .iter()
            .fold(Invocation::new(self.function.clone()), |inv, a| inv.arg(a));
        self.kwargs
            .iter()
            .fold(inv, |inv, (k, v)| inv.kwarg(k.clone(), v))
    }
}

fn parse_kwarg(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected NAME=VALUE, got {s:?}"))
}

pub fn cache_command(config: &Config, command: &CacheCommand) -> PprofResult<serde_json::Value> {
    let cache = ProfileCache::from_config(config);
    match command {
        CacheCommand::List => {
            let entries = find_cached_runs(cache.scratch_dir())?;
            Ok(serde_json::to_value(entries)?)
        }
        CacheCommand::Path(args) => {
            let invocation = args.invocation();
            let key = CacheKey::derive(&args.tag, &invocation)?;
            let cached = cache.contains(&args.tag, &invocation)?;
            Ok(serde_json::json!({
                "signature": invocation.signature(),
                "digest": key.digest(),
                "run": cache.run_path(&key),
                "output": cache.output_path(&key),
                "cached": cached,
            }))
        }
        CacheCommand::Evict(args) => {
            let evicted = cache.evict(&args.tag, &args.invocation())?;
            Ok(serde_json::json!({ "evicted": evicted }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fixtures::sample_run;
    use std::path::PathBuf;

    fn temp_config(name: &str) -> Config {
        let dir =
            std::env::temp_dir().join(format!("pprofiler-cache-cmd-{name}-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).expect("mkdir");
        Config {
            scratch_dir: dir,
            ..Config::default()
        }
    }

    fn args() -> InvocationArgs {
        InvocationArgs {
            tag: "t".to_string(),
            function: "work".to_string(),
            args: vec!["10".to_string()],
            kwargs: vec![
                ("depth".to_string(), "2".to_string()),
                ("by".to_string(), "x".to_string()),
            ],
        }
    }

    #[test]
    fn kwarg_parser_splits_on_first_equals() {
        assert_eq!(
            parse_kwarg("expr=a=b").expect("kwarg"),
            ("expr".to_string(), "a=b".to_string())
        );
        assert!(parse_kwarg("flag").is_err());
    }

    #[test]
    fn path_reports_sorted_signature_and_presence() {
        let cfg = temp_config("path");
        let out = cache_command(&cfg, &CacheCommand::Path(args())).expect("path");
        assert_eq!(out["signature"], "10, by=x, depth=2");
        assert_eq!(out["cached"], false);

        let run_path = PathBuf::from(out["run"].as_str().expect("run path"));
        sample_run().write_json(&run_path).expect("write");
        let out = cache_command(&cfg, &CacheCommand::Path(args())).expect("path");
        assert_eq!(out["cached"], true);

        let listed = cache_command(&cfg, &CacheCommand::List).expect("list");
        assert_eq!(listed.as_array().map(Vec::len), Some(1));
        assert_eq!(listed[0]["tag"], "t");

        let out = cache_command(&cfg, &CacheCommand::Evict(args())).expect("evict");
        assert_eq!(out["evicted"], true);
        let listed = cache_command(&cfg, &CacheCommand::List).expect("list");
        assert_eq!(listed.as_array().map(Vec::len), Some(0));
    }

    #[test]
    fn path_rejects_tag_with_separator() {
        let cfg = temp_config("separator");
        let bad = InvocationArgs {
            tag: "../up".to_string(),
            ..args()
        };
        let err = cache_command(&cfg, &CacheCommand::Path(bad)).expect_err("separator");
        assert!(matches!(err, crate::PprofError::InvalidArgument(_)));
    }
}

//! Inspection commands over one persisted run (`pprofiler ls|cat|grep|...`).

use clap::Subcommand;

use crate::{Config, FileDescriptor, Filter, Highlighter, PprofResult, ProfileRun, Renderer};

const FILE_HELP: &str =
    "File ordinal (as listed by `ls`) or exact file path; prefix with `path:` for an all-digit path.";

#[derive(Debug, Subcommand)]
pub enum InspectCommand {
    /// List files, hottest first, stopping at the first one below the threshold.
    Ls {
        #[arg(long)]
        threshold: Option<f64>,
    },
    /// Print annotated source lines of one file.
    Cat {
        #[arg(value_name = "FILE", help = FILE_HELP)]
        file: String,
        /// First line to print (1-based).
        #[arg(long, default_value_t = 0)]
        from: usize,
        /// Last line to print (inclusive); defaults to the end of the file.
        #[arg(long)]
        to: Option<usize>,
    },
    /// Print lines whose source starts with a match of PATTERN.
    Grep {
        pattern: String,
        #[arg(value_name = "FILE", help = FILE_HELP)]
        file: Option<String>,
    },
    /// Dump one file's profile as JSON.
    Dump {
        #[arg(value_name = "FILE", help = FILE_HELP)]
        file: String,
        /// Group contiguous lines by block id.
        #[arg(long)]
        blocks: bool,
    },
    /// Show total, attributed and unattributed run time.
    Overhead,
    /// Group files and lines by order of magnitude of their duration.
    Partition,
    /// List lines at or above a duration threshold, hottest first.
    Filter {
        #[arg(long)]
        threshold: Option<f64>,
        /// `file:<regex>` or `line:<regex>`; repeatable, any match keeps the line.
        #[arg(long = "filter", value_name = "KIND:PATTERN")]
        filters: Vec<String>,
    },
}

#[derive(Debug, Clone)]
pub enum InspectOutput {
    Text(String),
    Value(serde_json::Value),
}

pub fn inspect_command(
    config: &Config,
    run: &ProfileRun,
    highlighter: &dyn Highlighter,
    command: &InspectCommand,
) -> PprofResult<InspectOutput> {
    let renderer = Renderer::new(run, highlighter);
    let mut buf = Vec::<u8>::new();
    match command {
        InspectCommand::Ls { threshold } => {
            renderer.ls(&mut buf, threshold.unwrap_or(config.threshold))?;
        }
        InspectCommand::Cat { file, from, to } => {
            renderer.cat(&mut buf, &file.parse::<FileDescriptor>()?, *from, *to)?;
        }
        InspectCommand::Grep { pattern, file } => {
            let descriptor = file.as_deref().map(str::parse::<FileDescriptor>).transpose()?;
            let matched = renderer.grep(&mut buf, pattern, descriptor.as_ref())?;
            tracing::debug!("grep {pattern:?}: {matched} matching lines");
        }
        InspectCommand::Dump { file, blocks } => {
            renderer.dump(&mut buf, &file.parse::<FileDescriptor>()?, *blocks)?;
        }
        InspectCommand::Overhead => {
            return Ok(InspectOutput::Value(serde_json::to_value(run.overhead())?));
        }
        InspectCommand::Partition => {
            return Ok(InspectOutput::Value(serde_json::to_value(run.partition())?));
        }
        InspectCommand::Filter { threshold, filters } => {
            let filters = filters
                .iter()
                .map(|f| f.parse::<Filter>())
                .collect::<PprofResult<Vec<_>>>()?;
            let rows = run.get_filtered_profile(threshold.unwrap_or(config.threshold), &filters);
            return Ok(InspectOutput::Value(serde_json::to_value(rows)?));
        }
    }
    Ok(InspectOutput::Text(String::from_utf8_lossy(&buf).into_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fixtures::sample_run;
    use crate::{PlainHighlighter, PprofError};

    fn run_cmd(command: InspectCommand) -> PprofResult<InspectOutput> {
        inspect_command(&Config::default(), &sample_run(), &PlainHighlighter, &command)
    }

    #[test]
    fn ls_uses_config_threshold_by_default() {
        let cfg = Config {
            threshold: 1.0,
            ..Config::default()
        };
        let out = inspect_command(
            &cfg,
            &sample_run(),
            &PlainHighlighter,
            &InspectCommand::Ls { threshold: None },
        )
        .expect("ls");
        match out {
            InspectOutput::Text(text) => assert_eq!(text.lines().count(), 1),
            InspectOutput::Value(_) => panic!("expected text"),
        }
    }

    #[test]
    fn cat_accepts_ordinal_text() {
        let out = run_cmd(InspectCommand::Cat {
            file: "1".to_string(),
            from: 0,
            to: None,
        })
        .expect("cat");
        match out {
            InspectOutput::Text(text) => assert!(text.contains("def foobar(i):")),
            InspectOutput::Value(_) => panic!("expected text"),
        }
    }

    #[test]
    fn cat_accepts_prefixed_path() {
        let out = run_cmd(InspectCommand::Cat {
            file: "path:app/util.py".to_string(),
            from: 0,
            to: None,
        })
        .expect("cat");
        match out {
            InspectOutput::Text(text) => assert!(text.contains("return xfoobar(i)")),
            InspectOutput::Value(_) => panic!("expected text"),
        }
    }

    #[test]
    fn filter_returns_rows_as_json() {
        let out = run_cmd(InspectCommand::Filter {
            threshold: Some(0.0),
            filters: vec!["file:app/util".to_string()],
        })
        .expect("filter");
        match out {
            InspectOutput::Value(value) => {
                let rows = value.as_array().expect("rows");
                assert_eq!(rows.len(), 2);
                assert_eq!(rows[0]["address"], "app/util.py:2");
            }
            InspectOutput::Text(_) => panic!("expected value"),
        }
    }

    #[test]
    fn bad_filter_kind_fails_fast() {
        let err = run_cmd(InspectCommand::Filter {
            threshold: None,
            filters: vec!["func:x".to_string()],
        })
        .expect_err("kind");
        assert!(matches!(err, PprofError::Config(_)));
    }

    #[test]
    fn dump_of_unknown_file_is_not_found() {
        let err = run_cmd(InspectCommand::Dump {
            file: "nope.py".to_string(),
            blocks: true,
        })
        .expect_err("missing");
        assert!(matches!(err, PprofError::NotFound(_)));
    }
}

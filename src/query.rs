//! Flattened, regex-filtered views over the lines of a run.

use regex::Regex;
use serde::Serialize;

use std::str::FromStr;

use crate::{LineProfile, PprofError, PprofResult, ProfileRun};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterKind {
    /// Matches against the containing file's name.
    File,
    /// Matches against the line's source text.
    Line,
}

impl FromStr for FilterKind {
    type Err = PprofError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "file" => Ok(Self::File),
            "line" => Ok(Self::Line),
            other => Err(PprofError::Config(format!(
                "filter kind must be one of `file` or `line`, got {other:?}"
            ))),
        }
    }
}

/// Compiles `pattern` so that it only matches from the start of the haystack.
pub fn anchored(pattern: &str) -> PprofResult<Regex> {
    Ok(Regex::new(&format!("^(?:{pattern})"))?)
}

#[derive(Debug, Clone)]
pub struct Filter {
    kind: FilterKind,
    regex: Regex,
}

impl Filter {
    pub fn new(kind: FilterKind, pattern: &str) -> PprofResult<Self> {
        Ok(Self {
            kind,
            regex: anchored(pattern)?,
        })
    }

    pub fn kind(&self) -> FilterKind {
        self.kind
    }

    pub fn matches(&self, file_name: &str, line: &LineProfile) -> bool {
        match self.kind {
            FilterKind::File => self.regex.is_match(file_name),
            FilterKind::Line => self.regex.is_match(&line.line),
        }
    }
}

/// Parses `"<kind>:<pattern>"`, splitting on the first colon.
impl FromStr for Filter {
    type Err = PprofError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, pattern) = s.split_once(':').ok_or_else(|| {
            PprofError::Config(format!("filter {s:?} is not of the form <kind>:<pattern>"))
        })?;
        Self::new(kind.parse()?, pattern)
    }
}

/// With no filters every line is a hit; otherwise a line is a hit as soon as
/// one filter, taken in order, matches it.
pub fn is_hit(filters: &[Filter], file_name: &str, line: &LineProfile) -> bool {
    filters.is_empty() || filters.iter().any(|f| f.matches(file_name, line))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineDatum {
    /// Duration of the containing file, not of the line.
    pub duration: f64,
    pub file_name: String,
    pub line: LineProfile,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilteredLine {
    pub address: String,
    pub datum: LineDatum,
}

impl ProfileRun {
    /// Every line passing `filters` whose own duration is at least
    /// `threshold`, hottest line first. Ties keep run order.
    pub fn get_filtered_profile(&self, threshold: f64, filters: &[Filter]) -> Vec<FilteredLine> {
        let mut out = Vec::new();
        for file in &self.files {
            for line in &file.lines {
                if !is_hit(filters, &file.file_name, line) || line.duration < threshold {
                    continue;
                }
                out.push(FilteredLine {
                    address: file.address_of(line),
                    datum: LineDatum {
                        duration: file.duration,
                        file_name: file.file_name.clone(),
                        line: line.clone(),
                    },
                });
            }
        }
        out.sort_by(|a, b| b.datum.line.duration.total_cmp(&a.datum.line.duration));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fixtures::{line, sample_run};

    fn filters(specs: &[&str]) -> Vec<Filter> {
        specs
            .iter()
            .map(|s| s.parse::<Filter>().expect("filter"))
            .collect()
    }

    #[test]
    fn no_filters_returns_every_line_hottest_first() {
        let run = sample_run();
        let rows = run.get_filtered_profile(0.0, &[]);
        assert_eq!(rows.len(), run.line_count());
        assert!(
            rows.windows(2)
                .all(|w| w[0].datum.line.duration >= w[1].datum.line.duration)
        );
        assert_eq!(rows[0].address, "app/main.py:4");
    }

    #[test]
    fn datum_reports_file_duration() {
        let rows = sample_run().get_filtered_profile(0.0, &[]);
        let util = rows
            .iter()
            .find(|r| r.address == "app/util.py:2")
            .expect("util line");
        assert_eq!(util.datum.duration, 0.045);
        assert_eq!(util.datum.line.duration, 0.04);
    }

    #[test]
    fn threshold_applies_to_line_duration() {
        let rows = sample_run().get_filtered_profile(1.0, &[]);
        let addresses = rows.iter().map(|r| r.address.as_str()).collect::<Vec<_>>();
        assert_eq!(addresses, vec!["app/main.py:4", "app/main.py:3"]);
    }

    #[test]
    fn line_filter_is_anchored() {
        let rows = sample_run().get_filtered_profile(0.0, &filters(&["line:    return"]));
        let addresses = rows.iter().map(|r| r.address.as_str()).collect::<Vec<_>>();
        assert_eq!(addresses, vec!["app/main.py:5", "app/util.py:2"]);

        let rows = sample_run().get_filtered_profile(0.0, &filters(&["line:return"]));
        assert!(rows.is_empty());
    }

    #[test]
    fn filters_combine_as_or() {
        let rows = sample_run()
            .get_filtered_profile(0.0, &filters(&["file:app/util", "line:import"]));
        let addresses = rows.iter().map(|r| r.address.as_str()).collect::<Vec<_>>();
        assert_eq!(addresses, vec!["app/util.py:2", "app/util.py:1", "app/main.py:1"]);
    }

    #[test]
    fn equal_durations_keep_run_order() {
        let mut run = sample_run();
        for file in &mut run.files {
            for l in &mut file.lines {
                l.duration = 1.0;
            }
        }
        let rows = run.get_filtered_profile(0.0, &[]);
        let addresses = rows.iter().map(|r| r.address.as_str()).collect::<Vec<_>>();
        assert_eq!(
            addresses,
            vec![
                "app/main.py:1",
                "app/main.py:2",
                "app/main.py:3",
                "app/main.py:4",
                "app/main.py:5",
                "app/util.py:1",
                "app/util.py:2",
            ]
        );
    }

    #[test]
    fn unknown_filter_kind_is_a_config_error() {
        let err = "func:main".parse::<Filter>().expect_err("kind");
        assert!(matches!(err, PprofError::Config(_)));
        let err = "no-colon".parse::<Filter>().expect_err("shape");
        assert!(matches!(err, PprofError::Config(_)));
    }

    #[test]
    fn invalid_pattern_is_rejected() {
        let err = "line:(".parse::<Filter>().expect_err("regex");
        assert!(matches!(err, PprofError::InvalidArgument(_)));
    }

    #[test]
    fn pattern_may_contain_colons() {
        let f = "line:a:b".parse::<Filter>().expect("filter");
        assert_eq!(f.kind(), FilterKind::Line);
        assert!(f.matches("x.py", &line(1, "a:b = 1", 0.0, 0, &[])));
    }
}

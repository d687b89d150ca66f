//! Overhead accounting and order-of-magnitude partitioning of a run.

use serde::{Serialize, Serializer};

use std::collections::BTreeMap;
use std::fmt;

use crate::{LineProfile, ProfileRun};

/// A power of ten, `10^exponent`, used to group durations by magnitude.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Bucket {
    exponent: i32,
}

impl Bucket {
    pub fn from_exponent(exponent: i32) -> Self {
        Self { exponent }
    }

    /// Bucket of `duration`, read off the exponent of its scientific notation.
    ///
    /// `0.0` has exponent 0 and so lands in bucket `1`, as do non-finite values.
    pub fn of(duration: f64) -> Self {
        let sci = format!("{duration:E}");
        let exponent = sci
            .rsplit_once('E')
            .and_then(|(_, exp)| exp.parse::<i32>().ok())
            .unwrap_or(0);
        Self { exponent }
    }

    pub fn exponent(&self) -> i32 {
        self.exponent
    }

    pub fn value(&self) -> f64 {
        10f64.powi(self.exponent)
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.exponent >= 0 {
            write!(f, "1{}", "0".repeat(self.exponent as usize))
        } else {
            let zeros = (-(self.exponent as i64) - 1) as usize;
            write!(f, "0.{}1", "0".repeat(zeros))
        }
    }
}

impl Serialize for Bucket {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Overhead {
    pub total: f64,
    pub actual: f64,
    pub overhead: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileSummary {
    pub file_name: String,
    pub duration: f64,
    pub details: BTreeMap<Bucket, Vec<LineProfile>>,
}

pub type Partition = BTreeMap<Bucket, Vec<FileSummary>>;

impl ProfileRun {
    /// Time the run spent outside any profiled file.
    pub fn overhead(&self) -> Overhead {
        let actual = self.files.iter().map(|f| f.duration).sum::<f64>();
        Overhead {
            total: self.duration,
            actual,
            overhead: self.duration - actual,
        }
    }

    /// Regroups every file by the bucket of its duration, and every line of
    /// that file by the bucket of the line's duration. Nothing is dropped.
    pub fn partition(&self) -> Partition {
        let mut buckets = Partition::new();
        for file in &self.files {
            let mut details = BTreeMap::<Bucket, Vec<LineProfile>>::new();
            for line in &file.lines {
                details
                    .entry(Bucket::of(line.duration))
                    .or_default()
                    .push(line.clone());
            }
            buckets
                .entry(Bucket::of(file.duration))
                .or_default()
                .push(FileSummary {
                    file_name: file.file_name.clone(),
                    duration: file.duration,
                    details,
                });
        }
        buckets
    }
}

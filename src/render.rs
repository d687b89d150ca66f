//! Text rendering of a run for interactive inspection.

use std::borrow::Cow;
use std::io::Write;

use crate::{
    FileDescriptor, FileProfile, Highlighter, Language, LineProfile, PprofResult, ProfileRun,
    anchored, colorize_lines,
};

pub struct Renderer<'a> {
    run: &'a ProfileRun,
    highlighter: &'a dyn Highlighter,
}

impl<'a> Renderer<'a> {
    pub fn new(run: &'a ProfileRun, highlighter: &'a dyn Highlighter) -> Self {
        Self { run, highlighter }
    }

    /// Lists files in run order until the first one below `threshold`.
    ///
    /// Assumes the run's files are sorted by descending duration.
    pub fn ls(&self, out: &mut impl Write, threshold: f64) -> PprofResult<()> {
        for (index, file) in self.run.files.iter().enumerate() {
            if file.duration < threshold {
                break;
            }
            writeln!(
                out,
                "{index:>3} | {:>6.1} | {}",
                file.duration, file.file_name
            )?;
        }
        Ok(())
    }

    /// Prints lines `from..=to` (1-based) of one file; `to = None` runs to the end.
    pub fn cat(
        &self,
        out: &mut impl Write,
        descriptor: &FileDescriptor,
        from: usize,
        to: Option<usize>,
    ) -> PprofResult<()> {
        let (_, file) = self.run.resolve(descriptor)?;
        let colored = self.colorize(&file);
        let first = from.saturating_sub(1);
        for (i, line) in file.lines.iter().enumerate() {
            if i < first || to.is_some_and(|last| i >= last) {
                continue;
            }
            write_row(out, line, &colored[i])?;
        }
        Ok(())
    }

    /// Prints every line whose source text matches `pattern` from its first
    /// character, under a header per file with at least one match. Returns
    /// the number of matching lines.
    pub fn grep(
        &self,
        out: &mut impl Write,
        pattern: &str,
        descriptor: Option<&FileDescriptor>,
    ) -> PprofResult<usize> {
        let regex = anchored(pattern)?;
        let selected: Vec<(usize, Cow<'_, FileProfile>)> = match descriptor {
            Some(d) => {
                let (index, file) = self.run.resolve(d)?;
                vec![(index, Cow::Owned(file))]
            }
            None => self
                .run
                .files
                .iter()
                .enumerate()
                .map(|(i, f)| (i, Cow::Borrowed(f)))
                .collect(),
        };

        let mut matched = 0;
        for (index, file) in selected {
            let colored = self.colorize(&file);
            let mut headed = false;
            for (j, line) in file.lines.iter().enumerate() {
                if !regex.is_match(&line.line) {
                    continue;
                }
                if !headed {
                    writeln!(out, "# file[{index}]: {}", file.file_name)?;
                    headed = true;
                }
                write_row(out, line, &colored[j])?;
                matched += 1;
            }
        }
        Ok(matched)
    }

    /// Pretty-prints [`ProfileRun::get_dump`] as JSON with sorted keys.
    pub fn dump(
        &self,
        out: &mut impl Write,
        descriptor: &FileDescriptor,
        block_mode: bool,
    ) -> PprofResult<()> {
        let dump = self.run.get_dump(descriptor, block_mode)?;
        let json = serde_json::to_string_pretty(&serde_json::to_value(&dump)?)?;
        writeln!(out, "{}", self.highlighter.highlight(&json, Language::Json))?;
        Ok(())
    }

    fn colorize(&self, file: &FileProfile) -> Vec<String> {
        let sources = file.lines.iter().map(|l| l.line.as_str()).collect::<Vec<_>>();
        colorize_lines(self.highlighter, &sources)
    }
}

fn write_row(out: &mut impl Write, line: &LineProfile, colored: &str) -> PprofResult<()> {
    let text = if colored.is_empty() {
        line.line.as_str()
    } else {
        colored
    };
    writeln!(
        out,
        "{:>5.1}/{:<9} | {:04} | {text}",
        line.duration, line.hits, line.line_no
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fixtures::{line, sample_run};
    use crate::{AnsiHighlighter, PlainHighlighter, PprofError};

    fn render<F>(run: &ProfileRun, f: F) -> String
    where
        F: FnOnce(&Renderer<'_>, &mut Vec<u8>) -> PprofResult<()>,
    {
        let renderer = Renderer::new(run, &PlainHighlighter);
        let mut buf = Vec::new();
        f(&renderer, &mut buf).expect("render");
        String::from_utf8(buf).expect("utf8")
    }

    #[test]
    fn ls_formats_rows() {
        let out = render(&sample_run(), |r, buf| r.ls(buf, 0.0));
        assert_eq!(
            out,
            "  0 |   12.3 | app/main.py\n  1 |    0.0 | app/util.py\n"
        );
    }

    #[test]
    fn ls_stops_at_first_file_below_threshold() {
        let mut run = sample_run();
        let mut late = run.files[0].clone();
        late.file_name = "app/late.py".to_string();
        run.files.push(late);
        let out = render(&run, |r, buf| r.ls(buf, 1.0));
        assert_eq!(out.lines().count(), 1);
        assert!(!out.contains("app/late.py"));
    }

    #[test]
    fn cat_prints_requested_range() {
        let out = render(&sample_run(), |r, buf| {
            r.cat(buf, &"app/main.py".into(), 3, Some(4))
        });
        assert_eq!(
            out,
            "  1.5/1001      | 0003 |     for i in range(n):\n 10.7/1000      | 0004 |         foobar(i)\n"
        );
    }

    #[test]
    fn cat_defaults_cover_whole_file() {
        let out = render(&sample_run(), |r, buf| {
            r.cat(buf, &FileDescriptor::Index(0), 0, None)
        });
        assert_eq!(out.lines().count(), 5);
        assert!(out.starts_with("  0.0/1         | 0001 | import os\n"));
    }

    #[test]
    fn grep_is_anchored() {
        let run = sample_run();
        let renderer = Renderer::new(&run, &PlainHighlighter);
        let mut buf = Vec::new();
        let hits = renderer.grep(&mut buf, "foo", None).expect("grep");
        assert_eq!(hits, 0);
        assert!(buf.is_empty());

        let mut run = sample_run();
        run.files[1].lines.push(line(3, "foobar()", 0.0, 1, &[0]));
        run.files[1].lines.push(line(4, "xfoobar()", 0.0, 1, &[0]));
        let renderer = Renderer::new(&run, &PlainHighlighter);
        let mut buf = Vec::new();
        let hits = renderer.grep(&mut buf, "foo", None).expect("grep");
        let out = String::from_utf8(buf).expect("utf8");
        assert_eq!(hits, 1);
        assert_eq!(
            out,
            "# file[1]: app/util.py\n  0.0/1         | 0003 | foobar()\n"
        );
    }

    #[test]
    fn grep_heads_each_matching_file_once() {
        let out = render(&sample_run(), |r, buf| {
            r.grep(buf, r"\s+return", None).map(|_| ())
        });
        let headers = out.lines().filter(|l| l.starts_with("# file[")).collect::<Vec<_>>();
        assert_eq!(headers, vec!["# file[0]: app/main.py", "# file[1]: app/util.py"]);
    }

    #[test]
    fn grep_with_descriptor_uses_resolved_index() {
        let out = render(&sample_run(), |r, buf| {
            r.grep(buf, "def", Some(&"app/util.py".into())).map(|_| ())
        });
        assert!(out.starts_with("# file[1]: app/util.py\n"));
        assert_eq!(out.lines().count(), 2);
    }

    #[test]
    fn grep_unknown_file_is_not_found() {
        let run = sample_run();
        let renderer = Renderer::new(&run, &PlainHighlighter);
        let err = renderer
            .grep(&mut Vec::<u8>::new(), "x", Some(&"nope.py".into()))
            .expect_err("missing");
        assert!(matches!(err, PprofError::NotFound(_)));
    }

    #[test]
    fn dump_prints_sorted_keys() {
        let out = render(&sample_run(), |r, buf| {
            r.dump(buf, &FileDescriptor::Index(1), false)
        });
        let value: serde_json::Value = serde_json::from_str(&out).expect("json");
        assert_eq!(value["file_name"], "app/util.py");
        let duration_at = out.find("\"duration\"").expect("duration");
        let file_name_at = out.find("\"file_name\"").expect("file_name");
        let file_profile_at = out.find("\"file_profile\"").expect("file_profile");
        assert!(duration_at < file_name_at && file_name_at < file_profile_at);
    }

    #[test]
    fn colored_rows_keep_annotations() {
        let run = sample_run();
        let highlighter = AnsiHighlighter::new().expect("highlighter");
        let renderer = Renderer::new(&run, &highlighter);
        let mut buf = Vec::new();
        renderer
            .cat(&mut buf, &FileDescriptor::Index(0), 1, Some(1))
            .expect("cat");
        let out = String::from_utf8(buf).expect("utf8");
        assert!(out.starts_with("  0.0/1         | 0001 | \x1b[35;1mimport\x1b[0m os"));
    }
}

//! Session statistics and the plain-text report written when practice ends.

use std::cmp::Reverse;
use std::fmt;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::NaiveDateTime;
use log::info;

use crate::error::ReportError;
use crate::problem::Problem;

/// Length of the "top ten" listings.
pub const TOP_COUNT: usize = 10;

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Statistics over the answered problems of one session, oldest first.
#[derive(Debug, Clone, Copy)]
pub struct Report<'a> {
    duration: Duration,
    answered: &'a [Problem],
}

impl<'a> Report<'a> {
    pub fn new(duration: Duration, answered: &'a [Problem]) -> Self {
        Self { duration, answered }
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn total(&self) -> usize {
        self.answered.len()
    }

    /// Whole-millisecond mean; zero when nothing was answered.
    pub fn mean_response_time(&self) -> Duration {
        if self.answered.is_empty() {
            return Duration::ZERO;
        }
        let total: u64 = self.answered.iter().map(|p| millis(p.response_time())).sum();
        Duration::from_millis(total / self.answered.len() as u64)
    }

    /// Sample standard deviation (N - 1), zero below two answers.
    pub fn standard_deviation_response_time(&self) -> Duration {
        let n = self.answered.len();
        if n < 2 {
            return Duration::ZERO;
        }

        let mean = millis(self.mean_response_time()) as f64;
        let sum_of_squares: f64 = self
            .answered
            .iter()
            .map(|p| {
                let deviation = millis(p.response_time()) as f64 - mean;
                deviation * deviation
            })
            .sum();
        let variance = sum_of_squares / (n - 1) as f64;
        Duration::from_millis(variance.sqrt() as u64)
    }

    /// Share of problems answered right without a wrong attempt first.
    pub fn fraction_correct_on_first_try(&self) -> f64 {
        if self.answered.is_empty() {
            return 0.0;
        }
        let first_try = self
            .answered
            .iter()
            .filter(|p| p.response_count() == 1)
            .count();
        first_try as f64 / self.answered.len() as f64
    }

    /// Most attempts first; ties keep answer order.
    pub fn top_by_response_count(&self, n: usize) -> Vec<&'a Problem> {
        let mut sorted: Vec<&Problem> = self.answered.iter().collect();
        sorted.sort_by_key(|p| Reverse(p.response_count()));
        sorted.truncate(n);
        sorted
    }

    /// Slowest first; ties keep answer order.
    pub fn top_by_response_time(&self, n: usize) -> Vec<&'a Problem> {
        let mut sorted: Vec<&Problem> = self.answered.iter().collect();
        sorted.sort_by_key(|p| Reverse(p.response_time()));
        sorted.truncate(n);
        sorted
    }
}

struct Line<'p>(&'p Problem);

impl fmt::Display for Line<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}; response time ms = {}; responses = {}",
            self.0.question_with_answer(),
            millis(self.0.response_time()),
            self.0.responses().join("  ")
        )
    }
}

impl fmt::Display for Report<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "duration = {}ms", millis(self.duration))?;
        writeln!(f, "total problems answered = {}", self.total())?;
        writeln!(f, "average response time = {}ms", millis(self.mean_response_time()))?;
        writeln!(
            f,
            "standard deviation response time = {}ms",
            millis(self.standard_deviation_response_time())
        )?;
        writeln!(
            f,
            "fraction correct on first try = {}",
            self.fraction_correct_on_first_try()
        )?;

        writeln!(f, "\ntop ten most responses")?;
        for problem in self.top_by_response_count(TOP_COUNT) {
            writeln!(f, "{}", Line(problem))?;
        }

        writeln!(f, "\ntop ten longest responses")?;
        for problem in self.top_by_response_time(TOP_COUNT) {
            writeln!(f, "{}", Line(problem))?;
        }

        writeln!(f, "\nall answers")?;
        for problem in self.answered {
            writeln!(f, "{}", Line(problem))?;
        }
        Ok(())
    }
}

/// `<username>-<YYYY-MM-DD>-<HH.MM.SS>.txt`
pub fn report_file_name(username: &str, at: NaiveDateTime) -> String {
    format!("{}-{}.txt", username, at.format("%Y-%m-%d-%H.%M.%S"))
}

/// Writes `contents` to `dir/file_name`, creating `dir` if needed.
pub fn write_report(dir: &Path, file_name: &str, contents: &str) -> Result<PathBuf, ReportError> {
    if dir.exists() && !dir.is_dir() {
        return Err(ReportError::NotADirectory(dir.to_path_buf()));
    }

    fs::create_dir_all(dir).map_err(|source| ReportError::CreateDirectory {
        path: dir.to_path_buf(),
        source,
    })?;

    let path = dir.join(file_name);
    let write_err = |source| ReportError::Write {
        path: path.clone(),
        source,
    };

    let file = File::create(&path).map_err(write_err)?;
    let mut writer = BufWriter::new(file);
    writer.write_all(contents.as_bytes()).map_err(write_err)?;
    writer.flush().map_err(write_err)?;

    info!("wrote report to {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use chrono::NaiveDate;

    use super::*;
    use crate::problem::{ArithmeticProblem, TimeProblem};

    /// An answered problem with the given wrong tries before the right one.
    fn answered(top: u32, ms: u64, wrong: &[&str]) -> Problem {
        let start = Instant::now();
        let mut problem = Problem::new(ArithmeticProblem::addition(top, 1));
        problem.set_start(start).unwrap();
        for attempt in wrong {
            for c in attempt.chars() {
                problem.push_char(c);
            }
            problem.grade_at(start);
        }
        for c in (top + 1).to_string().chars() {
            problem.push_char(c);
        }
        problem.grade_at(start + Duration::from_millis(ms));
        problem
    }

    #[test]
    fn empty_session_statistics() {
        let report = Report::new(Duration::from_secs(300), &[]);
        assert_eq!(report.total(), 0);
        assert_eq!(report.mean_response_time(), Duration::ZERO);
        assert_eq!(report.standard_deviation_response_time(), Duration::ZERO);
        assert_eq!(report.fraction_correct_on_first_try(), 0.0);
        assert!(report.top_by_response_count(TOP_COUNT).is_empty());

        let text = report.to_string();
        assert!(text.starts_with(
            "duration = 300000ms\n\
             total problems answered = 0\n\
             average response time = 0ms\n\
             standard deviation response time = 0ms\n\
             fraction correct on first try = 0\n"
        ));
        assert!(text.ends_with("\nall answers\n"));
    }

    #[test]
    fn single_answer_has_no_deviation() {
        let problems = [answered(1, 1200, &[])];
        let report = Report::new(Duration::from_secs(1), &problems);
        assert_eq!(report.mean_response_time(), Duration::from_millis(1200));
        assert_eq!(report.standard_deviation_response_time(), Duration::ZERO);
    }

    #[test]
    fn sample_standard_deviation() {
        let problems = [
            answered(1, 1000, &[]),
            answered(2, 2000, &[]),
            answered(3, 3000, &[]),
        ];
        let report = Report::new(Duration::from_secs(1), &problems);
        assert_eq!(report.mean_response_time(), Duration::from_millis(2000));
        assert_eq!(
            report.standard_deviation_response_time(),
            Duration::from_millis(1000)
        );
    }

    #[test]
    fn first_try_fraction() {
        let problems = [
            answered(1, 10, &[]),
            answered(2, 10, &["9"]),
            answered(3, 10, &[]),
            answered(4, 10, &["1", "2"]),
        ];
        let report = Report::new(Duration::from_secs(1), &problems);
        assert_eq!(report.fraction_correct_on_first_try(), 0.5);
    }

    #[test]
    fn rankings_are_stable_and_capped() {
        let problems = [
            answered(1, 500, &["9"]),
            answered(2, 900, &[]),
            answered(3, 500, &["9"]),
            answered(4, 100, &["9", "9"]),
        ];
        let report = Report::new(Duration::from_secs(1), &problems);

        let by_count: Vec<u32> = report
            .top_by_response_count(3)
            .iter()
            .map(|p| p.response_count() as u32 * 100 + (millis(p.response_time()) / 100) as u32)
            .collect();
        assert_eq!(by_count, vec![301, 205, 205]);

        let by_time: Vec<u64> = report
            .top_by_response_time(10)
            .iter()
            .map(|p| millis(p.response_time()))
            .collect();
        assert_eq!(by_time, vec![900, 500, 500, 100]);

        let slow = report.top_by_response_time(2);
        assert_eq!(slow[1].question_with_answer(), "1 + 1 = 2");
    }

    #[test]
    fn report_lines() {
        let problems = [answered(6, 1500, &["3", "12"])];
        let report = Report::new(Duration::from_secs(60), &problems);
        let line = "6 + 1 = 7; response time ms = 1500; responses = 3  12  7";

        let text = report.to_string();
        assert!(text.contains("total problems answered = 1\n"));
        assert!(text.contains("fraction correct on first try = 0\n"));
        assert_eq!(text.matches(line).count(), 3);
    }

    #[test]
    fn time_problems_in_report() {
        let start = Instant::now();
        let mut problem = Problem::new(TimeProblem::military(12, 0, false));
        problem.set_start(start).unwrap();
        for c in "00:00".chars() {
            problem.push_char(c);
        }
        problem.grade_at(start + Duration::from_millis(20));

        let problems = [problem];
        let text = Report::new(Duration::from_secs(1), &problems).to_string();
        assert!(text.contains(
            "What military time is it? = 00:00; response time ms = 20; responses = 00:00"
        ));
    }

    #[test]
    fn file_name_format() {
        let at = NaiveDate::from_ymd_opt(2024, 3, 9)
            .unwrap()
            .and_hms_opt(7, 5, 3)
            .unwrap();
        assert_eq!(report_file_name("sam", at), "sam-2024-03-09-07.05.03.txt");
    }

    #[test]
    fn writes_into_new_directory() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("reports").join("nested");

        let path = write_report(&dir, "r.txt", "hello\n").unwrap();
        assert_eq!(path, dir.join("r.txt"));
        assert_eq!(fs::read_to_string(&path).unwrap(), "hello\n");

        // An existing directory is fine.
        write_report(&dir, "s.txt", "again\n").unwrap();
        assert_eq!(fs::read_to_string(dir.join("s.txt")).unwrap(), "again\n");
    }

    #[test]
    fn unwritable_report_file_is_an_error() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("reports");
        fs::create_dir_all(dir.join("taken.txt")).unwrap();

        let err = write_report(&dir, "taken.txt", "x").unwrap_err();
        assert!(matches!(err, ReportError::Write { path, .. } if path == dir.join("taken.txt")));
    }

    #[test]
    fn refuses_file_in_place_of_directory() {
        let root = tempfile::tempdir().unwrap();
        let blocker = root.path().join("reports");
        fs::write(&blocker, "not a dir").unwrap();

        let err = write_report(&blocker, "r.txt", "x").unwrap_err();
        assert!(matches!(err, ReportError::NotADirectory(p) if p == blocker));
    }
}

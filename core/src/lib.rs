//! Problem generation, grading and session reporting for arithmetic and
//! clock-reading drills. Presentation lives in the host crate.

pub mod error;
pub mod pool;
pub mod problem;
pub mod report;
pub mod session;
pub mod settings;

pub use error::{Error, FactError, ReportError, SessionError, SettingsError, TimingError};
pub use pool::{Category, Choice, Generator};
pub use problem::{
    AnswerResult, ArithmeticProblem, ClockTime, Fact, Operation, Problem, TimeProblem,
};
pub use report::{report_file_name, write_report, Report};
pub use session::{Frame, QuestionView, Session, SessionConfig, Stage};
pub use settings::Settings;

use std::fmt;
use std::num::NonZeroU32;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::error::{FactError, TimingError};

pub const ARITHMETIC_MAX_RESPONSE_LEN: usize = 3;
pub const TIME_MAX_RESPONSE_LEN: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnswerResult {
    Incorrect,
    Correct,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operation {
    Add,
    Sub,
    Mul,
    Div,
}

impl Operation {
    /// Symbol used in reports.
    pub fn symbol(self) -> &'static str {
        match self {
            Operation::Add => "+",
            Operation::Sub => "-",
            Operation::Mul => "*",
            Operation::Div => "/",
        }
    }

    /// Symbol shown to the student.
    pub fn display_symbol(self) -> &'static str {
        match self {
            Operation::Add => "+",
            Operation::Sub => "-",
            Operation::Mul => "x",
            Operation::Div => "÷",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArithmeticProblem {
    top: u32,
    bottom: u32,
    operation: Operation,
    answer: u32,
}

impl ArithmeticProblem {
    /// Builds a fact from its two operands, rejecting anything that would not
    /// produce a whole non-negative answer.
    pub fn new(top: u32, bottom: u32, operation: Operation) -> Result<Self, FactError> {
        let answer = match operation {
            Operation::Add => top + bottom,
            Operation::Sub => top
                .checked_sub(bottom)
                .ok_or(FactError::NegativeDifference { top, bottom })?,
            Operation::Mul => top * bottom,
            Operation::Div => {
                if bottom == 0 {
                    return Err(FactError::DivisionByZero);
                }
                if top % bottom != 0 {
                    return Err(FactError::InexactQuotient { top, bottom });
                }
                top / bottom
            }
        };

        Ok(Self {
            top,
            bottom,
            operation,
            answer,
        })
    }

    pub fn addition(top: u32, bottom: u32) -> Self {
        Self {
            top,
            bottom,
            operation: Operation::Add,
            answer: top + bottom,
        }
    }

    pub fn multiplication(top: u32, bottom: u32) -> Self {
        Self {
            top,
            bottom,
            operation: Operation::Mul,
            answer: top * bottom,
        }
    }

    /// `divisor * quotient / divisor`; always exact.
    pub fn division(divisor: NonZeroU32, quotient: u32) -> Self {
        Self {
            top: divisor.get() * quotient,
            bottom: divisor.get(),
            operation: Operation::Div,
            answer: quotient,
        }
    }

    pub fn top(&self) -> u32 {
        self.top
    }

    pub fn bottom(&self) -> u32 {
        self.bottom
    }

    pub fn operation(&self) -> Operation {
        self.operation
    }

    pub fn answer(&self) -> u32 {
        self.answer
    }

    /// Non-numeric input reads as 0, so it is simply a wrong answer.
    pub fn grade(&self, response: &str) -> bool {
        let value: i64 = response.trim().parse().unwrap_or(0);
        value == i64::from(self.answer)
    }

    pub fn question(&self) -> String {
        format!("{} {} {}", self.top, self.operation.symbol(), self.bottom)
    }
}

/// A clock position, on the hour dial (1..=12) and the five-minute marks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClockTime {
    hour: u8,
    minute: u8,
}

impl ClockTime {
    pub fn new(hour: u8, minute: u8) -> Self {
        let hour = match hour % 12 {
            0 => 12,
            h => h,
        };
        Self {
            hour,
            minute: (minute % 60) / 5 * 5,
        }
    }

    pub fn hour(&self) -> u8 {
        self.hour
    }

    pub fn minute(&self) -> u8 {
        self.minute
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeProblem {
    /// Answered as "H:MM".
    Standard(ClockTime),
    /// Answered in 24-hour form, "HH:MM".
    Military { time: ClockTime, afternoon: bool },
}

impl TimeProblem {
    pub fn standard(hour: u8, minute: u8) -> Self {
        TimeProblem::Standard(ClockTime::new(hour, minute))
    }

    pub fn military(hour: u8, minute: u8, afternoon: bool) -> Self {
        TimeProblem::Military {
            time: ClockTime::new(hour, minute),
            afternoon,
        }
    }

    pub fn time(&self) -> ClockTime {
        match *self {
            TimeProblem::Standard(time) | TimeProblem::Military { time, .. } => time,
        }
    }

    pub fn hour(&self) -> u8 {
        self.time().hour()
    }

    pub fn minute(&self) -> u8 {
        self.time().minute()
    }

    /// `None` for the 12-hour variant.
    pub fn afternoon(&self) -> Option<bool> {
        match *self {
            TimeProblem::Standard(_) => None,
            TimeProblem::Military { afternoon, .. } => Some(afternoon),
        }
    }

    pub fn prompt(&self) -> &'static str {
        match self {
            TimeProblem::Standard(_) => "What time is it?",
            TimeProblem::Military { .. } => "What military time is it?",
        }
    }

    pub fn answer(&self) -> String {
        match *self {
            TimeProblem::Standard(time) => format!("{}:{:02}", time.hour, time.minute),
            TimeProblem::Military { time, afternoon } => {
                let hour = match (afternoon, time.hour) {
                    (true, 12) => 12,
                    (true, h) => h + 12,
                    (false, 12) => 0,
                    (false, h) => h,
                };
                format!("{:02}:{:02}", hour, time.minute)
            }
        }
    }

    pub fn grade(&self, response: &str) -> bool {
        response == self.answer()
    }
}

/// What is being asked, independent of any answering state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Fact {
    Arithmetic(ArithmeticProblem),
    Time(TimeProblem),
}

impl Fact {
    pub fn max_response_len(&self) -> usize {
        match self {
            Fact::Arithmetic(_) => ARITHMETIC_MAX_RESPONSE_LEN,
            Fact::Time(_) => TIME_MAX_RESPONSE_LEN,
        }
    }

    pub fn accepts(&self, c: char) -> bool {
        match self {
            Fact::Arithmetic(_) => c.is_ascii_digit(),
            Fact::Time(_) => c.is_ascii_digit() || c == ':',
        }
    }

    pub fn canonical_answer(&self) -> String {
        match self {
            Fact::Arithmetic(problem) => problem.answer().to_string(),
            Fact::Time(problem) => problem.answer(),
        }
    }

    pub fn grade(&self, response: &str) -> bool {
        match self {
            Fact::Arithmetic(problem) => problem.grade(response),
            Fact::Time(problem) => problem.grade(response),
        }
    }

    pub fn question(&self) -> String {
        match self {
            Fact::Arithmetic(problem) => problem.question(),
            Fact::Time(problem) => problem.prompt().to_string(),
        }
    }
}

impl From<ArithmeticProblem> for Fact {
    fn from(problem: ArithmeticProblem) -> Self {
        Fact::Arithmetic(problem)
    }
}

impl From<TimeProblem> for Fact {
    fn from(problem: TimeProblem) -> Self {
        Fact::Time(problem)
    }
}

impl fmt::Display for Fact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.question(), self.canonical_answer())
    }
}

/// One question being asked: the fact plus the student's typing, every
/// submitted response and the time it took.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Problem {
    fact: Fact,
    response: String,
    responses: Vec<String>,
    start: Option<Instant>,
    end: Option<Instant>,
}

impl Problem {
    pub fn new(fact: impl Into<Fact>) -> Self {
        Self {
            fact: fact.into(),
            response: String::new(),
            responses: Vec::new(),
            start: None,
            end: None,
        }
    }

    pub fn fact(&self) -> &Fact {
        &self.fact
    }

    /// The text typed so far.
    pub fn response(&self) -> &str {
        &self.response
    }

    /// Every submitted response, oldest first.
    pub fn responses(&self) -> &[String] {
        &self.responses
    }

    pub fn response_count(&self) -> usize {
        self.responses.len()
    }

    pub fn is_answered(&self) -> bool {
        self.end.is_some()
    }

    /// Returns `true` if the character was taken.
    pub fn push_char(&mut self, c: char) -> bool {
        if self.is_answered()
            || !self.fact.accepts(c)
            || self.response.chars().count() >= self.fact.max_response_len()
        {
            return false;
        }
        self.response.push(c);
        true
    }

    pub fn delete_last(&mut self) -> bool {
        if self.is_answered() {
            return false;
        }
        self.response.pop().is_some()
    }

    pub fn grade(&mut self) -> Option<AnswerResult> {
        self.grade_at(Instant::now())
    }

    /// Grades the typed response. Nothing happens for an empty response or a
    /// problem already answered. A wrong answer clears the typing so the same
    /// problem can be retried; a right one keeps it and stamps the end time.
    pub fn grade_at(&mut self, now: Instant) -> Option<AnswerResult> {
        if self.response.is_empty() || self.is_answered() {
            return None;
        }

        self.responses.push(self.response.clone());

        if self.fact.grade(&self.response) {
            // Never started: timed as answered on the spot.
            let start = *self.start.get_or_insert(now);
            self.end = Some(now.max(start));
            Some(AnswerResult::Correct)
        } else {
            self.response.clear();
            Some(AnswerResult::Incorrect)
        }
    }

    pub fn start_time(&self) -> Option<Instant> {
        self.start
    }

    pub fn end_time(&self) -> Option<Instant> {
        self.end
    }

    pub fn set_start(&mut self, at: Instant) -> Result<(), TimingError> {
        if self.end.is_some() {
            return Err(TimingError::AlreadyEnded);
        }
        self.start = Some(at);
        Ok(())
    }

    pub fn set_end(&mut self, at: Instant) -> Result<(), TimingError> {
        let start = self.start.ok_or(TimingError::NotStarted)?;
        if self.end.is_some() {
            return Err(TimingError::AlreadyEnded);
        }
        if at < start {
            return Err(TimingError::EndBeforeStart);
        }
        self.end = Some(at);
        Ok(())
    }

    /// Zero until both ends of the interval are known.
    pub fn response_time(&self) -> Duration {
        match (self.start, self.end) {
            (Some(start), Some(end)) => end - start,
            _ => Duration::ZERO,
        }
    }

    pub fn question_with_answer(&self) -> String {
        self.fact.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn type_in(problem: &mut Problem, text: &str) {
        for c in text.chars() {
            problem.push_char(c);
        }
    }

    #[test]
    fn arithmetic_answers() {
        assert_eq!(ArithmeticProblem::addition(7, 5).answer(), 12);
        assert_eq!(ArithmeticProblem::multiplication(7, 5).answer(), 35);
        assert_eq!(
            ArithmeticProblem::new(9, 4, Operation::Sub).unwrap().answer(),
            5
        );
        let div = ArithmeticProblem::division(NonZeroU32::new(4).unwrap(), 6);
        assert_eq!((div.top(), div.bottom(), div.answer()), (24, 4, 6));
    }

    #[test]
    fn invalid_facts_are_rejected() {
        assert_eq!(
            ArithmeticProblem::new(3, 4, Operation::Sub),
            Err(FactError::NegativeDifference { top: 3, bottom: 4 })
        );
        assert_eq!(
            ArithmeticProblem::new(3, 0, Operation::Div),
            Err(FactError::DivisionByZero)
        );
        assert_eq!(
            ArithmeticProblem::new(7, 2, Operation::Div),
            Err(FactError::InexactQuotient { top: 7, bottom: 2 })
        );
    }

    #[test]
    fn non_numeric_response_reads_as_zero() {
        let zero = ArithmeticProblem::addition(0, 0);
        assert!(zero.grade("abc"));
        assert!(!ArithmeticProblem::addition(1, 0).grade("abc"));
        assert!(ArithmeticProblem::addition(1, 6).grade("007"));
    }

    #[test]
    fn question_with_answer_uses_report_symbols() {
        let problem = Problem::new(ArithmeticProblem::multiplication(3, 4));
        assert_eq!(problem.question_with_answer(), "3 * 4 = 12");
        let problem = Problem::new(TimeProblem::standard(9, 5));
        assert_eq!(problem.question_with_answer(), "What time is it? = 9:05");
    }

    #[test]
    fn time_is_normalized_to_the_dial() {
        let time = TimeProblem::standard(13, 47);
        assert_eq!((time.hour(), time.minute()), (1, 45));
        assert_eq!(time.answer(), "1:45");

        let midnight = TimeProblem::standard(0, 0);
        assert_eq!(midnight.hour(), 12);
        assert_eq!(midnight.answer(), "12:00");
    }

    #[test]
    fn military_conversion() {
        assert_eq!(TimeProblem::military(12, 0, false).answer(), "00:00");
        assert_eq!(TimeProblem::military(12, 30, true).answer(), "12:30");
        assert_eq!(TimeProblem::military(9, 5, false).answer(), "09:05");
        assert_eq!(TimeProblem::military(9, 5, true).answer(), "21:05");
        assert_eq!(TimeProblem::military(3, 0, true).afternoon(), Some(true));
        assert_eq!(TimeProblem::standard(3, 0).afternoon(), None);
    }

    #[test]
    fn time_grading_is_textual() {
        let time = TimeProblem::standard(9, 5);
        assert!(time.grade("9:05"));
        assert!(!time.grade("09:05"));
        assert!(!time.grade("9:5"));
    }

    #[test]
    fn response_length_is_capped() {
        let mut problem = Problem::new(ArithmeticProblem::addition(1, 1));
        type_in(&mut problem, "12345");
        assert_eq!(problem.response(), "123");

        let mut problem = Problem::new(TimeProblem::standard(10, 10));
        type_in(&mut problem, "10:100");
        assert_eq!(problem.response(), "10:10");
    }

    #[test]
    fn disallowed_characters_are_ignored() {
        let mut problem = Problem::new(ArithmeticProblem::addition(1, 1));
        assert!(!problem.push_char(':'));
        assert!(!problem.push_char('a'));
        assert!(problem.push_char('2'));
        assert_eq!(problem.response(), "2");
    }

    #[test]
    fn delete_last_on_empty_is_noop() {
        let mut problem = Problem::new(ArithmeticProblem::addition(1, 1));
        assert!(!problem.delete_last());
        type_in(&mut problem, "12");
        assert!(problem.delete_last());
        assert_eq!(problem.response(), "1");
    }

    #[test]
    fn grading_empty_response_changes_nothing() {
        let mut problem = Problem::new(ArithmeticProblem::addition(1, 1));
        let before = problem.clone();
        assert_eq!(problem.grade(), None);
        assert_eq!(problem, before);
    }

    #[test]
    fn wrong_answer_clears_and_allows_retry() {
        let start = Instant::now();
        let mut problem = Problem::new(ArithmeticProblem::addition(2, 2));
        problem.set_start(start).unwrap();

        type_in(&mut problem, "5");
        assert_eq!(problem.grade_at(start), Some(AnswerResult::Incorrect));
        assert_eq!(problem.response(), "");
        assert!(!problem.is_answered());

        type_in(&mut problem, "4");
        let end = start + Duration::from_millis(1500);
        assert_eq!(problem.grade_at(end), Some(AnswerResult::Correct));
        assert_eq!(problem.response(), "4");
        assert_eq!(problem.responses(), ["5", "4"]);
        assert_eq!(problem.response_time(), Duration::from_millis(1500));
    }

    #[test]
    fn answered_problem_ignores_input() {
        let start = Instant::now();
        let mut problem = Problem::new(TimeProblem::standard(1, 0));
        problem.set_start(start).unwrap();
        type_in(&mut problem, "1:00");
        assert_eq!(problem.grade_at(start), Some(AnswerResult::Correct));

        assert!(!problem.push_char('1'));
        assert!(!problem.delete_last());
        assert_eq!(problem.grade_at(start), None);
        assert_eq!(problem.response_count(), 1);
    }

    #[test]
    fn unstarted_problem_is_retired_on_correct_answer() {
        let now = Instant::now();
        let mut problem = Problem::new(ArithmeticProblem::addition(3, 4));
        type_in(&mut problem, "7");

        assert_eq!(problem.grade_at(now), Some(AnswerResult::Correct));
        assert!(problem.is_answered());
        assert_eq!(problem.start_time(), Some(now));
        assert_eq!(problem.response_time(), Duration::ZERO);

        assert!(!problem.push_char('7'));
        assert_eq!(problem.grade_at(now), None);
        assert_eq!(problem.responses(), ["7"]);
    }

    #[test]
    fn timing_invariants() {
        let start = Instant::now();
        let mut problem = Problem::new(ArithmeticProblem::addition(1, 1));
        assert_eq!(problem.response_time(), Duration::ZERO);
        assert_eq!(problem.set_end(start), Err(TimingError::NotStarted));

        problem.set_start(start + Duration::from_secs(1)).unwrap();
        assert_eq!(problem.set_end(start), Err(TimingError::EndBeforeStart));

        problem.set_end(start + Duration::from_secs(3)).unwrap();
        assert_eq!(
            problem.set_end(start + Duration::from_secs(4)),
            Err(TimingError::AlreadyEnded)
        );
        assert_eq!(problem.set_start(start), Err(TimingError::AlreadyEnded));
        assert_eq!(problem.response_time(), Duration::from_secs(2));
    }
}

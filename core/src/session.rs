use std::time::{Duration, Instant};

use log::info;

use crate::error::SessionError;
use crate::pool::{Choice, Generator};
use crate::problem::{AnswerResult, Fact, Problem};
use crate::report::Report;
use crate::settings::{self, Settings};

/// How long a grading result stays on screen.
pub const FEEDBACK_DURATION: Duration = Duration::from_secs(1);

/// Number of colour schemes the host cycles through on correct answers.
pub const PALETTE_SIZE: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub enabled_math_facts: u32,
    pub duration: Duration,
    pub minimum_answered: usize,
    pub seed: Option<u64>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            enabled_math_facts: settings::DEFAULT_ENABLED_MATH_FACTS,
            duration: Duration::from_millis(settings::DEFAULT_DURATION_MS),
            minimum_answered: settings::DEFAULT_MINIMUM_TO_PRACTICE,
            seed: None,
        }
    }
}

impl From<&Settings> for SessionConfig {
    fn from(settings: &Settings) -> Self {
        Self {
            enabled_math_facts: settings.enabled_math_facts(),
            duration: settings.practice_duration(),
            minimum_answered: settings.minimum_amount_to_practice(),
            seed: settings.seed,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Title,
    Practice,
    Ended,
}

/// What the host needs to draw the current question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuestionView {
    Arithmetic {
        top: String,
        symbol: &'static str,
        bottom: String,
    },
    Clock {
        prompt: &'static str,
        hour: u8,
        minute: u8,
        afternoon: Option<bool>,
    },
}

impl From<&Fact> for QuestionView {
    fn from(fact: &Fact) -> Self {
        match fact {
            Fact::Arithmetic(p) => QuestionView::Arithmetic {
                top: p.top().to_string(),
                symbol: p.operation().display_symbol(),
                bottom: p.bottom().to_string(),
            },
            Fact::Time(p) => QuestionView::Clock {
                prompt: p.prompt(),
                hour: p.hour(),
                minute: p.minute(),
                afternoon: p.afternoon(),
            },
        }
    }
}

/// Read-only snapshot handed to the host for one repaint.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub stage: Stage,
    pub question: Option<QuestionView>,
    pub response: String,
    /// Share of the practice time still left, 1.0 down to 0.0.
    pub remaining: f32,
    pub feedback: Option<AnswerResult>,
    pub palette_index: usize,
    pub answered: usize,
}

/// One practice run, from the title screen to the report.
#[derive(Debug)]
pub struct Session {
    config: SessionConfig,
    stage: Stage,
    generator: Option<Generator>,
    current: Option<Problem>,
    answered: Vec<Problem>,
    started_at: Option<Instant>,
    feedback: Option<(AnswerResult, Instant)>,
    palette_index: usize,
}

impl Session {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            stage: Stage::Title,
            generator: None,
            current: None,
            answered: Vec::new(),
            started_at: None,
            feedback: None,
            palette_index: 0,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn available_choices(&self) -> Vec<Choice> {
        Choice::available(self.config.enabled_math_facts)
    }

    pub fn current(&self) -> Option<&Problem> {
        self.current.as_ref()
    }

    /// Answered problems, oldest first.
    pub fn answered(&self) -> &[Problem] {
        &self.answered
    }

    pub fn start(&mut self, choice: Choice) -> Result<(), SessionError> {
        self.start_at(choice, Instant::now())
    }

    pub fn start_at(&mut self, choice: Choice, now: Instant) -> Result<(), SessionError> {
        if self.stage != Stage::Title {
            return Err(SessionError::AlreadyStarted);
        }

        let categories = choice.categories(self.config.enabled_math_facts);
        let mut generator = match self.config.seed {
            Some(seed) => Generator::with_seed(&categories, seed)?,
            None => Generator::new(&categories)?,
        };

        self.current = Some(generator.draw_at(now));
        self.generator = Some(generator);
        self.started_at = Some(now);
        self.stage = Stage::Practice;

        info!(
            "practice started: {} with {:?} for {}ms, minimum {}",
            choice.label(),
            categories,
            self.config.duration.as_millis(),
            self.config.minimum_answered
        );
        Ok(())
    }

    fn practicing(&mut self) -> Option<&mut Problem> {
        match self.stage {
            Stage::Practice => self.current.as_mut(),
            _ => None,
        }
    }

    pub fn push_char(&mut self, c: char) -> bool {
        self.practicing().is_some_and(|p| p.push_char(c))
    }

    pub fn delete_last(&mut self) -> bool {
        self.practicing().is_some_and(|p| p.delete_last())
    }

    pub fn submit(&mut self) -> Option<AnswerResult> {
        self.submit_at(Instant::now())
    }

    /// Grades the current problem. A correct answer retires it to the
    /// answered list and deals the next one.
    pub fn submit_at(&mut self, now: Instant) -> Option<AnswerResult> {
        let result = self.practicing()?.grade_at(now)?;
        self.feedback = Some((result, now));

        if result == AnswerResult::Correct {
            if let Some(done) = self.current.take() {
                self.answered.push(done);
            }
            self.current = self.generator.as_mut().map(|g| g.draw_at(now));
            self.palette_index = (self.palette_index + 1) % PALETTE_SIZE;
        }
        Some(result)
    }

    pub fn remaining_at(&self, now: Instant) -> Duration {
        match self.started_at {
            Some(start) => (start + self.config.duration).saturating_duration_since(now),
            None => self.config.duration,
        }
    }

    pub fn time_expired_at(&self, now: Instant) -> bool {
        self.started_at.is_some() && self.remaining_at(now).is_zero()
    }

    /// Practice is over only when the time is up AND enough problems have
    /// been answered.
    pub fn is_finished_at(&self, now: Instant) -> bool {
        self.time_expired_at(now) && self.answered.len() >= self.config.minimum_answered
    }

    /// Moves to `Stage::Ended` once finished; returns whether it did.
    pub fn check_end_at(&mut self, now: Instant) -> bool {
        if self.stage != Stage::Practice || !self.is_finished_at(now) {
            return false;
        }
        self.stage = Stage::Ended;
        self.feedback = None;
        info!("practice ended after {} answers", self.answered.len());
        true
    }

    pub fn frame_at(&self, now: Instant) -> Frame {
        let remaining = if self.config.duration.is_zero() {
            0.0
        } else {
            self.remaining_at(now).as_secs_f32() / self.config.duration.as_secs_f32()
        };
        let feedback = self
            .feedback
            .filter(|(_, at)| now.saturating_duration_since(*at) < FEEDBACK_DURATION)
            .map(|(result, _)| result);
        let current = match self.stage {
            Stage::Practice => self.current.as_ref(),
            _ => None,
        };

        Frame {
            stage: self.stage,
            question: current.map(|p| QuestionView::from(p.fact())),
            response: current.map(|p| p.response().to_string()).unwrap_or_default(),
            remaining: remaining.clamp(0.0, 1.0),
            feedback,
            palette_index: self.palette_index,
            answered: self.answered.len(),
        }
    }

    pub fn report(&self) -> Report<'_> {
        Report::new(self.config.duration, &self.answered)
    }
}

use std::num::NonZeroU32;
use std::time::Instant;

use log::debug;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::error::SessionError;
use crate::problem::{ArithmeticProblem, Fact, Operation, Problem, TimeProblem};

/// Largest operand in the arithmetic fact tables.
pub const MAX_OPERAND: u32 = 12;

const MINUTE_STEP: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    Addition,
    Subtraction,
    Multiplication,
    Division,
    Clock,
    MilitaryClock,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Addition,
        Category::Subtraction,
        Category::Multiplication,
        Category::Division,
        Category::Clock,
        Category::MilitaryClock,
    ];

    /// Bit used in the `enabled_math_facts` mask.
    pub fn bit(self) -> u32 {
        match self {
            Category::Addition => 0x01,
            Category::Subtraction => 0x02,
            Category::Multiplication => 0x04,
            Category::Division => 0x08,
            Category::Clock => 0x10,
            Category::MilitaryClock => 0x20,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Category::Addition => "Addition",
            Category::Subtraction => "Subtraction",
            Category::Multiplication => "Multiplication",
            Category::Division => "Division",
            Category::Clock => "Clock",
            Category::MilitaryClock => "Military Clock",
        }
    }

    pub fn is_enabled_in(self, mask: u32) -> bool {
        mask & self.bit() != 0
    }

    /// Every distinct fact of this category, in nested-range order.
    pub fn facts(self) -> Vec<Fact> {
        let operands = || 0..=MAX_OPERAND;
        let clock = || {
            (1..=12u8).flat_map(|h| (0..60u8).step_by(MINUTE_STEP).map(move |m| (h, m)))
        };

        match self {
            Category::Addition => operands()
                .flat_map(|top| {
                    operands().map(move |bottom| ArithmeticProblem::addition(top, bottom))
                })
                .map(Fact::from)
                .collect(),
            Category::Subtraction => operands()
                .flat_map(|top| {
                    operands().filter_map(move |bottom| {
                        ArithmeticProblem::new(top, bottom, Operation::Sub).ok()
                    })
                })
                .map(Fact::from)
                .collect(),
            Category::Multiplication => operands()
                .flat_map(|top| {
                    operands().map(move |bottom| ArithmeticProblem::multiplication(top, bottom))
                })
                .map(Fact::from)
                .collect(),
            Category::Division => (1..=MAX_OPERAND)
                .filter_map(NonZeroU32::new)
                .flat_map(|divisor| {
                    operands().map(move |quotient| ArithmeticProblem::division(divisor, quotient))
                })
                .map(Fact::from)
                .collect(),
            Category::Clock => clock()
                .map(|(h, m)| Fact::from(TimeProblem::standard(h, m)))
                .collect(),
            Category::MilitaryClock => clock()
                .flat_map(|(h, m)| {
                    [false, true]
                        .map(|afternoon| Fact::from(TimeProblem::military(h, m, afternoon)))
                })
                .collect(),
        }
    }
}

/// What the student picked on the title screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Choice {
    Only(Category),
    All,
}

impl Choice {
    pub fn label(self) -> &'static str {
        match self {
            Choice::Only(category) => category.label(),
            Choice::All => "All",
        }
    }

    /// The categories both chosen and enabled, in declaration order.
    pub fn categories(self, enabled_mask: u32) -> Vec<Category> {
        Category::ALL
            .into_iter()
            .filter(|c| c.is_enabled_in(enabled_mask))
            .filter(|c| match self {
                Choice::Only(only) => *c == only,
                Choice::All => true,
            })
            .collect()
    }

    /// Choices worth offering for a configuration mask.
    pub fn available(enabled_mask: u32) -> Vec<Choice> {
        let mut choices: Vec<Choice> = Category::ALL
            .into_iter()
            .filter(|c| c.is_enabled_in(enabled_mask))
            .map(Choice::Only)
            .collect();
        if !choices.is_empty() {
            choices.push(Choice::All);
        }
        choices
    }
}

/// Deals problems from one shuffled pool per category, without replacement.
/// Pools are only restocked once every one of them is empty.
#[derive(Debug)]
pub struct Generator {
    rng: StdRng,
    pools: Vec<(Category, Vec<Problem>)>,
    cycles: u64,
}

impl Generator {
    pub fn new(categories: &[Category]) -> Result<Self, SessionError> {
        Self::with_rng(categories, StdRng::from_entropy())
    }

    pub fn with_seed(categories: &[Category], seed: u64) -> Result<Self, SessionError> {
        Self::with_rng(categories, StdRng::seed_from_u64(seed))
    }

    fn with_rng(categories: &[Category], rng: StdRng) -> Result<Self, SessionError> {
        let mut categories = categories.to_vec();
        categories.sort();
        categories.dedup();
        if categories.is_empty() {
            return Err(SessionError::NoCategoryEnabled);
        }

        Ok(Self {
            rng,
            pools: categories.into_iter().map(|c| (c, Vec::new())).collect(),
            cycles: 0,
        })
    }

    pub fn categories(&self) -> impl Iterator<Item = Category> + '_ {
        self.pools.iter().map(|(category, _)| *category)
    }

    /// Problems left in a category's pool this cycle.
    pub fn remaining(&self, category: Category) -> usize {
        self.pools
            .iter()
            .find(|(c, _)| *c == category)
            .map_or(0, |(_, pool)| pool.len())
    }

    /// How many times the pools have been stocked.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub fn is_exhausted(&self) -> bool {
        self.pools.iter().all(|(_, pool)| pool.is_empty())
    }

    pub fn draw(&mut self) -> Problem {
        self.draw_at(Instant::now())
    }

    pub fn draw_at(&mut self, now: Instant) -> Problem {
        if self.is_exhausted() {
            self.restock();
        }

        // Categories that already ran dry are simply picked again.
        let (category, mut problem) = loop {
            let index = self.rng.gen_range(0..self.pools.len());
            let (category, pool) = &mut self.pools[index];
            if let Some(problem) = pool.pop() {
                break (*category, problem);
            }
        };
        debug!(
            "drew {} from {:?}, {} left",
            problem.fact(),
            category,
            self.remaining(category)
        );

        if let Err(err) = problem.set_start(now) {
            debug!("not timing {}: {err}", problem.fact());
        }
        problem
    }

    fn restock(&mut self) {
        for (category, pool) in &mut self.pools {
            *pool = category.facts().into_iter().map(Problem::new).collect();
            pool.shuffle(&mut self.rng);
        }
        self.cycles += 1;
        debug!("restocked {} pools, cycle {}", self.pools.len(), self.cycles);
    }
}

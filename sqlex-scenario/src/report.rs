// SPDX-FileCopyrightText: 2025 sqlex contributors
// SPDX-License-Identifier: MIT

//! Results of a suite run.

use std::fmt;

use serde::Serialize;
use sqlex_db::Dialect;

/// How a single scenario ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Outcome {
    Passed,
    Failed { message: String },
    Skipped { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScenarioReport {
    pub name: String,
    #[serde(flatten)]
    pub outcome: Outcome,
    /// Steps left out because they target another dialect
    pub skipped_steps: usize,
}

/// Scenario counts by outcome.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Totals {
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    pub suite: String,
    pub dialect: Dialect,
    pub scenarios: Vec<ScenarioReport>,
}

impl Report {
    pub fn new(suite: impl Into<String>, dialect: Dialect) -> Self {
        Self {
            suite: suite.into(),
            dialect,
            scenarios: Vec::new(),
        }
    }

    pub fn totals(&self) -> Totals {
        let mut totals = Totals::default();
        for scenario in &self.scenarios {
            match scenario.outcome {
                Outcome::Passed => totals.passed += 1,
                Outcome::Failed { .. } => totals.failed += 1,
                Outcome::Skipped { .. } => totals.skipped += 1,
            }
        }
        totals
    }

    /// True when no scenario failed.
    pub fn is_success(&self) -> bool {
        self.totals().failed == 0
    }

    pub fn failures(&self) -> impl Iterator<Item = &ScenarioReport> {
        self.scenarios
            .iter()
            .filter(|s| matches!(s.outcome, Outcome::Failed { .. }))
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for scenario in &self.scenarios {
            match &scenario.outcome {
                Outcome::Passed => writeln!(f, "PASS {}", scenario.name)?,
                Outcome::Failed { message } => writeln!(f, "FAIL {}: {message}", scenario.name)?,
                Outcome::Skipped { reason } => writeln!(f, "SKIP {} ({reason})", scenario.name)?,
            }
        }
        let Totals {
            passed,
            failed,
            skipped,
        } = self.totals();
        write!(
            f,
            "{} on {}: {passed} passed, {failed} failed, {skipped} skipped",
            self.suite, self.dialect
        )
    }
}

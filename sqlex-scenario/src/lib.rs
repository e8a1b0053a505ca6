// SPDX-FileCopyrightText: 2025 sqlex contributors
// SPDX-License-Identifier: MIT

//! Dependency-ordered SQL scenarios.
//!
//! A [`Suite`] bundles a schema, a fixture that is restored before each
//! [`Scenario`], and the scenarios themselves. Every scenario is a [`Plan`]
//! of raw statements whose ordering constraints are declared explicitly
//! instead of implied by the order they were written in.
//!
//! # Example
//!
//! ```
//! use sqlex_db::Database;
//! use sqlex_scenario::{Runner, many_to_many};
//!
//! let mut db = Database::open_memory()?;
//! let report = Runner::default().filter(["tags of dog"]).run(&mut db, &many_to_many::suite())?;
//! assert!(report.is_success(), "{report}");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod error;
pub mod many_to_many;
mod plan;
mod report;
mod runner;
mod scenario;

pub use error::{PlanError, StepError};
pub use plan::{Expectation, Plan, Step};
pub use report::{Outcome, Report, ScenarioReport, Totals};
pub use runner::{Runner, run_plan};
pub use scenario::{Scenario, Suite};

// SPDX-FileCopyrightText: 2025 sqlex contributors
// SPDX-License-Identifier: MIT

//! Scenarios and the suites that group them.

use sqlex_db::Dialect;
use sqlex_verify::TypecastMap;

use crate::plan::Plan;

/// A named plan checked against a freshly reset fixture.
#[derive(Debug, Clone)]
pub struct Scenario {
    name: String,
    description: String,
    dialect: Option<Dialect>,
    plan: Plan,
}

impl Scenario {
    pub fn new(name: impl Into<String>, plan: Plan) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            dialect: None,
            plan,
        }
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Restrict the scenario to one dialect; it is reported as skipped
    /// elsewhere.
    pub fn only_on(mut self, dialect: Dialect) -> Self {
        self.dialect = Some(dialect);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn dialect(&self) -> Option<Dialect> {
        self.dialect
    }

    pub fn plan(&self) -> &Plan {
        &self.plan
    }

    pub fn runs_on(&self, dialect: Dialect) -> bool {
        self.dialect.is_none_or(|d| d == dialect)
    }
}

/// Scenarios sharing one schema and fixture.
///
/// Before `setup` runs, the tables listed by [`Suite::drop_tables`] are
/// dropped in order. `reset` runs before every scenario.
#[derive(Debug, Clone, Default)]
pub struct Suite {
    name: String,
    drop_tables: Vec<String>,
    setup: Plan,
    reset: Plan,
    typecasts: TypecastMap,
    scenarios: Vec<Scenario>,
}

impl Suite {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Tables dropped, one after the other, before setup.
    pub fn with_drops<I, S>(mut self, tables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.drop_tables = tables.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_setup(mut self, setup: Plan) -> Self {
        self.setup = setup;
        self
    }

    pub fn with_reset(mut self, reset: Plan) -> Self {
        self.reset = reset;
        self
    }

    /// Typecasts applied to every row comparison in the suite.
    pub fn with_typecasts(mut self, typecasts: TypecastMap) -> Self {
        self.typecasts = typecasts;
        self
    }

    pub fn scenario(mut self, scenario: Scenario) -> Self {
        self.scenarios.push(scenario);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn drop_tables(&self) -> &[String] {
        &self.drop_tables
    }

    pub fn setup(&self) -> &Plan {
        &self.setup
    }

    pub fn reset(&self) -> &Plan {
        &self.reset
    }

    pub fn typecasts(&self) -> &TypecastMap {
        &self.typecasts
    }

    pub fn scenarios(&self) -> &[Scenario] {
        &self.scenarios
    }

    /// Scenarios whose name contains any of `filters`; all of them when
    /// `filters` is empty.
    pub fn select<'a, S: AsRef<str>>(
        &'a self,
        filters: &'a [S],
    ) -> impl Iterator<Item = &'a Scenario> + 'a {
        self.scenarios.iter().filter(move |scenario| {
            filters.is_empty()
                || filters
                    .iter()
                    .any(|filter| scenario.name.contains(filter.as_ref()))
        })
    }
}

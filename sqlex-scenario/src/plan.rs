// SPDX-FileCopyrightText: 2025 sqlex contributors
// SPDX-License-Identifier: MIT

//! Steps and their ordering.
//!
//! A [`Plan`] lists raw statements together with the steps each one must
//! wait for. [`Plan::stages`] turns those declarations into waves of
//! mutually independent steps.

use std::collections::HashMap;

use sqlex_db::{Dialect, ErrorKind};
use sqlex_verify::{MatchMode, Row, RowOrder, Typecast, TypecastMap, Value};

use crate::error::PlanError;

/// What a step's statement is expected to produce.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Expectation {
    /// Any successful outcome.
    #[default]
    Nothing,
    /// The statement returns these rows.
    Rows(Vec<Row>),
    /// The statement changes exactly this many rows.
    Affected(u64),
    /// The statement fails with an error of this kind.
    Fails(ErrorKind),
}

/// One raw statement in a [`Plan`].
#[derive(Debug, Clone)]
pub struct Step {
    name: String,
    sql: String,
    params: Vec<Value>,
    after: Vec<String>,
    dialect: Option<Dialect>,
    expect: Expectation,
    typecasts: TypecastMap,
    mode: Option<MatchMode>,
    order: Option<RowOrder>,
}

impl Step {
    pub fn new(name: impl Into<String>, sql: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sql: sql.into(),
            params: Vec::new(),
            after: Vec::new(),
            dialect: None,
            expect: Expectation::Nothing,
            typecasts: TypecastMap::new(),
            mode: None,
            order: None,
        }
    }

    /// Bind the next positional parameter.
    pub fn param(mut self, value: impl Into<Value>) -> Self {
        self.params.push(value.into());
        self
    }

    /// Run only once `step` has completed.
    pub fn after(mut self, step: impl Into<String>) -> Self {
        let step = step.into();
        if !self.after.contains(&step) {
            self.after.push(step);
        }
        self
    }

    /// Restrict the step to one dialect; it is skipped elsewhere.
    pub fn only_on(mut self, dialect: Dialect) -> Self {
        self.dialect = Some(dialect);
        self
    }

    pub fn expect_rows(mut self, rows: impl IntoIterator<Item = Row>) -> Self {
        self.expect = Expectation::Rows(rows.into_iter().collect());
        self
    }

    pub fn expect_affected(mut self, rows: u64) -> Self {
        self.expect = Expectation::Affected(rows);
        self
    }

    pub fn expect_error(mut self, kind: ErrorKind) -> Self {
        self.expect = Expectation::Fails(kind);
        self
    }

    /// Coerce `column` for this step's row comparison only.
    pub fn typecast(mut self, column: impl Into<String>, cast: impl Into<Typecast>) -> Self {
        self.typecasts.insert(column, cast);
        self
    }

    pub fn match_mode(mut self, mode: MatchMode) -> Self {
        self.mode = Some(mode);
        self
    }

    pub fn row_order(mut self, order: RowOrder) -> Self {
        self.order = Some(order);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn params(&self) -> &[Value] {
        &self.params
    }

    /// Names of the steps this one waits for.
    pub fn dependencies(&self) -> &[String] {
        &self.after
    }

    pub fn dialect(&self) -> Option<Dialect> {
        self.dialect
    }

    pub fn expectation(&self) -> &Expectation {
        &self.expect
    }

    pub fn typecasts(&self) -> &TypecastMap {
        &self.typecasts
    }

    pub fn mode(&self) -> Option<MatchMode> {
        self.mode
    }

    pub fn order(&self) -> Option<RowOrder> {
        self.order
    }

    pub fn runs_on(&self, dialect: Dialect) -> bool {
        self.dialect.is_none_or(|d| d == dialect)
    }
}

/// An ordered list of steps with declared dependencies.
#[derive(Debug, Clone, Default)]
pub struct Plan {
    steps: Vec<Step>,
}

impl Plan {
    pub fn new() -> Self {
        Self::default()
    }

    /// A plan in which every step runs after the one before it.
    pub fn sequence(steps: impl IntoIterator<Item = Step>) -> Self {
        let mut plan = Self::new();
        for step in steps {
            let step = match plan.steps.last() {
                Some(prev) => step.after(prev.name.clone()),
                None => step,
            };
            plan.steps.push(step);
        }
        plan
    }

    pub fn push(&mut self, step: Step) {
        self.steps.push(step);
    }

    pub fn then(mut self, step: Step) -> Self {
        self.push(step);
        self
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Group steps into dependency waves.
    ///
    /// Every step lands in the first stage after all of its dependencies.
    /// Within a stage, steps keep their declaration order.
    pub fn stages(&self) -> Result<Vec<Vec<&Step>>, PlanError> {
        let mut index = HashMap::with_capacity(self.steps.len());
        for (i, step) in self.steps.iter().enumerate() {
            if index.insert(step.name.as_str(), i).is_some() {
                return Err(PlanError::DuplicateStep(step.name.clone()));
            }
        }

        let mut pending = vec![0usize; self.steps.len()];
        let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); self.steps.len()];
        for (i, step) in self.steps.iter().enumerate() {
            for dependency in &step.after {
                let Some(&d) = index.get(dependency.as_str()) else {
                    return Err(PlanError::UnknownDependency {
                        step: step.name.clone(),
                        dependency: dependency.clone(),
                    });
                };
                pending[i] += 1;
                dependents[d].push(i);
            }
        }

        let mut done = vec![false; self.steps.len()];
        let mut stages = Vec::new();
        let mut remaining = self.steps.len();
        while remaining > 0 {
            let ready: Vec<usize> = (0..self.steps.len())
                .filter(|&i| !done[i] && pending[i] == 0)
                .collect();
            if ready.is_empty() {
                let stuck = (0..self.steps.len())
                    .filter(|&i| !done[i])
                    .map(|i| self.steps[i].name.clone())
                    .collect();
                return Err(PlanError::Cycle(stuck));
            }
            for &i in &ready {
                done[i] = true;
                for &dependent in &dependents[i] {
                    pending[dependent] -= 1;
                }
            }
            remaining -= ready.len();
            stages.push(ready.into_iter().map(|i| &self.steps[i]).collect());
        }
        Ok(stages)
    }
}

impl FromIterator<Step> for Plan {
    fn from_iter<I: IntoIterator<Item = Step>>(iter: I) -> Self {
        Self {
            steps: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use sqlex_verify::row;

    use super::*;

    fn names(stages: &[Vec<&Step>]) -> Vec<Vec<String>> {
        stages
            .iter()
            .map(|stage| stage.iter().map(|s| s.name().to_owned()).collect())
            .collect()
    }

    #[test]
    fn test_independent_steps_share_a_stage() {
        let plan: Plan = [Step::new("a", "SELECT 1"), Step::new("b", "SELECT 2")]
            .into_iter()
            .collect();
        assert_eq!(names(&plan.stages().unwrap()), [vec!["a", "b"]]);
    }

    #[test]
    fn test_dependency_waves() {
        let plan = Plan::new()
            .then(Step::new("delete animals", "").after("nothing"))
            .then(Step::new("nothing", ""))
            .then(Step::new("insert links", "").after("insert animals").after("insert tags"))
            .then(Step::new("insert animals", "").after("delete animals"))
            .then(Step::new("insert tags", "").after("delete animals"));

        assert_eq!(
            names(&plan.stages().unwrap()),
            [
                vec!["nothing"],
                vec!["delete animals"],
                vec!["insert animals", "insert tags"],
                vec!["insert links"],
            ]
        );
    }

    #[test]
    fn test_sequence_chains_steps() {
        let plan = Plan::sequence([
            Step::new("one", ""),
            Step::new("two", ""),
            Step::new("three", ""),
        ]);
        assert!(plan.steps()[0].dependencies().is_empty());
        assert_eq!(plan.steps()[2].dependencies(), ["two"]);
        assert_eq!(
            names(&plan.stages().unwrap()),
            [vec!["one"], vec!["two"], vec!["three"]]
        );
    }

    #[test]
    fn test_after_ignores_repeats() {
        let step = Step::new("b", "").after("a").after("a");
        assert_eq!(step.dependencies(), ["a"]);
    }

    #[test]
    fn test_empty_plan() {
        assert!(Plan::new().stages().unwrap().is_empty());
    }

    #[rstest]
    #[case::duplicate(
        vec![Step::new("a", ""), Step::new("a", "")],
        PlanError::DuplicateStep("a".into())
    )]
    #[case::unknown(
        vec![Step::new("a", "").after("ghost")],
        PlanError::UnknownDependency { step: "a".into(), dependency: "ghost".into() }
    )]
    #[case::self_cycle(
        vec![Step::new("a", "").after("a")],
        PlanError::Cycle(vec!["a".into()])
    )]
    #[case::cycle(
        vec![
            Step::new("root", ""),
            Step::new("a", "").after("b"),
            Step::new("b", "").after("a").after("root"),
        ],
        PlanError::Cycle(vec!["a".into(), "b".into()])
    )]
    fn test_invalid_plans(#[case] steps: Vec<Step>, #[case] expected: PlanError) {
        let plan: Plan = steps.into_iter().collect();
        assert_eq!(plan.stages().unwrap_err(), expected);
    }

    #[test]
    fn test_step_builder() {
        let step = Step::new("count", "SELECT COUNT(*) AS cnt FROM t WHERE id > ?1")
            .param(1)
            .only_on(Dialect::Postgres)
            .expect_rows([row! { "cnt" => 3 }])
            .row_order(RowOrder::Unordered);

        assert_eq!(step.params(), [Value::Integer(1)]);
        assert!(step.runs_on(Dialect::Postgres));
        assert!(!step.runs_on(Dialect::Sqlite));
        assert_eq!(
            step.expectation(),
            &Expectation::Rows(vec![row! { "cnt" => 3 }])
        );
        assert_eq!(step.order(), Some(RowOrder::Unordered));
        assert_eq!(step.mode(), None);
        assert!(Step::new("any", "").runs_on(Dialect::Sqlite));
    }
}

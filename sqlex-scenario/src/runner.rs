// SPDX-FileCopyrightText: 2025 sqlex contributors
// SPDX-License-Identifier: MIT

//! Running suites against a backend.

use sqlex_db::{Backend, Dialect};
use sqlex_verify::{Verifier, VerifyConfig};
use tracing::{debug, info, warn};

use crate::error::StepError;
use crate::plan::{Expectation, Plan, Step};
use crate::report::{Outcome, Report, ScenarioReport};
use crate::scenario::Suite;

/// Executes suites on one connection.
///
/// Steps run one at a time in stage order. Steps sharing a stage are
/// independent, but they still share the connection, so writes that
/// depend on each other or cascade through linked tables never overlap.
#[derive(Debug, Clone, Default)]
pub struct Runner {
    verifier: Verifier,
    fail_fast: bool,
    filters: Vec<String>,
}

impl Runner {
    /// A runner comparing rows with `verifier`.
    ///
    /// The verifier's typecasts take precedence over a suite's defaults.
    pub fn new(verifier: Verifier) -> Self {
        Self {
            verifier,
            ..Self::default()
        }
    }

    /// Stop after the first failed scenario.
    pub fn fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    /// Only run scenarios whose name contains one of `filters`.
    pub fn filter<I, S>(mut self, filters: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.filters = filters.into_iter().map(Into::into).collect();
        self
    }

    /// Run `suite` against `backend`.
    ///
    /// An error is returned only when the suite cannot be set up; scenario
    /// failures are recorded in the [`Report`].
    pub fn run<B: Backend + ?Sized>(
        &self,
        backend: &mut B,
        suite: &Suite,
    ) -> Result<Report, StepError> {
        let dialect = backend.dialect();
        let verifier = self.suite_verifier(suite);
        let mut report = Report::new(suite.name(), dialect);

        info!("Setting up suite {} on {}", suite.name(), dialect);
        for table in suite.drop_tables() {
            backend
                .drop_table(table)
                .map_err(|source| StepError::Backend {
                    step: format!("drop {table}"),
                    source,
                })?;
        }
        run_plan(backend, suite.setup(), &verifier, dialect)?;

        let mut stopped = false;
        for scenario in suite.select(self.filters.as_slice()) {
            let name = scenario.name().to_owned();
            if stopped {
                report.scenarios.push(ScenarioReport {
                    name,
                    outcome: Outcome::Skipped {
                        reason: "not run after an earlier failure".into(),
                    },
                    skipped_steps: 0,
                });
                continue;
            }
            if !scenario.runs_on(dialect) {
                let reason = match scenario.dialect() {
                    Some(only) => format!("{only} only"),
                    None => String::new(),
                };
                info!("SKIP {name} ({reason})");
                report.scenarios.push(ScenarioReport {
                    name,
                    outcome: Outcome::Skipped { reason },
                    skipped_steps: 0,
                });
                continue;
            }

            let result = run_plan(backend, suite.reset(), &verifier, dialect)
                .map_err(|e| format!("reset: {e}"))
                .and_then(|_| {
                    run_plan(backend, scenario.plan(), &verifier, dialect)
                        .map_err(|e| e.to_string())
                });
            let (outcome, skipped_steps) = match result {
                Ok(skipped) => {
                    info!("PASS {name}");
                    (Outcome::Passed, skipped)
                }
                Err(message) => {
                    warn!("FAIL {name}: {message}");
                    stopped = self.fail_fast;
                    (Outcome::Failed { message }, 0)
                }
            };
            report.scenarios.push(ScenarioReport {
                name,
                outcome,
                skipped_steps,
            });
        }

        Ok(report)
    }

    fn suite_verifier(&self, suite: &Suite) -> Verifier {
        let config = self.verifier.config();
        Verifier::new(VerifyConfig {
            typecasts: suite.typecasts().overlay(&config.typecasts),
            mode: config.mode,
            order: config.order,
        })
    }
}

/// Run every step of `plan` that applies to `dialect`, returning how many
/// steps were skipped.
pub fn run_plan<B: Backend + ?Sized>(
    backend: &mut B,
    plan: &Plan,
    verifier: &Verifier,
    dialect: Dialect,
) -> Result<usize, StepError> {
    let mut skipped = 0;
    for stage in plan.stages()? {
        for step in stage {
            if !step.runs_on(dialect) {
                debug!("Skipping step '{}' on {}", step.name(), dialect);
                skipped += 1;
                continue;
            }
            run_step(backend, step, verifier)?;
        }
    }
    Ok(skipped)
}

fn run_step<B: Backend + ?Sized>(
    backend: &mut B,
    step: &Step,
    verifier: &Verifier,
) -> Result<(), StepError> {
    debug!("Running step '{}'", step.name());
    let result = backend.query(step.sql(), step.params());

    let rs = match (step.expectation(), result) {
        (Expectation::Fails(expected), Ok(_)) => {
            return Err(StepError::UnexpectedSuccess {
                step: step.name().to_owned(),
                expected: *expected,
            });
        }
        (Expectation::Fails(expected), Err(source)) => {
            let actual = source.kind();
            if actual == *expected {
                debug!("Step '{}' failed as expected: {}", step.name(), source);
                return Ok(());
            }
            return Err(StepError::WrongErrorKind {
                step: step.name().to_owned(),
                expected: *expected,
                actual,
                source,
            });
        }
        (_, Err(source)) => {
            return Err(StepError::Backend {
                step: step.name().to_owned(),
                source,
            });
        }
        (_, Ok(rs)) => rs,
    };

    match step.expectation() {
        Expectation::Rows(expected) => step_verifier(verifier, step)
            .verify(rs.rows(), expected)
            .map_err(|source| StepError::Verify {
                step: step.name().to_owned(),
                source,
            }),
        Expectation::Affected(expected) => {
            let actual = rs.meta.rows_affected.unwrap_or(0);
            if actual == *expected {
                Ok(())
            } else {
                Err(StepError::AffectedMismatch {
                    step: step.name().to_owned(),
                    expected: *expected,
                    actual,
                })
            }
        }
        Expectation::Nothing | Expectation::Fails(_) => Ok(()),
    }
}

fn step_verifier(verifier: &Verifier, step: &Step) -> Verifier {
    let mut scoped = verifier.with_overrides(step.typecasts());
    if let Some(mode) = step.mode() {
        scoped = scoped.with_mode(mode);
    }
    if let Some(order) = step.order() {
        scoped = scoped.with_order(order);
    }
    scoped
}

#[cfg(test)]
mod tests {
    use sqlex_db::{Database, ErrorKind};
    use sqlex_verify::{Coercion, RowOrder, TypecastMap, VerifyError, row};

    use super::*;
    use crate::scenario::Scenario;

    fn suite() -> Suite {
        Suite::new("pets")
            .with_drops(["Pet"])
            .with_setup(Plan::new().then(Step::new(
                "create",
                r#"CREATE TABLE "Pet" (id INTEGER PRIMARY KEY, name TEXT NOT NULL UNIQUE)"#,
            )))
            .with_reset(Plan::sequence([
                Step::new("clear", r#"DELETE FROM "Pet""#),
                Step::new("fill", r#"INSERT INTO "Pet" VALUES (0, 'dog'), (1, 'cat')"#)
                    .expect_affected(2),
            ]))
            .with_typecasts([("cnt", Coercion::Integer)].into_iter().collect())
    }

    fn count(name: &str, cnt: &str) -> Scenario {
        Scenario::new(
            name,
            Plan::new().then(
                Step::new("count", r#"SELECT COUNT(*) AS cnt FROM "Pet""#)
                    .expect_rows([row! { "cnt" => cnt }]),
            ),
        )
    }

    fn run(runner: &Runner, suite: &Suite) -> Report {
        let mut db = Database::open_memory().unwrap();
        runner.run(&mut db, suite).unwrap()
    }

    #[test_log::test]
    fn test_reset_runs_before_each_scenario() {
        let suite = suite()
            .scenario(Scenario::new(
                "delete",
                Plan::new().then(Step::new("delete", r#"DELETE FROM "Pet""#).expect_affected(2)),
            ))
            .scenario(count("count after delete", "2"));

        let report = run(&Runner::default(), &suite);
        assert!(report.is_success(), "{report}");
        assert_eq!(report.totals().passed, 2);
    }

    #[test_log::test]
    fn test_failure_is_recorded_and_run_continues() {
        let suite = suite()
            .scenario(count("wrong count", "3"))
            .scenario(count("right count", "2"));

        let report = run(&Runner::default(), &suite);
        assert!(!report.is_success());
        assert_eq!(
            report.scenarios[0].outcome,
            Outcome::Failed {
                message: VerifyError::ValueMismatch {
                    row: 0,
                    column: "cnt".into(),
                    expected: 3.into(),
                    actual: 2.into(),
                }
                .to_string()
                .replace("row 0", "step 'count': row 0"),
            }
        );
        assert_eq!(report.scenarios[1].outcome, Outcome::Passed);
    }

    #[test]
    fn test_fail_fast_skips_the_rest() {
        let suite = suite()
            .scenario(count("wrong count", "3"))
            .scenario(count("right count", "2"));

        let report = run(&Runner::default().fail_fast(true), &suite);
        assert!(matches!(report.scenarios[1].outcome, Outcome::Skipped { .. }));
    }

    #[test]
    fn test_filter() {
        let suite = suite()
            .scenario(count("first", "2"))
            .scenario(count("second", "2"));

        let report = run(&Runner::default().filter(["sec"]), &suite);
        assert_eq!(report.scenarios.len(), 1);
        assert_eq!(report.scenarios[0].name, "second");
    }

    #[test]
    fn test_dialect_skips() {
        let suite = suite()
            .scenario(count("postgres", "2").only_on(Dialect::Postgres))
            .scenario(Scenario::new(
                "mixed",
                Plan::new()
                    .then(
                        Step::new("pg", r#"DELETE FROM "Pet" USING "Pet" AS p2"#)
                            .only_on(Dialect::Postgres),
                    )
                    .then(Step::new("portable", r#"SELECT 1"#)),
            ));

        let report = run(&Runner::default(), &suite);
        assert_eq!(
            report.scenarios[0].outcome,
            Outcome::Skipped {
                reason: "postgres only".into()
            }
        );
        assert_eq!(report.scenarios[1].outcome, Outcome::Passed);
        assert_eq!(report.scenarios[1].skipped_steps, 1);
    }

    #[test]
    fn test_expected_errors() {
        let suite = suite()
            .scenario(Scenario::new(
                "unique",
                Plan::new().then(
                    Step::new("dup", r#"INSERT INTO "Pet" VALUES (5, 'dog')"#)
                        .expect_error(ErrorKind::Constraint),
                ),
            ))
            .scenario(Scenario::new(
                "wrong kind",
                Plan::new().then(
                    Step::new("dup", r#"INSERT INTO "Pet" VALUES (5, 'dog')"#)
                        .expect_error(ErrorKind::Syntax),
                ),
            ))
            .scenario(Scenario::new(
                "no error",
                Plan::new().then(Step::new("ok", "SELECT 1").expect_error(ErrorKind::Other)),
            ));

        let report = run(&Runner::default(), &suite);
        assert_eq!(report.scenarios[0].outcome, Outcome::Passed);
        let Outcome::Failed { message } = &report.scenarios[1].outcome else {
            panic!("expected a failure: {report}");
        };
        assert!(message.contains("expected syntax error, got constraint violation"));
        let Outcome::Failed { message } = &report.scenarios[2].outcome else {
            panic!("expected a failure: {report}");
        };
        assert!(message.contains("but the statement succeeded"));
    }

    #[test]
    fn test_step_overrides() {
        let suite = suite().scenario(Scenario::new(
            "unordered",
            Plan::new().then(
                Step::new("names", r#"SELECT id, name FROM "Pet" ORDER BY id DESC"#)
                    .expect_rows([row! { "id" => "0" }, row! { "id" => "1" }])
                    .typecast("id", Coercion::Integer)
                    .row_order(RowOrder::Unordered),
            ),
        ));

        let report = run(&Runner::default(), &suite);
        assert!(report.is_success(), "{report}");
    }

    #[test]
    fn test_verifier_typecasts_win_over_suite() {
        let config = VerifyConfig {
            typecasts: TypecastMap::new().with("cnt", Coercion::Text),
            ..VerifyConfig::default()
        };
        let suite = suite().scenario(count("as text", "2"));

        let report = run(&Runner::new(Verifier::new(config)), &suite);
        assert!(report.is_success(), "{report}");
    }

    #[test]
    fn test_setup_failure_aborts() {
        let suite = Suite::new("broken")
            .with_setup(Plan::new().then(Step::new("bad", "CREATE TABLE")))
            .scenario(count("never", "0"));

        let mut db = Database::open_memory().unwrap();
        let err = Runner::default().run(&mut db, &suite).unwrap_err();
        assert_eq!(err.step(), Some("bad"));
    }
}

// SPDX-FileCopyrightText: 2025 sqlex contributors
// SPDX-License-Identifier: MIT

//! Runs the many-to-many suite against SQLite.

use sqlex_db::{Backend, Database, Dialect, OpenMode};
use sqlex_scenario::{Outcome, Runner, many_to_many};
use sqlex_verify::{Coercion, Verifier, assert_rows_eq, row};

#[test_log::test]
fn test_suite_passes_in_memory() {
    let mut db = Database::open_memory().unwrap();
    let suite = many_to_many::suite();
    let report = Runner::default().run(&mut db, &suite).unwrap();

    assert!(report.is_success(), "{report}");
    assert_eq!(report.scenarios.len(), suite.scenarios().len());

    let totals = report.totals();
    assert_eq!(totals.failed, 0);
    assert_eq!(totals.skipped, 1);
    let skipped = report
        .scenarios
        .iter()
        .find(|s| matches!(s.outcome, Outcome::Skipped { .. }))
        .unwrap();
    assert_eq!(skipped.name, "delete animals tagged flying using join");
}

/// Running twice on one file exercises the initial drops.
#[test_log::test]
fn test_suite_reruns_on_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("animals.sqlite");
    let suite = many_to_many::suite();

    for _ in 0..2 {
        let mut db = Database::open(&path, OpenMode::Create).unwrap();
        let report = Runner::default().run(&mut db, &suite).unwrap();
        assert!(report.is_success(), "{report}");
    }
}

#[test]
fn test_last_scenario_leaves_fixture_mutated() {
    let mut db = sqlex_db::connect(Dialect::Sqlite, ":memory:").unwrap();
    let report = Runner::default()
        .filter(["delete tags of dog"])
        .run(&mut db, &many_to_many::suite())
        .unwrap();
    assert!(report.is_success(), "{report}");

    // mammal is gone, and so are its links
    let rs = db
        .query(r#"SELECT COUNT(*) AS cnt FROM "AnimalTag""#, &[])
        .unwrap();
    assert_rows_eq!(rs, [row! { "cnt" => 5 }]);
}

/// Counts compared as text still match once both sides are coerced.
#[test]
fn test_verifier_typecast_overrides_suite() {
    let verifier = Verifier::default().with_typecast("cnt", Coercion::Text);
    let mut db = Database::open_memory().unwrap();
    let report = Runner::new(verifier)
        .filter(["animal count per tag"])
        .run(&mut db, &many_to_many::suite())
        .unwrap();
    assert!(report.is_success(), "{report}");
    assert_eq!(report.scenarios.len(), 2);
}

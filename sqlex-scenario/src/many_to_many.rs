// SPDX-FileCopyrightText: 2025 sqlex contributors
// SPDX-License-Identifier: MIT

//! Animals and tags linked through a join table.
//!
//! The fixture holds four animals and four tags:
//!
//! | animal | tags               |
//! |--------|--------------------|
//! | dog    | mammal, vertebrate |
//! | cat    | mammal, vertebrate |
//! | hawk   | flying, vertebrate |
//! | bee    | flying             |
//!
//! No animal is `aquatic`. Both foreign keys of `AnimalTag` cascade on
//! delete, so clearing either side also clears the links.

use sqlex_db::{Dialect, ErrorKind};
use sqlex_verify::{Coercion, Row, TypecastMap, row};

use crate::plan::{Plan, Step};
use crate::scenario::{Scenario, Suite};

const CREATE_ANIMAL: &str =
    r#"CREATE TABLE "Animal" (id INTEGER PRIMARY KEY, name TEXT NOT NULL UNIQUE)"#;

const CREATE_TAG: &str =
    r#"CREATE TABLE "Tag" (id INTEGER PRIMARY KEY, name TEXT NOT NULL UNIQUE)"#;

const CREATE_ANIMAL_TAG: &str = r#"
CREATE TABLE "AnimalTag" (
  "animalId" INTEGER NOT NULL,
  "tagId" INTEGER NOT NULL,
  PRIMARY KEY ("animalId", "tagId"),
  FOREIGN KEY ("animalId") REFERENCES "Animal"(id) ON DELETE CASCADE,
  FOREIGN KEY ("tagId") REFERENCES "Tag"(id) ON DELETE CASCADE
)
"#;

const INSERT_ANIMALS: &str = r#"
INSERT INTO "Animal" VALUES
(0, 'dog'),
(1, 'cat'),
(2, 'hawk'),
(3, 'bee')
"#;

const INSERT_TAGS: &str = r#"
INSERT INTO "Tag" VALUES
(0, 'flying'),
(1, 'mammal'),
(2, 'vertebrate'),
(3, 'aquatic')
"#;

const INSERT_LINKS: &str = r#"
INSERT INTO "AnimalTag" VALUES
(0, 1),
(0, 2),
(1, 1),
(1, 2),
(2, 0),
(2, 2),
(3, 0)
"#;

const SELECT_ANIMALS: &str = r#"SELECT * FROM "Animal" ORDER BY id ASC"#;
const SELECT_TAGS: &str = r#"SELECT * FROM "Tag" ORDER BY id ASC"#;

/// The complete many-to-many suite.
pub fn suite() -> Suite {
    Suite::new("many-to-many")
        .with_drops(["AnimalTag", "Animal", "Tag"])
        .with_setup(schema())
        .with_reset(reset())
        .with_typecasts(TypecastMap::new().with("cnt", Coercion::Integer))
        .scenario(all_tags_of_all_animals())
        .scenario(animals_tagged_flying())
        .scenario(tags_of_dog())
        .scenario(flying_animals_with_all_tags())
        .scenario(animal_count_per_tag())
        .scenario(animal_count_per_tag_with_empty())
        .scenario(tags_with_fewer_than_three_animals())
        .scenario(counts_for_tags_of_dog_by_id())
        .scenario(counts_for_tags_of_dog_by_name())
        .scenario(uppercase_tags_of_dog())
        .scenario(delete_cascades_to_links())
        .scenario(delete_using_join())
        .scenario(delete_via_subquery())
        .scenario(delete_sparse_tags_of_dog())
        .scenario(unique_violation())
        .scenario(foreign_key_violation())
        .scenario(delete_join_rejected())
}

/// Tables; the link table is created once both sides exist.
pub fn schema() -> Plan {
    Plan::new()
        .then(Step::new("create Animal", CREATE_ANIMAL))
        .then(Step::new("create Tag", CREATE_TAG))
        .then(
            Step::new("create AnimalTag", CREATE_ANIMAL_TAG)
                .after("create Animal")
                .after("create Tag"),
        )
}

/// Restore the fixture.
///
/// Deleting from either side clears `AnimalTag` through the cascade. The
/// two deletes are chained because cascades into the same link table from
/// two statements at once can deadlock on PostgreSQL.
pub fn reset() -> Plan {
    Plan::sequence([
        Step::new("delete Animal", r#"DELETE FROM "Animal""#),
        Step::new("delete Tag", r#"DELETE FROM "Tag""#),
    ])
    .then(Step::new("insert Animal", INSERT_ANIMALS).after("delete Tag"))
    .then(Step::new("insert Tag", INSERT_TAGS).after("delete Tag"))
    .then(
        Step::new("insert AnimalTag", INSERT_LINKS)
            .after("insert Animal")
            .after("insert Tag"),
    )
}

fn names(column: &str, values: &[&str]) -> Vec<Row> {
    values.iter().map(|v| row! { column => *v }).collect()
}

fn single(name: &str, step: Step) -> Scenario {
    Scenario::new(name, Plan::new().then(step))
}

fn all_tags_of_all_animals() -> Scenario {
    single(
        "all tags of all animals",
        Step::new(
            "select",
            r#"
SELECT
  "Animal".name AS "Animal_name",
  "Tag".name AS "Tag_name"
FROM "Animal"
INNER JOIN "AnimalTag"
  ON "Animal"."id" = "AnimalTag"."animalId"
INNER JOIN "Tag"
  ON "AnimalTag"."tagId" = "Tag"."id"
ORDER BY "Animal"."id" ASC, "Tag"."id" ASC
"#,
        )
        .expect_rows([
            row! { "Animal_name" => "dog", "Tag_name" => "mammal" },
            row! { "Animal_name" => "dog", "Tag_name" => "vertebrate" },
            row! { "Animal_name" => "cat", "Tag_name" => "mammal" },
            row! { "Animal_name" => "cat", "Tag_name" => "vertebrate" },
            row! { "Animal_name" => "hawk", "Tag_name" => "flying" },
            row! { "Animal_name" => "hawk", "Tag_name" => "vertebrate" },
            row! { "Animal_name" => "bee", "Tag_name" => "flying" },
        ]),
    )
    .describe("A join through the link table repeats animals and tags")
}

fn animals_tagged_flying() -> Scenario {
    single(
        "animals tagged flying",
        Step::new(
            "select",
            r#"
SELECT
  "Animal".name AS "Animal_name"
FROM "Animal"
INNER JOIN "AnimalTag"
  ON "Animal"."id" = "AnimalTag"."animalId"
INNER JOIN "Tag"
  ON "AnimalTag"."tagId" = "Tag".id
  AND "Tag".name = 'flying'
ORDER BY "Animal".id ASC
"#,
        )
        .expect_rows(names("Animal_name", &["hawk", "bee"])),
    )
}

fn tags_of_dog() -> Scenario {
    single(
        "tags of dog",
        Step::new(
            "select",
            r#"
SELECT
  "Tag".name AS "Tag_name"
FROM "Tag"
INNER JOIN "AnimalTag"
  ON "Tag".id = "AnimalTag"."tagId"
INNER JOIN "Animal"
  ON "AnimalTag"."animalId" = "Animal".id
  AND "Animal".name = 'dog'
ORDER BY "Tag".id ASC
"#,
        )
        .expect_rows(names("Tag_name", &["mammal", "vertebrate"])),
    )
}

fn flying_animals_with_all_tags() -> Scenario {
    single(
        "flying animals with all their tags",
        Step::new(
            "select",
            r#"
SELECT
  "Animal".name AS "Animal_name",
  "Tag2".name AS "Tag_name"
FROM "Animal"
INNER JOIN "AnimalTag"
  ON "Animal"."id" = "AnimalTag"."animalId"
INNER JOIN "Tag"
  ON "AnimalTag"."tagId" = "Tag".id
  AND "Tag".name = 'flying'
INNER JOIN "AnimalTag" AS "AnimalTag2"
  ON "AnimalTag2"."animalId" = "Animal".id
INNER JOIN "Tag" AS "Tag2"
  ON "Tag2".id = "AnimalTag2"."tagId"
ORDER BY "Animal".id ASC, "Tag2".id ASC
"#,
        )
        .expect_rows([
            row! { "Animal_name" => "hawk", "Tag_name" => "flying" },
            row! { "Animal_name" => "hawk", "Tag_name" => "vertebrate" },
            row! { "Animal_name" => "bee", "Tag_name" => "flying" },
        ]),
    )
    .describe("Filter on one tag but keep every tag of the matching animals")
}

fn animal_count_per_tag() -> Scenario {
    single(
        "animal count per tag",
        Step::new(
            "select",
            r#"
SELECT
  "Tag".id AS "id",
  "Tag".name AS "name",
  COUNT(*) AS "cnt"
FROM "Tag"
INNER JOIN "AnimalTag"
  ON "Tag"."id" = "AnimalTag"."tagId"
INNER JOIN "Animal"
  ON "AnimalTag"."animalId" = "Animal"."id"
GROUP BY "Tag"."id"
ORDER BY
  "cnt" DESC,
  "Tag".id ASC
"#,
        )
        .expect_rows([
            row! { "name" => "vertebrate", "cnt" => 3 },
            row! { "name" => "flying", "cnt" => 2 },
            row! { "name" => "mammal", "cnt" => 2 },
        ]),
    )
    .describe("Grouping by the primary key allows selecting other tag columns")
}

fn animal_count_per_tag_with_empty() -> Scenario {
    single(
        "animal count per tag including empty tags",
        Step::new(
            "select",
            r#"
SELECT
  "Tag".name AS name,
  COUNT("Animal".id) AS cnt
FROM "Tag"
LEFT OUTER JOIN "AnimalTag"
  ON "Tag".id = "AnimalTag"."tagId"
LEFT OUTER JOIN "Animal"
  ON "AnimalTag"."animalId" = "Animal".id
GROUP BY "Tag".id
ORDER BY
  cnt DESC,
  "Tag".id ASC
"#,
        )
        .expect_rows([
            row! { "name" => "vertebrate", "cnt" => 3 },
            row! { "name" => "flying", "cnt" => 2 },
            row! { "name" => "mammal", "cnt" => 2 },
            row! { "name" => "aquatic", "cnt" => 0 },
        ]),
    )
}

fn tags_with_fewer_than_three_animals() -> Scenario {
    single(
        "tags with fewer than three animals",
        Step::new(
            "select",
            r#"
SELECT
  "Tag".name AS name,
  COUNT(*) AS cnt
FROM "Tag"
INNER JOIN "AnimalTag"
  ON "Tag".id = "AnimalTag"."tagId"
INNER JOIN "Animal"
  ON "AnimalTag"."animalId" = "Animal".id
GROUP BY "Tag".id
HAVING
  COUNT(*) < 3
ORDER BY
  "cnt" DESC,
  "Tag".id ASC
"#,
        )
        .expect_rows([
            row! { "name" => "flying", "cnt" => 2 },
            row! { "name" => "mammal", "cnt" => 2 },
        ]),
    )
    .describe("HAVING repeats the aggregate since the alias is not visible there")
}

fn counts_for_tags_of_dog_by_id() -> Scenario {
    single(
        "animal counts for tags of dog by id",
        Step::new(
            "select",
            r#"
SELECT
  COUNT(*) AS cnt,
  "AnimalTag2"."tagId" AS "tagId"
FROM "Animal"
INNER JOIN "AnimalTag"
  ON "Animal".name = 'dog'
  AND "Animal".id = "AnimalTag"."animalId"
INNER JOIN "Tag"
  ON "Tag".id = "AnimalTag"."tagId"
INNER JOIN "AnimalTag" AS "AnimalTag2"
  ON "AnimalTag2"."tagId" = "AnimalTag"."tagId"
GROUP BY "AnimalTag2"."tagId"
ORDER BY
  cnt DESC,
  "AnimalTag2"."tagId" ASC
"#,
        )
        .expect_rows([
            row! { "tagId" => 2, "cnt" => 3 },
            row! { "tagId" => 1, "cnt" => 2 },
        ]),
    )
}

fn counts_for_tags_of_dog_by_name() -> Scenario {
    single(
        "animal counts for tags of dog by name",
        Step::new(
            "select",
            r#"
SELECT
  COUNT(*) AS cnt,
  "Tag".name AS name
FROM "Animal"
INNER JOIN "AnimalTag"
  ON "Animal".name = 'dog'
  AND "Animal".id = "AnimalTag"."animalId"
INNER JOIN "Tag"
  ON "Tag".id = "AnimalTag"."tagId"
INNER JOIN "AnimalTag" AS "AnimalTag2"
  ON "AnimalTag2"."tagId" = "AnimalTag"."tagId"
GROUP BY "Tag".name
ORDER BY
  cnt DESC,
  "Tag"."name" ASC
"#,
        )
        .expect_rows([
            row! { "name" => "vertebrate", "cnt" => 3 },
            row! { "name" => "mammal", "cnt" => 2 },
        ]),
    )
}

fn uppercase_tags_of_dog() -> Scenario {
    Scenario::new(
        "uppercase tags of dog",
        Plan::sequence([
            Step::new(
                "update",
                r#"
UPDATE "Tag"
  SET "name" = UPPER(name)
WHERE "id" IN (
  SELECT "AnimalTag"."tagId"
  FROM "Animal"
  INNER JOIN "AnimalTag"
    ON "AnimalTag"."animalId" = "Animal"."id"
    AND "Animal"."name" = 'dog'
)
"#,
            )
            .expect_affected(2),
            Step::new("select", SELECT_TAGS).expect_rows(names(
                "name",
                &["flying", "MAMMAL", "VERTEBRATE", "aquatic"],
            )),
        ]),
    )
    .describe("Portable UPDATE selecting its targets with a subquery")
}

fn delete_cascades_to_links() -> Scenario {
    Scenario::new(
        "delete cascades to links",
        Plan::sequence([
            Step::new("delete", r#"DELETE FROM "Tag" WHERE id = 2"#).expect_affected(1),
            Step::new(
                "select",
                r#"SELECT * FROM "AnimalTag" ORDER BY "animalId" ASC, "tagId" ASC"#,
            )
            .expect_rows([
                row! { "animalId" => 0, "tagId" => 1 },
                row! { "animalId" => 1, "tagId" => 1 },
                row! { "animalId" => 2, "tagId" => 0 },
                row! { "animalId" => 3, "tagId" => 0 },
            ]),
        ]),
    )
    .describe("Deleting the vertebrate tag removes its links")
}

fn delete_using_join() -> Scenario {
    Scenario::new(
        "delete animals tagged flying using join",
        Plan::sequence([
            Step::new(
                "delete",
                r#"
DELETE FROM "Animal"
USING "AnimalTag", "Tag"
WHERE "Animal".id = "AnimalTag"."animalId"
  AND "AnimalTag"."tagId" = "Tag".id
  AND "Tag".name = 'flying'
"#,
            )
            .expect_affected(2),
            Step::new("select", SELECT_ANIMALS).expect_rows(names("name", &["dog", "cat"])),
        ]),
    )
    .only_on(Dialect::Postgres)
    .describe("DELETE ... USING is a PostgreSQL extension")
}

fn delete_via_subquery() -> Scenario {
    Scenario::new(
        "delete animals tagged flying via subquery",
        Plan::sequence([
            Step::new(
                "delete",
                r#"
DELETE FROM "Animal"
WHERE "Animal".id IN (
  SELECT
    "Animal".id
  FROM "Animal"
  INNER JOIN "AnimalTag"
    ON "Animal".id = "AnimalTag"."animalId"
  INNER JOIN "Tag"
    ON "AnimalTag"."tagId" = "Tag".id
    AND "Tag".name = 'flying'
)
"#,
            )
            .expect_affected(2),
            Step::new("select", SELECT_ANIMALS).expect_rows(names("name", &["dog", "cat"])),
        ]),
    )
}

fn delete_sparse_tags_of_dog() -> Scenario {
    Scenario::new(
        "delete tags of dog with fewer than three animals",
        Plan::sequence([
            Step::new(
                "delete",
                r#"
DELETE FROM "Tag"
WHERE "Tag".id IN (
  SELECT
    "AnimalTag2"."tagId"
  FROM "Animal"
  INNER JOIN "AnimalTag"
    ON "Animal".name = 'dog'
    AND "Animal".id = "AnimalTag"."animalId"
  INNER JOIN "Tag"
    ON "Tag".id = "AnimalTag"."tagId"
  INNER JOIN "AnimalTag" AS "AnimalTag2"
    ON "AnimalTag2"."tagId" = "AnimalTag"."tagId"
  GROUP BY "AnimalTag2"."tagId"
  HAVING
    COUNT(*) < 3
)
"#,
            )
            .expect_affected(1),
            Step::new("select", SELECT_TAGS)
                .expect_rows(names("name", &["flying", "vertebrate", "aquatic"])),
        ]),
    )
    .describe("Only mammal is shared by fewer than three animals")
}

fn unique_violation() -> Scenario {
    Scenario::new(
        "duplicate animal name is rejected",
        Plan::sequence([
            Step::new("insert", r#"INSERT INTO "Animal" VALUES (4, $1)"#)
                .param("dog")
                .expect_error(ErrorKind::Constraint),
            Step::new("select", SELECT_ANIMALS)
                .expect_rows(names("name", &["dog", "cat", "hawk", "bee"])),
        ]),
    )
}

fn foreign_key_violation() -> Scenario {
    Scenario::new(
        "link to missing animal is rejected",
        Plan::sequence([
            Step::new("insert", r#"INSERT INTO "AnimalTag" VALUES ($1, $2)"#)
                .param(9)
                .param(0)
                .expect_error(ErrorKind::Constraint),
            Step::new("count", r#"SELECT COUNT(*) AS cnt FROM "AnimalTag""#)
                .expect_rows([row! { "cnt" => 7 }]),
        ]),
    )
}

fn delete_join_rejected() -> Scenario {
    single(
        "delete with join is a syntax error",
        Step::new(
            "delete",
            r#"
DELETE FROM "Animal"
INNER JOIN "AnimalTag"
  ON "Animal".id = "AnimalTag"."animalId"
INNER JOIN "Tag"
  ON "AnimalTag"."tagId" = "Tag".id
  AND "Tag".name = 'flying'
"#,
        )
        .expect_error(ErrorKind::Syntax),
    )
    .describe("DELETE has no JOIN clause in either dialect")
}

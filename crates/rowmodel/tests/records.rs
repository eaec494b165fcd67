//! Finds, scopes, counts and single-table writes against a recording store.

mod common;

use common::{MockDb, people_registry, row};
use rowmodel::prelude::*;
use std::sync::Arc;

fn person(id: i64, name: &str, state: &str) -> Row {
    row(&[
        ("id", Value::BigInt(id)),
        ("name", name.into()),
        ("state", state.into()),
        ("manager_id", Value::Null),
    ])
}

#[test]
fn find_by_field_with_sort() {
    let (db, registry) = people_registry();
    db.script(vec![person(1, "Scott", "LA"), person(2, "Amy", "LA")]);

    let people = registry.record("people").unwrap();
    let found = people
        .find(
            FindParams::new()
                .fields(["state"])
                .values([Value::from("LA")])
                .sort_fields("name"),
        )
        .unwrap();

    assert_eq!(
        db.log(),
        vec![(
            "SELECT *\nFROM `people`\nWHERE `people`.`state` = ?\nORDER BY `people`.`name` ASC"
                .to_string(),
            vec![Value::from("LA")],
        )]
    );
    assert_eq!(found.len(), 2);
    assert_eq!(found[0].get_as::<String>("name").unwrap(), "Scott");
    assert_eq!(found[1].id(), Some(&Value::BigInt(2)));
    assert!(found.iter().all(|r| r.state() == RecordState::Saved));
}

#[test]
fn find_paginates() {
    let (db, registry) = people_registry();
    let people = registry.record("people").unwrap();

    people.find(FindParams::new().page(2).per_page(10)).unwrap();
    people.find(FindParams::new().page("x").per_page("-3")).unwrap();

    let statements = db.statements();
    assert_eq!(statements[0], "SELECT *\nFROM `people`\nLIMIT 10,10");
    assert_eq!(statements[1], "SELECT *\nFROM `people`\nLIMIT 0,15");
}

#[test]
fn find_one_limits_to_a_single_row() {
    let (db, registry) = people_registry();
    db.script(vec![person(1, "Scott", "LA"), person(2, "Amy", "LA")]);

    let people = registry.record("people").unwrap();
    let one = people.find_one(FindParams::new().field("state", "LA")).unwrap();
    assert_eq!(one.and_then(|r| r.id().cloned()), Some(Value::BigInt(1)));
    assert!(db.statements()[0].ends_with("\nLIMIT 0,1"));

    let none = people.find_one(FindParams::new().field("state", "TX")).unwrap();
    assert!(none.is_none());
}

#[test]
fn match_any_and_unknown_fields() {
    let (db, registry) = people_registry();
    let people = registry.record("people").unwrap();

    people
        .find(
            FindParams::new()
                .fields(["state", "name"])
                .values([Value::from("LA"), Value::from("Scott")])
                .match_any(),
        )
        .unwrap();
    people
        .find(
            FindParams::new()
                .fields(["nickname", "state"])
                .values([Value::from("Scotty"), Value::from("LA")]),
        )
        .unwrap();

    let log = db.log();
    assert_eq!(
        log[0].0,
        "SELECT *\nFROM `people`\nWHERE `people`.`state` = ? OR `people`.`name` = ?"
    );
    assert_eq!(log[0].1, vec![Value::from("LA"), Value::from("Scott")]);
    assert_eq!(log[1].0, "SELECT *\nFROM `people`\nWHERE `people`.`state` = ?");
    assert_eq!(log[1].1, vec![Value::from("LA")]);
}

#[test]
fn scope_leaves_original_untouched() {
    let (db, registry) = people_registry();
    let people = registry.record("people").unwrap();
    let active = people.scope("active");

    assert!(people.scope_stack().is_empty());
    assert_eq!(active.scope_stack().len(), 1);

    active.find(FindParams::new().field("state", "LA")).unwrap();
    people.find(FindParams::new().field("state", "LA")).unwrap();

    let log = db.log();
    assert_eq!(
        log[0].0,
        "SELECT *\nFROM `people`\nWHERE (`people`.`status` = ?) AND (`people`.`state` = ?)"
    );
    assert_eq!(log[0].1, vec![Value::from("active"), Value::from("LA")]);
    assert_eq!(log[1].0, "SELECT *\nFROM `people`\nWHERE `people`.`state` = ?");
}

#[test]
fn scoped_limit_and_page_request() {
    let (db, registry) = people_registry();
    let people = registry.record("people").unwrap();

    let request = PageRequest::from_pairs([("page", "3"), ("per_page", "5"), ("sort_field", "name")]);
    people
        .scope(FindParams::from(request))
        .find(FindParams::new())
        .unwrap();

    assert_eq!(
        db.statements()[0],
        "SELECT *\nFROM `people`\nORDER BY `people`.`name` ASC\nLIMIT 10,5"
    );
}

#[test]
fn unknown_named_scope_is_an_error() {
    let (db, registry) = people_registry();
    let people = registry.record("people").unwrap();

    match people.scope("archived").find(FindParams::new()) {
        Err(Error::Scope(e)) => assert_eq!(e.rule, "archived"),
        other => panic!("expected scope error, got {other:?}"),
    }
    assert!(db.statements().is_empty());
}

#[test]
fn get_missing_record() {
    let (db, registry) = people_registry();
    let people = registry.record("people").unwrap();

    let err = people.get(42).unwrap_err();
    assert!(err.is_not_found());
    match err {
        Error::RecordNotFound(e) => {
            assert_eq!(e.table, "people");
            assert_eq!(e.id, "42");
        }
        other => panic!("expected not found, got {other:?}"),
    }
    assert_eq!(
        db.log()[0],
        (
            "SELECT *\nFROM `people`\nWHERE `people`.`id` = ?\nLIMIT 0,1".to_string(),
            vec![Value::Int(42)]
        )
    );
}

#[test]
fn counts_and_exists() {
    let (db, registry) = people_registry();
    let people = registry.record("people").unwrap();

    db.script(vec![row(&[("count", Value::BigInt(3))])]);
    let count = people
        .scope("active")
        .row_count(Some("`id` > ?"), vec![Value::BigInt(10)])
        .unwrap();
    assert_eq!(count, 3);

    db.script(vec![row(&[("count", Value::BigInt(0))])]);
    assert!(!people.exists(5).unwrap());

    let log = db.log();
    assert_eq!(
        log[0].0,
        "SELECT COUNT(*) AS `count` FROM `people` WHERE (`people`.`status` = ?) AND (`id` > ?)"
    );
    assert_eq!(log[0].1, vec![Value::from("active"), Value::BigInt(10)]);
    assert_eq!(log[1].0, "SELECT COUNT(*) AS `count` FROM `people` WHERE `id` = ?");
}

#[test]
fn field_map_round_trip() {
    let (_db, registry) = people_registry();
    let original = registry
        .record_from(
            "people",
            [("name", Value::from("Scott")), ("state", Value::from("LA")), ("manager_id", Value::Null)],
        )
        .unwrap();

    let copy = registry.record_from("people", original.to_map()).unwrap();
    assert_eq!(copy.to_map(), original.to_map());
    assert_eq!(copy.get_as::<Option<i64>>("manager_id").unwrap(), None);
    assert_eq!(
        original.to_json(),
        serde_json::json!({"manager_id": null, "name": "Scott", "state": "LA"})
    );
}

#[test]
fn typed_access_reports_column() {
    let (_db, registry) = people_registry();
    let record = registry.record_from("people", [("name", "Scott")]).unwrap();
    match record.get_as::<i64>("name") {
        Err(Error::Type(e)) => assert_eq!(e.column.as_deref(), Some("name")),
        other => panic!("expected type error, got {other:?}"),
    }
}

#[test]
fn insert_then_update() {
    let (db, registry) = people_registry();
    let mut scott = registry
        .record_from("people", [("name", "Scott"), ("state", "LA"), ("nickname", "Scotty")])
        .unwrap();
    assert_eq!(scott.state(), RecordState::New);

    assert!(scott.save().unwrap());
    assert_eq!(scott.id(), Some(&Value::BigInt(100)));
    assert_eq!(scott.state(), RecordState::Saved);

    scott.set("state", "TX");
    assert_eq!(scott.state(), RecordState::Modified);
    assert!(scott.save().unwrap());

    // nothing changed, nothing written
    assert!(scott.save().unwrap());

    assert_eq!(
        db.log(),
        vec![
            (
                "INSERT INTO `people` SET `name` = ?, `state` = ?".to_string(),
                vec![Value::from("Scott"), Value::from("LA")],
            ),
            (
                "UPDATE `people` SET `name` = ?, `state` = ?\nWHERE `id` = ?".to_string(),
                vec![Value::from("Scott"), Value::from("TX"), Value::BigInt(100)],
            ),
        ]
    );
}

#[test]
fn failed_validation_writes_nothing() {
    let (db, registry) = people_registry();
    let mut nameless = registry.record_from("people", [("state", "LA")]).unwrap();

    assert!(!nameless.save().unwrap());
    assert!(nameless.errors().contains_key("name"));
    assert_eq!(nameless.state(), RecordState::New);
    assert!(db.statements().is_empty());

    assert!(nameless.save_with(SaveOptions::new().validate(false)).unwrap());
    assert!(nameless.errors().is_empty());
    assert_eq!(db.statements(), vec!["INSERT INTO `people` SET `state` = ?"]);
}

#[test]
fn timestamps_and_replace() {
    let (db, registry) = people_registry();
    let pets = registry.record("pets").unwrap();

    let mut rex = registry.record_from("pets", [("name", "Rex")]).unwrap();
    rex.save().unwrap();
    pets.replace([
        ("id", Value::BigInt(7)),
        ("name", Value::from("Fido")),
        ("updated_at", Value::from("2020-01-01 00:00:00")),
    ])
    .unwrap();

    assert_eq!(
        db.statements(),
        vec![
            "INSERT INTO `pets` SET `name` = ?, `updated_at` = NOW()",
            "REPLACE INTO `pets` SET `id` = ?, `name` = ?, `updated_at` = ?",
        ]
    );
}

#[test]
fn table_level_writes() {
    let (db, registry) = people_registry();
    let people = registry.record("people").unwrap();

    people.update([("state", "TX"), ("shoe_size", "11")], 4).unwrap();
    people
        .update_all_by_sql([("status", "retired")], None, Vec::new())
        .unwrap();
    people.update([("shoe_size", "11")], 4).unwrap();
    people.delete(4).unwrap();
    people
        .delete_all_by_sql(Some("`state` = ?"), vec![Value::from("TX")])
        .unwrap();
    people.truncate().unwrap();

    assert_eq!(
        db.log(),
        vec![
            (
                "UPDATE `people` SET `state` = ?\nWHERE `id` = ?".to_string(),
                vec![Value::from("TX"), Value::Int(4)],
            ),
            (
                "UPDATE `people` SET `status` = ?".to_string(),
                vec![Value::from("retired")],
            ),
            (
                "DELETE FROM `people` WHERE `id` = ?".to_string(),
                vec![Value::Int(4)],
            ),
            (
                "DELETE FROM `people` WHERE `state` = ?".to_string(),
                vec![Value::from("TX")],
            ),
            ("TRUNCATE `people`".to_string(), Vec::new()),
        ]
    );
}

#[test]
fn reload_discards_changes() {
    let (db, registry) = people_registry();
    let people = registry.record("people").unwrap();

    db.script(vec![person(3, "Scott", "LA")]);
    let mut scott = people.get(3).unwrap();
    scott.set("state", "TX");

    db.script(vec![person(3, "Scott", "LA")]);
    scott.reload().unwrap();
    assert_eq!(scott.field("state"), Some(&Value::from("LA")));
    assert_eq!(scott.state(), RecordState::Saved);

    let mut fresh = registry.record("people").unwrap();
    assert!(fresh.reload().unwrap_err().is_not_found());
}

#[test]
fn raw_query_passthrough() {
    let (db, registry) = people_registry();
    db.script(vec![row(&[("n", Value::BigInt(1))])]);

    let rows = registry
        .record("people")
        .unwrap()
        .query("SELECT 1 AS n", &[])
        .unwrap();
    assert_eq!(rows[0].get_named::<i64>("n").unwrap(), 1);
    assert_eq!(db.statements(), vec!["SELECT 1 AS n"]);
}

#[test]
fn after_fetch_hook_and_callback_switch() {
    let db = Arc::new(MockDb::new().with_table(
        "`crm`.`notes`",
        vec![("id", "int(11)"), ("body", "text")],
    ));
    let store = Store::with_shared_connection(
        db.clone(),
        ConnectionConfig::new("mysql://localhost/crm").database("crm"),
    );
    let registry = Registry::builder(Arc::new(store))
        .table(
            TableDef::builder("notes")
                .after_fetch(|note: &mut Record| {
                    let upper = note
                        .field("body")
                        .and_then(Value::as_str)
                        .map(str::to_uppercase);
                    if let Some(upper) = upper {
                        note.set("body", upper);
                    }
                })
                .build(),
        )
        .build()
        .unwrap();
    let notes = registry.record("notes").unwrap();

    db.script(vec![row(&[("id", Value::BigInt(1)), ("body", "hello".into())])]);
    let hooked = notes.find(FindParams::new()).unwrap();
    assert_eq!(hooked[0].field("body"), Some(&Value::from("HELLO")));
    assert!(hooked[0].is_saved());

    db.script(vec![row(&[("id", Value::BigInt(1)), ("body", "hello".into())])]);
    let plain = notes.scope(FindParams::new().callback(false)).find(FindParams::new()).unwrap();
    assert_eq!(plain[0].field("body"), Some(&Value::from("hello")));

    assert_eq!(db.statements()[0], "SELECT *\nFROM `crm`.`notes`");
}

#[test]
fn introspection_failure_is_config_error() {
    let (_db, registry) = people_registry();
    let ghosts = Registry::builder(Arc::clone(registry.store()))
        .table(TableDef::builder("ghosts").build())
        .build()
        .unwrap();

    match ghosts.record("ghosts").unwrap().find(FindParams::new()) {
        Err(Error::Config(e)) => assert!(e.message.contains("`ghosts`")),
        other => panic!("expected introspection failure, got {other:?}"),
    }
}

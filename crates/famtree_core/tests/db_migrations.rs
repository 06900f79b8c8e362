use famtree_core::db::migrations::{schema_version, target_version};
use famtree_core::db::{open_db, open_db_in_memory, DbError};
use rusqlite::Connection;

#[test]
fn in_memory_database_gets_every_tree_table() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn).unwrap(), target_version());
    for table in ["family_trees", "people", "relationship_lines"] {
        assert_table_exists(&conn, table);
    }
}

#[test]
fn reopening_a_file_keeps_schema_version() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("famtree.db");

    drop(open_db(&path).unwrap());
    let conn = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn).unwrap(), target_version());
}

#[test]
fn version_one_file_is_upgraded_with_line_table() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("v1.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch(include_str!("../src/db/migrations/0001_init.sql"))
        .unwrap();
    conn.execute_batch("PRAGMA user_version = 1;").unwrap();
    conn.execute("INSERT INTO family_trees (tree_name) VALUES ('kept');", [])
        .unwrap();
    drop(conn);

    let conn = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn).unwrap(), 2);
    assert_table_exists(&conn, "relationship_lines");
    let kept: i64 = conn
        .query_row("SELECT COUNT(*) FROM family_trees;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(kept, 1);
}

#[test]
fn newer_schema_version_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    match open_db(&path).unwrap_err() {
        DbError::SchemaTooNew { found, supported } => {
            assert_eq!(found, 999);
            assert_eq!(supported, target_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn deleting_a_tree_row_cascades_to_people() {
    let conn = open_db_in_memory().unwrap();
    conn.execute_batch(
        "INSERT INTO family_trees (tree_name) VALUES ('t');
         INSERT INTO people (tree_name, person_id, position, name) VALUES ('t', 'p1', 0, 'A');",
    )
    .unwrap();
    conn.execute("DELETE FROM family_trees WHERE tree_name = 't';", [])
        .unwrap();

    let remaining: i64 = conn
        .query_row("SELECT COUNT(*) FROM people;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(remaining, 0);
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "table {table_name} does not exist");
}

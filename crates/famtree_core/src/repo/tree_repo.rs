//! Family tree repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist named trees as plain person and relationship-line rows.
//! - Rebuild a validated `FamilyTree` from stored rows.
//!
//! # Invariants
//! - `save_tree` replaces a tree wholesale inside one immediate transaction;
//!   a failure leaves the previously stored rows intact.
//! - Rows are read back in saved order, so the root stays the first person.
//! - Tree names are trimmed and never blank.

use crate::db::migrations::target_version;
use crate::db::DbError;
use crate::model::person::{Gender, NodeType, ParentRef, Person, PersonId, RelationshipType};
use crate::model::relationship_line::{LineType, RelationshipLine};
use crate::model::tree::{FamilyTree, TreeIntegrityError};
use crate::model::validation::{normalize_tree_name, ValidationError};
use log::info;
use rusqlite::{params, Connection, Row, Transaction, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};

const REQUIRED_TABLES: [&str; 3] = ["family_trees", "people", "relationship_lines"];

const PERSON_SELECT_SQL: &str = "SELECT
    person_id,
    name,
    birth_year,
    gender,
    is_deceased,
    node_type,
    x,
    y,
    parent_id,
    spouse_id,
    relationship_type,
    multiple_birth_group_id,
    next_identical_sibling_id
FROM people";

pub type RepoResult<T> = Result<T, RepoError>;

/// Errors from family tree persistence.
#[derive(Debug)]
pub enum RepoError {
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// Input rejected before any SQL ran.
    Validation(ValidationError),
    /// Stored rows do not form a consistent tree.
    Integrity(TreeIntegrityError),
    /// Stored value cannot be mapped to the domain model.
    InvalidData(String),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Required table is missing.
    MissingRequiredTable(&'static str),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::Integrity(err) => write!(f, "stored tree is inconsistent: {err}"),
            Self::InvalidData(message) => write!(f, "invalid stored tree data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "tree repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "tree repository requires table `{table}`")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Validation(err) => Some(err),
            Self::Integrity(err) => Some(err),
            Self::InvalidData(_) => None,
            Self::UninitializedConnection { .. } => None,
            Self::MissingRequiredTable(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<ValidationError> for RepoError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<TreeIntegrityError> for RepoError {
    fn from(value: TreeIntegrityError) -> Self {
        Self::Integrity(value)
    }
}

/// Repository interface for named family trees.
pub trait TreeRepository {
    /// Lists stored tree names in ascending order.
    fn list_trees(&self) -> RepoResult<Vec<String>>;
    /// Replaces the stored content of `name`, creating the tree if needed.
    fn save_tree(&self, name: &str, people: &[Person], lines: &[RelationshipLine])
        -> RepoResult<()>;
    /// Loads `name`; `None` when no such tree is registered.
    fn load_tree(&self, name: &str) -> RepoResult<Option<FamilyTree>>;
    /// Deletes `name`; returns whether a tree was removed.
    fn delete_tree(&self, name: &str) -> RepoResult<bool>;
}

/// SQLite-backed family tree repository.
pub struct SqliteTreeRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTreeRepository<'conn> {
    /// Creates repository from migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl TreeRepository for SqliteTreeRepository<'_> {
    fn list_trees(&self) -> RepoResult<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT tree_name FROM family_trees ORDER BY tree_name ASC;")?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(names)
    }

    fn save_tree(
        &self,
        name: &str,
        people: &[Person],
        lines: &[RelationshipLine],
    ) -> RepoResult<()> {
        let name = normalize_tree_name(name)?;
        for person in people {
            person.validate().map_err(ValidationError::from)?;
        }

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        tx.execute(
            "INSERT OR IGNORE INTO family_trees (tree_name) VALUES (?1);",
            params![name],
        )?;
        tx.execute("DELETE FROM people WHERE tree_name = ?1;", params![name])?;
        tx.execute(
            "DELETE FROM relationship_lines WHERE tree_name = ?1;",
            params![name],
        )?;

        for (position, person) in people.iter().enumerate() {
            insert_person(&tx, &name, position as i64, person)?;
        }
        for (position, line) in lines.iter().enumerate() {
            tx.execute(
                "INSERT INTO relationship_lines (
                    tree_name, line_id, position, line_type, x1, y1, x2, y2
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
                params![
                    name,
                    line.id,
                    position as i64,
                    line.line_type.as_wire(),
                    line.x1,
                    line.y1,
                    line.x2,
                    line.y2,
                ],
            )?;
        }

        tx.commit()?;
        info!(
            "event=tree_save module=repo status=ok people={} lines={}",
            people.len(),
            lines.len()
        );
        Ok(())
    }

    fn load_tree(&self, name: &str) -> RepoResult<Option<FamilyTree>> {
        let name = normalize_tree_name(name)?;
        let registered: i64 = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM family_trees WHERE tree_name = ?1);",
            params![name],
            |row| row.get(0),
        )?;
        if registered == 0 {
            return Ok(None);
        }

        let mut stmt = self.conn.prepare(&format!(
            "{PERSON_SELECT_SQL} WHERE tree_name = ?1 ORDER BY position ASC;"
        ))?;
        let mut rows = stmt.query(params![name])?;
        let mut people = Vec::new();
        while let Some(row) = rows.next()? {
            people.push(parse_person_row(row)?);
        }

        let mut stmt = self.conn.prepare(
            "SELECT line_id, line_type, x1, y1, x2, y2
             FROM relationship_lines
             WHERE tree_name = ?1
             ORDER BY position ASC;",
        )?;
        let mut rows = stmt.query(params![name])?;
        let mut lines = Vec::new();
        while let Some(row) = rows.next()? {
            lines.push(parse_line_row(row)?);
        }

        let tree = FamilyTree::from_records(people, lines)?;
        info!(
            "event=tree_load module=repo status=ok people={} lines={}",
            tree.people.len(),
            tree.lines.len()
        );
        Ok(Some(tree))
    }

    fn delete_tree(&self, name: &str) -> RepoResult<bool> {
        let name = normalize_tree_name(name)?;
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        tx.execute("DELETE FROM people WHERE tree_name = ?1;", params![name])?;
        tx.execute(
            "DELETE FROM relationship_lines WHERE tree_name = ?1;",
            params![name],
        )?;
        let removed = tx.execute(
            "DELETE FROM family_trees WHERE tree_name = ?1;",
            params![name],
        )?;
        tx.commit()?;

        info!("event=tree_delete module=repo status=ok found={}", removed > 0);
        Ok(removed > 0)
    }
}

fn insert_person(tx: &Transaction<'_>, tree_name: &str, position: i64, person: &Person) -> RepoResult<()> {
    tx.execute(
        "INSERT INTO people (
            tree_name,
            person_id,
            position,
            name,
            birth_year,
            gender,
            is_deceased,
            node_type,
            x,
            y,
            parent_id,
            spouse_id,
            relationship_type,
            multiple_birth_group_id,
            next_identical_sibling_id
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15);",
        params![
            tree_name,
            person.id.as_str(),
            position,
            person.name,
            person.birth_year.as_deref(),
            person.gender.as_str(),
            bool_to_int(person.is_deceased),
            person.node_type.as_str(),
            person.x,
            person.y,
            person.parent.as_ref().map(ParentRef::key),
            person.spouse_id.as_ref().map(PersonId::as_str),
            person.relationship_type.map(RelationshipType::as_str),
            person.multiple_birth_group_id.as_deref(),
            person.next_identical_sibling_id.as_ref().map(PersonId::as_str),
        ],
    )?;
    Ok(())
}

fn parse_person_row(row: &Row<'_>) -> RepoResult<Person> {
    let id: String = row.get(0)?;
    let gender_raw: String = row.get(3)?;
    let gender = Gender::parse(&gender_raw)
        .ok_or_else(|| RepoError::InvalidData(format!("invalid gender `{gender_raw}` for {id}")))?;
    let node_type_raw: String = row.get(5)?;
    let node_type = NodeType::parse(&node_type_raw).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid node_type `{node_type_raw}` for {id}"))
    })?;
    let relationship_type = match row.get::<_, Option<String>>(10)? {
        Some(raw) => Some(RelationshipType::parse(&raw).ok_or_else(|| {
            RepoError::InvalidData(format!("invalid relationship_type `{raw}` for {id}"))
        })?),
        None => None,
    };

    let mut person = Person::with_id(PersonId::new(id), row.get::<_, String>(1)?, gender);
    person.birth_year = row.get(2)?;
    person.is_deceased = row.get::<_, i64>(4)? != 0;
    person.node_type = node_type;
    person.x = row.get(6)?;
    person.y = row.get(7)?;
    // Classified against the loaded people by `FamilyTree::from_records`.
    person.parent = row.get::<_, Option<String>>(8)?.map(ParentRef::Virtual);
    person.spouse_id = row.get::<_, Option<String>>(9)?.map(PersonId::new);
    person.relationship_type = relationship_type;
    person.multiple_birth_group_id = row.get(11)?;
    person.next_identical_sibling_id = row.get::<_, Option<String>>(12)?.map(PersonId::new);
    Ok(person)
}

fn parse_line_row(row: &Row<'_>) -> RepoResult<RelationshipLine> {
    let id: String = row.get(0)?;
    let raw_type: String = row.get(1)?;
    let line_type = LineType::parse(&raw_type)
        .ok_or_else(|| RepoError::InvalidData(format!("invalid line_type `{raw_type}` for {id}")))?;
    Ok(RelationshipLine {
        id,
        line_type,
        x1: row.get(2)?,
        y1: row.get(3)?,
        x2: row.get(4)?,
        y2: row.get(5)?,
    })
}

fn ensure_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = target_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    for table in REQUIRED_TABLES {
        if !table_exists(conn, table)? {
            return Err(RepoError::MissingRequiredTable(table));
        }
    }
    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}

//! Generic SQLite repository and reference entity mappings.
//!
//! # Responsibility
//! - Implement `Repository<T>` for any entity with a table mapping.
//! - Keep SQL text and row decoding inside the persistence boundary.
//!
//! # Invariants
//! - Every mapped table starts with `id`, `external_id`, `created_ts`,
//!   `modified_ts`, followed by the entity's business columns.
//! - Writes refuse entities that were not lifecycle-stamped.
//! - `external_id` and `created_ts` are written once on insert; updates keep
//!   the stored values and hand them back to the caller.
//! - Reads reject rows that violate the identity/temporal layout.
//! - `find_all` and `find_by_group` return rows in ascending `id` order.

use crate::db::migrations::latest_version;
use crate::lifecycle::{checked_stamps, Stamps};
use crate::model::entity::{EntityId, EntityMeta, EpochMs, PersistedEntity};
use crate::model::link::LinkEntity;
use crate::model::person::Person;
use crate::model::team::{Team, TeamMember};
use crate::repo::{LinkRepository, RepoError, RepoResult, Repository};
use log::{error, info};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, OptionalExtension, Row};
use std::marker::PhantomData;

static IDENTITY_COLUMNS: [&str; 4] = ["id", "external_id", "created_ts", "modified_ts"];

/// Table mapping for an entity stored by [`SqliteRepository`].
pub trait SqliteEntity: PersistedEntity + Sized {
    const TABLE: &'static str;
    /// Business columns, in the order produced by `column_values`.
    const COLUMNS: &'static [&'static str];

    fn column_values(&self) -> Vec<Value>;
    /// Decodes business columns; identity columns arrive already parsed.
    fn from_row(meta: EntityMeta, row: &Row<'_>) -> RepoResult<Self>;
}

/// Table mapping for link entities, naming the group-side column.
pub trait SqliteLinkEntity: SqliteEntity + LinkEntity {
    const GROUP_COLUMN: &'static str;
}

/// SQLite-backed repository for one entity type.
pub struct SqliteRepository<'conn, T> {
    conn: &'conn Connection,
    _entity: PhantomData<fn() -> T>,
}

impl<'conn, T: SqliteEntity> SqliteRepository<'conn, T> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready::<T>(conn)?;
        Ok(Self {
            conn,
            _entity: PhantomData,
        })
    }

    fn insert(&self, stamps: Stamps<'_>, entity: &T) -> RepoResult<EntityId> {
        let columns = all_columns::<T>(false);
        let placeholders = vec!["?"; columns.len()].join(", ");
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({placeholders});",
            T::TABLE,
            columns.join(", ")
        );

        let mut values = vec![
            Value::Text(stamps.external_id.to_string()),
            Value::Integer(stamps.created_at),
            Value::Integer(stamps.modified_at),
        ];
        values.extend(entity.column_values());

        self.conn.execute(&sql, params_from_iter(values))?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Rewrites `modified_ts` and the business columns of row `id`.
    ///
    /// Returns the stored `(external_id, created_ts)` pair.
    fn update(
        &self,
        id: EntityId,
        modified_at: EpochMs,
        entity: &T,
    ) -> RepoResult<(String, EpochMs)> {
        let assignments = std::iter::once("modified_ts")
            .chain(T::COLUMNS.iter().copied())
            .map(|column| format!("{column} = ?"))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "UPDATE {} SET {assignments} WHERE id = ? RETURNING external_id, created_ts;",
            T::TABLE
        );

        let mut values = vec![Value::Integer(modified_at)];
        values.extend(entity.column_values());
        values.push(Value::Integer(id));

        self.conn
            .query_row(&sql, params_from_iter(values), |row| {
                Ok((row.get(0)?, row.get(1)?))
            })
            .optional()?
            .ok_or_else(|| RepoError::not_found::<T>(id))
    }

    fn query(&self, filter: Option<(&str, i64)>) -> RepoResult<Vec<T>> {
        let mut sql = select_sql::<T>();
        let mut bind_values = Vec::new();

        if let Some((column, value)) = filter {
            sql.push_str(&format!(" WHERE {column} = ?"));
            bind_values.push(Value::Integer(value));
        }
        sql.push_str(" ORDER BY id ASC;");

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut entities = Vec::new();

        while let Some(row) = rows.next()? {
            entities.push(parse_entity_row::<T>(row)?);
        }

        Ok(entities)
    }
}

impl<T: SqliteEntity> Repository<T> for SqliteRepository<'_, T> {
    fn save(&self, mut entity: T) -> RepoResult<T> {
        let stamps = match checked_stamps(&entity) {
            Ok(stamps) => stamps,
            Err(err) => {
                error!(
                    "event=entity_save module=repo status=error entity={} error_code=unstamped error={}",
                    T::ENTITY_NAME,
                    err
                );
                return Err(err.into());
            }
        };

        match entity.id() {
            None => {
                let id = self.insert(stamps, &entity)?;
                entity.set_id(id);
                info!(
                    "event=entity_save module=repo status=ok op=insert entity={} id={}",
                    T::ENTITY_NAME,
                    id
                );
            }
            Some(id) => {
                let (external_id, created_at) = self.update(id, stamps.modified_at, &entity)?;
                entity.set_external_id(external_id);
                entity.set_created_at(created_at);
                info!(
                    "event=entity_save module=repo status=ok op=update entity={} id={}",
                    T::ENTITY_NAME,
                    id
                );
            }
        }

        Ok(entity)
    }

    fn find_all(&self) -> RepoResult<Vec<T>> {
        self.query(None)
    }

    fn find_by_id(&self, id: EntityId) -> RepoResult<Option<T>> {
        Ok(self.query(Some(("id", id)))?.into_iter().next())
    }

    fn delete(&self, entity: &T) -> RepoResult<()> {
        let id = entity.id().ok_or(RepoError::NotPersisted(T::ENTITY_NAME))?;
        let changed = self.conn.execute(
            &format!("DELETE FROM {} WHERE id = ?1;", T::TABLE),
            [id],
        )?;

        if changed == 0 {
            return Err(RepoError::not_found::<T>(id));
        }

        info!(
            "event=entity_delete module=repo status=ok entity={} id={}",
            T::ENTITY_NAME,
            id
        );
        Ok(())
    }
}

impl<T: SqliteLinkEntity> LinkRepository<T> for SqliteRepository<'_, T> {
    fn find_by_group(&self, group_id: EntityId) -> RepoResult<Vec<T>> {
        self.query(Some((T::GROUP_COLUMN, group_id)))
    }
}

fn all_columns<T: SqliteEntity>(with_id: bool) -> Vec<&'static str> {
    let identity = if with_id {
        &IDENTITY_COLUMNS[..]
    } else {
        &IDENTITY_COLUMNS[1..]
    };
    identity.iter().chain(T::COLUMNS).copied().collect()
}

fn select_sql<T: SqliteEntity>() -> String {
    format!("SELECT {} FROM {}", all_columns::<T>(true).join(", "), T::TABLE)
}

fn parse_entity_row<T: SqliteEntity>(row: &Row<'_>) -> RepoResult<T> {
    let id: EntityId = row.get("id")?;
    let external_id: String = row.get("external_id")?;
    if external_id.is_empty() {
        return Err(RepoError::InvalidData(format!(
            "empty external_id in {}.id={id}",
            T::TABLE
        )));
    }

    let created_at: i64 = row.get("created_ts")?;
    let modified_at: i64 = row.get("modified_ts")?;
    if modified_at < created_at {
        return Err(RepoError::InvalidData(format!(
            "modified_ts ({modified_at}) earlier than created_ts ({created_at}) in {}.id={id}",
            T::TABLE
        )));
    }

    let meta = EntityMeta {
        id: Some(id),
        external_id: Some(external_id),
        created_at: Some(created_at),
        modified_at: Some(modified_at),
    };
    T::from_row(meta, row)
}

fn ensure_connection_ready<T: SqliteEntity>(conn: &Connection) -> RepoResult<()> {
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    let expected_version = latest_version();
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    if !table_exists(conn, T::TABLE)? {
        return Err(RepoError::MissingRequiredTable(T::TABLE));
    }

    for column in all_columns::<T>(true) {
        if !table_has_column(conn, T::TABLE, column)? {
            return Err(RepoError::MissingRequiredColumn {
                table: T::TABLE,
                column,
            });
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

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}

impl SqliteEntity for Person {
    const TABLE: &'static str = "person";
    const COLUMNS: &'static [&'static str] = &["name"];

    fn column_values(&self) -> Vec<Value> {
        vec![Value::Text(self.name.clone())]
    }

    fn from_row(meta: EntityMeta, row: &Row<'_>) -> RepoResult<Self> {
        Ok(Self {
            meta,
            name: row.get("name")?,
        })
    }
}

impl SqliteEntity for Team {
    const TABLE: &'static str = "team";
    const COLUMNS: &'static [&'static str] = &["name"];

    fn column_values(&self) -> Vec<Value> {
        vec![Value::Text(self.name.clone())]
    }

    fn from_row(meta: EntityMeta, row: &Row<'_>) -> RepoResult<Self> {
        Ok(Self {
            meta,
            name: row.get("name")?,
        })
    }
}

impl SqliteEntity for TeamMember {
    const TABLE: &'static str = "team_member";
    const COLUMNS: &'static [&'static str] = &["team_id", "person_id"];

    fn column_values(&self) -> Vec<Value> {
        vec![Value::Integer(self.team_id), Value::Integer(self.person_id)]
    }

    fn from_row(meta: EntityMeta, row: &Row<'_>) -> RepoResult<Self> {
        Ok(Self {
            meta,
            team_id: row.get("team_id")?,
            person_id: row.get("person_id")?,
        })
    }
}

impl SqliteLinkEntity for TeamMember {
    const GROUP_COLUMN: &'static str = "team_id";
}

//! Link-table repository, generic over the four associations.
//!
//! Every link table has the shape `(id, <parent>_id, <child>_id[, position])`,
//! so one implementation serves all of them with SQL built from the
//! association's [`Relation`].

use std::marker::PhantomData;
use std::time::Instant;

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{Pool, Postgres, Row, Transaction};
use tracing::{debug, trace};
use uuid::Uuid;

use podcaster_core::{
    Association, AssociationRepository, BlockProgram, Error, OverwriteStep, ProgramCategory,
    ProgramTag, Relation, ReplaceOutcome, Result, WallBlock,
};

/// PostgreSQL implementation of `AssociationRepository<A>`.
pub struct PgAssociationRepository<A> {
    pool: Pool<Postgres>,
    select_sql: String,
    insert_sql: String,
    _marker: PhantomData<fn() -> A>,
}

impl<A> Clone for PgAssociationRepository<A> {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
            select_sql: self.select_sql.clone(),
            insert_sql: self.insert_sql.clone(),
            _marker: PhantomData,
        }
    }
}

pub type PgWallBlockRepository = PgAssociationRepository<WallBlock>;
pub type PgBlockProgramRepository = PgAssociationRepository<BlockProgram>;
pub type PgProgramTagRepository = PgAssociationRepository<ProgramTag>;
pub type PgProgramCategoryRepository = PgAssociationRepository<ProgramCategory>;

fn select_sql(relation: Relation) -> String {
    let position = if relation.is_positioned() {
        ", position"
    } else {
        ""
    };
    format!(
        "SELECT id, {} AS parent_id, {} AS child_id{} FROM {}",
        relation.parent_column(),
        relation.child_column(),
        position,
        relation.table()
    )
}

fn insert_sql(relation: Relation) -> String {
    if relation.is_positioned() {
        format!(
            "INSERT INTO {} (id, {}, {}, position) VALUES ($1, $2, $3, $4)",
            relation.table(),
            relation.parent_column(),
            relation.child_column()
        )
    } else {
        format!(
            "INSERT INTO {} (id, {}, {}) VALUES ($1, $2, $3)",
            relation.table(),
            relation.parent_column(),
            relation.child_column()
        )
    }
}

/// Key for the transaction-scoped advisory lock of one parent.
fn lock_key(relation: Relation, parent_id: Uuid) -> String {
    format!("{}:{}", relation.table(), parent_id)
}

impl<A: Association> PgAssociationRepository<A> {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            pool,
            select_sql: select_sql(A::RELATION),
            insert_sql: insert_sql(A::RELATION),
            _marker: PhantomData,
        }
    }

    fn map_row(r: PgRow) -> A {
        let position = if A::RELATION.is_positioned() {
            Some(r.get::<i32, _>("position"))
        } else {
            None
        };
        A::bind(r.get("id"), r.get("parent_id"), r.get("child_id"), position)
    }

    async fn select_where(&self, clause: &str, a: Uuid, b: Option<Uuid>) -> Result<Vec<A>> {
        let sql = format!("{} WHERE {}", self.select_sql, clause);
        let mut query = sqlx::query(&sql).bind(a);
        if let Some(b) = b {
            query = query.bind(b);
        }
        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(Error::persistence("select", A::RELATION.table()))?;
        Ok(rows.into_iter().map(Self::map_row).collect())
    }

    async fn insert(&self, tx: &mut Transaction<'_, Postgres>, row: &A) -> sqlx::Result<()> {
        let mut query = sqlx::query(&self.insert_sql)
            .bind(row.id())
            .bind(row.parent_id())
            .bind(row.child_id());
        if let Some(position) = row.position() {
            query = query.bind(position);
        }
        query.execute(&mut **tx).await?;
        Ok(())
    }

    fn step_error(parent_id: Uuid, step: OverwriteStep, source: sqlx::Error) -> Error {
        Error::Overwrite {
            relation: A::RELATION,
            parent_id,
            step,
            partial: false,
            source: Box::new(Error::Database(source)),
        }
    }
}

#[async_trait]
impl<A: Association> AssociationRepository<A> for PgAssociationRepository<A> {
    async fn create(&self, association: A) -> Result<()> {
        let mut query = sqlx::query(&self.insert_sql)
            .bind(association.id())
            .bind(association.parent_id())
            .bind(association.child_id());
        if let Some(position) = association.position() {
            query = query.bind(position);
        }
        query
            .execute(&self.pool)
            .await
            .map_err(Error::persistence(
                "insert",
                format!("{} {}", A::RELATION, association.id()),
            ))?;
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        sqlx::query(&format!("DELETE FROM {} WHERE id = $1", A::RELATION.table()))
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(Error::persistence("delete", format!("{} {}", A::RELATION, id)))?;
        Ok(())
    }

    async fn find(&self, id: Uuid) -> Result<A> {
        self.select_where("id = $1", id, None)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| Error::not_found(A::RELATION.table(), id))
    }

    async fn find_by_parent(&self, parent_id: Uuid) -> Result<Vec<A>> {
        let clause = format!("{} = $1", A::RELATION.parent_column());
        self.select_where(&clause, parent_id, None).await
    }

    async fn find_by_child(&self, child_id: Uuid) -> Result<Vec<A>> {
        let clause = format!("{} = $1", A::RELATION.child_column());
        self.select_where(&clause, child_id, None).await
    }

    async fn find_by_parent_and_child(&self, parent_id: Uuid, child_id: Uuid) -> Result<Vec<A>> {
        let clause = format!(
            "{} = $1 AND {} = $2",
            A::RELATION.parent_column(),
            A::RELATION.child_column()
        );
        self.select_where(&clause, parent_id, Some(child_id)).await
    }

    /// Replace the parent's rows inside one transaction.
    ///
    /// A transaction-scoped advisory lock on (table, parent) serializes
    /// replacements across processes. Any failure, or dropping the future,
    /// rolls everything back, so `partial` is always false.
    async fn replace_for_parent(&self, parent_id: Uuid, rows: Vec<A>) -> Result<ReplaceOutcome> {
        let relation = A::RELATION;
        let start = Instant::now();

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| Self::step_error(parent_id, OverwriteStep::Fetch, e))?;

        sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1, 0))")
            .bind(lock_key(relation, parent_id))
            .execute(&mut *tx)
            .await
            .map_err(|e| Self::step_error(parent_id, OverwriteStep::Fetch, e))?;

        let current: Vec<Uuid> = sqlx::query(&format!(
            "SELECT id FROM {} WHERE {} = $1",
            relation.table(),
            relation.parent_column()
        ))
        .bind(parent_id)
        .fetch_all(&mut *tx)
        .await
        .map_err(|e| Self::step_error(parent_id, OverwriteStep::Fetch, e))?
        .into_iter()
        .map(|r| r.get("id"))
        .collect();

        let delete_sql = format!("DELETE FROM {} WHERE id = $1", relation.table());
        for association_id in &current {
            sqlx::query(&delete_sql)
                .bind(*association_id)
                .execute(&mut *tx)
                .await
                .map_err(|e| {
                    Self::step_error(parent_id, OverwriteStep::Delete(*association_id), e)
                })?;
            trace!(relation = %relation, %parent_id, %association_id, "Association deleted");
        }

        let created = rows.len();
        for row in &rows {
            self.insert(&mut tx, row).await.map_err(|e| {
                Self::step_error(parent_id, OverwriteStep::Create(row.child_id()), e)
            })?;
        }

        tx.commit()
            .await
            .map_err(|e| Self::step_error(parent_id, OverwriteStep::Commit, e))?;

        debug!(
            subsystem = "database",
            component = "associations",
            op = "replace",
            relation = %relation,
            %parent_id,
            removed = current.len(),
            created,
            duration_ms = start.elapsed().as_millis() as u64,
            "Associations replaced in transaction"
        );

        Ok(ReplaceOutcome {
            removed: current.len(),
            created,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_sql_positioned() {
        assert_eq!(
            select_sql(Relation::WallBlock),
            "SELECT id, wall_id AS parent_id, block_id AS child_id, position FROM wall_block"
        );
    }

    #[test]
    fn test_select_sql_unpositioned() {
        assert_eq!(
            select_sql(Relation::ProgramTag),
            "SELECT id, program_id AS parent_id, tag_id AS child_id FROM program_tag"
        );
    }

    #[test]
    fn test_insert_sql() {
        assert_eq!(
            insert_sql(Relation::BlockProgram),
            "INSERT INTO block_program (id, block_id, program_id, position) VALUES ($1, $2, $3, $4)"
        );
        assert_eq!(
            insert_sql(Relation::ProgramCategory),
            "INSERT INTO program_category (id, program_id, category_id) VALUES ($1, $2, $3)"
        );
    }

    #[test]
    fn test_lock_key_is_per_relation() {
        let parent = Uuid::new_v4();
        assert_ne!(
            lock_key(Relation::ProgramTag, parent),
            lock_key(Relation::ProgramCategory, parent)
        );
    }
}

// store/write.rs - Queued write operations
//
// Writes are described as values first and submitted later as one batch
// (see Store::transaction). That keeps the "many independent statements in a
// single transaction" shape the reproduction depends on.

use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

use super::models::{Entity, NewVacancy};
use crate::error::StoreError;

/// SQLite's default SQLITE_MAX_VARIABLE_NUMBER since 3.32
pub const MAX_BIND_VALUES: usize = 32766;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WriteOp {
    /// `tag.create({ data: { id } })`
    CreateTag { id: i64 },
    /// `post.create` with nested tag creation; one link row per tag
    CreatePost { id: i64, tag_ids: Vec<i64> },
    /// `<entity>.deleteMany()`
    DeleteAll(Entity),
}

impl WriteOp {
    /// Run the operation on an open connection, returning the affected row count
    pub(crate) async fn execute(&self, conn: &mut SqliteConnection) -> Result<u64, StoreError> {
        match self {
            WriteOp::CreateTag { id } => {
                tracing::trace!(id, "INSERT INTO Tag");
                let result = sqlx::query("INSERT INTO Tag (id) VALUES (?)")
                    .bind(id)
                    .execute(&mut *conn)
                    .await?;
                Ok(result.rows_affected())
            }
            WriteOp::CreatePost { id, tag_ids } => {
                tracing::trace!(id, tags = tag_ids.len(), "INSERT INTO Post");
                let mut affected = sqlx::query("INSERT INTO Post (id) VALUES (?)")
                    .bind(id)
                    .execute(&mut *conn)
                    .await?
                    .rows_affected();

                for tag_id in tag_ids {
                    affected += sqlx::query("INSERT INTO Tag (id) VALUES (?)")
                        .bind(tag_id)
                        .execute(&mut *conn)
                        .await?
                        .rows_affected();
                    affected += sqlx::query("INSERT INTO TagOnPost (postId, tagId) VALUES (?, ?)")
                        .bind(id)
                        .bind(tag_id)
                        .execute(&mut *conn)
                        .await?
                        .rows_affected();
                }

                Ok(affected)
            }
            WriteOp::DeleteAll(entity) => {
                let sql = format!("DELETE FROM {}", entity.table());
                tracing::trace!(%sql);
                let result = sqlx::query(&sql).execute(&mut *conn).await?;
                Ok(result.rows_affected())
            }
        }
    }
}

/// Multi-row `INSERT` for vacancies, split so no statement exceeds the bind limit
pub(crate) async fn insert_vacancies(
    conn: &mut SqliteConnection,
    rows: &[NewVacancy],
) -> Result<u64, StoreError> {
    let mut affected = 0;

    for chunk in rows.chunks(MAX_BIND_VALUES / 2) {
        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new("INSERT INTO Vacancy (id, staffMemberId) ");
        builder.push_values(chunk, |mut row, vacancy| {
            row.push_bind(vacancy.id).push_bind(vacancy.staff_member_id);
        });

        tracing::debug!(rows = chunk.len(), "INSERT INTO Vacancy (bulk)");
        affected += builder.build().execute(&mut *conn).await?.rows_affected();
    }

    Ok(affected)
}

// store/read.rs - Structured reads
//
// IN lists are split into chunks of the current query batch size. Each chunk
// is its own statement; the chunks are dispatched together and merged in
// chunk order. When an ordering was asked for and more than one chunk was
// needed, the merged rows are sorted again here and `take` is applied last.

use std::collections::HashMap;

use futures::future::try_join_all;
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, QueryBuilder, Sqlite};

use super::models::{Post, PostWithTags, StaffMember, Tag, TagOnPost, Vacancy};
use super::Store;
use crate::error::StoreError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    fn as_sql(self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }

    fn sort_by_id<T, F>(self, rows: &mut [T], key: F)
    where
        F: Fn(&T) -> i64,
    {
        match self {
            SortOrder::Asc => rows.sort_by_key(|row| key(row)),
            SortOrder::Desc => rows.sort_by_key(|row| std::cmp::Reverse(key(row))),
        }
    }
}

/// `tag.findMany({ where: { id: { in } }, orderBy: { id }, take })`
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TagQuery {
    ids: Option<Vec<i64>>,
    order_by: Option<SortOrder>,
    take: Option<usize>,
}

impl TagQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id_in(mut self, ids: impl IntoIterator<Item = i64>) -> Self {
        self.ids = Some(ids.into_iter().collect());
        self
    }

    pub fn order_by_id(mut self, order: SortOrder) -> Self {
        self.order_by = Some(order);
        self
    }

    pub fn take(mut self, take: usize) -> Self {
        self.take = Some(take);
        self
    }
}

/// `ORDER BY id ... LIMIT ...` for a statement that covers the whole read
fn order_and_limit(order_by: Option<SortOrder>, take: Option<usize>) -> String {
    let mut suffix = String::new();

    if let Some(order) = order_by {
        suffix.push_str("ORDER BY id ");
        suffix.push_str(order.as_sql());
    }

    if let Some(take) = take {
        if !suffix.is_empty() {
            suffix.push(' ');
        }
        suffix.push_str(&format!("LIMIT {take}"));
    }

    suffix
}

impl Store {
    /// Run `select WHERE column IN (...) suffix` once per chunk of `ids`
    async fn fetch_in<T>(
        &self,
        select: &str,
        column: &str,
        ids: &[i64],
        suffix: &str,
    ) -> Result<Vec<T>, StoreError>
    where
        T: for<'r> FromRow<'r, SqliteRow> + Send + Unpin,
    {
        let batch_size = self.effective_batch_size();
        let pool = &self.pool;

        let chunks = ids.chunks(batch_size).map(|chunk| async move {
            let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(select);
            builder.push(" WHERE ").push(column).push(" IN (");
            {
                let mut separated = builder.separated(", ");
                for id in chunk {
                    separated.push_bind(*id);
                }
            }
            builder.push(")");
            if !suffix.is_empty() {
                builder.push(" ").push(suffix);
            }

            tracing::debug!(sql = builder.sql(), params = chunk.len(), "query");
            builder.build_query_as::<T>().fetch_all(pool).await
        });

        let batches = try_join_all(chunks).await?;
        Ok(batches.into_iter().flatten().collect())
    }

    /// Structured tag read, honouring the current query batch size
    pub async fn find_many_tags(&self, query: &TagQuery) -> Result<Vec<Tag>, StoreError> {
        if query.take == Some(0) {
            return Ok(Vec::new());
        }

        let ids = match &query.ids {
            Some(ids) => ids,
            None => {
                let sql = format!("SELECT id FROM Tag {}", order_and_limit(query.order_by, query.take));
                tracing::debug!(sql = sql.trim(), "query");
                return Ok(sqlx::query_as::<_, Tag>(&sql).fetch_all(&self.pool).await?);
            }
        };

        if ids.is_empty() {
            return Ok(Vec::new());
        }

        // A single chunk can order and limit in SQL
        if ids.len() <= self.effective_batch_size() {
            let suffix = order_and_limit(query.order_by, query.take);
            return self.fetch_in("SELECT id FROM Tag", "id", ids, &suffix).await;
        }

        let mut tags: Vec<Tag> = self.fetch_in("SELECT id FROM Tag", "id", ids, "").await?;
        if let Some(order) = query.order_by {
            order.sort_by_id(&mut tags, |tag| tag.id);
        }
        if let Some(take) = query.take {
            tags.truncate(take);
        }

        Ok(tags)
    }

    /// `vacancy.findMany({ orderBy: { id: 'asc' }, take })`
    pub async fn find_many_vacancies(&self, take: Option<usize>) -> Result<Vec<Vacancy>, StoreError> {
        let sql = format!(
            "SELECT id, staffMemberId FROM Vacancy {}",
            order_and_limit(Some(SortOrder::Asc), take)
        );
        tracing::debug!(sql = sql.trim(), "query");
        let vacancies = sqlx::query_as::<_, Vacancy>(&sql).fetch_all(&self.pool).await?;
        Ok(vacancies)
    }

    /// `vacancy.findUnique({ where: { id } })`
    pub async fn find_unique_vacancy(&self, id: i64) -> Result<Option<Vacancy>, StoreError> {
        tracing::trace!(id, "SELECT FROM Vacancy");
        let vacancy = sqlx::query_as::<_, Vacancy>("SELECT id, staffMemberId FROM Vacancy WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(vacancy)
    }

    /// `staffMember.findUnique({ where: { id } })`
    pub async fn find_unique_staff_member(&self, id: i64) -> Result<Option<StaffMember>, StoreError> {
        tracing::trace!(id, "SELECT FROM StaffMember");
        let staff_member = sqlx::query_as::<_, StaffMember>("SELECT id, name FROM StaffMember WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(staff_member)
    }

    /// `vacancy.findUnique({ where: { id } }).staffMember()`
    ///
    /// `None` when either the vacancy or its owner is missing.
    pub async fn vacancy_staff_member(&self, vacancy_id: i64) -> Result<Option<StaffMember>, StoreError> {
        match self.find_unique_vacancy(vacancy_id).await? {
            Some(vacancy) => self.find_unique_staff_member(vacancy.staff_member_id).await,
            None => Ok(None),
        }
    }

    /// `post.findMany({ where: { id: { in } }, include: { tags: { include: { tag: true } } } })`
    ///
    /// Posts come back ordered by id, each with its tags ordered by id. A link
    /// whose tag cannot be loaded fails the whole read with
    /// [`StoreError::InconsistentResult`].
    pub async fn find_many_posts_with_tags(
        &self,
        ids: Option<&[i64]>,
    ) -> Result<Vec<PostWithTags>, StoreError> {
        let mut posts: Vec<Post> = match ids {
            Some([]) => return Ok(Vec::new()),
            Some(ids) => self.fetch_in("SELECT id FROM Post", "id", ids, "ORDER BY id ASC").await?,
            None => {
                tracing::debug!(sql = "SELECT id FROM Post ORDER BY id ASC", "query");
                sqlx::query_as::<_, Post>("SELECT id FROM Post ORDER BY id ASC")
                    .fetch_all(&self.pool)
                    .await?
            }
        };
        posts.sort_by_key(|post| post.id);

        if posts.is_empty() {
            return Ok(Vec::new());
        }

        let post_ids: Vec<i64> = posts.iter().map(|post| post.id).collect();
        let links: Vec<TagOnPost> = self
            .fetch_in(
                "SELECT postId, tagId FROM TagOnPost",
                "postId",
                &post_ids,
                "ORDER BY postId ASC, tagId ASC",
            )
            .await?;

        let mut tag_ids: Vec<i64> = links.iter().map(|link| link.tag_id).collect();
        tag_ids.sort_unstable();
        tag_ids.dedup();

        let tags: HashMap<i64, Tag> = if tag_ids.is_empty() {
            HashMap::new()
        } else {
            self.fetch_in::<Tag>("SELECT id FROM Tag", "id", &tag_ids, "")
                .await?
                .into_iter()
                .map(|tag| (tag.id, tag))
                .collect()
        };

        let mut tags_by_post: HashMap<i64, Vec<Tag>> = HashMap::new();
        for link in &links {
            let tag = tags
                .get(&link.tag_id)
                .copied()
                .ok_or_else(|| StoreError::inconsistent_result("tag"))?;
            tags_by_post.entry(link.post_id).or_default().push(tag);
        }

        Ok(posts
            .into_iter()
            .map(|post| PostWithTags {
                id: post.id,
                tags: tags_by_post.remove(&post.id).unwrap_or_default(),
            })
            .collect())
    }
}

// fixtures/mod.rs - Seed data and the cleaner
//
// Every test case starts the same way: wipe the tables it touches, then seed
// deterministic rows (ids 1..=n). The helpers here do both.
//
// Tags and posts are created one statement per row inside a single
// transaction on purpose: that is the write pattern after which large IN
// reads were seen to come back empty.

pub mod tables;

use futures::future::try_join_all;

use crate::error::StoreError;
use crate::store::{Entity, NewVacancy, StaffMember, Store, WriteOp};

/// A simple trait that all test tables must implement
pub trait TestTable {
    /// The SQL commands to create this table family.
    /// Returns a slice of SQL strings that should be executed in order.
    fn setup_sql() -> &'static [&'static str];
}

/// Entities touched by the tag and staff member suites
pub const TAG_AND_STAFF_ENTITIES: &[Entity] = &[Entity::Tag, Entity::Vacancy, Entity::StaffMember];

/// Entities touched by the post suites
pub const POST_ENTITIES: &[Entity] = &[Entity::TagOnPost, Entity::Tag, Entity::Post];

/// Delete every row of `entities` and of the tables referencing them,
/// children before parents, in one transaction
pub async fn clean(store: &Store, entities: &[Entity]) -> Result<(), StoreError> {
    let mut ordered: Vec<Entity> = entities
        .iter()
        .flat_map(|&entity| std::iter::once(entity).chain(entity.dependents().iter().copied()))
        .collect();
    ordered.sort_by_key(|entity| (entity.dependency_rank(), *entity));
    ordered.dedup();

    tracing::debug!(?ordered, "cleaning");
    let ops = ordered.into_iter().map(WriteOp::DeleteAll).collect();
    store.transaction(ops).await?;
    Ok(())
}

/// Create tags `1..=length`, one create per tag, all in one transaction
pub async fn create_tags(store: &Store, length: i64) -> Result<Vec<i64>, StoreError> {
    let ids: Vec<i64> = (1..=length).collect();

    let ops = ids.iter().map(|&id| WriteOp::CreateTag { id }).collect();
    store.transaction(ops).await?;

    tracing::debug!(created = ids.len(), "tags seeded");
    Ok(ids)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PostsWithTags {
    pub n_posts: i64,
    pub n_tags_per_post: i64,
}

impl PostsWithTags {
    /// Post `i` gets id `i * n_tags_per_post + 1`
    pub fn post_ids(&self) -> Vec<i64> {
        (0..self.n_posts).map(|i| i * self.n_tags_per_post + 1).collect()
    }

    /// A post owns the tags starting at its own id, so no two posts share a tag
    pub fn tag_ids(&self, post_id: i64) -> Vec<i64> {
        (post_id..post_id + self.n_tags_per_post).collect()
    }
}

/// Create posts with freshly created tags, one create per post, all in one transaction
pub async fn create_posts_with_tags(store: &Store, shape: PostsWithTags) -> Result<Vec<i64>, StoreError> {
    let ids = shape.post_ids();

    let ops = ids
        .iter()
        .map(|&id| WriteOp::CreatePost {
            id,
            tag_ids: shape.tag_ids(id),
        })
        .collect();
    store.transaction(ops).await?;

    tracing::debug!(posts = ids.len(), tags_per_post = shape.n_tags_per_post, "posts seeded");
    Ok(ids)
}

/// The owner and what each per-vacancy lookup returned for it
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StaffFanOut {
    pub staff_member: StaffMember,
    pub staff_members_from_store: Vec<Option<StaffMember>>,
}

/// Create one staff member owning vacancies `1..=length`, then look the owner
/// up once per vacancy with all lookups in flight at the same time
pub async fn find_unique_staff_members(store: &Store, length: i64) -> Result<StaffFanOut, StoreError> {
    let staff_member = store.create_staff_member("StaffMember1").await?;

    let rows: Vec<NewVacancy> = (1..=length)
        .map(|id| NewVacancy {
            id,
            staff_member_id: staff_member.id,
        })
        .collect();
    store.create_many_vacancies(&rows).await?;

    let take = usize::try_from(length).unwrap_or(0).saturating_mul(10);
    let vacancy_ids: Vec<i64> = store
        .find_many_vacancies(Some(take))
        .await?
        .into_iter()
        .map(|vacancy| vacancy.id)
        .collect();

    // Get the staff members of the vacancies in one go
    let lookups = vacancy_ids.iter().map(|&id| store.vacancy_staff_member(id));
    let staff_members_from_store = try_join_all(lookups).await?;

    Ok(StaffFanOut {
        staff_member,
        staff_members_from_store,
    })
}

// store/models.rs - Row types and the entity catalogue
//
// The table and column names follow the schema the reproduction was written
// against (PascalCase tables, camelCase foreign keys), so raw SQL such as
// `SELECT * FROM Tag` works unchanged.

use sqlx::FromRow;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, FromRow)]
pub struct Tag {
    pub id: i64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, FromRow)]
pub struct Post {
    pub id: i64,
}

/// Link row between a post and one of its tags
#[derive(Clone, Copy, Debug, PartialEq, Eq, FromRow)]
pub struct TagOnPost {
    #[sqlx(rename = "postId")]
    pub post_id: i64,
    #[sqlx(rename = "tagId")]
    pub tag_id: i64,
}

#[derive(Clone, Debug, PartialEq, Eq, FromRow)]
pub struct StaffMember {
    pub id: i64,
    pub name: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, FromRow)]
pub struct Vacancy {
    pub id: i64,
    #[sqlx(rename = "staffMemberId")]
    pub staff_member_id: i64,
}

/// Input for a bulk vacancy insert
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NewVacancy {
    pub id: i64,
    pub staff_member_id: i64,
}

/// A post with its tags included
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PostWithTags {
    pub id: i64,
    pub tags: Vec<Tag>,
}

/// Every table the harness knows about
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Entity {
    TagOnPost,
    Vacancy,
    Tag,
    Post,
    StaffMember,
}

impl Entity {
    pub const ALL: [Entity; 5] = [
        Entity::TagOnPost,
        Entity::Vacancy,
        Entity::Tag,
        Entity::Post,
        Entity::StaffMember,
    ];

    pub fn table(self) -> &'static str {
        match self {
            Entity::TagOnPost => "TagOnPost",
            Entity::Vacancy => "Vacancy",
            Entity::Tag => "Tag",
            Entity::Post => "Post",
            Entity::StaffMember => "StaffMember",
        }
    }

    /// Tables holding foreign keys into this one
    pub fn dependents(self) -> &'static [Entity] {
        match self {
            Entity::Tag | Entity::Post => &[Entity::TagOnPost],
            Entity::StaffMember => &[Entity::Vacancy],
            Entity::TagOnPost | Entity::Vacancy => &[],
        }
    }

    /// Lower ranks reference higher ranks and must be deleted first
    pub fn dependency_rank(self) -> u8 {
        match self {
            Entity::TagOnPost | Entity::Vacancy => 0,
            Entity::Tag | Entity::Post | Entity::StaffMember => 1,
        }
    }
}

impl std::fmt::Display for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.table())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dependents_rank_below_their_parent() {
        for entity in Entity::ALL {
            for dependent in entity.dependents() {
                assert!(dependent.dependency_rank() < entity.dependency_rank(), "{dependent} -> {entity}");
            }
        }
        assert_eq!(Entity::Tag.dependents(), &[Entity::TagOnPost]);
        assert!(Entity::Vacancy.dependents().is_empty());
    }
}

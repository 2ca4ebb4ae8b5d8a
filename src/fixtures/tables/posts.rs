// fixtures/tables/posts.rs
//
// Posts and their many-to-many link to tags. The Tag table itself comes from
// TagsTable, which must be applied first.

use crate::fixtures::TestTable;

pub struct PostsTable;

impl TestTable for PostsTable {
    fn setup_sql() -> &'static [&'static str] {
        &[
            // 1. Create Post
            r#"
            CREATE TABLE IF NOT EXISTS Post (
                id INTEGER PRIMARY KEY NOT NULL
            )
            "#,
            // 2. Create the link table, keyed by both sides
            r#"
            CREATE TABLE IF NOT EXISTS TagOnPost (
                postId INTEGER NOT NULL REFERENCES Post (id),
                tagId INTEGER NOT NULL REFERENCES Tag (id),
                PRIMARY KEY (postId, tagId)
            )
            "#,
            // 3. Index the reverse direction for tag-side lookups
            r#"
            CREATE INDEX IF NOT EXISTS TagOnPost_tagId_idx ON TagOnPost (tagId)
            "#,
        ]
    }
}

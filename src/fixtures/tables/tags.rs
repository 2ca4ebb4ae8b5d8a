// fixtures/tables/tags.rs
//
// The Tag table: just an integer id, assigned by the fixture rather than the
// database so that ids are always 1..=n after a clean.

use crate::fixtures::TestTable;

pub struct TagsTable;

impl TestTable for TagsTable {
    fn setup_sql() -> &'static [&'static str] {
        &[r#"
            CREATE TABLE IF NOT EXISTS Tag (
                id INTEGER PRIMARY KEY NOT NULL
            )
            "#]
    }
}

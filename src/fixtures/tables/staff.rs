// fixtures/tables/staff.rs
//
// Staff members own vacancies. Staff member ids are generated by the database;
// vacancy ids are supplied by the fixture.

use crate::fixtures::TestTable;

pub struct StaffTable;

impl TestTable for StaffTable {
    fn setup_sql() -> &'static [&'static str] {
        &[
            r#"
            CREATE TABLE IF NOT EXISTS StaffMember (
                id INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL,
                name TEXT NOT NULL
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS Vacancy (
                id INTEGER PRIMARY KEY NOT NULL,
                staffMemberId INTEGER NOT NULL REFERENCES StaffMember (id)
            )
            "#,
            r#"
            CREATE INDEX IF NOT EXISTS Vacancy_staffMemberId_idx ON Vacancy (staffMemberId)
            "#,
        ]
    }
}

// fixtures/tables/mod.rs
//
// Table definitions, one struct per table family. Each implements TestTable
// and is applied by Store::connect, so every store starts with the full schema.

pub mod posts;
pub mod staff;
pub mod tags;

pub use posts::PostsTable;
pub use staff::StaffTable;
pub use tags::TagsTable;

// common/mod.rs - Shared test utilities
//
// Each test binary opens one store, registers its suites and runs them
// against that store. Isolation between cases comes from cleaning and
// reseeding at the start of every case, not from separate databases.

#![allow(dead_code)]

use large_in_repro::harness::Registry;
use large_in_repro::store::StaffMember;
use large_in_repro::{Store, StoreConfig};
use tracing_subscriber::EnvFilter;

/// Install a test-friendly subscriber once; later calls are no-ops
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .with_target(false)
        .try_init();
}

/// Open the store described by the environment (in-memory SQLite by default)
pub async fn create_test_store() -> anyhow::Result<Store> {
    init_tracing();

    let config = StoreConfig::from_env()?;
    let store = Store::connect(&config).await?;

    Ok(store)
}

/// Run every registered case against one shared store and fail on any case failure
pub async fn run_registry(registry: Registry<Store>) -> anyhow::Result<()> {
    let store = create_test_store().await?;

    let report = registry.run(store.clone()).await;
    store.close().await;

    println!("✓ {} of {} cases passed", report.passed.len(), report.total());
    report.assert_all_passed();
    Ok(())
}

/// `1,2,3` for interpolating into raw SQL
pub fn join_ids(ids: &[i64]) -> String {
    ids.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

/// What a healthy fan-out returns: the owner once per vacancy
pub fn owner_per_vacancy(staff_member: &StaffMember, length: usize) -> Vec<Option<StaffMember>> {
    vec![Some(staff_member.clone()); length]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_ids() {
        assert_eq!(join_ids(&[1, 2, 3]), "1,2,3");
        assert_eq!(join_ids(&[]), "");
    }
}

// Probe a database for the large IN defect.
//
// Seeds tags of increasing size, reads them back once with raw SQL and once
// through the structured path, and reports which expectation suite the
// database matches. Point DATABASE_URL at the database under suspicion.

use anyhow::Result;
use serde::Serialize;

use large_in_repro::fixtures::{clean, create_tags, find_unique_staff_members, TAG_AND_STAFF_ENTITIES};
use large_in_repro::store::{Tag, TagQuery};
use large_in_repro::{Expectation, Store, StoreConfig};

const SIZES: &[i64] = &[999, 1000, 5000];

#[derive(Debug, Serialize)]
struct Probe {
    size: i64,
    raw_rows: usize,
    structured_rows: usize,
    fan_out_found: usize,
}

impl Probe {
    fn is_complete(&self) -> bool {
        let expected = self.size as usize;
        self.raw_rows == expected && self.structured_rows == expected && self.fan_out_found == expected
    }
}

fn main() -> Result<()> {
    // Single-threaded, like the test runner
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?
        .block_on(async_main())
}

async fn async_main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_thread_ids(false)
        .with_max_level(tracing::Level::INFO)
        .init();

    let config = StoreConfig::from_env()?;
    println!("Probing {} (QUERY_BATCH_SIZE={})", config.database_url, config.query_batch_size);

    let store = Store::connect(&config).await?;
    println!("✓ Connected successfully!");

    let mut probes = Vec::with_capacity(SIZES.len());
    for &size in SIZES {
        let probe = probe(&store, size).await?;
        let marker = if probe.is_complete() { "✓" } else { "✗" };
        println!(
            "{marker} {size:>5} ids: raw={} structured={} fan-out={}",
            probe.raw_rows, probe.structured_rows, probe.fan_out_found
        );
        probes.push(probe);
    }

    clean(&store, TAG_AND_STAFF_ENTITIES).await?;
    store.close().await;

    let detected = if probes.iter().all(Probe::is_complete) {
        Expectation::Stable
    } else {
        Expectation::Bugged
    };

    println!("\n{}", serde_json::to_string_pretty(&probes)?);
    println!("\nThis database behaves like a {detected}.");
    if detected.is_bugged() {
        println!("Run the tests with IS_DATABASE_BUGGED=1 to assert the defect.");
    }

    Ok(())
}

async fn probe(store: &Store, size: i64) -> Result<Probe> {
    clean(store, TAG_AND_STAFF_ENTITIES).await?;
    let ids = create_tags(store, size).await?;

    let in_list = ids.iter().map(|id| id.to_string()).collect::<Vec<_>>().join(",");
    let raw: Vec<Tag> = store
        .query_raw_unsafe(&format!("SELECT * FROM Tag WHERE id IN ({in_list}) ORDER BY id ASC"))
        .await?;

    let structured = store.find_many_tags(&TagQuery::new().id_in(ids)).await?;

    let fan_out = find_unique_staff_members(store, size).await?;
    let fan_out_found = fan_out
        .staff_members_from_store
        .iter()
        .filter(|found| found.as_ref() == Some(&fan_out.staff_member))
        .count();

    Ok(Probe {
        size,
        raw_rows: raw.len(),
        structured_rows: structured.len(),
        fan_out_found,
    })
}

use nosql::collection::DocWriter;
use nosql::context::Context;
use nosql::errors::NosqlResult;
use nosql::filter::field;
use nosql::{doc, key_from};
use nosql_int_test::test_util::{cleanup, create_test_context};

fn main() -> NosqlResult<()> {
    println!("Starting stress test...");
    let ctx = create_test_context()?;
    let db = ctx.db();
    let background = Context::background();

    let count = 100_000;
    let start = std::time::Instant::now();
    let mut writer = db.batch_insert("records");
    for i in 0..count {
        let record = doc! {
            first_name: (uuid::Uuid::new_v4().to_string()),
            last_name: (uuid::Uuid::new_v4().to_string()),
            failed: (i % 10 == 0),
            processed: false,
        };
        let key = key_from(&["first_name", "last_name"], &record);
        writer.write_doc(&background, Some(key), record)?;
        if i % 1_000 == 999 {
            writer.flush(&background)?;
        }
    }
    writer.flush(&background)?;
    writer.close()?;
    println!("Inserted {} records in {:?}", count, start.elapsed());

    let start = std::time::Instant::now();
    let mut iter = db.query("records").with_fields([field("failed").eq(false)]).iterate();
    let mut keys = Vec::new();
    while iter.next(&background) {
        if let Some(key) = iter.key() {
            keys.push(key.clone());
        }
    }
    iter.close()?;
    println!("Scanned {} records in {:?}", keys.len(), start.elapsed());

    let start = std::time::Instant::now();
    for key in &keys {
        db.update("records", key.clone())
            .upsert(doc! { processed: true })
            .inc("attempts", 1)
            .execute(&background)?;
    }
    println!("Updated {} records in {:?}", keys.len(), start.elapsed());

    let start = std::time::Instant::now();
    let processed = db
        .query("records")
        .with_fields([field("processed").eq(true)])
        .count(&background)?;
    println!("Counted {} processed records in {:?}", processed, start.elapsed());

    let start = std::time::Instant::now();
    let removed = db
        .delete("records")
        .with_fields([field("failed").eq(true)])
        .execute(&background)?;
    println!("Removed {} failed records in {:?}", removed, start.elapsed());

    cleanup(ctx)
}

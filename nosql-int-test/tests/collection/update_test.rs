use nosql::common::Value;
use nosql::context::Context;
use nosql::errors::ErrorKind;
use nosql::{doc, key};
use nosql_int_test::test_util::{cleanup, create_test_context, run_test};
use std::sync::{Arc, Barrier};
use std::thread;

#[test]
fn test_upsert_with_increment_then_increment_again() {
    run_test(
        create_test_context,
        |ctx| {
            let db = ctx.db();
            let background = Context::background();

            let created = db
                .update("counters", key!("page"))
                .inc("n", 5)
                .upsert(doc! { n: 3, x: "y" })
                .execute(&background)?;
            assert_eq!(created, doc! { n: 5, x: "y" });
            assert_eq!(db.find_by_key(&background, "counters", &key!("page"))?, created);

            db.update("counters", key!("page"))
                .upsert(doc! { n: 10, x: "y" })
                .execute(&background)?;
            let updated = db
                .update("counters", key!("page"))
                .inc("n", 5)
                .upsert(doc! { n: 3, x: "y" })
                .execute(&background)?;
            assert_eq!(updated.get("n"), Some(&Value::Int(15)));
            assert_eq!(updated.get("x"), Some(&Value::from("y")));
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_upsert_merges_into_existing() {
    run_test(
        create_test_context,
        |ctx| {
            let db = ctx.db();
            let background = Context::background();
            db.insert(
                &background,
                "users",
                Some(key!("bob")),
                doc! { name: "bob", visits: 2, city: "Rome" },
            )?;

            let updated = db
                .update("users", key!("bob"))
                .upsert(doc! { city: "Paris", email: "bob@example.com" })
                .execute(&background)?;

            assert_eq!(
                updated,
                doc! { name: "bob", visits: 2, city: "Paris", email: "bob@example.com" }
            );
            assert_eq!(db.find_by_key(&background, "users", &key!("bob"))?, updated);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_increment_only() {
    run_test(
        create_test_context,
        |ctx| {
            let db = ctx.db();
            let background = Context::background();
            db.insert(
                &background,
                "stats",
                Some(key!("s")),
                doc! { hits: 1, ratio: 0.5, label: "a" },
            )?;

            let updated = db
                .update("stats", key!("s"))
                .inc("hits", 9)
                .inc("ratio", 2)
                .inc("misses", 3)
                .execute(&background)?;

            assert_eq!(updated.get("hits"), Some(&Value::Int(10)));
            assert_eq!(updated.get("ratio"), Some(&Value::Float(2.5)));
            assert_eq!(updated.get("misses"), Some(&Value::Int(3)));
            assert_eq!(updated.get("label"), Some(&Value::from("a")));
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_later_increment_replaces_earlier() {
    run_test(
        create_test_context,
        |ctx| {
            let db = ctx.db();
            let background = Context::background();
            db.insert(&background, "stats", Some(key!("s")), doc! { n: 0 })?;

            let updated = db
                .update("stats", key!("s"))
                .inc("n", 1)
                .inc("n", 7)
                .execute(&background)?;
            assert_eq!(updated.get("n"), Some(&Value::Int(7)));
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_update_missing_without_upsert() {
    run_test(
        create_test_context,
        |ctx| {
            let db = ctx.db();
            let background = Context::background();

            let err = db
                .update("stats", key!("ghost"))
                .inc("n", 1)
                .execute(&background)
                .unwrap_err();
            assert!(err.is_not_found());
            assert!(db.collection_names()?.is_empty());

            db.insert(&background, "stats", Some(key!("real")), doc! {})?;
            let err = db
                .update("stats", key!("ghost"))
                .inc("n", 1)
                .execute(&background)
                .unwrap_err();
            assert!(err.is_not_found());
            assert_eq!(db.query("stats").count(&background)?, 1);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_increment_non_numeric_field_fails() {
    run_test(
        create_test_context,
        |ctx| {
            let db = ctx.db();
            let background = Context::background();
            db.insert(&background, "stats", Some(key!("s")), doc! { n: "ten" })?;

            let err = db
                .update("stats", key!("s"))
                .inc("n", 1)
                .execute(&background)
                .unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::InvalidDataType);
            assert_eq!(
                db.find_by_key(&background, "stats", &key!("s"))?,
                doc! { n: "ten" }
            );
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_increment_overflow_fails() {
    run_test(
        create_test_context,
        |ctx| {
            let db = ctx.db();
            let background = Context::background();
            db.insert(&background, "stats", Some(key!("s")), doc! { n: (i64::MAX) })?;

            let err = db
                .update("stats", key!("s"))
                .inc("n", 1)
                .execute(&background)
                .unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::InvalidOperation);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_concurrent_increments_are_not_lost() {
    run_test(
        create_test_context,
        |ctx| {
            let db = ctx.db();
            let threads = 4;
            let per_thread = 25;
            let barrier = Arc::new(Barrier::new(threads));

            let handles: Vec<_> = (0..threads)
                .map(|_| {
                    let db = db.clone();
                    let barrier = Arc::clone(&barrier);
                    thread::spawn(move || {
                        let background = Context::background();
                        barrier.wait();
                        for _ in 0..per_thread {
                            db.update("counters", key!("shared"))
                                .inc("n", 1)
                                .upsert(doc! {})
                                .execute(&background)
                                .unwrap();
                        }
                    })
                })
                .collect();

            for handle in handles {
                handle.join().unwrap();
            }

            let doc = db.find_by_key(&Context::background(), "counters", &key!("shared"))?;
            assert_eq!(doc.get("n"), Some(&Value::Int((threads * per_thread) as i64)));
            Ok(())
        },
        cleanup,
    )
}

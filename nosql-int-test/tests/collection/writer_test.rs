use nosql::collection::{DocWriter, SequentialWriter};
use nosql::context::Context;
use nosql::errors::ErrorKind;
use nosql::{doc, key, Key};
use nosql_int_test::test_util::{cleanup, collect_keys, create_test_context, run_test, sorted};

#[test]
fn test_emulated_writer_stops_at_first_error() {
    run_test(
        create_test_context,
        |ctx| {
            let db = ctx.db();
            let background = Context::background();
            db.insert(&background, "items", Some(key!("taken")), doc! { v: 0 })?;

            let mut writer = SequentialWriter::new(&db, "items");
            writer.write_doc(&background, Some(key!("k1")), doc! { v: 1 })?;
            let second = writer
                .write_doc(&background, Some(key!("taken")), doc! { v: 2 })
                .unwrap_err();
            assert_eq!(second.kind(), &ErrorKind::UniqueConstraintViolation);
            let third = writer
                .write_doc(&background, Some(key!("k3")), doc! { v: 3 })
                .unwrap_err();
            assert_eq!(third.kind(), second.kind());

            assert_eq!(writer.keys(), &[key!("k1")]);
            let flushed = writer.flush(&background).unwrap_err();
            assert_eq!(flushed.kind(), second.kind());
            assert_eq!(flushed.message(), second.message());
            assert!(writer.close().is_ok());

            assert!(db
                .find_by_key(&background, "items", &key!("k3"))
                .unwrap_err()
                .is_not_found());
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_emulated_writer_reports_keys_immediately() {
    run_test(
        create_test_context,
        |ctx| {
            let db = ctx.db();
            let background = Context::background();

            let mut writer = SequentialWriter::new(&db, "items");
            writer.write_doc(&background, None, doc! { v: 1 })?;
            assert_eq!(writer.keys().len(), 1);
            assert_eq!(
                db.find_by_key(&background, "items", &writer.keys()[0])?,
                doc! { v: 1 }
            );

            writer.close()?;
            let err = writer.write_doc(&background, None, doc! {}).unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::InvalidOperation);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_batch_insert_writes_every_document() {
    run_test(
        create_test_context,
        |ctx| {
            let db = ctx.db();
            let background = Context::background();

            let mut writer = db.batch_insert("bulk");
            let mut expected = Vec::new();
            for i in 0..100 {
                let key = if i % 2 == 0 {
                    Some(key!(format!("even-{}", i)))
                } else {
                    None
                };
                if let Some(key) = &key {
                    expected.push(key.clone());
                }
                writer.write_doc(&background, key, doc! { i: i })?;
            }
            writer.flush(&background)?;

            let keys: Vec<Key> = writer.keys().to_vec();
            assert_eq!(keys.len(), 100);
            for key in &expected {
                assert!(keys.contains(key));
            }
            writer.close()?;

            let stored = collect_keys(&background, db.query("bulk").iterate())?;
            assert_eq!(sorted(stored), sorted(keys));
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_batch_insert_keys_keep_write_order() {
    run_test(
        create_test_context,
        |ctx| {
            let db = ctx.db();
            let background = Context::background();

            let mut writer = db.batch_insert("ordered");
            for name in ["c", "a", "b"] {
                writer.write_doc(&background, Some(key!(name)), doc! { name: name })?;
            }
            writer.flush(&background)?;
            assert_eq!(writer.keys(), &[key!("c"), key!("a"), key!("b")]);
            writer.close()?;
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_batch_insert_rejects_existing_key() {
    run_test(
        create_test_context,
        |ctx| {
            let db = ctx.db();
            let background = Context::background();
            db.insert(&background, "bulk", Some(key!("dup")), doc! { v: 0 })?;

            let mut writer = db.batch_insert("bulk");
            let written = writer.write_doc(&background, Some(key!("dup")), doc! { v: 1 });
            let result = written.and_then(|_| writer.flush(&background));
            let err = result.unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::UniqueConstraintViolation);

            // the writer stays failed
            assert!(writer.flush(&background).is_err());
            assert!(writer.close().is_ok());
            assert_eq!(
                db.find_by_key(&background, "bulk", &key!("dup"))?,
                doc! { v: 0 }
            );
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_multiple_flushes() {
    run_test(
        create_test_context,
        |ctx| {
            let db = ctx.db();
            let background = Context::background();

            let mut writer = db.batch_insert("chunks");
            for chunk in 0..3 {
                for i in 0..10 {
                    writer.write_doc(
                        &background,
                        Some(key!(format!("{}-{}", chunk, i))),
                        doc! { chunk: (chunk as i64) },
                    )?;
                }
                writer.flush(&background)?;
                assert_eq!(writer.keys().len(), (chunk + 1) * 10);
            }
            writer.close()?;

            assert_eq!(db.query("chunks").count(&background)?, 30);
            Ok(())
        },
        cleanup,
    )
}

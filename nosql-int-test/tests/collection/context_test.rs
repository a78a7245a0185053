use nosql::context::Context;
use nosql::errors::ErrorKind;
use nosql::index::Index;
use nosql::{doc, key};
use nosql_int_test::test_util::{cleanup, create_test_context, insert_test_documents, run_test};
use std::time::{Duration, Instant};

#[test]
fn test_cancelled_context_fails_every_operation() {
    run_test(
        create_test_context,
        |ctx| {
            let db = ctx.db();
            let background = Context::background();
            insert_test_documents(&db, "people")?;

            let (cancelled, handle) = background.with_cancel();
            handle.cancel();

            let errors = vec![
                db.insert(&cancelled, "people", None, doc! {}).unwrap_err(),
                db.find_by_key(&cancelled, "people", &key!("fn1")).unwrap_err(),
                db.query("people").count(&cancelled).unwrap_err(),
                db.query("people").one(&cancelled).unwrap_err(),
                db.update("people", key!("fn1"))
                    .inc("age", 1)
                    .execute(&cancelled)
                    .unwrap_err(),
                db.delete("people").execute(&cancelled).unwrap_err(),
                db.ensure_index(&cancelled, "people", &Index::primary(["first_name"]), &[])
                    .unwrap_err(),
            ];
            for err in errors {
                assert_eq!(err.kind(), &ErrorKind::Cancelled);
                assert!(err.is_cancelled());
            }

            // nothing changed
            assert_eq!(db.query("people").count(&background)?, 3);
            let doc = db.find_by_key(&background, "people", &key!("fn1"))?;
            assert_eq!(doc.get("age").and_then(|v| v.as_int()), Some(34));
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_expired_deadline() {
    run_test(
        create_test_context,
        |ctx| {
            let db = ctx.db();
            let background = Context::background();
            insert_test_documents(&db, "people")?;

            let expired = background.with_deadline(Instant::now());
            let err = db.query("people").count(&expired).unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::DeadlineExceeded);
            assert!(err.is_cancelled());

            let err = db.insert(&expired, "people", None, doc! {}).unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::DeadlineExceeded);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_timeout_elapses_during_iteration() {
    run_test(
        create_test_context,
        |ctx| {
            let db = ctx.db();
            let background = Context::background();
            insert_test_documents(&db, "people")?;

            let timed = background.with_timeout(Duration::from_millis(50));
            let mut iter = db.query("people").iterate();
            assert!(iter.next(&timed));

            awaitility::at_most(Duration::from_secs(2)).until(|| timed.is_expired());
            assert!(!iter.next(&timed));
            assert_eq!(
                iter.err().map(|e| e.kind()),
                Some(&ErrorKind::DeadlineExceeded)
            );
            iter.close()?;
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_cancelled_writer() {
    run_test(
        create_test_context,
        |ctx| {
            let db = ctx.db();
            let background = Context::background();
            let (cancellable, handle) = background.with_cancel();

            let mut writer = db.batch_insert("bulk");
            handle.cancel();
            let err = writer
                .write_doc(&cancellable, None, doc! { v: 1 })
                .and_then(|_| writer.flush(&cancellable))
                .unwrap_err();
            assert!(err.is_cancelled());
            assert!(writer.close().is_ok());
            assert_eq!(db.query("bulk").count(&background)?, 0);
            Ok(())
        },
        cleanup,
    )
}

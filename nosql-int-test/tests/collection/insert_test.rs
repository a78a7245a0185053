use nosql::context::Context;
use nosql::errors::ErrorKind;
use nosql::{doc, key};
use nosql_int_test::test_util::{cleanup, create_test_context, run_test, sorted};

#[test]
fn test_insert_with_generated_key() {
    run_test(
        create_test_context,
        |ctx| {
            let db = ctx.db();
            let background = Context::background();

            let first = db.insert(&background, "notes", None, doc! { text: "a" })?;
            let second = db.insert(&background, "notes", None, doc! { text: "a" })?;
            assert_ne!(first, second);
            assert_eq!(first.len(), 1);

            assert_eq!(db.find_by_key(&background, "notes", &first)?, doc! { text: "a" });
            assert_eq!(db.query("notes").count(&background)?, 2);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_insert_duplicate_key_fails() {
    run_test(
        create_test_context,
        |ctx| {
            let db = ctx.db();
            let background = Context::background();

            db.insert(&background, "notes", Some(key!("n1")), doc! { v: 1 })?;
            let err = db
                .insert(&background, "notes", Some(key!("n1")), doc! { v: 2 })
                .unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::UniqueConstraintViolation);

            // the first write wins
            assert_eq!(db.find_by_key(&background, "notes", &key!("n1"))?, doc! { v: 1 });
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_insert_empty_key_fails() {
    run_test(
        create_test_context,
        |ctx| {
            let db = ctx.db();
            let err = db
                .insert(&Context::background(), "notes", Some(key!()), doc! { v: 1 })
                .unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::InvalidKey);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_same_key_in_different_collections() {
    run_test(
        create_test_context,
        |ctx| {
            let db = ctx.db();
            let background = Context::background();

            db.insert(&background, "left", Some(key!("k")), doc! { side: "left" })?;
            db.insert(&background, "right", Some(key!("k")), doc! { side: "right" })?;

            assert_eq!(
                db.find_by_key(&background, "left", &key!("k"))?,
                doc! { side: "left" }
            );
            assert_eq!(
                db.find_by_key(&background, "right", &key!("k"))?,
                doc! { side: "right" }
            );
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_insert_creates_collection() {
    run_test(
        create_test_context,
        |ctx| {
            let db = ctx.db();
            let background = Context::background();
            assert!(db.collection_names()?.is_empty());

            db.insert(&background, "zeta", None, doc! {})?;
            db.insert(&background, "alpha", None, doc! {})?;
            db.insert(&background, "with space/and:colon", None, doc! {})?;

            let names = db.collection_names()?;
            assert_eq!(
                names,
                sorted(vec![
                    "alpha".to_string(),
                    "with space/and:colon".to_string(),
                    "zeta".to_string(),
                ])
            );
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_find_missing_key() {
    run_test(
        create_test_context,
        |ctx| {
            let db = ctx.db();
            let background = Context::background();

            let err = db.find_by_key(&background, "nowhere", &key!("x")).unwrap_err();
            assert!(err.is_not_found());
            assert_eq!(err.kind(), &ErrorKind::NotFound);

            db.insert(&background, "somewhere", Some(key!("y")), doc! {})?;
            assert!(db
                .find_by_key(&background, "somewhere", &key!("x"))
                .unwrap_err()
                .is_not_found());

            // a lookup never creates the collection
            assert_eq!(db.collection_names()?, vec!["somewhere".to_string()]);
            Ok(())
        },
        cleanup,
    )
}

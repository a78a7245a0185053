use nosql::context::Context;
use nosql::filter::field;
use nosql::{doc, key, Key};
use nosql_int_test::test_util::{
    cleanup, collect_keys, create_test_context, insert_test_documents, run_test, sorted,
};

#[test]
fn test_delete_by_keys_and_filter() {
    run_test(
        create_test_context,
        |ctx| {
            let db = ctx.db();
            let background = Context::background();
            db.insert(&background, "items", Some(key!("k1")), doc! { status: "done" })?;
            db.insert(&background, "items", Some(key!("k2")), doc! { status: "open" })?;
            db.insert(&background, "items", Some(key!("k3")), doc! { status: "done" })?;

            let removed = db
                .delete("items")
                .keys([key!("k1"), key!("k2")])
                .with_fields([field("status").eq("done")])
                .execute(&background)?;
            assert_eq!(removed, 1);

            let left = collect_keys(&background, db.query("items").iterate())?;
            assert_eq!(sorted(left), vec![key!("k2"), key!("k3")]);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_delete_by_filter() {
    run_test(
        create_test_context,
        |ctx| {
            let db = ctx.db();
            let background = Context::background();
            insert_test_documents(&db, "people")?;

            let removed = db
                .delete("people")
                .with_fields([field("last_name").eq("ln2")])
                .execute(&background)?;
            assert_eq!(removed, 2);

            let left = collect_keys(&background, db.query("people").iterate())?;
            assert_eq!(left, vec![key!("fn1")]);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_delete_by_keys_skips_missing() {
    run_test(
        create_test_context,
        |ctx| {
            let db = ctx.db();
            let background = Context::background();
            insert_test_documents(&db, "people")?;

            let removed = db
                .delete("people")
                .keys([key!("fn1")])
                .keys([key!("fn2"), key!("nobody")])
                .execute(&background)?;
            assert_eq!(removed, 2);
            assert_eq!(db.query("people").count(&background)?, 1);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_delete_everything() {
    run_test(
        create_test_context,
        |ctx| {
            let db = ctx.db();
            let background = Context::background();
            insert_test_documents(&db, "people")?;

            assert_eq!(db.delete("people").execute(&background)?, 3);
            assert_eq!(db.query("people").count(&background)?, 0);
            assert_eq!(db.delete("people").execute(&background)?, 0);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_empty_key_list_does_not_restrict() {
    run_test(
        create_test_context,
        |ctx| {
            let db = ctx.db();
            let background = Context::background();
            insert_test_documents(&db, "people")?;

            let removed = db
                .delete("people")
                .keys(Vec::<Key>::new())
                .with_fields([field("age").gt(18)])
                .execute(&background)?;
            assert_eq!(removed, 2);
            assert_eq!(db.query("people").count(&background)?, 1);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_delete_from_missing_collection() {
    run_test(
        create_test_context,
        |ctx| {
            let db = ctx.db();
            let background = Context::background();

            let removed = db
                .delete("ghost")
                .keys([key!("a")])
                .execute(&background)?;
            assert_eq!(removed, 0);
            assert!(db.collection_names()?.is_empty());
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_deleted_key_can_be_reused() {
    run_test(
        create_test_context,
        |ctx| {
            let db = ctx.db();
            let background = Context::background();
            db.insert(&background, "items", Some(key!("k")), doc! { v: 1 })?;
            db.delete("items").keys([key!("k")]).execute(&background)?;

            assert!(db
                .find_by_key(&background, "items", &key!("k"))
                .unwrap_err()
                .is_not_found());
            db.insert(&background, "items", Some(key!("k")), doc! { v: 2 })?;
            assert_eq!(db.find_by_key(&background, "items", &key!("k"))?, doc! { v: 2 });
            Ok(())
        },
        cleanup,
    )
}

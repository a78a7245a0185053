use nosql::context::Context;
use nosql::filter::{field, path};
use nosql::{doc, key};
use nosql_int_test::test_util::{
    cleanup, collect_keys, create_test_context, insert_test_documents, run_test, sorted,
};
use rand::Rng;

#[test]
fn test_find_all() {
    run_test(
        create_test_context,
        |ctx| {
            let db = ctx.db();
            let background = Context::background();
            let keys = insert_test_documents(&db, "people")?;

            let found = collect_keys(&background, db.query("people").iterate())?;
            assert_eq!(sorted(found), sorted(keys));
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_find_with_filters_is_conjunction() {
    run_test(
        create_test_context,
        |ctx| {
            let db = ctx.db();
            let background = Context::background();
            insert_test_documents(&db, "people")?;

            let found = collect_keys(
                &background,
                db.query("people")
                    .with_fields([field("last_name").eq("ln2")])
                    .with_fields([field("age").gt(18)])
                    .iterate(),
            )?;
            assert_eq!(found, vec![key!("fn3")]);

            let adults_in_paris = db
                .query("people")
                .with_fields([field("address.city").eq("Paris"), field("age").gte(18)])
                .count(&background)?;
            assert_eq!(adults_in_paris, 2);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_adding_filters_never_grows_result() {
    run_test(
        create_test_context,
        |ctx| {
            let db = ctx.db();
            let background = Context::background();
            let mut rng = rand::rng();

            for i in 0..50 {
                let age: i64 = rng.random_range(0..100);
                let city = if rng.random_bool(0.5) { "Paris" } else { "Rome" };
                db.insert(
                    &background,
                    "people",
                    Some(key!(format!("p{}", i))),
                    doc! { age: age, city: city, even: (i % 2 == 0) },
                )?;
            }

            let filters = [
                field("age").gte(30),
                field("city").eq("Paris"),
                field("even").eq(true),
                field("age").lt(70),
            ];

            let mut query = db.query("people");
            let mut previous = query.count(&background)?;
            assert_eq!(previous, 50);
            for filter in filters {
                query.with_fields([filter]);
                let current = query.count(&background)?;
                assert!(current <= previous);
                previous = current;
            }
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_find_with_missing_nested_field() {
    run_test(
        create_test_context,
        |ctx| {
            let db = ctx.db();
            let background = Context::background();
            insert_test_documents(&db, "people")?;

            // fn3 has no zip, and no document has a country
            let found = collect_keys(
                &background,
                db.query("people")
                    .with_fields([field("address.zip").ne("75001")])
                    .iterate(),
            )?;
            assert_eq!(found, vec![key!("fn2")]);

            assert_eq!(
                db.query("people")
                    .with_fields([field("address.country").eq("FR")])
                    .count(&background)?,
                0
            );

            // a path through a scalar does not match either
            assert_eq!(
                db.query("people")
                    .with_fields([field("age.value").eq(34)])
                    .count(&background)?,
                0
            );
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_find_with_dotted_field_name() {
    run_test(
        create_test_context,
        |ctx| {
            let db = ctx.db();
            let background = Context::background();

            let mut doc = doc! { plain: 1 };
            doc.put("a.b", "dotted")?;
            db.insert(&background, "odd", Some(key!("k")), doc)?;

            assert_eq!(
                db.query("odd").with_fields([path(["a.b"]).eq("dotted")]).count(&background)?,
                1
            );
            assert_eq!(
                db.query("odd").with_fields([field("a.b").eq("dotted")]).count(&background)?,
                0
            );
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_limit() {
    run_test(
        create_test_context,
        |ctx| {
            let db = ctx.db();
            let background = Context::background();
            for i in 0..10 {
                db.insert(&background, "items", None, doc! { n: i })?;
            }

            assert_eq!(db.query("items").limit(3).count(&background)?, 3);
            assert_eq!(db.query("items").limit(0).count(&background)?, 0);
            assert_eq!(db.query("items").limit(100).count(&background)?, 10);
            assert_eq!(db.query("items").limit(-1).count(&background)?, 10);

            // the last limit set wins
            assert_eq!(db.query("items").limit(2).limit(5).count(&background)?, 5);

            // the limit applies after filtering
            let found = collect_keys(
                &background,
                db.query("items")
                    .with_fields([field("n").gte(5)])
                    .limit(4)
                    .iterate(),
            )?;
            assert_eq!(found.len(), 4);
            for key in found {
                let doc = db.find_by_key(&background, "items", &key)?;
                assert!(doc.get("n").and_then(|n| n.as_int()).unwrap_or(0) >= 5);
            }
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_one() {
    run_test(
        create_test_context,
        |ctx| {
            let db = ctx.db();
            let background = Context::background();
            insert_test_documents(&db, "people")?;

            let doc = db
                .query("people")
                .with_fields([field("first_name").eq("fn2")])
                .one(&background)?;
            assert_eq!(doc.get("last_name").and_then(|v| v.as_string()), Some("ln2"));

            let err = db
                .query("people")
                .with_fields([field("first_name").eq("nobody")])
                .one(&background)
                .unwrap_err();
            assert!(err.is_not_found());

            let err = db.query("empty").one(&background).unwrap_err();
            assert!(err.is_not_found());
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_query_missing_collection() {
    run_test(
        create_test_context,
        |ctx| {
            let db = ctx.db();
            let background = Context::background();

            assert_eq!(db.query("ghost").count(&background)?, 0);
            assert!(collect_keys(&background, db.query("ghost").iterate())?.is_empty());
            assert!(db.collection_names()?.is_empty());
            Ok(())
        },
        cleanup,
    )
}

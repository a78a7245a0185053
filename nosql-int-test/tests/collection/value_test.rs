use nosql::collection::Document;
use nosql::common::{Value, ValueKind};
use nosql::context::Context;
use nosql::filter::field;
use nosql::{doc, key};
use nosql_int_test::test_util::{
    cleanup, create_test_context, create_test_docs, insert_test_documents, parse_time, run_test,
};

#[test]
fn test_every_value_kind_round_trips() {
    run_test(
        create_test_context,
        |ctx| {
            let db = ctx.db();
            let background = Context::background();

            let doc = doc! {
                text: "héllo wörld",
                count: 42,
                ratio: 0.125,
                flag: true,
                at: (parse_time("2021-03-04T05:06:07.123456789Z")),
                raw: (vec![0u8, 255u8, 7u8]),
                labels: ["x", "y", ""],
                nested: {
                    deeper: { level: 3 },
                    empty: {},
                },
            };

            let kinds: Vec<ValueKind> = doc.iter().map(|(_, value)| value.kind()).collect();
            for kind in [
                ValueKind::Document,
                ValueKind::String,
                ValueKind::Int,
                ValueKind::Float,
                ValueKind::Bool,
                ValueKind::Time,
                ValueKind::Bytes,
                ValueKind::Strings,
            ] {
                assert!(kinds.contains(&kind), "missing {:?}", kind);
            }

            db.insert(&background, "values", Some(key!("all")), doc.clone())?;
            let stored = db.find_by_key(&background, "values", &key!("all"))?;
            assert_eq!(stored, doc);

            assert_eq!(stored.get("count"), Some(&Value::Int(42)));
            assert_eq!(stored.get("ratio"), Some(&Value::Float(0.125)));
            assert_eq!(
                stored.get_path(&["nested", "deeper", "level"]),
                Some(&Value::Int(3))
            );
            assert_eq!(
                stored.get("at").and_then(|v| v.as_time()),
                Some(&parse_time("2021-03-04T05:06:07.123456789Z"))
            );
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_extreme_values_round_trip() {
    run_test(
        create_test_context,
        |ctx| {
            let db = ctx.db();
            let background = Context::background();

            let mut doc = Document::new();
            doc.put("max", i64::MAX)?;
            doc.put("min", i64::MIN)?;
            doc.put("tiny", f64::MIN_POSITIVE)?;
            doc.put("empty_text", "")?;
            doc.put("empty_bytes", Vec::<u8>::new())?;
            doc.put("empty_list", Vec::<String>::new())?;

            let key = db.insert(&background, "values", None, doc.clone())?;
            assert_eq!(db.find_by_key(&background, "values", &key)?, doc);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_test_documents_round_trip() {
    run_test(
        create_test_context,
        |ctx| {
            let db = ctx.db();
            let background = Context::background();
            let keys = insert_test_documents(&db, "people")?;

            for (key, doc) in keys.iter().zip(create_test_docs()) {
                assert_eq!(db.find_by_key(&background, "people", key)?, doc);
            }
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_int_and_float_compare_numerically() {
    run_test(
        create_test_context,
        |ctx| {
            let db = ctx.db();
            let background = Context::background();
            db.insert(&background, "numbers", Some(key!("i")), doc! { n: 2 })?;
            db.insert(&background, "numbers", Some(key!("f")), doc! { n: 2.5 })?;

            assert_eq!(
                db.query("numbers").with_fields([field("n").gt(2.2)]).count(&background)?,
                1
            );
            assert_eq!(
                db.query("numbers").with_fields([field("n").gte(2)]).count(&background)?,
                2
            );
            assert_eq!(
                db.query("numbers").with_fields([field("n").lt(3)]).count(&background)?,
                2
            );

            // equality agrees with the ordering operators
            assert_eq!(
                db.query("numbers").with_fields([field("n").eq(2.0)]).count(&background)?,
                1
            );
            assert_eq!(
                db.query("numbers").with_fields([field("n").eq(2)]).count(&background)?,
                1
            );
            assert_eq!(
                db.query("numbers").with_fields([field("n").ne(2.0)]).count(&background)?,
                1
            );
            assert_eq!(
                db.query("numbers").with_fields([field("n").ne(3)]).count(&background)?,
                2
            );
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_cross_kind_filters_never_match() {
    run_test(
        create_test_context,
        |ctx| {
            let db = ctx.db();
            let background = Context::background();
            db.insert(&background, "mixed", Some(key!("a")), doc! { v: "10" })?;
            db.insert(&background, "mixed", Some(key!("b")), doc! { v: 10 })?;
            db.insert(&background, "mixed", Some(key!("c")), doc! { other: 1 })?;

            assert_eq!(
                db.query("mixed").with_fields([field("v").gt(5)]).count(&background)?,
                1
            );
            assert_eq!(
                db.query("mixed").with_fields([field("v").ne(11)]).count(&background)?,
                1
            );
            assert_eq!(
                db.query("mixed").with_fields([field("v").ne("x")]).count(&background)?,
                1
            );
            Ok(())
        },
        cleanup,
    )
}

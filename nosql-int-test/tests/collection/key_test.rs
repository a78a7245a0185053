use nosql::context::Context;
use nosql::{doc, gen_key, key, key_from, Key};
use nosql_int_test::test_util::{cleanup, create_test_context, run_test};
use std::collections::HashSet;

#[test]
fn test_gen_key_never_repeats() {
    let keys: HashSet<Key> = (0..10_000).map(|_| gen_key()).collect();
    assert_eq!(keys.len(), 10_000);
}

#[test]
fn test_gen_key_is_a_uuid() {
    let key = gen_key();
    assert_eq!(key.len(), 1);
    assert!(uuid::Uuid::parse_str(&key.components()[0]).is_ok());
}

#[test]
fn test_key_from_keeps_field_order() {
    let doc = doc! { a: "x", b: "y", c: "z" };
    assert_eq!(key_from(&["c", "a"], &doc), key!("z", "x"));
    assert_eq!(key_from(&["a", "b", "c"], &doc), key!("x", "y", "z"));
}

#[test]
fn test_key_from_skips_missing_and_non_string_fields() {
    let doc = doc! {
        name: "alice",
        age: 30,
        tags: ["a", "b"],
        address: { city: "Paris" },
    };

    let fields = ["age", "name", "missing", "tags", "address"];
    let key = key_from(&fields, &doc);
    assert_eq!(key, key!("alice"));
    assert!(key.len() <= fields.len());
}

#[test]
fn test_key_from_without_string_fields_is_empty() {
    let doc = doc! { n: 1, flag: true };
    assert!(key_from(&["n", "flag"], &doc).is_empty());
    assert!(key_from::<&str>(&[], &doc).is_empty());
}

#[test]
fn test_derived_key_addresses_document() {
    run_test(
        create_test_context,
        |ctx| {
            let db = ctx.db();
            let background = Context::background();
            let doc = doc! { tenant: "acme", user: "bob", visits: 3 };

            let key = key_from(&["tenant", "user"], &doc);
            let stored = db.insert(&background, "users", Some(key.clone()), doc.clone())?;
            assert_eq!(stored, key!("acme", "bob"));
            assert_eq!(db.find_by_key(&background, "users", &key)?, doc);

            // components are not concatenated, so a shorter key is a different document
            assert!(db
                .find_by_key(&background, "users", &key!("acme"))
                .unwrap_err()
                .is_not_found());
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_components_are_kept_apart() {
    run_test(
        create_test_context,
        |ctx| {
            let db = ctx.db();
            let background = Context::background();
            db.insert(&background, "pairs", Some(key!("ab", "c")), doc! { n: 1 })?;
            db.insert(&background, "pairs", Some(key!("a", "bc")), doc! { n: 2 })?;

            assert_eq!(db.query("pairs").count(&background)?, 2);
            assert_eq!(db.find_by_key(&background, "pairs", &key!("a", "bc"))?, doc! { n: 2 });
            Ok(())
        },
        cleanup,
    )
}

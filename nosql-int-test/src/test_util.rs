use chrono::{DateTime, Utc};
use nosql::collection::{DocIterator, Document};
use nosql::context::Context;
use nosql::database::Database;
use nosql::errors::NosqlResult;
use nosql::{doc, key_from, Key};
use std::backtrace::Backtrace;
use std::time::{Duration, Instant};
use std::{env, fs, thread};

const ATTEMPTS: u32 = 3;
const BACKOFF: Duration = Duration::from_millis(100);

/// Why one attempt of a database test did not pass.
enum AttemptFailure {
    Setup(String),
    Body(String),
    Teardown(String),
    Panicked(String),
}

impl std::fmt::Display for AttemptFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AttemptFailure::Setup(e) => write!(f, "opening the {} database failed: {}", BACKEND, e),
            AttemptFailure::Body(e) => write!(f, "test body returned an error: {}", e),
            AttemptFailure::Teardown(e) => {
                write!(f, "closing the {} database failed: {}", BACKEND, e)
            }
            AttemptFailure::Panicked(e) => write!(f, "test panicked: {}", e),
        }
    }
}

#[cfg(feature = "memory")]
const BACKEND: &str = "in-memory";
#[cfg(not(feature = "memory"))]
const BACKEND: &str = "fjall";

/// Opens a fresh database with `before`, runs `test` against it and tears it
/// down with `after`, retrying the whole cycle on failure.
///
/// Teardown runs even when the body fails. Fjall keeps file handles for a
/// moment after close, so transient setup or cleanup failures are retried
/// with a growing pause.
pub fn run_test<T, B, A>(before: B, test: T, after: A)
where
    T: Fn(TestContext) -> NosqlResult<()> + std::panic::UnwindSafe + std::panic::RefUnwindSafe,
    B: Fn() -> NosqlResult<TestContext> + std::panic::UnwindSafe + std::panic::RefUnwindSafe,
    A: Fn(TestContext) -> NosqlResult<()> + std::panic::UnwindSafe + std::panic::RefUnwindSafe,
{
    let mut failure: Option<(AttemptFailure, String)> = None;

    for attempt in 1..=ATTEMPTS {
        let started = Instant::now();
        let outcome = std::panic::catch_unwind(|| run_attempt(&before, &test, &after))
            .unwrap_or_else(|panic| {
                let trace = Backtrace::capture().to_string();
                Err((AttemptFailure::Panicked(panic_message(panic)), trace))
            });

        match outcome {
            Ok(()) => return,
            Err((reason, trace)) => {
                if attempt < ATTEMPTS {
                    eprintln!(
                        "[{} db] attempt {}/{} failed after {:?}: {}",
                        BACKEND,
                        attempt,
                        ATTEMPTS,
                        started.elapsed(),
                        reason
                    );
                    thread::sleep(BACKOFF * attempt);
                }
                failure = Some((reason, trace));
            }
        }
    }

    let (reason, trace) = match failure {
        Some(failure) => failure,
        None => return,
    };
    if !trace.is_empty() && !trace.contains("disabled") {
        eprintln!("[{} db] backtrace of the last attempt:\n{}", BACKEND, trace);
    }
    panic!(
        "[{} db] gave up after {} attempts, last one: {}",
        BACKEND, ATTEMPTS, reason
    );
}

fn run_attempt<T, B, A>(before: &B, test: &T, after: &A) -> Result<(), (AttemptFailure, String)>
where
    T: Fn(TestContext) -> NosqlResult<()>,
    B: Fn() -> NosqlResult<TestContext>,
    A: Fn(TestContext) -> NosqlResult<()>,
{
    let trace = || Backtrace::capture().to_string();
    let ctx = before().map_err(|e| (AttemptFailure::Setup(format!("{:?}", e)), trace()))?;

    match test(ctx.clone()) {
        Ok(()) => after(ctx).map_err(|e| (AttemptFailure::Teardown(format!("{:?}", e)), trace())),
        Err(e) => {
            if let Err(cleanup) = after(ctx) {
                eprintln!("[{} db] cleanup after a failed test also failed: {}", BACKEND, cleanup);
            }
            Err((AttemptFailure::Body(format!("{:?}", e)), trace()))
        }
    }
}

fn panic_message(panic: Box<dyn std::any::Any + Send>) -> String {
    match panic.downcast::<String>() {
        Ok(message) => *message,
        Err(panic) => match panic.downcast::<&str>() {
            Ok(message) => message.to_string(),
            Err(_) => "non-string panic payload".to_string(),
        },
    }
}

#[derive(Clone)]
pub struct TestContext {
    path: String,
    db: Database,
}

impl TestContext {
    pub fn new(path: String, db: Database) -> Self {
        Self { path, db }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn db(&self) -> Database {
        self.db.clone()
    }
}

pub fn random_path() -> String {
    let id = uuid::Uuid::new_v4();
    env::temp_dir().join(id.to_string()).to_string_lossy().to_string()
}

#[cfg(not(feature = "memory"))]
pub fn create_test_context() -> NosqlResult<TestContext> {
    use nosql::errors::{ErrorKind, NosqlError};
    use nosql_fjall_adapter::FjallDatabase;

    const MAX_ATTEMPTS: u32 = 3;
    let mut last_error: Option<NosqlError> = None;

    for attempt in 1..=MAX_ATTEMPTS {
        let path = random_path();

        // low memory preset keeps one flush and one compaction worker per database
        match FjallDatabase::with_config()
            .low_memory_preset()
            .db_path(&path)
            .open()
        {
            Ok(db) => return Ok(TestContext::new(path, db)),
            Err(e) => {
                let _ = fs::remove_dir_all(&path);
                if attempt < MAX_ATTEMPTS {
                    eprintln!(
                        "Warning: Failed to create test context (attempt {}/{}): {:?}",
                        attempt, MAX_ATTEMPTS, e
                    );
                    thread::sleep(Duration::from_millis(50 * attempt as u64));
                }
                last_error = Some(e);
            }
        }
    }

    Err(last_error.unwrap_or_else(|| {
        NosqlError::new("Failed to create test context", ErrorKind::InternalError)
    }))
}

#[cfg(feature = "memory")]
pub fn create_test_context() -> NosqlResult<TestContext> {
    use nosql::store::memory::InMemoryDatabase;

    Ok(TestContext::new(random_path(), InMemoryDatabase::open()))
}

#[cfg(not(feature = "memory"))]
pub fn cleanup(ctx: TestContext) -> NosqlResult<()> {
    if let Err(e) = ctx.db().close() {
        eprintln!("Warning: Failed to close database: {:?}", e);
    }

    let path = ctx.path().to_string();
    let max_retries = 10;
    let mut delay_ms = 50u64;

    for retry in 0..max_retries {
        if !std::path::Path::new(&path).exists() {
            return Ok(());
        }

        match fs::remove_dir_all(&path) {
            Ok(_) => return Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(_) if retry < max_retries - 1 => {
                thread::sleep(Duration::from_millis(delay_ms));
                delay_ms = std::cmp::min(delay_ms * 2, 1000);
            }
            Err(e) => {
                // leftovers in the temp dir are not worth failing a test over
                eprintln!(
                    "Warning: Failed to remove test directory {} after {} attempts: {:?}",
                    path, max_retries, e
                );
                return Ok(());
            }
        }
    }

    Ok(())
}

#[cfg(feature = "memory")]
pub fn cleanup(ctx: TestContext) -> NosqlResult<()> {
    ctx.db().close()
}

pub fn parse_time(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
}

/// Three documents which together use every kind of value.
pub fn create_test_docs() -> Vec<Document> {
    let doc1 = doc! {
        first_name: "fn1",
        last_name: "ln1",
        age: 34,
        score: 7.5,
        active: true,
        birth_day: (parse_time("2012-07-01T02:15:22+02:00")),
        data: (vec![1u8, 2u8, 3u8]),
        tags: ["one", "two", "three"],
        address: {
            city: "Paris",
            zip: "75001",
        },
    };

    let doc2 = doc! {
        first_name: "fn2",
        last_name: "ln2",
        age: 17,
        score: 9.25,
        active: false,
        birth_day: (parse_time("2010-06-12T12:05:35+05:30")),
        data: (vec![3u8, 4u8, 3u8]),
        tags: ["three", "four"],
        address: {
            city: "Berlin",
            zip: "10115",
        },
    };

    let doc3 = doc! {
        first_name: "fn3",
        last_name: "ln2",
        age: 52,
        active: true,
        birth_day: (parse_time("2014-04-17T22:25:44-04:00")),
        data: (vec![9u8, 4u8, 8u8]),
        address: {
            city: "Paris",
        },
    };

    vec![doc1, doc2, doc3]
}

/// Inserts [create_test_docs] keyed by `first_name` and returns the keys.
pub fn insert_test_documents(db: &Database, collection: &str) -> NosqlResult<Vec<Key>> {
    let ctx = Context::background();
    let mut keys = Vec::new();
    for doc in create_test_docs() {
        let key = key_from(&["first_name"], &doc);
        keys.push(db.insert(&ctx, collection, Some(key), doc)?);
    }
    Ok(keys)
}

/// Drains an iterator, returning the keys it produced or its terminal error.
pub fn collect_keys(ctx: &Context, mut iter: DocIterator) -> NosqlResult<Vec<Key>> {
    let mut keys = Vec::new();
    while iter.next(ctx) {
        if let Some(key) = iter.key() {
            keys.push(key.clone());
        }
    }

    if let Some(err) = iter.err() {
        return Err(err.clone());
    }
    iter.close()?;
    Ok(keys)
}

pub fn sorted<T: Ord>(mut items: Vec<T>) -> Vec<T> {
    items.sort();
    items
}

//! Shared models and seeded fixture data for the integration tests.

#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use minidb::{
    define_model, Column, DriverConfig, ModelMetadata, ModelRegistry, Result, SqliteDriver, Value,
};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

// ============================================================================
// MODELS
// ============================================================================

define_model! {
    pub struct AutoIncrementDoc in "auto_increment_doc" {
        id: i64 => Column::integer().primary_key().autoincrement(),
        name: String => Column::string(),
    }
}

define_model! {
    pub struct GeneratedDoc in "generated_doc" {
        id: i64 => Column::integer().primary_key().generator(|| Value::Integer(1234567890)),
    }
}

define_model! {
    pub struct DatedDoc in "dated_doc" {
        id: i64 => Column::integer().primary_key().autoincrement(),
        created_on: DateTime<Utc> => Column::date(),
    }
}

define_model! {
    pub struct InitializedDoc in "initialized_doc" {
        id: i64 => Column::integer().primary_key(),
        name: String => Column::string(),
    }
}

define_model! {
    /// One of the seeded people
    pub struct Person in "person" {
        id: String => Column::string().primary_key(),
        first_name: String => Column::string(),
        last_name: String => Column::string(),
        email: String => Column::string(),
        state: String => Column::string(),
        locked: bool => Column::bit(),
        created_on: DateTime<Utc> => Column::date(),
        updated_on: DateTime<Utc> => Column::date(),
    }
}

define_model! {
    /// Tenant-scoped, full-text indexed
    pub struct Article in "article" {
        tenant: String => Column::string().primary_key(),
        id: i64 => Column::integer().primary_key(),
        title: String => Column::string().analyzed(),
        body: String => Column::string().analyzed(),
        state: String => Column::string(),
    }
}

// ============================================================================
// FIXTURE DATA
// ============================================================================

pub const PEOPLE: usize = 1000;
pub const ACTIVE_PEOPLE: usize = 327;
pub const INITIALIZED_ID: i64 = 9999;

const FIRST_NAMES: &[&str] = &[
    "Robert", "Alice", "Maria", "James", "Linda", "Omar", "Yuki", "Chen", "Priya", "Lucas",
    "Emma", "Noah", "Fatima", "Ivan", "Zoe",
];
const LAST_NAMES: &[&str] = &[
    "Maldonado", "Smith", "Garcia", "Okafor", "Tanaka", "Novak", "Haddad", "Larsen", "Silva",
];

/// 1000 people, exactly 327 of them `active`, in a seeded shuffled order
pub fn people() -> Vec<Person> {
    let mut rng = StdRng::seed_from_u64(0x5eed);

    let mut states: Vec<&str> = Vec::with_capacity(PEOPLE);
    states.extend(std::iter::repeat("active").take(ACTIVE_PEOPLE));
    states.extend(std::iter::repeat("inactive").take(400));
    states.extend(std::iter::repeat("deleted").take(PEOPLE - ACTIVE_PEOPLE - 400));
    states.shuffle(&mut rng);

    let base = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
    states
        .into_iter()
        .enumerate()
        .map(|(i, state)| {
            let first = FIRST_NAMES[rng.gen_range(0..FIRST_NAMES.len())];
            let last = LAST_NAMES[rng.gen_range(0..LAST_NAMES.len())];
            let created_on = base + chrono::Duration::seconds(rng.gen_range(0..20_000_000));
            Person {
                id: Some(format!("person-{:04}", i)),
                first_name: Some(first.to_string()),
                last_name: Some(last.to_string()),
                email: Some(format!("{}.{}{}@example.com", first, last, i).to_lowercase()),
                state: Some(state.to_string()),
                locked: Some(rng.gen_bool(0.1)),
                created_on: Some(created_on),
                updated_on: Some(created_on + chrono::Duration::hours(rng.gen_range(1..5000))),
            }
        })
        .collect()
}

pub fn articles() -> Vec<Article> {
    let rows: &[(&str, i64, &str, &str, &str)] = &[
        ("acme", 1, "Rust ownership explained", "Borrowing and lifetimes in depth", "published"),
        ("acme", 2, "Cooking with cast iron", "Seasoning a pan the right way", "published"),
        ("acme", 3, "Async rust in practice", "Executors, futures and pinning", "draft"),
        ("globex", 1, "Why rust for embedded", "No runtime, no garbage collector", "published"),
        ("globex", 2, "Gardening notes", "Tomatoes need sun and patience", "published"),
    ];
    rows.iter()
        .map(|(tenant, id, title, body, state)| Article {
            tenant: Some(tenant.to_string()),
            id: Some(*id),
            title: Some(title.to_string()),
            body: Some(body.to_string()),
            state: Some(state.to_string()),
        })
        .collect()
}

// ============================================================================
// DATABASE SETUP
// ============================================================================

fn seed(driver: &mut SqliteDriver, metadata: &ModelMetadata) -> Result<()> {
    let initialized = metadata.table::<InitializedDoc>()?;
    driver.add(
        &initialized,
        &mut InitializedDoc {
            id: Some(INITIALIZED_ID),
            name: Some("created by database initializer".to_string()),
        },
    )?;

    let persons = metadata.table::<Person>()?;
    for mut person in people() {
        driver.add(&persons, &mut person)?;
    }

    let article_table = metadata.table::<Article>()?;
    for mut article in articles() {
        driver.add(&article_table, &mut article)?;
    }
    Ok(())
}

pub fn registry() -> ModelRegistry {
    ModelRegistry::new()
        .register::<AutoIncrementDoc>()
        .register::<GeneratedDoc>()
        .register::<DatedDoc>()
        .register::<InitializedDoc>()
        .register::<Person>()
        .register::<Article>()
}

/// Connected in-memory driver with every table created and seeded
pub fn open() -> (SqliteDriver, ModelMetadata) {
    let metadata = registry().with_initializer(seed).build().unwrap();
    let mut driver = SqliteDriver::new(DriverConfig::for_testing()).unwrap();
    driver.connect().unwrap();
    metadata.create_db(&mut driver).unwrap();
    (driver, metadata)
}

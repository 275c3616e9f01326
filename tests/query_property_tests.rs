//! Property-Based Tests for Query Results
//!
//! **Property 1: Search Totals**
//!
//! For any state filter, limit and offset, `search` SHALL report the size of
//! the whole filtered set as `total`, and return exactly the rows of the
//! requested window.
//!
//! **Property 2: Sort Order**
//!
//! For any sortable column and direction, adjacent rows returned by `find`
//! SHALL be ordered accordingly.

use minidb::{Criteria, FindOptions, SortDirection, SortSpec};
use proptest::prelude::*;

#[path = "support/fixtures.rs"]
mod fixtures;
use fixtures::*;

// ============================================================================
// TEST CONFIGURATION
// ============================================================================

const STATES: &[&str] = &["active", "inactive", "deleted"];

fn state_subset() -> impl Strategy<Value = Vec<&'static str>> {
    proptest::sample::subsequence(STATES.to_vec(), 1..=STATES.len())
}

fn sort_column() -> impl Strategy<Value = &'static str> {
    prop_oneof![
        Just("first_name"),
        Just("last_name"),
        Just("email"),
        Just("created_on"),
    ]
}

fn direction() -> impl Strategy<Value = SortDirection> {
    prop_oneof![Just(SortDirection::Asc), Just(SortDirection::Desc)]
}

// ============================================================================
// PROPERTY TESTS
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(12))]

    #[test]
    fn prop_search_total_and_window(
        states in state_subset(),
        limit in 0i64..=1000,
        offset in 0i64..1200,
    ) {
        let (driver, metadata) = open();
        let table = metadata.table::<Person>().unwrap();

        let expected_total = people()
            .iter()
            .filter(|p| states.iter().any(|s| Some(*s) == p.state.as_deref()))
            .count() as i64;

        let opts = FindOptions::new()
            .criteria(Criteria::new().one_of("state", states.iter().copied()))
            .sort(SortSpec::new().asc("id"))
            .limit(limit)
            .offset(offset);
        let page = driver.search(&table, &opts).unwrap();

        prop_assert_eq!(page.total, expected_total);
        prop_assert_eq!(page.page_size, limit);
        prop_assert_eq!(page.offset, offset);
        let window = (expected_total - offset).clamp(0, limit);
        prop_assert_eq!(page.data.len() as i64, window);
        for person in &page.data {
            prop_assert!(states.iter().any(|s| Some(*s) == person.state.as_deref()));
        }
    }

    #[test]
    fn prop_sort_order(column in sort_column(), direction in direction()) {
        let (driver, metadata) = open();
        let table = metadata.table::<Person>().unwrap();

        let sort = SortSpec::parse(&[(column, direction.as_sql())]).unwrap();
        let docs = driver.find(&table, &FindOptions::new().sort(sort)).unwrap();
        prop_assert_eq!(docs.len(), PEOPLE);

        for pair in docs.windows(2) {
            let (a, b) = match column {
                "first_name" => (pair[0].first_name.clone(), pair[1].first_name.clone()),
                "last_name" => (pair[0].last_name.clone(), pair[1].last_name.clone()),
                "email" => (pair[0].email.clone(), pair[1].email.clone()),
                _ => (
                    pair[0].created_on.map(|d| d.to_rfc3339()),
                    pair[1].created_on.map(|d| d.to_rfc3339()),
                ),
            };
            match direction {
                SortDirection::Asc => prop_assert!(a <= b),
                SortDirection::Desc => prop_assert!(a >= b),
            }
        }
    }
}

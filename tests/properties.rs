// Property-based tests for cross-dataset and self blocking.
// CI: 128 cases (default). Soak: PROPTEST_CASES=5000 cargo test --release

use std::collections::{BTreeSet, HashSet};

use entity_blocking::{
    blocking_key_fn, Attribute, BlockingConfig, BlockingKeyGenerator, Correspondence, Dataset,
    Matchable, Record, SchemaLink, SourceId, StandardBlocker,
};
use proptest::prelude::*;

type Link = Correspondence<Attribute>;

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

fn config_128() -> ProptestConfig {
    ProptestConfig {
        cases: std::env::var("PROPTEST_CASES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(128),
        failure_persistence: None,
        ..ProptestConfig::default()
    }
}

fn blocking_config(parallel: bool) -> BlockingConfig {
    BlockingConfig {
        parallel,
        validate_correspondences: false,
        ..BlockingConfig::default()
    }
}

// ---------------------------------------------------------------------------
// Generators
// ---------------------------------------------------------------------------

fn arb_keys() -> impl Strategy<Value = BTreeSet<char>> {
    prop::collection::btree_set(prop::sample::select(vec!['a', 'b', 'c', 'd', 'e']), 0..3)
}

fn arb_records(sources: Vec<SourceId>, prefix: &'static str) -> impl Strategy<Value = Vec<Record>> {
    prop::collection::vec((prop::sample::select(sources), arb_keys()), 0..12).prop_map(
        move |rows| {
            rows.into_iter()
                .enumerate()
                .map(|(i, (source, keys))| {
                    let keys: Vec<String> = keys.iter().map(|k| k.to_string()).collect();
                    Record::new(format!("{prefix}{i}"), source).with_value("keys", keys.join(" "))
                })
                .collect()
        },
    )
}

fn arb_links() -> impl Strategy<Value = Vec<Link>> {
    prop::collection::vec(
        (0..5u32, 0..5u32, prop::sample::select(vec!["name", "city", "year"])),
        0..8,
    )
    .prop_map(|links| {
        links
            .into_iter()
            .map(|(a, b, name)| {
                Correspondence::without_causes(Attribute::new(a, name), Attribute::new(b, name), 1.0)
            })
            .collect()
    })
}

fn by_keys() -> impl BlockingKeyGenerator<Record, Link, Key = String, Blocked = Record> {
    blocking_key_fn(|record: &Record, _: &[Link]| {
        Ok(record
            .value("keys")
            .unwrap_or_default()
            .split_whitespace()
            .map(|key| (key.to_string(), record.clone()))
            .collect())
    })
}

fn keys_of(record: &Record) -> BTreeSet<&str> {
    record.value("keys").unwrap_or_default().split_whitespace().collect()
}

fn shared_keys(a: &Record, b: &Record) -> usize {
    keys_of(a).intersection(&keys_of(b)).count()
}

fn id_pair(c: &Correspondence<Record, Link>) -> (String, String) {
    (c.first().id.clone(), c.second().id.clone())
}

// ---------------------------------------------------------------------------
// Cross-dataset blocking
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(config_128())]

    #[test]
    fn cross_candidates_share_a_key_and_span_both_datasets(
        left in arb_records(vec![0, 1], "l"),
        right in arb_records(vec![2, 3], "r"),
        links in arb_links(),
    ) {
        let d1 = Dataset::new(left);
        let d2 = Dataset::new(right);
        let result = StandardBlocker::new(by_keys())
            .with_config(blocking_config(true))
            .run_blocking(&d1, &d2, &links)
            .unwrap();

        for candidate in &result {
            prop_assert!(shared_keys(candidate.first(), candidate.second()) > 0);
            prop_assert!(candidate.first().source < 2);
            prop_assert!(candidate.second().source >= 2);
            prop_assert_eq!(candidate.similarity(), 1.0);
        }
    }

    #[test]
    fn cross_candidates_repeat_once_per_shared_key(
        left in arb_records(vec![0, 1], "l"),
        right in arb_records(vec![2, 3], "r"),
    ) {
        let d1 = Dataset::new(left);
        let d2 = Dataset::new(right);
        let links: Vec<Link> = Vec::new();
        let result = StandardBlocker::new(by_keys())
            .with_config(blocking_config(false))
            .run_blocking(&d1, &d2, &links)
            .unwrap();

        let expected: usize = d1
            .records()
            .iter()
            .flat_map(|a| d2.records().iter().map(move |b| shared_keys(a, b)))
            .sum();
        prop_assert_eq!(result.len(), expected);
        let report = result.report();
        prop_assert!(report.distinct_pairs <= result.len());
        prop_assert!((0.0..=1.0).contains(&report.reduction_ratio));
    }

    #[test]
    fn causes_connect_exactly_the_pair_sources(
        left in arb_records(vec![0, 1], "l"),
        right in arb_records(vec![2, 3], "r"),
        links in arb_links(),
    ) {
        let d1 = Dataset::new(left);
        let d2 = Dataset::new(right);
        let result = StandardBlocker::new(by_keys())
            .with_config(blocking_config(true))
            .run_blocking(&d1, &d2, &links)
            .unwrap();

        for candidate in &result {
            let (s1, s2) = (candidate.first().source, candidate.second().source);
            let causes = candidate.causes();
            for cause in causes {
                prop_assert!(cause.connects(s1, s2));
            }
            // sorted and free of duplicates
            prop_assert!(causes.windows(2).all(|w| w[0] < w[1]));
            // nothing that connects the pair and applies to its records is lost
            for link in &links {
                if link.first_source() == s1 && link.second_source() == s2 {
                    prop_assert!(causes.contains(link));
                }
            }
        }
    }

    #[test]
    fn parallel_and_sequential_agree(
        left in arb_records(vec![0, 1], "l"),
        right in arb_records(vec![2, 3], "r"),
        links in arb_links(),
    ) {
        let d1 = Dataset::new(left);
        let d2 = Dataset::new(right);
        let run = |parallel: bool| {
            let mut pairs = StandardBlocker::new(by_keys())
                .with_config(blocking_config(parallel))
                .run_blocking(&d1, &d2, &links)
                .unwrap()
                .into_correspondences();
            pairs.sort();
            pairs
        };
        prop_assert_eq!(run(false), run(true));
    }
}

// ---------------------------------------------------------------------------
// Self blocking
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(config_128())]

    #[test]
    fn self_pairs_are_canonical_and_unique(
        records in arb_records(vec![0, 1, 2], "d"),
        links in arb_links(),
    ) {
        let d = Dataset::new(records);
        let result = StandardBlocker::new(by_keys())
            .with_config(blocking_config(true))
            .run_self_blocking(&d, &links)
            .unwrap();

        let mut seen = HashSet::new();
        for candidate in &result {
            prop_assert!(
                candidate.first().data_source_identifier()
                    <= candidate.second().data_source_identifier()
            );
            prop_assert!(candidate.first() != candidate.second());
            let (a, b) = id_pair(candidate);
            prop_assert!(!seen.contains(&(b.clone(), a.clone())));
            prop_assert!(seen.insert((a, b)));
            let (s1, s2) = (candidate.first().source, candidate.second().source);
            for cause in candidate.causes() {
                prop_assert!(cause.connects(s1, s2));
            }
        }
    }

    #[test]
    fn self_pairs_cover_every_shared_key(
        records in arb_records(vec![0, 1, 2], "d"),
    ) {
        let d = Dataset::new(records);
        let links: Vec<Link> = Vec::new();
        let result = StandardBlocker::new(by_keys())
            .with_config(blocking_config(false))
            .run_self_blocking(&d, &links)
            .unwrap();

        let found: HashSet<BTreeSet<String>> = result
            .iter()
            .map(|c| {
                let (a, b) = id_pair(c);
                [a, b].into_iter().collect()
            })
            .collect();
        let rows = d.records();
        let mut expected = HashSet::new();
        for (i, a) in rows.iter().enumerate() {
            for b in &rows[i + 1..] {
                if shared_keys(a, b) > 0 {
                    expected.insert([a.id.clone(), b.id.clone()].into_iter().collect::<BTreeSet<_>>());
                }
            }
        }
        prop_assert_eq!(found, expected);
        prop_assert_eq!(result.len(), result.report().candidates);
    }
}

//! Property tests for variant generation over the built-in rule table

use proptest::prelude::*;
use std::collections::HashSet;
use weaver_config::builtin_rules;
use weaver_core::{variants, MatchKind, RuleTable};

const FRAGMENTS: &[&str] = &[
    "API", "api", "UI", "DB", "db", "SSO", "Single Sign-On", "database", "データベース", "エーピーアイ",
    "サーバー", "ヴァイオリン", "ティー", "ディスク", "ウ", "Rust", "x", "-", " ", "2",
];

fn name_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec(prop::sample::select(FRAGMENTS), 1..5)
        .prop_map(|parts| parts.concat())
        .prop_filter("blank names are never expanded", |s| !s.trim().is_empty())
}

proptest! {
    #[test]
    fn name_itself_comes_first(name in name_strategy(), max in 1usize..20) {
        let out = variants(&name, &RuleTable::new(&builtin_rules(), max));
        prop_assert_eq!(&out[0].text, &name);
        prop_assert_eq!(out[0].match_kind, MatchKind::Exact);
        prop_assert_eq!(out[0].confidence, 1.0);
        for v in &out[1..] {
            prop_assert_ne!(v.match_kind, MatchKind::Exact);
            prop_assert!(v.confidence > 0.0 && v.confidence <= 1.0);
            prop_assert!(!v.text.trim().is_empty());
        }
    }

    #[test]
    fn output_is_capped_and_case_unique(name in name_strategy(), max in 1usize..20) {
        let out = variants(&name, &RuleTable::new(&builtin_rules(), max));
        prop_assert!(out.len() <= max);

        let mut seen = HashSet::new();
        for v in &out {
            prop_assert!(seen.insert(v.text.to_ascii_lowercase()), "duplicate {:?}", v.text);
        }
    }

    #[test]
    fn smaller_cap_is_a_prefix(name in name_strategy(), max in 1usize..10) {
        let small = variants(&name, &RuleTable::new(&builtin_rules(), max));
        let large = variants(&name, &RuleTable::new(&builtin_rules(), max + 8));
        prop_assert_eq!(&large[..small.len()], &small[..]);
    }

    #[test]
    fn generation_is_deterministic(name in name_strategy()) {
        let table = RuleTable::new(&builtin_rules(), 16);
        prop_assert_eq!(variants(&name, &table), variants(&name, &table));
    }

    #[test]
    fn every_variant_comes_from_a_single_rule(name in name_strategy()) {
        let rules = builtin_rules();
        let out = variants(&name, &RuleTable::new(&rules, 64));

        for v in &out[1..] {
            let produced_by_one = rules.iter().any(|rule| {
                variants(&name, &RuleTable::new(std::slice::from_ref(rule), 64))
                    .iter()
                    .skip(1)
                    .any(|single| single == v)
            });
            prop_assert!(produced_by_one, "{:?} from {:?} needs more than one rule", v.text, name);
        }
    }
}

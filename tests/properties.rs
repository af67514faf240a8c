use std::collections::BTreeSet;

use proptest::prelude::*;
use sheet_merge::MergeConfig;
use sheet_merge::alias::HeaderAliasMap;
use sheet_merge::matcher::{self, similarity::SimilarityMetric};
use sheet_merge::merge::project;
use sheet_merge::model::{CellValue, TemplateSchema};

/// Headers drawn from a small vocabulary so that exact, alias, contained and
/// blank collisions all show up.
fn header() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-c]{0,3}",
        "[A-C ]{1,4}",
        Just("日期".to_string()),
        Just("交易日期".to_string()),
        Just("金额".to_string()),
        Just("折/卡号/存单号".to_string()),
        Just(String::new()),
    ]
}

fn metric() -> impl Strategy<Value = SimilarityMetric> {
    prop_oneof![
        Just(SimilarityMetric::TokenOverlap),
        Just(SimilarityMetric::Levenshtein),
        Just(SimilarityMetric::JaroWinkler),
    ]
}

fn merge_config() -> impl Strategy<Value = MergeConfig> {
    (0.0f64..=1.0, any::<bool>(), metric()).prop_map(|(threshold, containment, metric)| MergeConfig {
        fuzzy_threshold: threshold,
        fuzzy_containment: containment,
        metric,
        ..MergeConfig::default()
    })
}

fn alias_map(pairs: &[(String, String)], config: &MergeConfig) -> HeaderAliasMap {
    let mut aliases = HeaderAliasMap::new();
    for (template, alias) in pairs {
        aliases.insert(template, alias, &config.normalize);
    }
    aliases
}

proptest! {
    #[test]
    fn resolution_has_template_width_and_distinct_sources(
        columns in proptest::collection::vec(header(), 0..6),
        pairs in proptest::collection::vec((header(), header()), 0..4),
        headers in proptest::collection::vec(header(), 0..7),
        config in merge_config(),
    ) {
        let schema = TemplateSchema::new(columns);
        let aliases = alias_map(&pairs, &config);
        let resolution = matcher::resolve(&schema, &aliases, &headers, &config);

        prop_assert_eq!(resolution.len(), schema.len());
        let used: Vec<usize> = resolution.slots().iter().flatten().copied().collect();
        let unique: BTreeSet<usize> = used.iter().copied().collect();
        prop_assert_eq!(used.len(), unique.len());
        prop_assert!(used.iter().all(|&index| index < headers.len()));
        prop_assert_eq!(resolution.matched_count(), used.len());
    }

    #[test]
    fn projection_width_matches_template_for_any_row(
        columns in proptest::collection::vec(header(), 0..6),
        headers in proptest::collection::vec(header(), 0..7),
        row in proptest::collection::vec("[a-z0-9]{0,4}", 0..9),
        config in merge_config(),
    ) {
        let schema = TemplateSchema::new(columns);
        let resolution = matcher::resolve(&schema, &HeaderAliasMap::new(), &headers, &config);
        let row: Vec<CellValue> = row.into_iter().map(CellValue::text).collect();
        let filler = CellValue::text("-");

        let projected = project(&resolution, &row, &filler);
        prop_assert_eq!(projected.len(), schema.len());
        for (slot, cell) in resolution.slots().iter().copied().zip(&projected) {
            let expected = slot.and_then(|index| row.get(index)).unwrap_or(&filler);
            prop_assert_eq!(cell, expected);
        }
    }

    #[test]
    fn repeated_resolution_is_identical(
        columns in proptest::collection::vec(header(), 0..6),
        pairs in proptest::collection::vec((header(), header()), 0..4),
        headers in proptest::collection::vec(header(), 0..7),
        config in merge_config(),
    ) {
        let schema = TemplateSchema::new(columns);
        let aliases = alias_map(&pairs, &config);
        let first = matcher::resolve(&schema, &aliases, &headers, &config);
        let second = matcher::resolve(&schema, &alias_map(&pairs, &config), &headers, &config);
        prop_assert_eq!(first, second);
    }
}

use std::collections::BTreeSet;

use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;

use crate::dataset::Record;
use crate::util::truncate_chars;

/// Comparison key of a degree name: its first `key_len` characters.
pub fn filter_key(category: &str, key_len: usize) -> &str {
    truncate_chars(category, key_len)
}

/// Records whose truncated degree name equals `filter`, or all of them.
pub fn filter_records<'a>(
    records: &'a [Record],
    filter: Option<&str>,
    key_len: usize,
) -> Vec<&'a Record> {
    match filter {
        None => records.iter().collect(),
        Some(filter) => records
            .iter()
            .filter(|record| filter_key(&record.category, key_len) == filter)
            .collect(),
    }
}

/// Distinct truncated degree names, sorted; the values a filter menu offers.
pub fn filter_options(records: &[Record], key_len: usize) -> Vec<String> {
    records
        .iter()
        .map(|record| filter_key(&record.category, key_len))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}

/// Filter options ranked by fuzzy match against `query`, best first.
pub fn suggest_filters<'a>(options: &'a [String], query: &str, limit: usize) -> Vec<&'a str> {
    let query = query.trim();
    if query.is_empty() {
        return options.iter().take(limit).map(String::as_str).collect();
    }

    let matcher = SkimMatcherV2::default();
    let mut ranked = options
        .iter()
        .filter_map(|option| {
            fuzzy_match_score(&matcher, option, query).map(|score| (score, option))
        })
        .collect::<Vec<_>>();

    ranked.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(b.1)));
    ranked.truncate(limit);
    ranked.into_iter().map(|(_, option)| option.as_str()).collect()
}

fn fuzzy_match_score(matcher: &SkimMatcherV2, text: &str, query: &str) -> Option<i64> {
    matcher
        .fuzzy_match(text, query)
        .or_else(|| matcher.fuzzy_match(&text.to_lowercase(), &query.to_lowercase()))
}

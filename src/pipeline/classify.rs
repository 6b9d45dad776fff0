// src/pipeline/classify.rs

//! Keyword classification of news items.
//!
//! Single pass over the input in order:
//! 1. titles containing a global filter term are dropped
//! 2. the first group (declaration order) whose rule matches wins
//! 3. aliased groups report into their canonical group's bucket
//! 4. repeats of a story already in the bucket are skipped
//! 5. past the bucket's cap, matches are counted but not listed

use std::collections::HashSet;

use crate::models::{ClassificationResult, GlobalFilter, GroupMatches, MatchStats, NewsItem, RuleSet};
use crate::utils::normalize_title;

/// Classify a batch of items against a rule set and global filter.
pub fn classify(
    items: &[NewsItem],
    rule_set: &RuleSet,
    global_filter: &GlobalFilter,
) -> ClassificationResult {
    let mut stats = MatchStats::default();

    // Bucket per rule index; only canonical indices are ever filled.
    let mut buckets: Vec<Option<GroupMatches>> = rule_set
        .rules
        .iter()
        .map(|rule| {
            rule.group_alias_of.is_none().then(|| GroupMatches {
                key: rule.key.clone(),
                display_name: rule.display_name.clone(),
                items: Vec::new(),
                total_count: 0,
                max_items: rule.max_items,
            })
        })
        .collect();
    let mut seen: Vec<HashSet<String>> = vec![HashSet::new(); rule_set.len()];

    for item in items {
        let title_lower = item.title.to_lowercase();

        if global_filter.blocks(&title_lower) {
            stats.globally_filtered += 1;
            continue;
        }

        let Some(matched) = rule_set.first_match(&item.title, &title_lower) else {
            stats.unmatched += 1;
            continue;
        };
        let canonical = rule_set.canonical(matched);

        if !seen[canonical].insert(normalize_title(&item.title)) {
            stats.duplicates += 1;
            continue;
        }

        let Some(bucket) = buckets[canonical].as_mut() else {
            continue;
        };
        bucket.total_count += 1;
        stats.record(item);

        let has_room = bucket
            .max_items
            .is_none_or(|cap| bucket.items.len() < cap);
        if has_room {
            bucket.items.push(item.clone());
        }
    }

    let groups: Vec<GroupMatches> = buckets.into_iter().flatten().collect();
    log::debug!(
        "Classified {} item(s): {} matched, {} unmatched, {} globally filtered, {} duplicate(s)",
        items.len(),
        stats.matched,
        stats.unmatched,
        stats.globally_filtered,
        stats.duplicates
    );

    ClassificationResult { groups, stats }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, CompiledRules, Importance};
    use crate::rules::compile;

    fn item(id: usize, title: &str) -> NewsItem {
        let mut item = NewsItem::new(id.to_string(), title, "weibo", "Weibo");
        item.rank = id as u32;
        item
    }

    fn items(titles: &[&str]) -> Vec<NewsItem> {
        titles
            .iter()
            .enumerate()
            .map(|(i, t)| item(i + 1, t))
            .collect()
    }

    fn run(rules: &CompiledRules, input: &[NewsItem]) -> ClassificationResult {
        classify(input, &rules.rules, &rules.global_filter)
    }

    fn titles(group: &GroupMatches) -> Vec<&str> {
        group.items.iter().map(|i| i.title.as_str()).collect()
    }

    #[test]
    fn test_required_filter_and_cap() {
        let rules = compile("+AI\n!ban\n@2").unwrap();
        let input = items(&["AI产品上线", "AI ban news", "chatgpt新功能", "AI突破", "AI芯片"]);

        let result = run(&rules, &input);
        let group = &result.groups[0];

        assert_eq!(titles(group), vec!["AI产品上线", "AI突破"]);
        assert_eq!(group.total_count, 3);
        assert_eq!(group.dropped(), 1);
        assert_eq!(result.stats.matched, 3);
        assert_eq!(result.stats.unmatched, 2);
    }

    #[test]
    fn test_required_plus_normal_terms() {
        let rules = compile("+AI\n!ban\nchatgpt\n@2").unwrap();
        let input = items(&[
            "AI产品上线",
            "AI ban chatgpt",
            "ChatGPT AI 新功能",
            "AI chatgpt 突破",
            "AI chatgpt 芯片",
        ]);

        let result = run(&rules, &input);
        let group = &result.groups[0];

        assert_eq!(titles(group), vec!["ChatGPT AI 新功能", "AI chatgpt 突破"]);
        assert_eq!(group.total_count, 3);
    }

    #[test]
    fn test_first_group_wins() {
        let rules = compile("apple\n\niphone\n\napple\niphone").unwrap();
        let input = items(&["Apple iPhone launch", "iPhone sales"]);

        let result = run(&rules, &input);
        assert_eq!(titles(&result.groups[0]), vec!["Apple iPhone launch"]);
        assert_eq!(titles(&result.groups[1]), vec!["iPhone sales"]);
        assert!(result.groups[2].is_empty());
    }

    #[test]
    fn test_filtered_group_falls_through() {
        let rules = compile("AI\n!ban\n\nban").unwrap();
        let result = run(&rules, &items(&["AI ban"]));
        assert!(result.groups[0].is_empty());
        assert_eq!(titles(&result.groups[1]), vec!["AI ban"]);
    }

    #[test]
    fn test_global_filter_precedence() {
        let rules = compile("[WORD_GROUPS]\n+AI\n\n[GLOBAL_FILTER]\n广告").unwrap();
        let result = run(&rules, &items(&["AI 广告", "AI news"]));

        assert_eq!(titles(&result.groups[0]), vec!["AI news"]);
        assert_eq!(result.stats.globally_filtered, 1);
    }

    #[test]
    fn test_duplicates_by_normalized_title() {
        let rules = compile("AI").unwrap();
        let mut input = items(&["AI 芯片, 发布!", "ai芯片发布", "AI 模型"]);
        input[1].platform_id = "zhihu".into();

        let result = run(&rules, &input);
        assert_eq!(titles(&result.groups[0]), vec!["AI 芯片, 发布!", "AI 模型"]);
        assert_eq!(result.groups[0].total_count, 2);
        assert_eq!(result.stats.duplicates, 1);
    }

    #[test]
    fn test_alias_merges_into_canonical_bucket() {
        let text = "tesla => EV\n[ev]\n@2\n\nbyd\n[ev]\n\nnio\n[ev]";
        let rules = compile(text).unwrap();
        let input = items(&["BYD sales", "Tesla recall", "NIO delivery", "BYD export"]);

        let result = run(&rules, &input);
        assert_eq!(result.groups.len(), 1);
        let group = &result.groups[0];
        assert_eq!(group.display_name, "EV");
        assert_eq!(titles(group), vec!["BYD sales", "Tesla recall"]);
        assert_eq!(group.total_count, 4);
    }

    #[test]
    fn test_degenerate_group_produces_nothing() {
        let rules = compile("@5\n\nAI").unwrap();
        let result = run(&rules, &items(&["AI", "@5"]));
        assert!(result.groups[0].is_empty());
        assert_eq!(titles(&result.groups[1]), vec!["AI"]);
    }

    #[test]
    fn test_stats_cover_capped_items() {
        let rules = compile("AI\n@1").unwrap();
        let mut input = items(&["AI one", "AI two", "AI three"]);
        input[0].category = Category::Forum;
        input[1].importance = Some(Importance::High);
        input[2].importance = Some(Importance::Critical);

        let result = run(&rules, &input);
        assert_eq!(result.groups[0].items.len(), 1);
        assert_eq!(result.stats.forum, 1);
        assert_eq!(result.stats.news, 2);
        assert_eq!(result.stats.importance.high, 1);
        assert_eq!(result.stats.importance.critical, 1);
        assert_eq!(result.stats.importance.unrated, 1);
    }

    #[test]
    fn test_assigned_group_invariants() {
        let text = "+AI\nchip\n\n+AI\n!chip\n\nrust\n/r\\w+t/";
        let rules = compile(text).unwrap();
        let input = items(&[
            "AI chip", "AI model", "rust lang", "robot", "AI rust", "chip only", "rocket",
        ]);

        let result = run(&rules, &input);
        for (group_index, group) in result.groups.iter().enumerate() {
            let rule = &rules.rules.rules[group_index];
            for it in &group.items {
                let lower = it.title.to_lowercase();
                assert!(rule.required_terms.iter().all(|t| lower.contains(t.as_str())));
                assert!(rules.rules.rules[..group_index]
                    .iter()
                    .all(|earlier| !earlier.matches(&it.title, &lower)));
            }
        }
    }

    #[test]
    fn test_classify_is_deterministic() {
        let rules = compile("AI\n@2\n\nrust").unwrap();
        let input = items(&["AI a", "rust b", "AI c", "AI d", "rust e"]);
        assert_eq!(run(&rules, &input), run(&rules, &input));
    }
}

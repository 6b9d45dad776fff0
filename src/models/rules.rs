//! Compiled keyword rules.

use regex::Regex;

/// One keyword group compiled from the word-group grammar.
///
/// All literal terms are stored lower-cased; titles are lower-cased once
/// before matching.
#[derive(Debug, Clone)]
pub struct KeywordRule {
    /// Stable group key (defaults to the joined primary terms)
    pub key: String,

    /// Every term must be a substring of the title
    pub required_terms: Vec<String>,

    /// Any term present vetoes the group
    pub filter_terms: Vec<String>,

    /// Any term present qualifies the title
    pub normal_terms: Vec<String>,

    /// Alternative match path, case-insensitive
    pub patterns: Vec<Regex>,

    /// Name shown in reports
    pub display_name: String,

    /// Cap on reported items; `None` means unlimited
    pub max_items: Option<usize>,

    /// Index of the canonical group this one merges into
    pub group_alias_of: Option<usize>,
}

impl KeywordRule {
    /// A group with nothing to match on never matches.
    pub fn is_degenerate(&self) -> bool {
        self.required_terms.is_empty() && self.normal_terms.is_empty() && self.patterns.is_empty()
    }

    /// Check the group against a title.
    ///
    /// `title_lower` must be `title.to_lowercase()`.
    pub fn matches(&self, title: &str, title_lower: &str) -> bool {
        if self.is_degenerate() {
            return false;
        }

        if !self
            .required_terms
            .iter()
            .all(|term| title_lower.contains(term.as_str()))
        {
            return false;
        }

        if self
            .filter_terms
            .iter()
            .any(|term| title_lower.contains(term.as_str()))
        {
            return false;
        }

        // Required terms alone qualify a group that has no optional terms.
        if self.normal_terms.is_empty() && self.patterns.is_empty() {
            return true;
        }

        self.normal_terms
            .iter()
            .any(|term| title_lower.contains(term.as_str()))
            || self.patterns.iter().any(|re| re.is_match(title))
    }
}

/// Ordered keyword groups, aliases already resolved to canonical indices.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    pub rules: Vec<KeywordRule>,
}

impl RuleSet {
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Index of the first group matching the title, in declaration order.
    pub fn first_match(&self, title: &str, title_lower: &str) -> Option<usize> {
        self.rules
            .iter()
            .position(|rule| rule.matches(title, title_lower))
    }

    /// Bucket index an item matched by group `index` is reported under.
    pub fn canonical(&self, index: usize) -> usize {
        self.rules[index].group_alias_of.unwrap_or(index)
    }

    /// Groups that own a report bucket, in declaration order.
    pub fn canonical_rules(&self) -> impl Iterator<Item = (usize, &KeywordRule)> {
        self.rules
            .iter()
            .enumerate()
            .filter(|(_, rule)| rule.group_alias_of.is_none())
    }
}

/// Terms that remove a title from consideration before group matching.
#[derive(Debug, Clone, Default)]
pub struct GlobalFilter {
    pub terms: Vec<String>,
}

impl GlobalFilter {
    /// `title_lower` must be lower-cased.
    pub fn blocks(&self, title_lower: &str) -> bool {
        self.terms
            .iter()
            .any(|term| title_lower.contains(term.as_str()))
    }
}

/// Output of the rule compiler.
#[derive(Debug, Clone, Default)]
pub struct CompiledRules {
    pub rules: RuleSet,
    pub global_filter: GlobalFilter,
}

impl CompiledRules {
    /// `(key, display_name)` of every reportable group.
    pub fn keywords(&self) -> Vec<(String, String)> {
        self.rules
            .canonical_rules()
            .map(|(_, rule)| (rule.key.clone(), rule.display_name.clone()))
            .collect()
    }
}

// src/rules/compiler.rs

//! Keyword grammar compiler.
//!
//! The grammar is line oriented. Inside `[WORD_GROUPS]` (also the default
//! when the text has no section header) a blank line closes a group, and
//! each line of a group is one of:
//!
//! ```text
//! word            normal term, any one qualifies
//! +word           required term, all must be present
//! !word           filter term, any one vetoes the group
//! /regex/         case-insensitive pattern, alternative to normal terms
//! word => Name    term plus the group's display name
//! @N              report at most N items (0 = unlimited)
//! [token]         merge into the first group declaring the same token
//! ```
//!
//! Every non-empty line of `[GLOBAL_FILTER]` is a term that removes a title
//! before any group is tried. Unrecognized lines become literal required
//! terms.

use std::collections::HashMap;

use regex::Regex;

use crate::error::{AppError, Result};
use crate::models::{CompiledRules, GlobalFilter, KeywordRule, RuleSet};

const WORD_GROUPS_HEADER: &str = "[WORD_GROUPS]";
const GLOBAL_FILTER_HEADER: &str = "[GLOBAL_FILTER]";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    WordGroups,
    GlobalFilter,
}

/// A group while its lines are being read.
#[derive(Debug, Default)]
struct GroupDraft {
    required: Vec<String>,
    filter: Vec<String>,
    normal: Vec<String>,
    patterns: Vec<Regex>,
    pattern_sources: Vec<String>,
    display_name: Option<String>,
    max_items: Option<usize>,
    alias_token: Option<String>,
    touched: bool,
}

impl GroupDraft {
    /// Original-case text the group key defaults to.
    fn primary(&self) -> Option<String> {
        [&self.normal, &self.required, &self.pattern_sources]
            .into_iter()
            .find(|terms| !terms.is_empty())
            .map(|terms| terms.join(" "))
    }

    fn push_term(&mut self, term: &str, line: usize) -> Result<()> {
        if let Some(rest) = term.strip_prefix('+').filter(|r| !r.is_empty()) {
            self.required.push(rest.to_string());
        } else if let Some(rest) = term.strip_prefix('!').filter(|r| !r.is_empty()) {
            self.filter.push(rest.to_string());
        } else if term.starts_with('/') {
            let body = term
                .strip_prefix('/')
                .and_then(|t| t.strip_suffix('/'))
                .ok_or_else(|| AppError::keyword(line, format!("unterminated pattern `{term}`")))?;
            if body.is_empty() {
                return Err(AppError::keyword(line, "empty pattern"));
            }
            let regex = Regex::new(&format!("(?i){body}"))
                .map_err(|e| AppError::keyword(line, format!("invalid pattern `{body}`: {e}")))?;
            self.patterns.push(regex);
            self.pattern_sources.push(body.to_string());
        } else if term == "+" || term == "!" {
            self.required.push(term.to_string());
        } else {
            self.normal.push(term.to_string());
        }
        Ok(())
    }

    fn push_line(&mut self, text: &str, line: usize) -> Result<()> {
        self.touched = true;

        if let Some(token) = text.strip_prefix('[').and_then(|t| t.strip_suffix(']')) {
            let token = token.trim();
            if token.is_empty() {
                return Err(AppError::keyword(line, "empty group alias `[]`"));
            }
            if let Some(existing) = self.alias_token.as_deref() {
                if existing != token {
                    return Err(AppError::keyword(
                        line,
                        format!("group already aliased as `{existing}`, cannot also be `{token}`"),
                    ));
                }
            }
            self.alias_token = Some(token.to_string());
            return Ok(());
        }

        if let Some(count) = text.strip_prefix('@') {
            match count.trim().parse::<usize>() {
                Ok(0) => self.max_items = None,
                Ok(n) => self.max_items = Some(n),
                Err(_) => self.required.push(text.to_string()),
            }
            return Ok(());
        }

        if let Some((term, alias)) = text.split_once("=>") {
            let (term, alias) = (term.trim(), alias.trim());
            if term.is_empty() || alias.is_empty() {
                return Err(AppError::keyword(
                    line,
                    "display alias needs both a term and a name (`term => name`)",
                ));
            }
            self.push_term(term, line)?;
            self.display_name = Some(alias.to_string());
            return Ok(());
        }

        self.push_term(text, line)
    }
}

fn lower_all(terms: Vec<String>) -> Vec<String> {
    terms.into_iter().map(|t| t.to_lowercase()).collect()
}

/// Compile keyword grammar text into rules and the global filter.
pub fn compile(text: &str) -> Result<CompiledRules> {
    let mut section = Section::WordGroups;
    let mut drafts: Vec<GroupDraft> = Vec::new();
    let mut current = GroupDraft::default();
    let mut global_terms = Vec::new();

    for (index, raw) in text.lines().enumerate() {
        let line = index + 1;
        let text = raw.trim();

        let next_section = match text {
            WORD_GROUPS_HEADER => Some(Section::WordGroups),
            GLOBAL_FILTER_HEADER => Some(Section::GlobalFilter),
            _ => None,
        };
        if let Some(next) = next_section {
            flush(&mut current, &mut drafts);
            section = next;
            continue;
        }

        if text.is_empty() {
            flush(&mut current, &mut drafts);
            continue;
        }

        match section {
            Section::GlobalFilter => global_terms.push(text.to_lowercase()),
            Section::WordGroups => current.push_line(text, line)?,
        }
    }
    flush(&mut current, &mut drafts);

    let rules = build_rules(drafts);
    log::debug!(
        "Compiled {} keyword group(s), {} global filter term(s)",
        rules.len(),
        global_terms.len()
    );

    Ok(CompiledRules {
        rules: RuleSet { rules },
        global_filter: GlobalFilter {
            terms: global_terms,
        },
    })
}

fn flush(current: &mut GroupDraft, drafts: &mut Vec<GroupDraft>) {
    if current.touched {
        drafts.push(std::mem::take(current));
    }
}

/// Assign keys, display names and canonical alias targets.
fn build_rules(drafts: Vec<GroupDraft>) -> Vec<KeywordRule> {
    let mut canonical_by_token: HashMap<String, usize> = HashMap::new();
    let mut key_uses: HashMap<String, usize> = HashMap::new();
    let mut rules = Vec::with_capacity(drafts.len());

    for (index, draft) in drafts.into_iter().enumerate() {
        let base_key = draft
            .primary()
            .unwrap_or_else(|| format!("group{}", index + 1));
        let uses = key_uses.entry(base_key.clone()).or_insert(0);
        *uses += 1;
        let key = if *uses == 1 {
            base_key.clone()
        } else {
            format!("{base_key}#{uses}")
        };

        let group_alias_of = draft.alias_token.and_then(|token| {
            match canonical_by_token.get(&token) {
                Some(&canonical) => Some(canonical),
                None => {
                    canonical_by_token.insert(token, index);
                    None
                }
            }
        });

        let rule = KeywordRule {
            display_name: draft.display_name.unwrap_or(base_key),
            key,
            required_terms: lower_all(draft.required),
            filter_terms: lower_all(draft.filter),
            normal_terms: lower_all(draft.normal),
            patterns: draft.patterns,
            max_items: draft.max_items,
            group_alias_of,
        };
        if rule.is_degenerate() {
            log::warn!("Keyword group `{}` has no terms and will never match", rule.key);
        }
        rules.push(rule);
    }

    rules
}

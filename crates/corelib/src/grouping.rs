//! Aggregation of flat issue and hotspot streams into deduplicated rule occurrences
//!
//! Both aggregations keep first-seen order at every level: categories (or
//! files), rules inside them and ranges inside a rule. Lookups go through a
//! position index kept next to each ordered list, so a single pass over the
//! raw records is linear in their number.

use std::collections::HashMap;

use tracing::debug;

use crate::types::{Category, CategorySet, Measures, RawHotspot, RawIssue, RuleOccurrence, TextRange};

/// Rule occurrences of one scope, deduplicated by rule id
#[derive(Debug, Default)]
struct OccurrenceList {
    occurrences: Vec<RuleOccurrence>,
    positions: HashMap<String, usize>,
}

impl OccurrenceList {
    fn record(&mut self, rule_id: &str, message: &str, range: Option<TextRange>) {
        match self.positions.get(rule_id) {
            Some(&idx) => self.occurrences[idx].text_ranges.extend(range),
            None => {
                self.positions
                    .insert(rule_id.to_string(), self.occurrences.len());
                self.occurrences
                    .push(RuleOccurrence::new(rule_id, message, range));
            }
        }
    }

    fn into_occurrences(self) -> Vec<RuleOccurrence> {
        self.occurrences
    }
}

/// Groups the issues of one file into category → rule → ranges.
///
/// Issues whose type is not in `allowed` (or is not a known category at all)
/// are dropped without error.
pub fn group(issues: &[RawIssue], allowed: &CategorySet) -> Measures {
    let mut lists: Vec<(Category, OccurrenceList)> = Vec::new();
    let mut positions: HashMap<Category, usize> = HashMap::new();
    let mut dropped = 0usize;

    for issue in issues {
        let category = match Category::parse(&issue.issue_type) {
            Some(category) if allowed.contains(category) => category,
            _ => {
                dropped += 1;
                continue;
            }
        };

        let idx = *positions.entry(category).or_insert_with(|| {
            lists.push((category, OccurrenceList::default()));
            lists.len() - 1
        });
        lists[idx]
            .1
            .record(&issue.rule, &issue.message, issue.text_range);
    }

    if dropped > 0 {
        debug!("Dropped {} issues outside the requested categories", dropped);
    }

    Measures::from_entries(
        lists
            .into_iter()
            .map(|(category, list)| (category, list.into_occurrences()))
            .collect(),
    )
}

/// Hotspots of a whole project, indexed by file key
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HotspotIndex {
    files: Vec<(String, Vec<RuleOccurrence>)>,
    positions: HashMap<String, usize>,
}

impl HotspotIndex {
    /// Occurrences reported for a file, `None` when the file has no hotspots.
    pub fn get(&self, file_key: &str) -> Option<&[RuleOccurrence]> {
        self.positions
            .get(file_key)
            .map(|&idx| self.files[idx].1.as_slice())
    }

    /// File keys in first-seen order.
    pub fn file_keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.files.iter().map(|(key, _)| key.as_str())
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Indexes project-wide hotspots per file, deduplicating rules within each file.
pub fn index(hotspots: &[RawHotspot]) -> HotspotIndex {
    let mut lists: Vec<(String, OccurrenceList)> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for hotspot in hotspots {
        let idx = match positions.get(&hotspot.component) {
            Some(&idx) => idx,
            None => {
                positions.insert(hotspot.component.clone(), lists.len());
                lists.push((hotspot.component.clone(), OccurrenceList::default()));
                lists.len() - 1
            }
        };
        lists[idx]
            .1
            .record(&hotspot.rule_key, &hotspot.message, hotspot.text_range);
    }

    HotspotIndex {
        files: lists
            .into_iter()
            .map(|(key, list)| (key, list.into_occurrences()))
            .collect(),
        positions,
    }
}

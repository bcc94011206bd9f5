//! Data model for the harvested dataset and the raw records the service returns

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Location span of a finding inside a source file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextRange {
    pub start_line: u32,
    pub end_line: u32,
    pub start_offset: u32,
    pub end_offset: u32,
}

/// Every location where one rule fired inside a single scope
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleOccurrence {
    #[serde(rename = "ruleID")]
    pub rule_id: String,
    pub message: String,
    #[serde(rename = "textRanges")]
    pub text_ranges: Vec<TextRange>,
}

impl RuleOccurrence {
    /// Starts an occurrence from the first matching record.
    pub fn new(rule_id: &str, message: &str, range: Option<TextRange>) -> Self {
        Self {
            rule_id: rule_id.to_string(),
            message: message.to_string(),
            text_ranges: range.into_iter().collect(),
        }
    }
}

/// Coarse classification of a finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    Bug,
    Vulnerability,
    CodeSmell,
    SecurityHotspot,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Bug,
        Category::Vulnerability,
        Category::CodeSmell,
        Category::SecurityHotspot,
    ];

    /// Upper-case singular name, as the service spells issue types.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Bug => "BUG",
            Category::Vulnerability => "VULNERABILITY",
            Category::CodeSmell => "CODE_SMELL",
            Category::SecurityHotspot => "SECURITY_HOTSPOT",
        }
    }

    /// Lower-case plural name, as the service spells metric keys.
    pub fn metric_key(&self) -> &'static str {
        match self {
            Category::Bug => "bugs",
            Category::Vulnerability => "vulnerabilities",
            Category::CodeSmell => "code_smells",
            Category::SecurityHotspot => "security_hotspots",
        }
    }

    /// Parses an issue type or a metric key, ignoring case and plurals.
    pub fn parse(value: &str) -> Option<Self> {
        let normalized = value.trim().to_ascii_uppercase();
        let singular = if let Some(stem) = normalized.strip_suffix("IES") {
            format!("{}Y", stem)
        } else if let Some(stem) = normalized.strip_suffix('S') {
            stem.to_string()
        } else {
            normalized
        };

        Category::ALL
            .into_iter()
            .find(|category| category.as_str() == singular)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::parse(s).ok_or_else(|| format!("Invalid category: {}", s))
    }
}

impl Serialize for Category {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Category {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        value.parse().map_err(serde::de::Error::custom)
    }
}

/// Ordered, duplicate-free set of requested categories
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategorySet {
    categories: Vec<Category>,
}

impl CategorySet {
    pub fn all() -> Self {
        Category::ALL.into_iter().collect()
    }

    /// Parses a comma separated metric key list such as `bugs,code_smells`.
    pub fn from_metric_keys(keys: &str) -> crate::Result<Self> {
        let mut set = CategorySet::default();
        for key in keys.split(',').map(str::trim).filter(|k| !k.is_empty()) {
            let category = Category::parse(key).ok_or_else(|| {
                crate::HarvestError::Config(format!("Unknown metric key: {}", key))
            })?;
            set.insert(category);
        }
        Ok(set)
    }

    pub fn insert(&mut self, category: Category) {
        if !self.contains(category) {
            self.categories.push(category);
        }
    }

    pub fn contains(&self, category: Category) -> bool {
        self.categories.contains(&category)
    }

    /// Same set without the given category.
    pub fn without(&self, category: Category) -> Self {
        self.iter().filter(|c| *c != category).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = Category> + '_ {
        self.categories.iter().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// Metric key list understood by the component tree endpoint.
    pub fn to_metric_keys(&self) -> String {
        self.iter()
            .map(|c| c.metric_key())
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl FromIterator<Category> for CategorySet {
    fn from_iter<I: IntoIterator<Item = Category>>(iter: I) -> Self {
        let mut set = CategorySet::default();
        for category in iter {
            set.insert(category);
        }
        set
    }
}

/// Grouped findings of one file, keyed by category in insertion order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Measures {
    entries: Vec<(Category, Vec<RuleOccurrence>)>,
}

impl Measures {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, category: Category) -> Option<&[RuleOccurrence]> {
        self.entries
            .iter()
            .find(|(c, _)| *c == category)
            .map(|(_, occurrences)| occurrences.as_slice())
    }

    /// Sets the occurrences of a category, replacing any previous list in place.
    pub fn insert(&mut self, category: Category, occurrences: Vec<RuleOccurrence>) {
        match self.entries.iter_mut().find(|(c, _)| *c == category) {
            Some((_, existing)) => *existing = occurrences,
            None => self.entries.push((category, occurrences)),
        }
    }

    pub(crate) fn from_entries(entries: Vec<(Category, Vec<RuleOccurrence>)>) -> Self {
        Self { entries }
    }

    pub fn categories(&self) -> impl Iterator<Item = Category> + '_ {
        self.entries.iter().map(|(c, _)| *c)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Category, &[RuleOccurrence])> + '_ {
        self.entries
            .iter()
            .map(|(c, occurrences)| (*c, occurrences.as_slice()))
    }

    /// Sum of the occurrence list lengths across every category.
    pub fn occurrence_count(&self) -> usize {
        self.entries.iter().map(|(_, o)| o.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

impl Serialize for Measures {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (category, occurrences) in &self.entries {
            map.serialize_entry(category, occurrences)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Measures {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct MeasuresVisitor;

        impl<'de> Visitor<'de> for MeasuresVisitor {
            type Value = Measures;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of categories to rule occurrences")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Measures, A::Error> {
                let mut measures = Measures::new();
                while let Some((category, occurrences)) =
                    access.next_entry::<Category, Vec<RuleOccurrence>>()?
                {
                    measures.insert(category, occurrences);
                }
                Ok(measures)
            }
        }

        deserializer.deserialize_map(MeasuresVisitor)
    }
}

/// One harvested source file with its grouped findings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    pub id: u64,
    pub name: String,
    pub source_code: String,
    pub language: String,
    pub measures: Measures,
}

/// File records of a single project, in component tree order
pub type ProjectDataset = Vec<FileRecord>;

/// Final dataset written to disk
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dataset {
    pub data: Vec<FileRecord>,
}

impl Dataset {
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Outcome of provisioning a single project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectRegistration {
    pub id: usize,
    pub project_key: String,
    pub project_name: String,
    pub token: Option<String>,
    pub message: String,
}

impl ProjectRegistration {
    pub const SUCCESS: &'static str = "Success";
    pub const FAILURE: &'static str = "Failure";

    pub fn is_success(&self) -> bool {
        self.message == Self::SUCCESS
    }
}

/// Registry of provisioned projects shared between `provision` and `harvest`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectRegistry {
    pub data: Vec<ProjectRegistration>,
}

/// Paging block attached to every list response
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paging {
    pub page_index: u32,
    pub page_size: u32,
    pub total: u32,
}

/// Issue record as returned by `api/issues/search`
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawIssue {
    #[serde(rename = "type")]
    pub issue_type: String,
    pub rule: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub component: String,
    pub text_range: Option<TextRange>,
}

/// Hotspot record as returned by `api/hotspots/search`
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawHotspot {
    pub component: String,
    pub rule_key: String,
    #[serde(default)]
    pub message: String,
    pub text_range: Option<TextRange>,
}

/// Node of the component tree returned by `api/measures/component_tree`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ComponentEntry {
    pub key: String,
    pub name: String,
    pub qualifier: String,
    pub language: Option<String>,
    pub path: Option<String>,
}

impl ComponentEntry {
    pub const FILE_QUALIFIER: &'static str = "FIL";

    pub fn is_file(&self) -> bool {
        self.qualifier == Self::FILE_QUALIFIER
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(line: u32) -> TextRange {
        TextRange {
            start_line: line,
            end_line: line,
            start_offset: 0,
            end_offset: 10,
        }
    }

    #[test]
    fn test_category_parse_is_case_and_plural_insensitive() {
        assert_eq!(Category::parse("BUG"), Some(Category::Bug));
        assert_eq!(Category::parse("bugs"), Some(Category::Bug));
        assert_eq!(Category::parse("Bugs"), Some(Category::Bug));
        assert_eq!(
            Category::parse("vulnerabilities"),
            Some(Category::Vulnerability)
        );
        assert_eq!(Category::parse("VULNERABILITY"), Some(Category::Vulnerability));
        assert_eq!(Category::parse("code_smells"), Some(Category::CodeSmell));
        assert_eq!(Category::parse("CODE_SMELL"), Some(Category::CodeSmell));
        assert_eq!(
            Category::parse("security_hotspots"),
            Some(Category::SecurityHotspot)
        );
        assert_eq!(Category::parse("coverage"), None);
        assert_eq!(Category::parse(""), None);
    }

    #[test]
    fn test_category_serializes_as_issue_type() {
        let json = serde_json::to_string(&Category::CodeSmell).unwrap();
        assert_eq!(json, "\"CODE_SMELL\"");
        let parsed: Category = serde_json::from_str("\"SECURITY_HOTSPOT\"").unwrap();
        assert_eq!(parsed, Category::SecurityHotspot);
    }

    #[test]
    fn test_category_set_from_metric_keys() {
        let set =
            CategorySet::from_metric_keys("bugs, vulnerabilities,security_hotspots,bugs").unwrap();
        assert_eq!(
            set.iter().collect::<Vec<_>>(),
            vec![
                Category::Bug,
                Category::Vulnerability,
                Category::SecurityHotspot
            ]
        );
        assert_eq!(
            set.to_metric_keys(),
            "bugs,vulnerabilities,security_hotspots"
        );
        assert!(!set.without(Category::SecurityHotspot).contains(Category::SecurityHotspot));
    }

    #[test]
    fn test_category_set_rejects_unknown_key() {
        let result = CategorySet::from_metric_keys("bugs,ncloc");
        assert!(matches!(result, Err(crate::HarvestError::Config(_))));
    }

    #[test]
    fn test_measures_keep_insertion_order() {
        let mut measures = Measures::new();
        measures.insert(Category::CodeSmell, vec![RuleOccurrence::new("S1", "m", None)]);
        measures.insert(Category::Bug, vec![]);

        let json = serde_json::to_string(&measures).unwrap();
        assert!(json.find("CODE_SMELL").unwrap() < json.find("BUG").unwrap());

        let back: Measures = serde_json::from_str(&json).unwrap();
        assert_eq!(back, measures);
    }

    #[test]
    fn test_measures_insert_replaces_in_place() {
        let mut measures = Measures::new();
        measures.insert(Category::Bug, vec![]);
        measures.insert(Category::CodeSmell, vec![]);
        measures.insert(Category::Bug, vec![RuleOccurrence::new("S2", "m", None)]);

        assert_eq!(
            measures.categories().collect::<Vec<_>>(),
            vec![Category::Bug, Category::CodeSmell]
        );
        assert_eq!(measures.occurrence_count(), 1);
    }

    #[test]
    fn test_file_record_json_shape() {
        let mut measures = Measures::new();
        measures.insert(
            Category::Bug,
            vec![RuleOccurrence::new("python:S1", "Fix this", Some(range(3)))],
        );
        let record = FileRecord {
            id: 7,
            name: "main.py".to_string(),
            source_code: "print()".to_string(),
            language: "py".to_string(),
            measures,
        };

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["sourceCode"], "print()");
        assert_eq!(value["measures"]["BUG"][0]["ruleID"], "python:S1");
        assert_eq!(value["measures"]["BUG"][0]["textRanges"][0]["startLine"], 3);
    }

    #[test]
    fn test_raw_issue_without_text_range() {
        let issue: RawIssue = serde_json::from_str(
            r#"{"type":"CODE_SMELL","rule":"java:S1451","message":"Add a header","component":"p:A.java"}"#,
        )
        .unwrap();
        assert!(issue.text_range.is_none());
        assert_eq!(issue.issue_type, "CODE_SMELL");
    }

    #[test]
    fn test_component_entry_is_file() {
        let entry: ComponentEntry = serde_json::from_str(
            r#"{"key":"p:src","name":"src","qualifier":"DIR","path":"src"}"#,
        )
        .unwrap();
        assert!(!entry.is_file());
        assert!(entry.language.is_none());
    }
}

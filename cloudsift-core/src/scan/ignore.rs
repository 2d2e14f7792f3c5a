use std::collections::{BTreeMap, HashSet};

/// Resources excluded from every report.
///
/// Ids match exactly, names case-insensitively, and a tag rule matches when
/// the resource carries the tag with the same value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IgnoreRules {
    resource_ids: HashSet<String>,
    resource_names: HashSet<String>,
    tags: BTreeMap<String, String>,
}

impl IgnoreRules {
    pub fn new(
        resource_ids: impl IntoIterator<Item = String>,
        resource_names: impl IntoIterator<Item = String>,
        tags: BTreeMap<String, String>,
    ) -> Self {
        Self {
            resource_ids: resource_ids.into_iter().collect(),
            resource_names: resource_names
                .into_iter()
                .map(|name| name.to_lowercase())
                .collect(),
            tags,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.resource_ids.is_empty() && self.resource_names.is_empty() && self.tags.is_empty()
    }

    pub fn matches(&self, id: &str, name: &str, tags: &BTreeMap<String, String>) -> bool {
        self.resource_ids.contains(id)
            || (!name.is_empty() && self.resource_names.contains(&name.to_lowercase()))
            || self
                .tags
                .iter()
                .any(|(key, value)| tags.get(key) == Some(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules() -> IgnoreRules {
        IgnoreRules::new(
            ["vol-keep".to_string()],
            ["Build-Cache".to_string()],
            BTreeMap::from([("cloudsift:ignore".to_string(), "true".to_string())]),
        )
    }

    #[test]
    fn ids_names_and_tags_match() {
        let rules = rules();
        let none = BTreeMap::new();
        assert!(rules.matches("vol-keep", "", &none));
        assert!(rules.matches("vol-1", "build-cache", &none));

        let tagged = BTreeMap::from([("cloudsift:ignore".to_string(), "true".to_string())]);
        assert!(rules.matches("vol-2", "scratch", &tagged));
    }

    #[test]
    fn tag_value_must_match() {
        let tagged = BTreeMap::from([("cloudsift:ignore".to_string(), "false".to_string())]);
        assert!(!rules().matches("vol-3", "scratch", &tagged));
        assert!(IgnoreRules::default().is_empty());
    }
}

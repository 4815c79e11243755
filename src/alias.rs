use std::collections::{HashMap, HashSet};

/// Key of the alias table consulted when a group has no entry for a name.
pub const GLOBAL_ALIAS_KEY: &str = "global";

/// Trims surrounding whitespace and lower-cases.
pub fn normalize(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Maps raw commit author names to the name they are reported under.
///
/// Lookup goes group table, then global table, then falls back to the
/// normalized raw name itself.
#[derive(Debug, Clone, Default)]
pub struct AliasTable {
    groups: HashMap<String, HashMap<String, String>>,
    global: HashMap<String, String>,
}

impl AliasTable {
    pub fn new(
        groups: HashMap<String, HashMap<String, String>>,
        global: HashMap<String, String>,
    ) -> Self {
        Self {
            groups: groups
                .into_iter()
                .map(|(group, table)| (group, normalize_keys(table)))
                .collect(),
            global: normalize_keys(global),
        }
    }

    /// Builds a table from the configuration shape, where the global table is
    /// stored under [`GLOBAL_ALIAS_KEY`] next to the group tables.
    pub fn from_mapping(mut mapping: HashMap<String, HashMap<String, String>>) -> Self {
        let global = mapping.remove(GLOBAL_ALIAS_KEY).unwrap_or_default();
        Self::new(mapping, global)
    }

    pub fn resolve(&self, raw: &str, group: &str) -> String {
        let name = normalize(raw);
        self.groups
            .get(group)
            .and_then(|table| table.get(&name))
            .or_else(|| self.global.get(&name))
            .cloned()
            .unwrap_or(name)
    }
}

fn normalize_keys(table: HashMap<String, String>) -> HashMap<String, String> {
    table.into_iter().map(|(k, v)| (normalize(&k), v)).collect()
}

/// Raw author names whose commits are ignored, matched case-insensitively.
#[derive(Debug, Clone, Default)]
pub struct ExcludedAuthors(HashSet<String>);

impl ExcludedAuthors {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self(names.into_iter().map(|n| normalize(n.as_ref())).collect())
    }

    pub fn contains(&self, raw: &str) -> bool {
        self.0.contains(&normalize(raw))
    }
}

//! Header normalization for truncated CSV exports

use super::{RawColumn, RawTable};
use tracing::debug;

/// Known truncated headers and their canonical names
const DEFAULT_ALIASES: [(&str, &str); 6] = [
    ("Relative H", "Relative Humidity"),
    ("Solar Zenit", "Solar Zenith"),
    ("Surface All", "Surface Albedo"),
    ("Clearsky D", "Clearsky DHI"),
    ("Clearsky G", "Clearsky GHI"),
    ("Clearsky D 2", "Clearsky DNI"),
];

/// Renames columns whose header exactly matches a known alias
#[derive(Debug, Clone)]
pub struct HeaderNormalizer {
    aliases: Vec<(String, String)>,
}

impl Default for HeaderNormalizer {
    fn default() -> Self {
        Self {
            aliases: DEFAULT_ALIASES
                .iter()
                .map(|(alias, canonical)| (alias.to_string(), canonical.to_string()))
                .collect(),
        }
    }
}

impl HeaderNormalizer {
    /// Add or override an alias
    pub fn with_alias(mut self, alias: impl Into<String>, canonical: impl Into<String>) -> Self {
        let alias = alias.into();
        let canonical = canonical.into();
        match self.aliases.iter_mut().find(|(a, _)| *a == alias) {
            Some(entry) => entry.1 = canonical,
            None => self.aliases.push((alias, canonical)),
        }
        self
    }

    /// Canonical name for a header, if it is a known alias
    pub fn canonical(&self, header: &str) -> Option<&str> {
        self.aliases
            .iter()
            .find(|(alias, _)| alias == header)
            .map(|(_, canonical)| canonical.as_str())
    }

    /// The renames that `normalize` would apply to these headers
    pub fn renames<'a>(&self, headers: impl IntoIterator<Item = &'a str>) -> Vec<(String, String)> {
        headers
            .into_iter()
            .filter_map(|h| self.canonical(h).map(|c| (h.to_string(), c.to_string())))
            .collect()
    }

    /// Rename aliased columns; everything else passes through unchanged
    pub fn normalize(&self, table: RawTable) -> RawTable {
        let n_rows = table.n_rows();
        let columns: Vec<RawColumn> = table
            .into_columns()
            .into_iter()
            .map(|mut column| {
                if let Some(canonical) = self.canonical(&column.name) {
                    debug!(from = %column.name, to = %canonical, "Renaming column");
                    column.name = canonical.to_string();
                }
                column
            })
            .collect();

        // Renaming never changes column lengths, so the shape check cannot fail.
        RawTable { columns, n_rows }
    }
}

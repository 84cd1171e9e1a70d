use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::domain::{ProcedureCode, ReferenceValues};

/// Reference-table row for one procedure code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceEntry {
    #[serde(default)]
    pub description: Option<String>,
    pub values: ReferenceValues,
    #[serde(default)]
    pub registration_instrument: Option<String>,
}

/// Lookup of base unit values by procedure code; `None` means not found.
pub trait ReferenceResolver: Send + Sync {
    fn lookup(&self, code: &ProcedureCode) -> Option<ReferenceEntry>;
}

/// In-memory reference table keyed by canonical procedure code.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceTable {
    entries: HashMap<ProcedureCode, ReferenceEntry>,
}

impl ReferenceTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts an entry, returning the one it replaced.
    pub fn insert(&mut self, code: &str, entry: ReferenceEntry) -> Option<ReferenceEntry> {
        self.entries.insert(ProcedureCode::normalize_lossy(code), entry)
    }

    pub fn get(&self, code: &str) -> Option<&ReferenceEntry> {
        self.entries.get(&ProcedureCode::normalize_lossy(code))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ReferenceResolver for ReferenceTable {
    fn lookup(&self, code: &ProcedureCode) -> Option<ReferenceEntry> {
        self.entries.get(code).cloned()
    }
}

impl FromIterator<(String, ReferenceEntry)> for ReferenceTable {
    fn from_iter<I: IntoIterator<Item = (String, ReferenceEntry)>>(iter: I) -> Self {
        let mut table = Self::new();
        for (code, entry) in iter {
            table.insert(&code, entry);
        }
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pricing::domain::Cents;

    #[test]
    fn lookups_use_canonical_codes() {
        let entry = ReferenceEntry {
            description: Some("ARTROPLASTIA".to_string()),
            values: ReferenceValues {
                value_amb: Cents::ZERO,
                value_hosp: Cents(150_000),
                value_prof: Cents(45_000),
            },
            registration_instrument: None,
        };
        let table: ReferenceTable = vec![("0408010055".to_string(), entry.clone())]
            .into_iter()
            .collect();

        assert_eq!(table.len(), 1);
        assert_eq!(table.get("04.08.01.005-5"), Some(&entry));
        assert_eq!(
            table.lookup(&ProcedureCode::normalize_lossy("04.08.01.005-5 - ARTROPLASTIA")),
            Some(entry)
        );
        assert!(table
            .lookup(&ProcedureCode::normalize_lossy("03.01.01.007-2"))
            .is_none());
    }
}

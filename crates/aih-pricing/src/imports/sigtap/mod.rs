mod parser;

use crate::imports::ImportError;
use crate::pricing::ReferenceTable;
use std::io::Read;
use std::path::Path;
use tracing::{info, warn};

/// Loads SIGTAP reference values exported as CSV.
pub struct SigtapTableImporter;

impl SigtapTableImporter {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<ReferenceTable, ImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    /// Later rows replace earlier rows declaring the same code.
    pub fn from_reader<R: Read>(reader: R) -> Result<ReferenceTable, ImportError> {
        let mut table = ReferenceTable::new();

        for record in parser::parse_records(reader)? {
            if table.insert(&record.code, record.entry).is_some() {
                warn!(code = %record.code, "reference table declares code twice; keeping last row");
            }
        }

        info!(entries = table.len(), "reference table loaded");
        Ok(table)
    }
}

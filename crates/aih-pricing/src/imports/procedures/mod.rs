mod parser;

use crate::imports::ImportError;
use crate::pricing::Admission;
use std::io::Read;
use std::path::Path;
use tracing::debug;

/// Reads the procedure lines of a single admission from CSV.
pub struct ProcedureImporter;

impl ProcedureImporter {
    pub fn from_path<P: AsRef<Path>>(
        path: P,
        principal_code: Option<String>,
    ) -> Result<Admission, ImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file, principal_code)
    }

    pub fn from_reader<R: Read>(
        reader: R,
        principal_code: Option<String>,
    ) -> Result<Admission, ImportError> {
        let procedures = parser::parse_records(reader)?;
        debug!(procedures = procedures.len(), "procedure lines imported");

        Ok(Admission {
            aih_number: None,
            principal_code,
            procedures,
        })
    }
}

use crate::imports::normalizer::{empty_string_as_none, parse_money};
use crate::imports::ImportError;
use crate::pricing::{Cents, ReferenceEntry, ReferenceValues};
use serde::Deserialize;
use std::io::Read;

#[derive(Debug)]
pub(crate) struct SigtapRecord {
    pub(crate) code: String,
    pub(crate) entry: ReferenceEntry,
}

pub(crate) fn parse_records<R: Read>(reader: R) -> Result<Vec<SigtapRecord>, ImportError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);
    let headers = csv_reader.headers()?.clone();
    let mut raw = csv::StringRecord::new();
    let mut records = Vec::new();

    while csv_reader.read_record(&mut raw)? {
        let line = raw.position().map_or(0, |position| position.line());
        let row: SigtapRow = raw.deserialize(Some(&headers))?;
        let Some(code) = row.code else {
            continue;
        };

        let values = ReferenceValues {
            value_amb: money(line, "value_amb", row.value_amb.as_deref())?,
            value_hosp: money(line, "value_hosp", row.value_hosp.as_deref())?,
            value_prof: money(line, "value_prof", row.value_prof.as_deref())?,
        };

        records.push(SigtapRecord {
            code,
            entry: ReferenceEntry {
                description: row.description,
                values,
                registration_instrument: row.registration_instrument,
            },
        });
    }

    Ok(records)
}

/// Blank money cells count as zero.
fn money(line: u64, column: &'static str, raw: Option<&str>) -> Result<Cents, ImportError> {
    match raw {
        None => Ok(Cents::ZERO),
        Some(value) => parse_money(value).map_err(|source| ImportError::Money {
            line,
            column,
            source,
        }),
    }
}

#[derive(Debug, Deserialize)]
struct SigtapRow {
    #[serde(default, deserialize_with = "empty_string_as_none")]
    code: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    description: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    value_amb: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    value_hosp: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    value_prof: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    registration_instrument: Option<String>,
}

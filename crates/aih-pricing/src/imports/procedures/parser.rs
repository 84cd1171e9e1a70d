use crate::imports::normalizer::{empty_string_as_none, parse_flag, parse_money};
use crate::imports::ImportError;
use crate::pricing::{validate_quantity, ProcedureRecord, ReferenceValues};
use serde::Deserialize;
use std::io::Read;

pub(crate) fn parse_records<R: Read>(reader: R) -> Result<Vec<ProcedureRecord>, ImportError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);
    let headers = csv_reader.headers()?.clone();
    let mut raw = csv::StringRecord::new();
    let mut records = Vec::new();

    while csv_reader.read_record(&mut raw)? {
        let line = raw.position().map_or(0, |position| position.line());
        let row: ProcedureRow = raw.deserialize(Some(&headers))?;
        let Some(code) = row.code.clone() else {
            continue;
        };
        records.push(row.into_record(line, code)?);
    }

    Ok(records)
}

#[derive(Debug, Deserialize)]
struct ProcedureRow {
    #[serde(default, deserialize_with = "empty_string_as_none")]
    sequence: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    code: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    description: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    cbo: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    participation: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    quantity: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    rejected: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    approved: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    registration_instrument: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    value_amb: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    value_hosp: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    value_prof: Option<String>,
}

impl ProcedureRow {
    fn into_record(self, line: u64, code: String) -> Result<ProcedureRecord, ImportError> {
        let sequence = match self.sequence.as_deref() {
            Some(raw) => parse_number(line, "sequence", raw)?,
            None => return Err(ImportError::Sequence { line }),
        };
        if sequence == 0 {
            return Err(ImportError::Sequence { line });
        }

        let quantity = match self.quantity.as_deref() {
            Some(raw) => parse_number(line, "quantity", raw)?,
            None => 1,
        };
        let quantity =
            validate_quantity(quantity).map_err(|source| ImportError::Quantity { line, source })?;

        let mut record = ProcedureRecord::new(code, sequence);
        record.description = self.description;
        record.professional_cbo = self.cbo.unwrap_or_default();
        record.participation_code = self.participation.unwrap_or_default();
        record.quantity = quantity;
        record.registration_instrument = self.registration_instrument;
        record.rejected = self.rejected.as_deref().and_then(parse_flag).unwrap_or(false);
        record.approved = self.approved.as_deref().and_then(parse_flag).unwrap_or(true);
        record.reference_values = inline_values(
            line,
            self.value_amb.as_deref(),
            self.value_hosp.as_deref(),
            self.value_prof.as_deref(),
        )?;

        Ok(record)
    }
}

/// Reference values given directly on the row; absent when every column is blank.
fn inline_values(
    line: u64,
    value_amb: Option<&str>,
    value_hosp: Option<&str>,
    value_prof: Option<&str>,
) -> Result<Option<ReferenceValues>, ImportError> {
    if value_amb.is_none() && value_hosp.is_none() && value_prof.is_none() {
        return Ok(None);
    }

    let money = |column: &'static str, raw: Option<&str>| match raw {
        None => Ok(Default::default()),
        Some(value) => parse_money(value).map_err(|source| ImportError::Money {
            line,
            column,
            source,
        }),
    };

    Ok(Some(ReferenceValues {
        value_amb: money("value_amb", value_amb)?,
        value_hosp: money("value_hosp", value_hosp)?,
        value_prof: money("value_prof", value_prof)?,
    }))
}

fn parse_number(line: u64, column: &'static str, raw: &str) -> Result<u32, ImportError> {
    raw.trim().parse().map_err(|_| ImportError::Number {
        line,
        column,
        value: raw.to_string(),
    })
}

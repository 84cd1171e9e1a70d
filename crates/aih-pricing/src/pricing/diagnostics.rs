use serde::{Deserialize, Serialize};

use super::domain::Cents;

/// Data-quality finding raised while pricing an admission.
///
/// Diagnostics never stop the pipeline; they are surfaced for operator review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PricingDiagnostic {
    PrincipalFallback {
        sequence: u32,
        code: String,
    },
    DuplicateSequence {
        sequence: u32,
        occurrences: usize,
    },
    QuantityClamped {
        sequence: u32,
        requested: u32,
        applied: u32,
    },
    UnparseableProcedureCode {
        sequence: u32,
        code: String,
    },
    UnknownParticipationCode {
        sequence: u32,
        participation_code: String,
    },
    MalformedCbo {
        sequence: u32,
        cbo: String,
    },
    MissingReference {
        sequence: u32,
        code: String,
    },
    HospitalValueBelowProfessional {
        sequence: u32,
        code: String,
        value_hosp: Cents,
        value_prof: Cents,
    },
    PositionBeyondRuleLimit {
        sequence: u32,
        code: String,
        position: u32,
        limit: u32,
    },
}

impl PricingDiagnostic {
    pub fn summary(&self) -> String {
        match self {
            Self::PrincipalFallback { sequence, code } => format!(
                "no procedure declared with sequence 1; using sequence {sequence} ({code}) as principal"
            ),
            Self::DuplicateSequence {
                sequence,
                occurrences,
            } => format!(
                "sequence {sequence} declared {occurrences} times; ties follow declaration order"
            ),
            Self::QuantityClamped {
                sequence,
                requested,
                applied,
            } => format!(
                "sequence {sequence}: quantity {requested} outside 1..=99, priced with {applied}"
            ),
            Self::UnparseableProcedureCode { sequence, code } => {
                format!("sequence {sequence}: '{code}' is not a SIGTAP procedure code")
            }
            Self::UnknownParticipationCode {
                sequence,
                participation_code,
            } => format!(
                "sequence {sequence}: unknown participation code '{participation_code}'"
            ),
            Self::MalformedCbo { sequence, cbo } => {
                format!("sequence {sequence}: '{cbo}' is not a six-digit CBO code")
            }
            Self::MissingReference { sequence, code } => {
                format!("sequence {sequence}: no reference values for {code}, priced at zero")
            }
            Self::HospitalValueBelowProfessional {
                sequence,
                code,
                value_hosp,
                value_prof,
            } => format!(
                "sequence {sequence}: hospital value {value_hosp} below professional value {value_prof} for {code}"
            ),
            Self::PositionBeyondRuleLimit {
                sequence,
                code,
                position,
                limit,
            } => format!(
                "sequence {sequence}: {code} at position {position} exceeds the rule maximum of {limit}"
            ),
        }
    }
}

use serde::{Deserialize, Serialize};

use super::domain::{ProcedureCategory, ProcedureCode, ProcedureRecord};
use super::rules::{AnesthetistMarkers, RuleSet};

/// Assigns the billing category of one procedure line.
///
/// Precedence is Anesthetist, then Instrument 04, then the admission-wide
/// special rule, then Normal.
pub fn classify(
    record: &ProcedureRecord,
    special_rule_active: bool,
    rules: &RuleSet,
) -> ProcedureCategory {
    if is_anesthetist(record, &rules.anesthetist) {
        return ProcedureCategory::Anesthetist;
    }

    if record
        .registration_instrument
        .as_deref()
        .is_some_and(|tag| rules.is_instrument04(tag))
    {
        return ProcedureCategory::Instrument04;
    }

    if special_rule_active {
        return ProcedureCategory::SpecialRule;
    }

    ProcedureCategory::Normal
}

pub fn is_anesthetist(record: &ProcedureRecord, markers: &AnesthetistMarkers) -> bool {
    markers.matches_cbo(&record.professional_cbo)
        || markers.matches_participation(&record.participation_code)
        || markers.matches_text(&record.participation_code)
        || markers.matches_text(&record.code)
}

/// Manual-control marker shown next to anesthetist lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnesthetistControl {
    /// Clinical group 03 procedure: the anesthetist line carries a value.
    Billable03,
    /// Surgical group 04 procedure: controlled by quantity only.
    QuantityOnly04,
    Unrecognized,
}

impl AnesthetistControl {
    pub fn for_code(code: &ProcedureCode) -> Self {
        match code.group() {
            Some("03") => Self::Billable03,
            Some("04") => Self::QuantityOnly04,
            _ => Self::Unrecognized,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Billable03 => "Anesthesia 03 - value calculated",
            Self::QuantityOnly04 => "Anesthesia 04 - no monetary value, quantity control",
            Self::Unrecognized => "Anesthesia - code not recognized, no value",
        }
    }
}

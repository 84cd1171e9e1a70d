use crate::pricing::{
    Admission, Cents, PricingEngine, ProcedureRecord, ReferenceValues, RuleSet,
};

pub(super) const MULTIPLE_SURGERY: &str = "04.15.01.001-2";
pub(super) const ARTHROPLASTY: &str = "04.08.01.005-5";
pub(super) const OSTEOSYNTHESIS: &str = "04.08.05.016-2";
pub(super) const TENDON_REPAIR: &str = "04.08.06.031-1";
pub(super) const CONSULTATION: &str = "03.01.01.007-2";
pub(super) const GENERAL_ANESTHESIA: &str = "04.17.01.001-0";
pub(super) const INSTRUMENT_04_TAG: &str = "04 - AIH (Proc. Especial)";

pub(super) fn engine() -> PricingEngine {
    PricingEngine::new(RuleSet::standard())
}

pub(super) fn values(value_hosp: i64, value_prof: i64, value_amb: i64) -> ReferenceValues {
    ReferenceValues {
        value_amb: Cents(value_amb),
        value_hosp: Cents(value_hosp),
        value_prof: Cents(value_prof),
    }
}

/// Surgeon line with reference values attached.
pub(super) fn procedure(
    code: &str,
    sequence: u32,
    value_hosp: i64,
    value_prof: i64,
) -> ProcedureRecord {
    let mut record = ProcedureRecord::new(code, sequence);
    record.description = Some("PROCEDIMENTO CIRURGICO".to_string());
    record.professional_cbo = "225125".to_string();
    record.participation_code = "01".to_string();
    record.reference_values = Some(values(value_hosp, value_prof, 0));
    record
}

pub(super) fn anesthetist(code: &str, sequence: u32, value_hosp: i64) -> ProcedureRecord {
    let mut record = procedure(code, sequence, value_hosp, 0);
    record.professional_cbo = "225151".to_string();
    record.participation_code = "04".to_string();
    record
}

pub(super) fn instrument04(
    code: &str,
    sequence: u32,
    value_hosp: i64,
    value_prof: i64,
) -> ProcedureRecord {
    let mut record = procedure(code, sequence, value_hosp, value_prof);
    record.registration_instrument = Some(INSTRUMENT_04_TAG.to_string());
    record
}

pub(super) fn admission(principal: Option<&str>, procedures: Vec<ProcedureRecord>) -> Admission {
    Admission {
        aih_number: Some("3525100012345".to_string()),
        principal_code: principal.map(str::to_string),
        procedures,
    }
}

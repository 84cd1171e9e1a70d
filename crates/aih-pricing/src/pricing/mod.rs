//! Classification and pricing of the procedure lines of one AIH.
//!
//! The pipeline runs classify -> resolve rule -> resolve position -> price ->
//! aggregate over an in-memory procedure list. It performs no I/O and keeps no
//! state between invocations, so admissions can be priced in parallel.

mod aggregate;
mod calculator;
mod classifier;
mod diagnostics;
pub mod domain;
mod position;
mod reference;
mod rules;

#[cfg(test)]
mod tests;

pub use aggregate::{aggregate, AdmissionAggregate};
pub use calculator::{
    hospital_percentage, price, PricedProcedure, UnitValues, PROFESSIONAL_PERCENTAGE,
};
pub use classifier::{classify, is_anesthetist, AnesthetistControl};
pub use diagnostics::PricingDiagnostic;
pub use domain::{
    clamp_quantity, is_well_formed_cbo, validate_quantity, Admission, Cents, ParticipationRole,
    ProcedureCategory, ProcedureCode, ProcedureRecord, QuantityError, ReferenceValues,
    MAX_QUANTITY,
};
pub use position::{resolve_position, resolve_positions, Classified};
pub use reference::{ReferenceEntry, ReferenceResolver, ReferenceTable};
pub use rules::{
    AnesthetistMarkers, NormalSchedule, RuleKind, RuleSet, RuleSetError, SpecialRuleDefinition,
};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Stateless engine applying a rule set to admissions.
#[derive(Debug, Clone, Default)]
pub struct PricingEngine {
    rules: RuleSet,
}

impl PricingEngine {
    pub fn new(rules: RuleSet) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Fills missing reference values from `resolver`, then prices the admission.
    pub fn price_with_resolver<R>(&self, admission: &Admission, resolver: &R) -> AdmissionPricing
    where
        R: ReferenceResolver + ?Sized,
    {
        let hydrated = hydrate_references(admission, resolver);
        self.price_admission(&hydrated)
    }

    /// Prices every procedure line using the reference values already on the records.
    pub fn price_admission(&self, admission: &Admission) -> AdmissionPricing {
        let aih = admission.aih_number.as_deref().unwrap_or("-");
        let mut diagnostics = Vec::new();

        diagnostics.extend(duplicate_sequences(&admission.procedures));

        let principal = resolve_principal(admission);
        if let Some(PrincipalResolution {
            fallback: Some(diagnostic),
            ..
        }) = &principal
        {
            diagnostics.push(diagnostic.clone());
        }
        let principal_code = principal.map(|resolution| resolution.code);
        let rule = principal_code
            .as_deref()
            .and_then(|code| self.rules.resolve_rule(code));

        let records: Vec<ProcedureRecord> = admission
            .procedures
            .iter()
            .map(|record| sanitize_record(record, &mut diagnostics))
            .collect();

        let classified: Vec<Classified<'_>> = records
            .iter()
            .map(|record| {
                let category = classify(record, rule.is_some(), &self.rules);
                debug!(
                    aih,
                    sequence = record.sequence,
                    code = %record.code,
                    category = category.label(),
                    "procedure classified"
                );
                Classified { record, category }
            })
            .collect();

        let positions = resolve_positions(&classified);

        let procedures: Vec<PricedProcedure> = classified
            .iter()
            .zip(&positions)
            .map(|(line, position)| {
                let rule = match line.category {
                    ProcedureCategory::SpecialRule => rule,
                    _ => None,
                };
                if let (Some(rule), Some(position)) = (rule, *position) {
                    if rule.exceeds_limit(position) {
                        diagnostics.push(PricingDiagnostic::PositionBeyondRuleLimit {
                            sequence: line.record.sequence,
                            code: line.record.canonical_code().as_str().to_string(),
                            position,
                            limit: rule.max_applicable_positions,
                        });
                    }
                }
                price(line.record, line.category, *position, rule, &self.rules)
            })
            .collect();

        let aggregate = aggregate(&procedures);

        for diagnostic in &diagnostics {
            warn!(aih, diagnostic = %diagnostic.summary(), "pricing diagnostic");
        }
        info!(
            aih,
            procedures = procedures.len(),
            special_rule = rule.map(|rule| rule.name.as_str()).unwrap_or("none"),
            total_payable = %aggregate.total_payable,
            "admission priced"
        );

        AdmissionPricing {
            aih_number: admission.aih_number.clone(),
            principal_code,
            special_rule: rule.cloned(),
            procedures,
            aggregate,
            diagnostics,
        }
    }
}

/// Result of pricing one admission: lines in input order plus the aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdmissionPricing {
    pub aih_number: Option<String>,
    pub principal_code: Option<String>,
    pub special_rule: Option<SpecialRuleDefinition>,
    pub procedures: Vec<PricedProcedure>,
    pub aggregate: AdmissionAggregate,
    pub diagnostics: Vec<PricingDiagnostic>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QuantityEditError {
    #[error("no procedure line at index {0}")]
    UnknownLine(usize),
    #[error(transparent)]
    Quantity(#[from] QuantityError),
}

impl AdmissionPricing {
    /// Applies a validated quantity edit to one line and refreshes the aggregate.
    pub fn update_quantity(
        &mut self,
        index: usize,
        quantity: u32,
    ) -> Result<&PricedProcedure, QuantityEditError> {
        let quantity = validate_quantity(quantity)?;
        let line = self
            .procedures
            .get_mut(index)
            .ok_or(QuantityEditError::UnknownLine(index))?;
        *line = line.with_quantity(quantity);
        self.aggregate = aggregate(&self.procedures);
        Ok(&self.procedures[index])
    }

    /// Anesthetist lines tracked on the manual control list.
    pub fn anesthetist_controls(&self) -> impl Iterator<Item = &PricedProcedure> {
        self.procedures
            .iter()
            .filter(|line| line.category == ProcedureCategory::Anesthetist)
    }

    pub fn count_by_category(&self, category: ProcedureCategory) -> usize {
        self.procedures
            .iter()
            .filter(|line| line.category == category)
            .count()
    }
}

/// Copies the admission, filling absent reference data from the resolver.
pub fn hydrate_references<R>(admission: &Admission, resolver: &R) -> Admission
where
    R: ReferenceResolver + ?Sized,
{
    let procedures = admission
        .procedures
        .iter()
        .map(|record| {
            let mut record = record.clone();
            let incomplete = record.reference_values.is_none()
                || record.registration_instrument.is_none()
                || record.description.is_none();
            if !incomplete {
                return record;
            }
            if let Some(entry) = resolver.lookup(&record.canonical_code()) {
                record.reference_values.get_or_insert(entry.values);
                if record.registration_instrument.is_none() {
                    record.registration_instrument = entry.registration_instrument;
                }
                if record.description.is_none() {
                    record.description = entry.description;
                }
            }
            record
        })
        .collect();

    Admission {
        aih_number: admission.aih_number.clone(),
        principal_code: admission.principal_code.clone(),
        procedures,
    }
}

struct PrincipalResolution {
    code: String,
    fallback: Option<PricingDiagnostic>,
}

/// Declared principal code, else the `sequence == 1` line, else the lowest sequence.
fn resolve_principal(admission: &Admission) -> Option<PrincipalResolution> {
    if let Some(code) = admission
        .principal_code
        .as_deref()
        .map(str::trim)
        .filter(|code| !code.is_empty())
    {
        return Some(PrincipalResolution {
            code: ProcedureCode::normalize_lossy(code).as_str().to_string(),
            fallback: None,
        });
    }

    if let Some(first) = admission
        .procedures
        .iter()
        .find(|record| record.sequence == 1)
    {
        return Some(PrincipalResolution {
            code: first.canonical_code().as_str().to_string(),
            fallback: None,
        });
    }

    let earliest = admission
        .procedures
        .iter()
        .min_by_key(|record| record.sequence)?;
    let code = earliest.canonical_code().as_str().to_string();
    Some(PrincipalResolution {
        fallback: Some(PricingDiagnostic::PrincipalFallback {
            sequence: earliest.sequence,
            code: code.clone(),
        }),
        code,
    })
}

fn duplicate_sequences(records: &[ProcedureRecord]) -> Vec<PricingDiagnostic> {
    let mut counts: BTreeMap<u32, usize> = BTreeMap::new();
    for record in records {
        *counts.entry(record.sequence).or_default() += 1;
    }

    counts
        .into_iter()
        .filter(|(_, occurrences)| *occurrences > 1)
        .map(|(sequence, occurrences)| PricingDiagnostic::DuplicateSequence {
            sequence,
            occurrences,
        })
        .collect()
}

/// Clamps the quantity and records data-quality findings for one line.
fn sanitize_record(
    record: &ProcedureRecord,
    diagnostics: &mut Vec<PricingDiagnostic>,
) -> ProcedureRecord {
    let mut sanitized = record.clone();
    let sequence = record.sequence;

    let applied = clamp_quantity(record.quantity);
    if applied != record.quantity {
        diagnostics.push(PricingDiagnostic::QuantityClamped {
            sequence,
            requested: record.quantity,
            applied,
        });
        sanitized.quantity = applied;
    }

    if ProcedureCode::parse(&record.code).is_err() {
        diagnostics.push(PricingDiagnostic::UnparseableProcedureCode {
            sequence,
            code: record.code.clone(),
        });
    }

    if !record.participation_code.trim().is_empty() && record.participation_role().is_none() {
        diagnostics.push(PricingDiagnostic::UnknownParticipationCode {
            sequence,
            participation_code: record.participation_code.clone(),
        });
    }

    let cbo = record.professional_cbo.trim();
    if !cbo.is_empty() && !is_well_formed_cbo(cbo) {
        diagnostics.push(PricingDiagnostic::MalformedCbo {
            sequence,
            cbo: record.professional_cbo.clone(),
        });
    }

    let code = record.canonical_code().as_str().to_string();
    match &record.reference_values {
        None => diagnostics.push(PricingDiagnostic::MissingReference { sequence, code }),
        Some(values) if values.hospital_below_professional() => {
            diagnostics.push(PricingDiagnostic::HospitalValueBelowProfessional {
                sequence,
                code,
                value_hosp: values.value_hosp,
                value_prof: values.value_prof,
            })
        }
        Some(_) => {}
    }

    sanitized
}

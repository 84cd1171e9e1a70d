use serde::{Deserialize, Serialize};

use super::calculator::PricedProcedure;
use super::domain::{Cents, ProcedureCategory};

/// Admission-level totals over the priced procedure lines.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdmissionAggregate {
    pub total_payable: Cents,
    pub hospital_total: Cents,
    pub professional_total: Cents,
    /// Informative SA sum over the payable lines, never part of `total_payable`.
    pub ambulatory_informative: Cents,
    pub approved_count: usize,
    pub rejected_count: usize,
    pub anesthetist_count: usize,
    pub unpriced_count: usize,
}

/// Sums non-rejected, non-anesthetist lines.
///
/// Anesthetist lines only feed `anesthetist_count`; approval counters cover the
/// remaining lines using the caller supplied flags.
pub fn aggregate(priced: &[PricedProcedure]) -> AdmissionAggregate {
    let mut totals = AdmissionAggregate::default();

    for line in priced {
        if line.category == ProcedureCategory::Anesthetist {
            totals.anesthetist_count += 1;
            continue;
        }

        if line.unpriced {
            totals.unpriced_count += 1;
        }

        if line.rejected {
            totals.rejected_count += 1;
            continue;
        }

        if line.approved {
            totals.approved_count += 1;
        }

        totals.total_payable += line.total_value;
        totals.hospital_total += line.value_sh;
        totals.professional_total += line.value_sp;
        totals.ambulatory_informative += line.value_sa;
    }

    totals
}

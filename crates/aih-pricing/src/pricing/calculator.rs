use serde::{Deserialize, Serialize};

use super::classifier::AnesthetistControl;
use super::domain::{clamp_quantity, Cents, ProcedureCategory, ProcedureRecord};
use super::rules::{RuleSet, SpecialRuleDefinition};

/// Professional services are never discounted.
pub const PROFESSIONAL_PERCENTAGE: u8 = 100;

/// Quantity-independent values kept so quantity edits never re-run classification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitValues {
    pub sh: Cents,
    pub sp: Cents,
    pub sa: Cents,
}

/// Priced output for one input procedure line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricedProcedure {
    pub sequence: u32,
    pub code: String,
    pub category: ProcedureCategory,
    pub position: Option<u32>,
    pub applied_hospital_percentage: u8,
    pub applied_professional_percentage: u8,
    pub quantity: u32,
    pub unit: UnitValues,
    pub value_sh: Cents,
    pub value_sp: Cents,
    /// Ambulatory component, informative only and never part of `total_value`.
    pub value_sa: Cents,
    pub total_value: Cents,
    pub rule_applied: String,
    pub unpriced: bool,
    pub rejected: bool,
    pub approved: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anesthetist_control: Option<AnesthetistControl>,
}

impl PricedProcedure {
    /// Re-prices the line for a new quantity from the stored unit values.
    pub fn with_quantity(&self, quantity: u32) -> Self {
        let quantity = clamp_quantity(quantity);
        let mut repriced = self.clone();
        repriced.quantity = quantity;
        repriced.value_sh = self.unit.sh.times(quantity);
        repriced.value_sp = self.unit.sp.times(quantity);
        repriced.value_sa = self.unit.sa.times(quantity);
        repriced.total_value = repriced.value_sh + repriced.value_sp;
        repriced
    }

    /// Whether the line counts towards the admission payable total.
    pub fn is_payable(&self) -> bool {
        self.category != ProcedureCategory::Anesthetist && !self.rejected
    }
}

/// Hospital percentage for a category and position, with the audit label that produced it.
pub fn hospital_percentage(
    record: &ProcedureRecord,
    category: ProcedureCategory,
    position: Option<u32>,
    rule: Option<&SpecialRuleDefinition>,
    rules: &RuleSet,
) -> (u8, String) {
    match category {
        ProcedureCategory::Anesthetist => (
            100,
            "Anesthetist - manual control, excluded from total".to_string(),
        ),
        ProcedureCategory::Instrument04 => (
            100,
            "Instrument 04 - AIH (special procedure), always 100%".to_string(),
        ),
        ProcedureCategory::SpecialRule => {
            let position = position.unwrap_or(1);
            match rule {
                Some(rule) => {
                    let percentage = rule.percentage_for(position);
                    (
                        percentage,
                        format!(
                            "{} (position {position}: {percentage}%)",
                            rule.label()
                        ),
                    )
                }
                None => normal_percentage(record, position, rules),
            }
        }
        ProcedureCategory::Normal => normal_percentage(record, position.unwrap_or(1), rules),
    }
}

fn normal_percentage(record: &ProcedureRecord, position: u32, rules: &RuleSet) -> (u8, String) {
    if rules.is_always_full(&record.canonical_code()) {
        return (
            100,
            format!("Always 100% override (position {position} among normal procedures)"),
        );
    }

    let percentage = rules.normal_schedule.percentage_for(position);
    (
        percentage,
        format!("Default rule: {percentage}% (position {position} among normal procedures)"),
    )
}

/// Prices one procedure line.
///
/// The SH base is the reference hospital total minus the professional value;
/// the percentage applies to that base only and SP is added back at 100%.
pub fn price(
    record: &ProcedureRecord,
    category: ProcedureCategory,
    position: Option<u32>,
    rule: Option<&SpecialRuleDefinition>,
    rules: &RuleSet,
) -> PricedProcedure {
    let code = record.canonical_code();
    let (applied_hospital_percentage, rule_applied) =
        hospital_percentage(record, category, position, rule, rules);

    let unit = match &record.reference_values {
        Some(values) => UnitValues {
            sh: values.hospital_base().percent(applied_hospital_percentage),
            sp: values.value_prof.percent(PROFESSIONAL_PERCENTAGE),
            sa: values.value_amb,
        },
        None => UnitValues::default(),
    };

    let anesthetist_control = match category {
        ProcedureCategory::Anesthetist => Some(AnesthetistControl::for_code(&code)),
        _ => None,
    };

    let template = PricedProcedure {
        sequence: record.sequence,
        code: code.as_str().to_string(),
        category,
        position,
        applied_hospital_percentage,
        applied_professional_percentage: PROFESSIONAL_PERCENTAGE,
        quantity: 1,
        unit,
        value_sh: unit.sh,
        value_sp: unit.sp,
        value_sa: unit.sa,
        total_value: unit.sh + unit.sp,
        rule_applied,
        unpriced: record.reference_values.is_none(),
        rejected: record.rejected,
        approved: record.approved,
        anesthetist_control,
    };

    template.with_quantity(record.quantity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pricing::domain::ReferenceValues;

    fn priced_record(value_hosp: i64, value_prof: i64, value_amb: i64) -> ProcedureRecord {
        let mut record = ProcedureRecord::new("04.08.01.005-5", 1);
        record.reference_values = Some(ReferenceValues {
            value_amb: Cents(value_amb),
            value_hosp: Cents(value_hosp),
            value_prof: Cents(value_prof),
        });
        record
    }

    #[test]
    fn professional_share_is_removed_before_discount_and_added_back_in_full() {
        let rules = RuleSet::standard();
        let record = priced_record(100_000, 30_000, 5_000);

        let priced = price(&record, ProcedureCategory::Normal, Some(2), None, &rules);

        assert_eq!(priced.applied_hospital_percentage, 70);
        assert_eq!(priced.value_sh, Cents(49_000));
        assert_eq!(priced.value_sp, Cents(30_000));
        assert_eq!(priced.value_sa, Cents(5_000));
        assert_eq!(priced.total_value, Cents(79_000));
    }

    #[test]
    fn full_percentage_reproduces_reference_hospital_total() {
        let rules = RuleSet::standard();
        let record = priced_record(100_000, 30_000, 5_000);

        let priced = price(&record, ProcedureCategory::Instrument04, None, None, &rules);

        assert_eq!(priced.value_sh + priced.value_sp, Cents(100_000));
        assert_eq!(priced.total_value, Cents(100_000));
    }

    #[test]
    fn hospital_value_below_professional_floors_sh_at_zero() {
        let rules = RuleSet::standard();
        let record = priced_record(10_000, 25_000, 0);

        let priced = price(&record, ProcedureCategory::Normal, Some(1), None, &rules);

        assert_eq!(priced.value_sh, Cents::ZERO);
        assert_eq!(priced.value_sp, Cents(25_000));
    }

    #[test]
    fn special_rule_uses_schedule_and_labels_the_rule() {
        let rules = RuleSet::standard();
        let rule = rules.resolve_rule("04.15.01.001-2");
        let record = priced_record(20_000, 0, 0);

        let priced = price(&record, ProcedureCategory::SpecialRule, Some(4), rule, &rules);

        assert_eq!(priced.applied_hospital_percentage, 60);
        assert_eq!(priced.value_sh, Cents(12_000));
        assert!(priced.rule_applied.starts_with("multiple_surgery"));
    }

    #[test]
    fn always_full_override_ignores_position() {
        let mut rules = RuleSet::standard();
        rules.always_full_codes.push("04.08.01.005-5".to_string());
        let record = priced_record(10_000, 0, 0);

        let priced = price(&record, ProcedureCategory::Normal, Some(2), None, &rules);

        assert_eq!(priced.applied_hospital_percentage, 100);
        assert!(priced.rule_applied.starts_with("Always 100%"));
    }

    #[test]
    fn missing_reference_prices_at_zero_and_flags_unpriced() {
        let rules = RuleSet::standard();
        let record = ProcedureRecord::new("04.08.01.005-5", 1);

        let priced = price(&record, ProcedureCategory::Normal, Some(1), None, &rules);

        assert!(priced.unpriced);
        assert_eq!(priced.total_value, Cents::ZERO);
        assert_eq!(priced.applied_hospital_percentage, 100);
    }

    #[test]
    fn quantity_edit_reuses_unit_values() {
        let rules = RuleSet::standard();
        let mut record = priced_record(100_001, 30_000, 1_000);
        record.quantity = 3;

        let priced = price(&record, ProcedureCategory::Normal, Some(2), None, &rules);
        assert_eq!(priced.unit.sh, Cents(49_001));
        assert_eq!(priced.value_sh, Cents(147_003));

        let edited = priced.with_quantity(5);
        assert_eq!(edited.value_sh, Cents(245_005));
        assert_eq!(edited.value_sp, Cents(150_000));
        assert_eq!(edited.value_sa, Cents(5_000));
        assert_eq!(edited.applied_hospital_percentage, 70);
    }

    #[test]
    fn anesthetist_lines_are_valued_for_display_with_control_marker() {
        let rules = RuleSet::standard();
        let mut record = priced_record(30_000, 10_000, 0);
        record.code = "03.01.01.007-2".to_string();

        let priced = price(&record, ProcedureCategory::Anesthetist, None, None, &rules);

        assert_eq!(priced.total_value, Cents(30_000));
        assert_eq!(
            priced.anesthetist_control,
            Some(AnesthetistControl::Billable03)
        );
        assert!(!priced.is_payable());
    }
}

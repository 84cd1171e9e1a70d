use aih_pricing::pricing::{
    Admission, Cents, PricingEngine, ProcedureCategory, ProcedureRecord, ReferenceValues, RuleSet,
    MAX_QUANTITY,
};
use proptest::prelude::*;

const CODES: [&str; 5] = [
    "04.15.01.001-2",
    "04.15.02.003-4",
    "04.08.01.005-5",
    "04.08.06.031-1",
    "03.01.01.007-2",
];

fn record_strategy() -> impl Strategy<Value = ProcedureRecord> {
    (
        0..CODES.len(),
        1u32..8,
        0i64..500_000,
        0i64..200_000,
        0i64..50_000,
        1u32..=MAX_QUANTITY,
        prop_oneof![Just("01"), Just("02"), Just("04"), Just("")],
        any::<bool>(),
        any::<bool>(),
    )
        .prop_map(
            |(code, sequence, hosp, prof, amb, quantity, participation, instrument04, rejected)| {
                let mut record = ProcedureRecord::new(CODES[code], sequence);
                record.participation_code = participation.to_string();
                record.quantity = quantity;
                record.rejected = rejected;
                if instrument04 {
                    record.registration_instrument = Some("04 - AIH (Proc. Especial)".to_string());
                }
                record.reference_values = Some(ReferenceValues {
                    value_amb: Cents(amb),
                    value_hosp: Cents(hosp),
                    value_prof: Cents(prof),
                });
                record
            },
        )
}

fn admission_strategy() -> impl Strategy<Value = Admission> {
    prop::collection::vec(record_strategy(), 0..10).prop_map(|procedures| Admission {
        aih_number: None,
        principal_code: None,
        procedures,
    })
}

proptest! {
    #[test]
    fn professional_value_is_never_discounted(admission in admission_strategy()) {
        let pricing = PricingEngine::new(RuleSet::standard()).price_admission(&admission);

        for (line, record) in pricing.procedures.iter().zip(&admission.procedures) {
            let values = record.reference_values.expect("generated with values");
            prop_assert_eq!(line.applied_professional_percentage, 100);
            prop_assert_eq!(line.value_sp, values.value_prof.times(line.quantity));
        }
    }

    #[test]
    fn ambulatory_value_never_reaches_totals(admission in admission_strategy()) {
        let pricing = PricingEngine::new(RuleSet::standard()).price_admission(&admission);

        for line in &pricing.procedures {
            prop_assert_eq!(line.total_value, line.value_sh + line.value_sp);
        }
        let expected: Cents = pricing
            .procedures
            .iter()
            .filter(|line| line.is_payable())
            .map(|line| line.total_value)
            .sum();
        prop_assert_eq!(pricing.aggregate.total_payable, expected);
    }

    #[test]
    fn pricing_twice_gives_identical_output(admission in admission_strategy()) {
        let engine = PricingEngine::new(RuleSet::standard());
        prop_assert_eq!(engine.price_admission(&admission), engine.price_admission(&admission));
    }

    #[test]
    fn values_scale_linearly_with_quantity(
        admission in admission_strategy(),
        quantity in 1u32..=MAX_QUANTITY,
    ) {
        let pricing = PricingEngine::new(RuleSet::standard()).price_admission(&admission);

        for line in &pricing.procedures {
            let single = line.with_quantity(1);
            let scaled = line.with_quantity(quantity);
            prop_assert_eq!(scaled.value_sh, single.value_sh.times(quantity));
            prop_assert_eq!(scaled.value_sp, single.value_sp.times(quantity));
            prop_assert_eq!(scaled.value_sa, single.value_sa.times(quantity));
            prop_assert_eq!(scaled.total_value, single.total_value.times(quantity));
        }
    }

    #[test]
    fn categories_follow_precedence_and_positions(admission in admission_strategy()) {
        let pricing = PricingEngine::new(RuleSet::standard()).price_admission(&admission);

        for (line, record) in pricing.procedures.iter().zip(&admission.procedures) {
            if record.participation_code == "04" {
                prop_assert_eq!(line.category, ProcedureCategory::Anesthetist);
            } else if record.registration_instrument.is_some() {
                prop_assert_eq!(line.category, ProcedureCategory::Instrument04);
            }
            prop_assert_eq!(line.position.is_some(), line.category.is_positional());
            prop_assert!(line.applied_hospital_percentage <= 100);
        }

        for category in ProcedureCategory::ordered() {
            if !category.is_positional() {
                continue;
            }
            let mut positions: Vec<u32> = pricing
                .procedures
                .iter()
                .filter(|line| line.category == category)
                .filter_map(|line| line.position)
                .collect();
            positions.sort_unstable();
            let expected: Vec<u32> = (1..=positions.len() as u32).collect();
            prop_assert_eq!(positions, expected);
        }
    }
}

use aih_pricing::imports::{ProcedureImporter, SigtapTableImporter};
use aih_pricing::pricing::{
    AnesthetistControl, Cents, PricingEngine, ProcedureCategory, RuleKind, RuleSet,
};

fn reference_table() -> aih_pricing::pricing::ReferenceTable {
    let data = include_bytes!("../fixtures/sigtap_reference.csv");
    SigtapTableImporter::from_reader(&data[..]).expect("reference table imports")
}

#[test]
fn csv_admission_is_priced_against_reference_table() {
    let data = include_bytes!("../fixtures/admission_multiple_surgery.csv");
    let admission = ProcedureImporter::from_reader(&data[..], None).expect("admission imports");
    let engine = PricingEngine::new(RuleSet::standard());

    let pricing = engine.price_with_resolver(&admission, &reference_table());

    let rule = pricing.special_rule.as_ref().expect("multiple surgery rule");
    assert_eq!(rule.kind, RuleKind::MultipleSurgery);

    let categories: Vec<_> = pricing.procedures.iter().map(|line| line.category).collect();
    assert_eq!(
        categories,
        vec![
            ProcedureCategory::SpecialRule,
            ProcedureCategory::SpecialRule,
            ProcedureCategory::SpecialRule,
            ProcedureCategory::Instrument04,
            ProcedureCategory::Anesthetist,
        ]
    );

    let arthroplasty = &pricing.procedures[1];
    assert_eq!(arthroplasty.position, Some(2));
    assert_eq!(arthroplasty.value_sh, Cents(100_359));
    assert_eq!(arthroplasty.value_sp, Cents(51_230));

    let osteosynthesis = &pricing.procedures[2];
    assert_eq!(osteosynthesis.quantity, 2);
    assert_eq!(osteosynthesis.total_value, Cents(195_000));

    let tendon = &pricing.procedures[3];
    assert_eq!(tendon.position, None);
    assert_eq!(tendon.total_value, Cents(64_015));

    let anesthesia = &pricing.procedures[4];
    assert_eq!(
        anesthesia.anesthetist_control,
        Some(AnesthetistControl::QuantityOnly04)
    );

    assert_eq!(pricing.aggregate.total_payable, Cents(410_604));
    assert_eq!(pricing.aggregate.approved_count, 4);
    assert_eq!(pricing.aggregate.anesthetist_count, 1);
    assert_eq!(pricing.aggregate.unpriced_count, 0);
    assert!(pricing.diagnostics.is_empty());
}

#[test]
fn rules_loaded_from_json_drive_the_engine() {
    let data = include_bytes!("../fixtures/rules_orthopedic.json");
    let rules = RuleSet::from_reader(&data[..]).expect("rule set loads");
    assert_eq!(rules.special_rules.len(), 1);
    assert_eq!(rules.always_full_codes, vec!["03.01.01.007-2".to_string()]);

    let csv = "sequence,code,value_hosp,value_prof\n\
1,04.15.02.006-9,0,0\n\
2,04.08.05.016-2,\"1.200,00\",\"300,00\"\n\
3,04.08.06.031-1,\"640,15\",\"210,00\"\n\
4,04.08.01.005-5,\"1.850,42\",\"512,30\"\n";
    let admission = ProcedureImporter::from_reader(csv.as_bytes(), None).expect("imports");

    let pricing = PricingEngine::new(rules).price_admission(&admission);

    let percentages: Vec<_> = pricing
        .procedures
        .iter()
        .map(|line| line.applied_hospital_percentage)
        .collect();
    assert_eq!(percentages, vec![100, 75, 50, 50]);
    assert_eq!(pricing.procedures[2].value_sh, Cents(21_508));
    assert_eq!(pricing.procedures[3].value_sh, Cents(66_906));
}

#[test]
fn unknown_codes_are_reported_and_priced_at_zero() {
    let csv = "sequence,code\n1,04.08.01.005-5\n2,04.99.99.999-9\n";
    let admission = ProcedureImporter::from_reader(csv.as_bytes(), None).expect("imports");
    let engine = PricingEngine::default();

    let pricing = engine.price_with_resolver(&admission, &reference_table());

    assert!(!pricing.procedures[0].unpriced);
    assert!(pricing.procedures[1].unpriced);
    assert_eq!(pricing.aggregate.unpriced_count, 1);
    assert_eq!(
        pricing.aggregate.total_payable,
        pricing.procedures[0].total_value
    );
    assert_eq!(pricing.diagnostics.len(), 1);
}

use aih_pricing::config::AppConfig;
use aih_pricing::error::AppError;
use aih_pricing::imports::{ProcedureImporter, SigtapTableImporter};
use aih_pricing::pricing::{
    AdmissionPricing, PricedProcedure, PricingEngine, ProcedureCategory, ReferenceTable, RuleSet,
};
use clap::{Args, ValueEnum};
use std::fmt::{self, Write as _};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Args, Debug)]
pub(crate) struct PriceArgs {
    /// CSV file with the procedure lines of one admission
    #[arg(long)]
    pub(crate) procedures: PathBuf,
    /// SIGTAP reference CSV (defaults to AIH_REFERENCE_TABLE)
    #[arg(long)]
    pub(crate) references: Option<PathBuf>,
    /// JSON rule set (defaults to AIH_RULES_PATH, then the standard table)
    #[arg(long)]
    pub(crate) rules: Option<PathBuf>,
    /// Principal procedure code; defaults to the line with sequence 1
    #[arg(long)]
    pub(crate) principal: Option<String>,
    /// AIH number shown in the output
    #[arg(long)]
    pub(crate) aih: Option<String>,
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub(crate) format: OutputFormat,
}

#[derive(Args, Debug, Default)]
pub(crate) struct RulesArgs {
    /// JSON rule set to validate and print (defaults to AIH_RULES_PATH)
    #[arg(long)]
    pub(crate) rules: Option<PathBuf>,
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub(crate) format: OutputFormat,
}

pub(crate) fn run_price(args: PriceArgs) -> Result<(), AppError> {
    let PriceArgs {
        procedures,
        references,
        rules,
        principal,
        aih,
        format,
    } = args;

    let mut pricing_config = AppConfig::load()?.pricing;
    if rules.is_some() {
        pricing_config.rules_path = rules;
    }
    let rules = pricing_config.load_rules()?;
    let references = match references {
        Some(path) => SigtapTableImporter::from_path(path)?,
        None => pricing_config.load_reference_table()?,
    };

    let mut admission = ProcedureImporter::from_path(procedures, principal)?;
    admission.aih_number = aih;

    let pricing = PricingEngine::new(rules).price_with_resolver(&admission, &references);

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&pricing)?),
        OutputFormat::Text => print!("{}", render_pricing(&pricing, &references)),
    }
    Ok(())
}

pub(crate) fn run_rules(args: RulesArgs) -> Result<(), AppError> {
    let mut pricing_config = AppConfig::load()?.pricing;
    if args.rules.is_some() {
        pricing_config.rules_path = args.rules;
    }
    let rules = pricing_config.load_rules()?;

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&rules)?),
        OutputFormat::Text => print!("{}", render_rules(&rules)),
    }
    Ok(())
}

pub(crate) fn render_pricing(pricing: &AdmissionPricing, references: &ReferenceTable) -> String {
    let mut out = String::new();
    let _ = write_pricing(&mut out, pricing, references);
    out
}

fn write_pricing(
    out: &mut String,
    pricing: &AdmissionPricing,
    references: &ReferenceTable,
) -> fmt::Result {
    writeln!(
        out,
        "AIH {}",
        pricing.aih_number.as_deref().unwrap_or("(no number)")
    )?;
    writeln!(
        out,
        "Principal procedure: {}",
        pricing.principal_code.as_deref().unwrap_or("(none)")
    )?;
    match &pricing.special_rule {
        Some(rule) => {
            writeln!(out, "Special rule: {}", rule.label())?;
        }
        None => {
            writeln!(out, "Special rule: none, default schedule applies")?;
        }
    }

    writeln!(out, "\nProcedures")?;
    for line in &pricing.procedures {
        writeln!(out, "{}", render_line(line, references))?;
    }

    let totals = &pricing.aggregate;
    writeln!(out, "\nTotals")?;
    writeln!(out, "- Payable: {}", totals.total_payable)?;
    writeln!(
        out,
        "- SH {} | SP {} | SA (informative) {}",
        totals.hospital_total, totals.professional_total, totals.ambulatory_informative
    )?;
    writeln!(
        out,
        "- {} approved | {} rejected | {} anesthetist | {} unpriced",
        totals.approved_count,
        totals.rejected_count,
        totals.anesthetist_count,
        totals.unpriced_count
    )?;

    let controls: Vec<&PricedProcedure> = pricing.anesthetist_controls().collect();
    if !controls.is_empty() {
        writeln!(out, "\nAnesthetist control list (excluded from totals)")?;
        for line in controls {
            let label = line
                .anesthetist_control
                .map(|control| control.label())
                .unwrap_or("Anesthesia");
            writeln!(
                out,
                "- seq {} {} x{}: {} ({})",
                line.sequence, line.code, line.quantity, label, line.total_value
            )?;
        }
    }

    if !pricing.diagnostics.is_empty() {
        writeln!(out, "\nDiagnostics")?;
        for diagnostic in &pricing.diagnostics {
            writeln!(out, "- {}", diagnostic.summary())?;
        }
    }

    Ok(())
}

fn render_line(line: &PricedProcedure, references: &ReferenceTable) -> String {
    let position = line
        .position
        .map(|position| format!("#{position}"))
        .unwrap_or_else(|| "-".to_string());
    let description = references
        .get(&line.code)
        .and_then(|entry| entry.description.as_deref())
        .unwrap_or("");

    let mut flags = Vec::new();
    if line.rejected {
        flags.push("rejected");
    }
    if line.unpriced {
        flags.push("unpriced");
    }
    if !line.approved {
        flags.push("pending approval");
    }
    if line.category == ProcedureCategory::Anesthetist {
        flags.push("not payable");
    }
    let flags = if flags.is_empty() {
        String::new()
    } else {
        format!(" [{}]", flags.join(", "))
    };

    format!(
        "- seq {:>2} {} {} | {} {} | SH {}% | x{} | SH {} + SP {} = {}{}\n    {}",
        line.sequence,
        line.code,
        description,
        line.category.label(),
        position,
        line.applied_hospital_percentage,
        line.quantity,
        line.value_sh,
        line.value_sp,
        line.total_value,
        flags,
        line.rule_applied
    )
}

pub(crate) fn render_rules(rules: &RuleSet) -> String {
    let mut out = String::new();
    let _ = write_rules(&mut out, rules);
    out
}

fn write_rules(out: &mut String, rules: &RuleSet) -> fmt::Result {
    writeln!(out, "Special rules (activated by the principal procedure)")?;
    for rule in &rules.special_rules {
        let schedule: Vec<String> = rule
            .hospital_percentage_schedule
            .iter()
            .map(|percentage| format!("{percentage}%"))
            .collect();
        writeln!(
            out,
            "- {} {}: SH {} (max {} positions)",
            rule.principal_code,
            rule.label(),
            schedule.join(" / "),
            rule.max_applicable_positions
        )?;
        if !rule.notes.is_empty() {
            writeln!(out, "    {}", rule.notes)?;
        }
    }

    writeln!(
        out,
        "Normal schedule: {}% principal, {}% others",
        rules.normal_schedule.principal_percentage, rules.normal_schedule.secondary_percentage
    )?;
    writeln!(
        out,
        "Always 100%: {}",
        if rules.always_full_codes.is_empty() {
            "(none)".to_string()
        } else {
            rules.always_full_codes.join(", ")
        }
    )?;
    writeln!(out, "Instrument 04 tags: {}", rules.instrument04_tags.join(", "))?;
    writeln!(
        out,
        "Anesthetist markers: CBO {} | participation {}",
        rules.anesthetist.cbo_codes.join(", "),
        rules.anesthetist.participation_codes.join(", ")
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use aih_pricing::pricing::{Admission, Cents, ProcedureRecord, ReferenceValues};

    fn priced() -> AdmissionPricing {
        let mut surgery = ProcedureRecord::new("04.08.01.005-5", 1);
        surgery.reference_values = Some(ReferenceValues {
            value_amb: Cents::ZERO,
            value_hosp: Cents(100_000),
            value_prof: Cents(20_000),
        });
        let mut anesthesia = ProcedureRecord::new("04.17.01.001-0", 2);
        anesthesia.professional_cbo = "225151".to_string();
        let admission = Admission {
            aih_number: Some("3525100012345".to_string()),
            principal_code: None,
            procedures: vec![surgery, anesthesia],
        };
        PricingEngine::default().price_admission(&admission)
    }

    #[test]
    fn text_report_lists_lines_totals_and_controls() {
        let text = render_pricing(&priced(), &ReferenceTable::new());

        assert!(text.contains("AIH 3525100012345"));
        assert!(text.contains("- Payable: R$ 1.000,00"));
        assert!(text.contains("Anesthetist control list"));
        assert!(text.contains("Anesthesia 04 - no monetary value, quantity control"));
        assert!(text.contains("no reference values for 04.17.01.001-0"));
    }

    #[test]
    fn rules_report_lists_standard_schedules() {
        let text = render_rules(&RuleSet::standard());

        assert!(text.contains("04.15.01.001-2 multiple_surgery - Cirurgias Multiplas"));
        assert!(text.contains("SH 100% / 75% / 50% (max 3 positions)"));
        assert!(text.contains("Always 100%: (none)"));
    }
}

use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::domain::{normalize_participation_code, ProcedureCode};

/// Family of multi-surgery schedule a rule belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    MultipleSurgery,
    SequentialGeneral,
    SequentialOrthopedic,
}

impl RuleKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::MultipleSurgery => "multiple_surgery",
            Self::SequentialGeneral => "sequential_general",
            Self::SequentialOrthopedic => "sequential_orthopedic",
        }
    }
}

/// Multi-surgery percentage schedule activated by an admission's principal procedure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecialRuleDefinition {
    pub principal_code: String,
    pub name: String,
    pub kind: RuleKind,
    pub hospital_percentage_schedule: Vec<u8>,
    pub max_applicable_positions: u32,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub revised_on: Option<NaiveDate>,
}

impl SpecialRuleDefinition {
    /// Hospital percentage for a 1-based position, repeating the last entry past the schedule.
    pub fn percentage_for(&self, position: u32) -> u8 {
        let index = position.saturating_sub(1) as usize;
        self.hospital_percentage_schedule
            .get(index)
            .or_else(|| self.hospital_percentage_schedule.last())
            .copied()
            .unwrap_or(100)
    }

    pub fn exceeds_limit(&self, position: u32) -> bool {
        position > self.max_applicable_positions
    }

    pub fn label(&self) -> String {
        format!("{} - {}", self.kind.label(), self.name)
    }
}

/// Hospital percentages for procedures without an admission-level special rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalSchedule {
    pub principal_percentage: u8,
    pub secondary_percentage: u8,
}

impl Default for NormalSchedule {
    fn default() -> Self {
        Self {
            principal_percentage: 100,
            secondary_percentage: 70,
        }
    }
}

impl NormalSchedule {
    pub fn percentage_for(&self, position: u32) -> u8 {
        if position <= 1 {
            self.principal_percentage
        } else {
            self.secondary_percentage
        }
    }
}

/// Signals marking a procedure line as an anesthetist line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnesthetistMarkers {
    pub cbo_codes: Vec<String>,
    pub participation_codes: Vec<String>,
    /// Lowercase fragments matched against the procedure code text and description.
    pub text_markers: Vec<String>,
}

impl Default for AnesthetistMarkers {
    fn default() -> Self {
        Self {
            cbo_codes: vec!["225151".to_string()],
            participation_codes: vec!["04".to_string()],
            text_markers: vec!["anestesi".to_string(), "anesthesi".to_string()],
        }
    }
}

impl AnesthetistMarkers {
    pub fn matches_cbo(&self, cbo: &str) -> bool {
        let cbo = cbo.trim();
        !cbo.is_empty() && self.cbo_codes.iter().any(|code| code == cbo)
    }

    pub fn matches_participation(&self, participation_code: &str) -> bool {
        normalize_participation_code(participation_code)
            .is_some_and(|code| self.participation_codes.contains(&code))
    }

    pub fn matches_text(&self, text: &str) -> bool {
        let lowered = text.to_lowercase();
        self.text_markers
            .iter()
            .any(|marker| !marker.is_empty() && lowered.contains(marker.as_str()))
    }
}

/// Complete rule configuration consumed by the pricing engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSet {
    pub special_rules: Vec<SpecialRuleDefinition>,
    #[serde(default)]
    pub always_full_codes: Vec<String>,
    #[serde(default = "standard_instrument04_tags")]
    pub instrument04_tags: Vec<String>,
    #[serde(default)]
    pub anesthetist: AnesthetistMarkers,
    #[serde(default)]
    pub normal_schedule: NormalSchedule,
}

fn standard_instrument04_tags() -> Vec<String> {
    [
        "04 - AIH (Proc. Especial)",
        "AIH (Proc. Especial)",
        "04 - AIH Proc. Especial",
        "Instrumento 04",
    ]
    .into_iter()
    .map(str::to_string)
    .collect()
}

#[derive(Debug, thiserror::Error)]
pub enum RuleSetError {
    #[error("failed to read rule set: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid rule set JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("rule for {code} has an empty hospital percentage schedule")]
    EmptySchedule { code: String },
    #[error("rule for {code} has percentage {percentage} outside 0..=100")]
    PercentageOutOfRange { code: String, percentage: u8 },
    #[error("rule for {code} must apply to at least one position")]
    NoApplicablePositions { code: String },
    #[error("principal code {code} is declared by more than one rule")]
    DuplicatePrincipal { code: String },
    #[error("normal schedule percentage {0} outside 0..=100")]
    NormalPercentageOutOfRange(u8),
}

impl RuleSet {
    /// Multi-surgery table published for SUS hospital billing.
    pub fn standard() -> Self {
        let revised_on = NaiveDate::from_ymd_opt(2024, 12, 30);
        Self {
            special_rules: vec![
                SpecialRuleDefinition {
                    principal_code: "04.15.01.001-2".to_string(),
                    name: "Cirurgias Multiplas".to_string(),
                    kind: RuleKind::MultipleSurgery,
                    hospital_percentage_schedule: vec![100, 75, 75, 60, 50],
                    max_applicable_positions: 5,
                    notes: "SH: 1st=100%, 2nd=75%, 3rd=75%, 4th=60%, 5th=50%. SP always 100%"
                        .to_string(),
                    revised_on,
                },
                SpecialRuleDefinition {
                    principal_code: "04.15.02.003-4".to_string(),
                    name: "Outros Procedimentos com Cirurgias Sequenciais".to_string(),
                    kind: RuleKind::SequentialGeneral,
                    hospital_percentage_schedule: vec![100, 75, 50],
                    max_applicable_positions: 3,
                    notes: "SH: 1st=100%, 2nd=75%, 3rd=50%. SP always 100%".to_string(),
                    revised_on,
                },
                SpecialRuleDefinition {
                    principal_code: "04.15.02.006-9".to_string(),
                    name: "Procedimentos Sequenciais em Ortopedia".to_string(),
                    kind: RuleKind::SequentialOrthopedic,
                    hospital_percentage_schedule: vec![100, 75, 50, 50, 50],
                    max_applicable_positions: 5,
                    notes: "SH: 1st=100%, 2nd=75%, 3rd to 5th=50%. SP always 100%".to_string(),
                    revised_on,
                },
            ],
            always_full_codes: Vec::new(),
            instrument04_tags: standard_instrument04_tags(),
            anesthetist: AnesthetistMarkers::default(),
            normal_schedule: NormalSchedule::default(),
        }
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, RuleSetError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    /// Reads a JSON rule set, canonicalising codes and validating schedules.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, RuleSetError> {
        let rules: RuleSet = serde_json::from_reader(reader)?;
        rules.normalized().validated()
    }

    fn normalized(mut self) -> Self {
        for rule in &mut self.special_rules {
            rule.principal_code = ProcedureCode::normalize_lossy(&rule.principal_code)
                .as_str()
                .to_string();
        }
        self.always_full_codes = self
            .always_full_codes
            .iter()
            .map(|code| ProcedureCode::normalize_lossy(code).as_str().to_string())
            .collect();
        self.anesthetist.text_markers = self
            .anesthetist
            .text_markers
            .iter()
            .map(|marker| marker.to_lowercase())
            .collect();
        self.anesthetist.participation_codes = self
            .anesthetist
            .participation_codes
            .iter()
            .map(|code| normalize_participation_code(code).unwrap_or_else(|| code.clone()))
            .collect();
        self
    }

    pub fn validated(self) -> Result<Self, RuleSetError> {
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), RuleSetError> {
        let mut seen = HashSet::new();
        for rule in &self.special_rules {
            let code = rule.principal_code.clone();
            if rule.hospital_percentage_schedule.is_empty() {
                return Err(RuleSetError::EmptySchedule { code });
            }
            if let Some(&percentage) = rule
                .hospital_percentage_schedule
                .iter()
                .find(|&&percentage| percentage > 100)
            {
                return Err(RuleSetError::PercentageOutOfRange { code, percentage });
            }
            if rule.max_applicable_positions == 0 {
                return Err(RuleSetError::NoApplicablePositions { code });
            }
            if !seen.insert(rule.principal_code.as_str()) {
                return Err(RuleSetError::DuplicatePrincipal { code });
            }
        }

        for percentage in [
            self.normal_schedule.principal_percentage,
            self.normal_schedule.secondary_percentage,
        ] {
            if percentage > 100 {
                return Err(RuleSetError::NormalPercentageOutOfRange(percentage));
            }
        }

        Ok(())
    }

    /// Exact match on the canonical principal code; first entry wins.
    pub fn resolve_rule(&self, principal_code: &str) -> Option<&SpecialRuleDefinition> {
        let code = ProcedureCode::normalize_lossy(principal_code);
        self.special_rules
            .iter()
            .find(|rule| rule.principal_code == code.as_str())
    }

    pub fn is_always_full(&self, code: &ProcedureCode) -> bool {
        self.always_full_codes
            .iter()
            .any(|candidate| candidate == code.as_str())
    }

    pub fn is_instrument04(&self, registration_instrument: &str) -> bool {
        let key = tag_key(registration_instrument);
        !key.is_empty() && self.instrument04_tags.iter().any(|tag| tag_key(tag) == key)
    }
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::standard()
    }
}

/// Case and whitespace insensitive comparison key for registration instrument tags.
fn tag_key(value: &str) -> String {
    value
        .chars()
        .filter(|ch| !ch.is_whitespace() && *ch != '\u{feff}')
        .flat_map(char::to_lowercase)
        .collect()
}

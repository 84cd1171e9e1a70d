use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign};

use serde::{Deserialize, Serialize};

/// Highest quantity a single AIH procedure line may declare.
pub const MAX_QUANTITY: u32 = 99;

/// Monetary amount in minor units (centavos).
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Cents(pub i64);

impl Cents {
    pub const ZERO: Cents = Cents(0);

    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    pub const fn value(self) -> i64 {
        self.0
    }

    pub fn times(self, quantity: u32) -> Self {
        Self(self.0.saturating_mul(i64::from(quantity)))
    }

    /// Applies an integer percentage, rounding half away from zero.
    pub fn percent(self, percentage: u8) -> Self {
        let scaled = i128::from(self.0) * i128::from(percentage);
        let rounded = if scaled >= 0 {
            (scaled + 50) / 100
        } else {
            (scaled - 50) / 100
        };
        let clamped = rounded.clamp(i128::from(i64::MIN), i128::from(i64::MAX));
        Self(i64::try_from(clamped).unwrap_or_default())
    }
}

impl Add for Cents {
    type Output = Cents;

    fn add(self, rhs: Self) -> Self::Output {
        Cents(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for Cents {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sum for Cents {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Cents::ZERO, Add::add)
    }
}

impl fmt::Display for Cents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let absolute = self.0.unsigned_abs();
        let units = absolute / 100;
        let minor = absolute % 100;

        let digits = units.to_string();
        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (index, ch) in digits.chars().enumerate() {
            if index > 0 && (digits.len() - index) % 3 == 0 {
                grouped.push('.');
            }
            grouped.push(ch);
        }

        write!(f, "{sign}R$ {grouped},{minor:02}")
    }
}

/// Canonical SIGTAP procedure code in the `NN.NN.NN.NNN-N` layout.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProcedureCode(String);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("'{raw}' is not a ten digit SIGTAP procedure code")]
pub struct InvalidProcedureCode {
    pub raw: String,
}

impl ProcedureCode {
    const DIGITS: usize = 10;

    /// Parses `0415010012`, `04.15.01.001-2`, or a code followed by its description.
    pub fn parse(raw: &str) -> Result<Self, InvalidProcedureCode> {
        let invalid = || InvalidProcedureCode {
            raw: raw.to_string(),
        };

        let mut digits = String::with_capacity(Self::DIGITS);
        let mut chars = raw.trim().chars().peekable();
        while digits.len() < Self::DIGITS {
            match chars.next() {
                Some(ch) if ch.is_ascii_digit() => digits.push(ch),
                Some('.') | Some('-') if !digits.is_empty() => {}
                _ => return Err(invalid()),
            }
        }

        if chars.peek().is_some_and(|ch| ch.is_ascii_digit()) {
            return Err(invalid());
        }

        Ok(Self(format!(
            "{}.{}.{}.{}-{}",
            &digits[0..2],
            &digits[2..4],
            &digits[4..6],
            &digits[6..9],
            &digits[9..10]
        )))
    }

    /// Canonical form when parseable, otherwise the trimmed input kept verbatim.
    pub fn normalize_lossy(raw: &str) -> Self {
        Self::parse(raw).unwrap_or_else(|_| Self(raw.trim().to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Two digit group prefix (`03` clinical, `04` surgical, ...).
    pub fn group(&self) -> Option<&str> {
        self.0
            .get(0..2)
            .filter(|prefix| prefix.chars().all(|ch| ch.is_ascii_digit()))
    }
}

impl fmt::Display for ProcedureCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Per-unit reference values as published in the SIGTAP table.
///
/// `value_hosp` is the combined hospital total, which already embeds the
/// professional component.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceValues {
    pub value_amb: Cents,
    pub value_hosp: Cents,
    pub value_prof: Cents,
}

impl ReferenceValues {
    /// Hospital service base with the professional share removed, floored at zero.
    pub fn hospital_base(&self) -> Cents {
        Cents(self.value_hosp.0.saturating_sub(self.value_prof.0).max(0))
    }

    pub fn hospital_below_professional(&self) -> bool {
        self.value_hosp < self.value_prof
    }
}

/// Professional role codes used on AIH procedure lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticipationRole {
    FirstSurgeon,
    SecondSurgeon,
    ThirdSurgeon,
    Anesthetist,
    FirstAssistant,
    SecondAssistant,
    ThirdAssistant,
    ScrubNurse,
    Perfusionist,
    Other,
}

impl ParticipationRole {
    pub const fn ordered() -> [Self; 10] {
        [
            Self::FirstSurgeon,
            Self::SecondSurgeon,
            Self::ThirdSurgeon,
            Self::Anesthetist,
            Self::FirstAssistant,
            Self::SecondAssistant,
            Self::ThirdAssistant,
            Self::ScrubNurse,
            Self::Perfusionist,
            Self::Other,
        ]
    }

    /// Resolves a participation code, accepting unpadded forms such as `"4"`.
    pub fn from_code(raw: &str) -> Option<Self> {
        let normalized = normalize_participation_code(raw)?;
        Self::ordered()
            .into_iter()
            .find(|role| role.code() == normalized)
    }

    pub const fn code(self) -> &'static str {
        match self {
            Self::FirstSurgeon => "01",
            Self::SecondSurgeon => "02",
            Self::ThirdSurgeon => "03",
            Self::Anesthetist => "04",
            Self::FirstAssistant => "05",
            Self::SecondAssistant => "06",
            Self::ThirdAssistant => "07",
            Self::ScrubNurse => "08",
            Self::Perfusionist => "09",
            Self::Other => "10",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::FirstSurgeon => "1st Surgeon",
            Self::SecondSurgeon => "2nd Surgeon",
            Self::ThirdSurgeon => "3rd Surgeon",
            Self::Anesthetist => "Anesthetist",
            Self::FirstAssistant => "1st Assistant",
            Self::SecondAssistant => "2nd Assistant",
            Self::ThirdAssistant => "3rd Assistant",
            Self::ScrubNurse => "Scrub Nurse",
            Self::Perfusionist => "Perfusionist",
            Self::Other => "Other Professionals",
        }
    }

    /// Whether the role is remunerated as a separate professional line.
    pub const fn requires_payment(self) -> bool {
        !matches!(self, Self::ThirdAssistant | Self::Other)
    }
}

/// Left pads single digit participation codes; `None` for blank or non-numeric input.
pub fn normalize_participation_code(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.len() > 2 || !trimmed.chars().all(|ch| ch.is_ascii_digit()) {
        return None;
    }
    Some(format!("{trimmed:0>2}"))
}

/// CBO occupation codes are six digits, optionally written as `2251-51`.
pub fn is_well_formed_cbo(raw: &str) -> bool {
    let digits: String = raw.trim().chars().filter(|ch| *ch != '-').collect();
    digits.len() == 6 && digits.chars().all(|ch| ch.is_ascii_digit())
}

/// One procedure line of an AIH as supplied by the upstream extraction step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcedureRecord {
    pub code: String,
    #[serde(default)]
    pub description: Option<String>,
    pub sequence: u32,
    #[serde(default)]
    pub professional_cbo: String,
    #[serde(default)]
    pub participation_code: String,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    #[serde(default)]
    pub registration_instrument: Option<String>,
    #[serde(default)]
    pub reference_values: Option<ReferenceValues>,
    #[serde(default)]
    pub rejected: bool,
    #[serde(default = "default_approved")]
    pub approved: bool,
}

fn default_quantity() -> u32 {
    1
}

fn default_approved() -> bool {
    true
}

impl ProcedureRecord {
    pub fn new(code: impl Into<String>, sequence: u32) -> Self {
        Self {
            code: code.into(),
            description: None,
            sequence,
            professional_cbo: String::new(),
            participation_code: String::new(),
            quantity: 1,
            registration_instrument: None,
            reference_values: None,
            rejected: false,
            approved: true,
        }
    }

    pub fn canonical_code(&self) -> ProcedureCode {
        ProcedureCode::normalize_lossy(&self.code)
    }

    pub fn participation_role(&self) -> Option<ParticipationRole> {
        ParticipationRole::from_code(&self.participation_code)
    }
}

/// Procedure list of a single AIH together with its declared principal procedure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Admission {
    #[serde(default)]
    pub aih_number: Option<String>,
    #[serde(default)]
    pub principal_code: Option<String>,
    pub procedures: Vec<ProcedureRecord>,
}

/// Billing category assigned to every procedure line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcedureCategory {
    Anesthetist,
    Instrument04,
    SpecialRule,
    Normal,
}

impl ProcedureCategory {
    /// Categories in precedence order.
    pub const fn ordered() -> [Self; 4] {
        [
            Self::Anesthetist,
            Self::Instrument04,
            Self::SpecialRule,
            Self::Normal,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Anesthetist => "Anesthetist",
            Self::Instrument04 => "Instrument 04",
            Self::SpecialRule => "Special Rule",
            Self::Normal => "Normal",
        }
    }

    /// Whether the category takes part in position ranking.
    pub const fn is_positional(self) -> bool {
        matches!(self, Self::SpecialRule | Self::Normal)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QuantityError {
    #[error("quantity must be at least 1")]
    Zero,
    #[error("quantity {0} exceeds the maximum of {MAX_QUANTITY}")]
    TooLarge(u32),
}

/// Boundary check for caller supplied quantities.
pub fn validate_quantity(quantity: u32) -> Result<u32, QuantityError> {
    match quantity {
        0 => Err(QuantityError::Zero),
        q if q > MAX_QUANTITY => Err(QuantityError::TooLarge(q)),
        q => Ok(q),
    }
}

/// Forces a quantity into `1..=MAX_QUANTITY`.
pub fn clamp_quantity(quantity: u32) -> u32 {
    quantity.clamp(1, MAX_QUANTITY)
}

use serde::{Deserialize, Deserializer};

use crate::pricing::Cents;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReferenceValueError {
    #[error("'{0}' is not a monetary amount")]
    InvalidAmount(String),
    #[error("'{0}' is negative; reference values must be zero or more")]
    Negative(String),
}

/// Parses `1234.56`, `1234,56`, `1.234,56` or `R$ 1.234,56` into cents.
///
/// When both separators appear the rightmost one is the decimal mark. A lone
/// separator followed by exactly three digits is read as a thousands mark.
pub fn parse_money(raw: &str) -> Result<Cents, ReferenceValueError> {
    let invalid = || ReferenceValueError::InvalidAmount(raw.to_string());

    let trimmed = raw.trim();
    let unprefixed = trimmed
        .strip_prefix("R$")
        .or_else(|| trimmed.strip_prefix("r$"))
        .unwrap_or(trimmed);
    let cleaned: String = unprefixed.chars().filter(|ch| !ch.is_whitespace()).collect();

    if cleaned.starts_with('-') {
        return Err(ReferenceValueError::Negative(raw.to_string()));
    }
    if cleaned.is_empty() {
        return Err(invalid());
    }

    let decimal_mark = match (cleaned.rfind('.'), cleaned.rfind(',')) {
        (Some(dot), Some(comma)) => Some(dot.max(comma)),
        (Some(mark), None) | (None, Some(mark)) => {
            let separators = cleaned.matches(['.', ',']).count();
            let fraction_len = cleaned.len() - mark - 1;
            (separators == 1 && fraction_len != 3).then_some(mark)
        }
        (None, None) => None,
    };

    let (whole, fraction) = match decimal_mark {
        Some(mark) => (&cleaned[..mark], &cleaned[mark + 1..]),
        None => (cleaned.as_str(), ""),
    };

    let whole: String = whole.chars().filter(|ch| *ch != '.' && *ch != ',').collect();
    if !whole.chars().all(|ch| ch.is_ascii_digit())
        || !fraction.chars().all(|ch| ch.is_ascii_digit())
        || fraction.len() > 2
        || (whole.is_empty() && fraction.is_empty())
    {
        return Err(invalid());
    }

    let units: i64 = if whole.is_empty() {
        0
    } else {
        whole.parse().map_err(|_| invalid())?
    };
    let minor: i64 = match fraction.len() {
        0 => 0,
        1 => fraction.parse::<i64>().map_err(|_| invalid())? * 10,
        _ => fraction.parse().map_err(|_| invalid())?,
    };

    units
        .checked_mul(100)
        .and_then(|cents| cents.checked_add(minor))
        .map(Cents)
        .ok_or_else(invalid)
}

/// Reads yes/no style flags (`true`, `1`, `sim`, `x`, ...); blank is `None`.
pub(crate) fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "" => None,
        "true" | "1" | "yes" | "y" | "sim" | "s" | "x" => Some(true),
        "false" | "0" | "no" | "n" | "nao" | "não" => Some(false),
        _ => None,
    }
}

pub(crate) fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt
        .map(|value| value.replace(['\u{feff}', '\u{200b}'], ""))
        .filter(|value| !value.trim().is_empty()))
}

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::ValidationError;

const MAX_SYMBOL_LEN: usize = 15;

/// Upper-cased ticker as accepted by the aggregates endpoints.
///
/// Share classes (`BRK.A`), when-issued suffixes (`ABC-W`) and market
/// prefixes (`I:SPX`, `X:BTCUSD`) are allowed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Symbol(String);

impl Symbol {
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let normalized = input.trim().to_ascii_uppercase();
        validate(&normalized)?;
        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Percent-encoded form for use inside a URL path.
    pub fn path_segment(&self) -> String {
        urlencoding::encode(&self.0).into_owned()
    }
}

fn validate(symbol: &str) -> Result<(), ValidationError> {
    let first = symbol.chars().next().ok_or(ValidationError::EmptySymbol)?;

    let len = symbol.chars().count();
    if len > MAX_SYMBOL_LEN {
        return Err(ValidationError::SymbolTooLong {
            len,
            max: MAX_SYMBOL_LEN,
        });
    }

    if !first.is_ascii_alphabetic() {
        return Err(ValidationError::SymbolInvalidStart { ch: first });
    }

    let mut seen_prefix = false;
    for (index, ch) in symbol.chars().enumerate() {
        let valid = match ch {
            'A'..='Z' | '0'..='9' | '.' | '-' => true,
            ':' if !seen_prefix && index > 0 => {
                seen_prefix = true;
                true
            }
            _ => false,
        };
        if !valid {
            return Err(ValidationError::SymbolInvalidChar { ch, index });
        }
    }

    Ok(())
}

impl Display for Symbol {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for Symbol {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Symbol> for String {
    fn from(value: Symbol) -> Self {
        value.0
    }
}

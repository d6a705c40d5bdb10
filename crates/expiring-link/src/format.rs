//! Textual encoding of link tokens.
//!
//! Tokens are `<age>g<signature>` or `<age>g<rounds>g<signature>`, with every
//! field in lowercase hex. `g` never appears in hex output, so it is safe as
//! a delimiter.

use serde::Deserialize;

use crate::error::CheckError;

/// Field separator in a token.
pub const DELIMITER: char = 'g';

/// Token layout used by a codec for its whole lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenFormat {
    /// `<age>g<signature>`, signed with a keyed MAC.
    Plain,
    /// `<age>g<rounds>g<signature>`, signed with an iterated hash chain.
    #[default]
    Rounds,
}

impl TokenFormat {
    /// Number of delimited fields in a token of this layout.
    pub fn field_count(self) -> usize {
        match self {
            TokenFormat::Plain => 2,
            TokenFormat::Rounds => 3,
        }
    }
}

/// Parsed components from a token string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedToken<'a> {
    /// Seconds from the epoch to the expiry instant.
    pub age: u64,
    /// Claimed round count (`None` for [`TokenFormat::Plain`]).
    pub rounds: Option<u64>,
    /// Hex signature, unchecked.
    pub signature: &'a str,
}

/// Format the unsigned part of a token.
pub fn format_message(age: u64, rounds: Option<u64>) -> String {
    match rounds {
        Some(rounds) => format!("{age:x}{DELIMITER}{rounds:x}"),
        None => format!("{age:x}"),
    }
}

/// Format a complete token.
///
/// Integers use the shortest lowercase hex form so every `(age, rounds,
/// signature)` triple has exactly one textual token.
pub fn format_token(age: u64, rounds: Option<u64>, signature: &str) -> String {
    format!("{}{DELIMITER}{signature}", format_message(age, rounds))
}

/// Parse a token string into its components.
///
/// Only the structure is checked here; expiry and signature are left to the
/// codec. Any structural problem is reported as [`CheckError::CorruptHash`].
pub fn parse(token: &str, format: TokenFormat) -> Result<ParsedToken<'_>, CheckError> {
    let parts: Vec<&str> = token.split(DELIMITER).collect();
    if parts.len() != format.field_count() {
        return Err(CheckError::CorruptHash);
    }

    let age = parse_hex(parts[0])?;
    let rounds = match format {
        TokenFormat::Plain => None,
        TokenFormat::Rounds => Some(parse_hex(parts[1])?),
    };

    Ok(ParsedToken {
        age,
        rounds,
        signature: parts[parts.len() - 1],
    })
}

fn parse_hex(field: &str) -> Result<u64, CheckError> {
    // from_str_radix tolerates a leading '+', which is never canonical.
    if field.starts_with('+') {
        return Err(CheckError::CorruptHash);
    }
    u64::from_str_radix(field, 16).map_err(|_| CheckError::CorruptHash)
}

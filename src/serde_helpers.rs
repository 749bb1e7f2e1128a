use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize as _, Serialize as _};

static RANGE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    // Expected format: 0xE1F0 - 0xE21E
    #[allow(clippy::unwrap_used)] // Safe because the regex is valid
    Regex::new(r"^\s*(?P<start>\S+)\s*-\s*(?P<end>\S+)\s*$").unwrap()
});

/// Parse a codepoint written as `0xE600`, `U+E600` or plain decimal.
pub fn parse_codepoint(input: &str) -> Option<u32> {
    let input = input.trim();
    if let Some(hex) = input
        .strip_prefix("0x")
        .or_else(|| input.strip_prefix("0X"))
        .or_else(|| input.strip_prefix("U+"))
        .or_else(|| input.strip_prefix("u+"))
    {
        return u32::from_str_radix(hex, 16).ok();
    }
    input.parse::<u32>().ok()
}

/// Parse an inclusive codepoint range such as `0xE1F0 - 0xE21E`.
pub fn parse_codepoint_range(input: &str) -> Option<(u32, u32)> {
    let captures = RANGE_REGEX.captures(input)?;
    let start = parse_codepoint(captures.name("start")?.as_str())?;
    let end = parse_codepoint(captures.name("end")?.as_str())?;
    Some((start, end))
}

pub fn format_codepoint(codepoint: u32) -> String {
    format!("{:#x}", codepoint)
}

#[derive(serde::Deserialize)]
#[serde(untagged)]
enum RawCodepoint {
    Int(u32),
    Str(String),
}

impl RawCodepoint {
    fn resolve<E: serde::de::Error>(self) -> Result<u32, E> {
        match self {
            RawCodepoint::Int(cp) => Ok(cp),
            RawCodepoint::Str(s) => parse_codepoint(&s)
                .ok_or_else(|| E::custom(format!("Invalid codepoint: {}", s))),
        }
    }
}

pub(crate) fn codepoint_de<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: serde::Deserializer<'de>,
{
    RawCodepoint::deserialize(deserializer)?.resolve()
}

pub(crate) fn codepoint_option_de<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt: Option<RawCodepoint> = Option::deserialize(deserializer)?;
    opt.map(RawCodepoint::resolve).transpose()
}

pub(crate) fn codepoint_hex_ser<S>(value: &u32, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    format_codepoint(*value).serialize(serializer)
}

pub(crate) fn codepoint_hex_option_ser<S>(
    value: &Option<u32>,
    serializer: S,
) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    match value {
        Some(v) => serializer.serialize_str(&format_codepoint(*v)),
        None => serializer.serialize_none(),
    }
}

pub(crate) fn codepoint_range_option_de<'de, D>(
    deserializer: D,
) -> Result<Option<(u32, u32)>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt: Option<String> = Option::deserialize(deserializer)?;
    match opt {
        Some(s) => parse_codepoint_range(&s)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("Invalid codepoint range: {}", s))),
        None => Ok(None),
    }
}

// Input validation shared by the tool handlers

use std::sync::LazyLock;

use regex::Regex;

/// Base58, 34 characters, `Q` prefix.
pub const ADDRESS_PATTERN: &str = "^Q[1-9A-HJ-NP-Za-km-z]{33}$";
pub const ADDRESS_LENGTH: usize = 34;

pub const NAME_PATTERN: &str = r"^[A-Za-z0-9$][A-Za-z0-9$._\- ]{1,38}[A-Za-z0-9$]$";
pub const NAME_MIN_LENGTH: usize = 3;
pub const NAME_MAX_LENGTH: usize = 40;

static ADDRESS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(ADDRESS_PATTERN).expect("address pattern compiles"));
static NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(NAME_PATTERN).expect("name pattern compiles"));

/// Format check only; the node is never consulted.
pub fn is_valid_qortal_address(address: &str) -> bool {
    ADDRESS_RE.is_match(address.trim())
}

pub fn is_valid_qortal_name(name: &str) -> bool {
    let name = name.trim();
    let chars = name.chars().count();
    (NAME_MIN_LENGTH..=NAME_MAX_LENGTH).contains(&chars) && NAME_RE.is_match(name)
}

/// Clamp a limit/offset-style value: absent or negative falls back to
/// `default`, anything else is capped at `max`.
pub fn clamp_limit(value: Option<i64>, default: u32, max: u32) -> u32 {
    match value {
        Some(v) if v >= 0 => u32::try_from(v).unwrap_or(u32::MAX).min(max),
        _ => default,
    }
}

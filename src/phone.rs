const DEFAULT_COUNTRY_PREFIX: &str = "+1";

/// Coerces a raw destination into E.164 form.
///
/// Everything except ASCII digits and `+` is dropped. Numbers without a
/// leading `+` are assumed to be North American and get `+1` prepended.
/// Returns `None` only for absent or empty input.
pub fn to_e164(raw: Option<&str>) -> Option<String> {
    let raw = raw.filter(|r| !r.is_empty())?;
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '+')
        .collect();

    if cleaned.starts_with('+') {
        Some(cleaned)
    } else {
        Some(format!("{DEFAULT_COUNTRY_PREFIX}{cleaned}"))
    }
}

// src/extract/numeric.rs

/// Normalize a locale-formatted price/length cell: `"20,50 €"` → `20.50`.
///
/// Everything except digits, comma and dot is stripped, then comma becomes
/// the decimal dot (these sources never group thousands in values this
/// small). Returns `None` when nothing numeric remains or the result is
/// not a single well-formed number; `"1.2.3"` fails closed rather than
/// being truncated.
pub fn clean_number(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == ',' || *c == '.')
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned
        .replace(',', ".")
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v >= 0.0)
}

/// Length cells come as composite strings like `"12 x 4 m."`; only the
/// leading token is the length.
pub fn leading_number(raw: &str) -> Option<f64> {
    raw.split_whitespace().next().and_then(clean_number)
}

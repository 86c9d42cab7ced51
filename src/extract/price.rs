//! Price-text normalization.

/// Converts free-form price text into a number.
///
/// Strips everything that is not a digit, period, or comma, treats commas as
/// thousands separators, and parses the remainder. Returns `None` for empty
/// or malformed remainders (for example two decimal points). Callers treat
/// `None` as "no usable price", never as a failure.
pub fn parse_price(text: &str) -> Option<f64> {
    let cleaned: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == ',')
        .collect();

    let cleaned = cleaned.replace(',', "");
    if cleaned.is_empty() {
        return None;
    }

    cleaned.parse().ok()
}

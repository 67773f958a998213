//! Locale-tolerant numeric parsing.
//!
//! Handles "1,234.56", "1.234,56", "1234,5", "$ 1 234.00", "€45.000" etc.

/// Parse a price/volume cell into a float.
///
/// Currency symbols, spaces (including non-breaking) and quotes are stripped.
/// When both separators are present, the one appearing last is the decimal
/// separator. A lone comma is a decimal separator only when followed by at most
/// two digits; otherwise commas group thousands.
pub fn parse_number(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !matches!(c, '$' | '€' | '"' | '\'' | '%') && !c.is_whitespace())
        .collect();
    if cleaned.is_empty() {
        return None;
    }

    let last_dot = cleaned.rfind('.');
    let last_comma = cleaned.rfind(',');

    let normalized = match (last_dot, last_comma) {
        (Some(d), Some(c)) => {
            if c > d {
                cleaned.replace('.', "").replace(',', ".")
            } else {
                cleaned.replace(',', "")
            }
        }
        (None, Some(_)) => resolve_single_separator(&cleaned, ','),
        (Some(_), None) => resolve_single_separator(&cleaned, '.'),
        (None, None) => cleaned,
    };

    normalized.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn resolve_single_separator(s: &str, sep: char) -> String {
    let count = s.matches(sep).count();
    if sep == '.' {
        // A lone dot is always a decimal point; repeated dots group thousands.
        return if count == 1 { s.to_string() } else { s.replace('.', "") };
    }
    let decimals = s.rsplit(sep).next().map(|tail| tail.len()).unwrap_or(0);
    if count == 1 && decimals <= 2 {
        s.replace(sep, ".")
    } else {
        s.replace(sep, "")
    }
}

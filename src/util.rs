// Number coercion and display formatting.
//
// Dataset cells are dirty: locale decimals (`2,5`), stray spaces, units glued
// to the number, blanks. Everything here degrades to zero instead of failing so
// one bad cell never costs a row.
use num_format::{Locale, ToFormattedString};

/// Parse a cell into `f64` the forgiving way.
///
/// - Trims whitespace; blank input is `None`.
/// - The first `,` is read as the decimal point.
/// - Reads the longest numeric prefix, so `"1.5kg"` is `1.5`.
/// - Non-finite results are rejected.
pub fn parse_f64_safe(s: Option<&str>) -> Option<f64> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    let s = s.replacen(',', ".", 1);
    let v = numeric_prefix(&s).parse::<f64>().ok()?;
    v.is_finite().then_some(v)
}

/// Cell value as a number, `0.0` when absent or unparseable.
pub fn to_number(s: Option<&str>) -> f64 {
    parse_f64_safe(s).unwrap_or(0.0)
}

// Longest prefix shaped like `[+-]digits[.digits][e[+-]digits]`.
fn numeric_prefix(s: &str) -> &str {
    let b = s.as_bytes();
    let mut i = 0;
    if i < b.len() && (b[i] == b'+' || b[i] == b'-') {
        i += 1;
    }
    let int_start = i;
    while i < b.len() && b[i].is_ascii_digit() {
        i += 1;
    }
    let mut digits = i - int_start;
    if i < b.len() && b[i] == b'.' {
        let frac_start = i + 1;
        let mut j = frac_start;
        while j < b.len() && b[j].is_ascii_digit() {
            j += 1;
        }
        if digits > 0 || j > frac_start {
            digits += j - frac_start;
            i = j;
        }
    }
    if digits == 0 {
        return "";
    }
    if i < b.len() && (b[i] == b'e' || b[i] == b'E') {
        let mut j = i + 1;
        if j < b.len() && (b[j] == b'+' || b[j] == b'-') {
            j += 1;
        }
        let exp_start = j;
        while j < b.len() && b[j].is_ascii_digit() {
            j += 1;
        }
        if j > exp_start {
            i = j;
        }
    }
    &s[..i]
}

pub fn format_number(n: f64, decimals: usize) -> String {
    // Fixed decimals plus thousands separators, e.g. `1,234,567.89`.
    let neg = n.is_sign_negative() && n != 0.0;
    let abs_n = n.abs();
    let s = format!("{:.*}", decimals, abs_n);
    let mut parts = s.split('.');
    let int_part = parts.next().unwrap_or("0");
    let frac_part = parts.next();
    let int_val: i64 = int_part.parse().unwrap_or(0);
    let mut res = int_val.to_formatted_string(&Locale::en);
    if let Some(frac) = frac_part {
        if decimals > 0 {
            res.push('.');
            res.push_str(frac);
        }
    }
    if neg && res.chars().any(|c| c.is_ascii_digit() && c != '0') {
        format!("-{}", res)
    } else {
        res
    }
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    // Counts in console messages, e.g. `9,855 rows loaded`.
    n.to_formatted_string(&Locale::en)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locale_decimals_are_coerced() {
        assert_eq!(to_number(Some("1,5")), 1.5);
        assert_eq!(to_number(Some("  -0,75 ")), -0.75);
        assert_eq!(to_number(Some("2.25")), 2.25);
        assert_eq!(to_number(Some("1e3")), 1000.0);
    }

    #[test]
    fn blanks_and_garbage_become_zero() {
        assert_eq!(to_number(None), 0.0);
        assert_eq!(to_number(Some("")), 0.0);
        assert_eq!(to_number(Some("   ")), 0.0);
        assert_eq!(to_number(Some("abc")), 0.0);
        assert_eq!(to_number(Some("-")), 0.0);
        assert_eq!(to_number(Some(".")), 0.0);
        assert_eq!(to_number(Some("Infinity")), 0.0);
        assert_eq!(to_number(Some("NaN")), 0.0);
    }

    #[test]
    fn only_the_first_comma_is_a_decimal_point() {
        assert_eq!(to_number(Some("1,234,5")), 1.234);
        assert_eq!(to_number(Some("3.5kg")), 3.5);
        assert_eq!(to_number(Some("7e")), 7.0);
        assert_eq!(to_number(Some(".5")), 0.5);
        assert_eq!(to_number(Some("5.")), 5.0);
    }

    #[test]
    fn numbers_format_with_separators() {
        assert_eq!(format_number(1234567.891, 2), "1,234,567.89");
        assert_eq!(format_number(-12.5, 1), "-12.5");
        assert_eq!(format_number(-0.0001, 2), "0.00");
        assert_eq!(format_number(42.0, 0), "42");
        assert_eq!(format_int(9855usize), "9,855");
    }
}

// Number formatting helpers shared by the console view, report captions and
// the interactive search output.
use num_format::{Locale, ToFormattedString};

pub fn format_number(n: f64, decimals: usize) -> String {
    // Fixed decimals plus thousands separators on the integer part,
    // e.g. `1,234,567.89`.
    let neg = n.is_sign_negative() && n != 0.0;
    let s = format!("{:.*}", decimals, n.abs());
    let mut parts = s.split('.');
    let int_part = parts.next().unwrap_or("0");
    let frac_part = parts.next();
    // Magnitudes past u64 keep their plain digits.
    let mut res = match int_part.parse::<u64>() {
        Ok(v) => v.to_formatted_string(&Locale::en),
        Err(_) => int_part.to_string(),
    };
    if let Some(frac) = frac_part {
        res.push('.');
        res.push_str(frac);
    }
    if neg && res.chars().any(|c| c.is_ascii_digit() && c != '0') {
        format!("-{}", res)
    } else {
        res
    }
}

/// Quantities are shown without decimals.
pub fn format_qty(n: f64) -> String {
    format_number(n, 0)
}

/// Money amounts are shown with two decimals.
pub fn format_amount(n: f64) -> String {
    format_number(n, 2)
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    n.to_formatted_string(&Locale::en)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groups_thousands() {
        assert_eq!(format_number(1234567.891, 2), "1,234,567.89");
        assert_eq!(format_qty(1500.4), "1,500");
        assert_eq!(format_amount(0.5), "0.50");
        assert_eq!(format_int(9855usize), "9,855");
    }

    #[test]
    fn keeps_sign_but_not_negative_zero() {
        assert_eq!(format_amount(-42.126), "-42.13");
        assert_eq!(format_qty(-0.2), "0");
    }

    #[test]
    fn huge_values_are_not_zeroed() {
        assert_eq!(format_qty(1e20), "100000000000000000000");
        assert_eq!(format_amount(-1e20), "-100000000000000000000.00");
    }
}

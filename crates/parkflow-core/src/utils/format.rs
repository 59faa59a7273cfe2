/// Format an amount in minor units (cents, grosze) as `12.34 PLN`.
/// Integer arithmetic only; the wire value is never treated as already scaled.
pub fn format_minor(amount_minor: i64, currency: &str) -> String {
    let sign = if amount_minor < 0 { "-" } else { "" };
    let abs = amount_minor.unsigned_abs();
    let amount = format!("{}{}.{:02}", sign, abs / 100, abs % 100);
    if currency.is_empty() {
        amount
    } else {
        format!("{} {}", amount, currency)
    }
}

/// Parse a user-entered major-unit amount (`10`, `10.5`, `10,50`) into minor units.
/// Returns `None` for anything that is not a plain amount with at most two decimals.
pub fn parse_major(input: &str) -> Option<i64> {
    let input = input.trim().replace(',', ".");
    let (negative, digits) = match input.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, input.as_str()),
    };

    let (whole, fraction) = match digits.split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => (digits, ""),
    };
    if whole.is_empty() && fraction.is_empty() {
        return None;
    }
    if !whole.chars().all(|c| c.is_ascii_digit()) || !fraction.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    if fraction.len() > 2 {
        return None;
    }

    let whole: i64 = if whole.is_empty() { 0 } else { whole.parse().ok()? };
    let cents: i64 = match fraction.len() {
        0 => 0,
        1 => fraction.parse::<i64>().ok()? * 10,
        _ => fraction.parse().ok()?,
    };

    let minor = whole.checked_mul(100)?.checked_add(cents)?;
    Some(if negative { -minor } else { minor })
}

/// Truncate a string to a maximum length, adding ellipsis if needed
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_minor() {
        assert_eq!(format_minor(1234, "PLN"), "12.34 PLN");
        assert_eq!(format_minor(5, "USD"), "0.05 USD");
        assert_eq!(format_minor(100, ""), "1.00");
        assert_eq!(format_minor(-250, "PLN"), "-2.50 PLN");
        assert_eq!(format_minor(0, "PLN"), "0.00 PLN");
    }

    #[test]
    fn test_parse_major() {
        assert_eq!(parse_major("10"), Some(1000));
        assert_eq!(parse_major("10.5"), Some(1050));
        assert_eq!(parse_major("10,50"), Some(1050));
        assert_eq!(parse_major(" 0.07 "), Some(7));
        assert_eq!(parse_major(".5"), Some(50));
        assert_eq!(parse_major("-3.10"), Some(-310));
    }

    #[test]
    fn test_parse_major_rejects_garbage() {
        assert_eq!(parse_major(""), None);
        assert_eq!(parse_major("."), None);
        assert_eq!(parse_major("10.123"), None); // sub-cent precision
        assert_eq!(parse_major("ten"), None);
        assert_eq!(parse_major("1e3"), None);
        assert_eq!(parse_major("99999999999999999999"), None); // overflow
    }

    #[test]
    fn test_truncate_string() {
        assert_eq!(truncate_string("Hello", 10), "Hello");
        assert_eq!(truncate_string("Hello World", 8), "Hello...");
        assert_eq!(truncate_string("Hi", 2), "Hi");
    }
}

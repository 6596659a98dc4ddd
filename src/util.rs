pub fn format_count(count: u64) -> String {
    const UNITS: [&str; 4] = ["", "k", "M", "G"];

    let mut value = count as f64;
    let mut unit = 0usize;
    while value >= 1000.0 && unit < UNITS.len() - 1 {
        value /= 1000.0;
        unit += 1;
    }

    if unit == 0 {
        format!("{count}")
    } else {
        format!("{value:.1}{}", UNITS[unit])
    }
}

/// First `max_chars` characters of `value`, never splitting a code point.
pub fn truncate_chars(value: &str, max_chars: usize) -> &str {
    match value.char_indices().nth(max_chars) {
        Some((end, _)) => &value[..end],
        None => value,
    }
}

pub fn ellipsize(value: &str, max_chars: usize) -> String {
    let cut = truncate_chars(value, max_chars.saturating_sub(3));
    if value.chars().count() > max_chars {
        format!("{cut}...")
    } else {
        value.to_string()
    }
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

/// Format a price in dollars, dropping the cents when they are zero
pub fn format_price(amount: f64) -> String {
    if amount.fract().abs() < f64::EPSILON {
        format!("${:.0}", amount)
    } else {
        format!("${:.2}", amount)
    }
}

/// "1 passenger", "3 passengers"
pub fn format_passengers(count: u32) -> String {
    if count == 1 {
        "1 passenger".to_string()
    } else {
        format!("{} passengers", count)
    }
}

pub fn format_duration(minutes: u32) -> String {
    format!("{} min", minutes)
}

/// Format a flight date and time as "2025-06-01 at 14:30"
pub fn format_flight_when(date: &str, time: &str) -> String {
    // Times from the data service carry seconds ("14:30:00")
    let time = match time.get(..5) {
        Some(hm) if time.len() > 5 && hm.as_bytes().get(2) == Some(&b':') => hm,
        _ => time,
    };
    format!("{} at {}", date, time)
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

/// Truncate a response body to avoid logging excessive data
pub fn truncate_body(body: &str) -> String {
    if body.len() <= MAX_ERROR_BODY_LENGTH {
        body.to_string()
    } else {
        let cut: String = body.chars().take(MAX_ERROR_BODY_LENGTH).collect();
        format!("{}... (truncated, {} total bytes)", cut, body.len())
    }
}

use chrono::Duration;

/// Number of leading characters of a token kept visible in logs
const TOKEN_VISIBLE_PREFIX: usize = 6;

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

/// Mask a bearer or refresh token for logging.
/// Keeps a short prefix so two tokens can still be told apart in a trace.
pub fn mask_token(token: &str) -> String {
    if token.is_empty() {
        return "<none>".to_string();
    }
    let prefix: String = token.chars().take(TOKEN_VISIBLE_PREFIX).collect();
    if token.chars().count() <= TOKEN_VISIBLE_PREFIX {
        "***".to_string()
    } else {
        format!("{}***", prefix)
    }
}

/// Format time left until expiry for display ("expired", "45s", "12m", "3h 5m")
pub fn format_remaining(remaining: Duration) -> String {
    let secs = remaining.num_seconds();
    if secs <= 0 {
        "expired".to_string()
    } else if secs < 60 {
        format!("{}s", secs)
    } else if secs < 3600 {
        format!("{}m", secs / 60)
    } else {
        let hours = secs / 3600;
        let mins = (secs % 3600) / 60;
        if mins == 0 {
            format!("{}h", hours)
        } else {
            format!("{}h {}m", hours, mins)
        }
    }
}

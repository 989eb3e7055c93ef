use crate::runner::UsageStats;

/// First `max` characters of `s` on one line, with `…` if cut.
pub fn preview(s: &str, max: usize) -> String {
    let flat = s.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= max {
        return flat;
    }
    let head: String = flat.chars().take(max).collect();
    let mut out = head.trim_end().to_string();
    out.push('…');
    out
}

pub fn format_tokens(n: u64) -> String {
    if n < 1_000 {
        return n.to_string();
    }
    // Unit follows the rounded value.
    let k = n as f64 / 1_000.0;
    if k < 9.95 {
        format!("{k:.1}k")
    } else if k.round() < 1_000.0 {
        format!("{}k", k.round() as u64)
    } else {
        format!("{:.1}M", n as f64 / 1_000_000.0)
    }
}

/// Compact one-line usage, zero fields left out.
pub fn format_usage(usage: &UsageStats, model: Option<&str>) -> String {
    let mut parts = Vec::new();
    if usage.turns > 0 {
        let noun = if usage.turns == 1 { "turn" } else { "turns" };
        parts.push(format!("{} {noun}", usage.turns));
    }
    if usage.input > 0 {
        parts.push(format!("↑{}", format_tokens(usage.input)));
    }
    if usage.output > 0 {
        parts.push(format!("↓{}", format_tokens(usage.output)));
    }
    if usage.cache_read > 0 {
        parts.push(format!("R{}", format_tokens(usage.cache_read)));
    }
    if usage.cache_write > 0 {
        parts.push(format!("W{}", format_tokens(usage.cache_write)));
    }
    if usage.cost > 0.0 {
        parts.push(format!("${:.4}", usage.cost));
    }
    if usage.context_tokens > 0 {
        parts.push(format!("ctx:{}", format_tokens(usage.context_tokens)));
    }
    if let Some(m) = model {
        parts.push(m.to_string());
    }
    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_abbreviations() {
        assert_eq!(format_tokens(340), "340");
        assert_eq!(format_tokens(1_234), "1.2k");
        assert_eq!(format_tokens(56_700), "57k");
        assert_eq!(format_tokens(2_500_000), "2.5M");
    }

    #[test]
    fn token_units_roll_over_after_rounding() {
        assert_eq!(format_tokens(9_949), "9.9k");
        assert_eq!(format_tokens(9_960), "10k");
        assert_eq!(format_tokens(999_499), "999k");
        assert_eq!(format_tokens(999_600), "1.0M");
        assert_eq!(format_tokens(1_000_000), "1.0M");
    }

    #[test]
    fn usage_line_skips_zero_fields() {
        let usage = UsageStats {
            input: 1_200,
            output: 340,
            cache_read: 2_000,
            cache_write: 120,
            cost: 0.0123,
            context_tokens: 5_600,
            turns: 3,
        };
        assert_eq!(
            format_usage(&usage, Some("acme/modelX")),
            "3 turns ↑1.2k ↓340 R2.0k W120 $0.0123 ctx:5.6k acme/modelX"
        );
        assert_eq!(format_usage(&UsageStats::default(), None), "");
    }

    #[test]
    fn preview_is_bounded() {
        assert_eq!(preview("short", 10), "short");
        assert_eq!(preview("line one\nline  two", 100), "line one line two");
        assert_eq!(preview("abcdefghij", 4), "abcd…");
        assert_eq!(preview("ééééé", 2), "éé…");
        assert_eq!(preview("ab cd", 3), "ab…");
    }
}

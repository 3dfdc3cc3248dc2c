//! Human-readable byte and file counts for frontends.
//!
//! Sizes are `u64` bytes everywhere in the core; floating point only
//! appears here, at the display boundary.

/// Binary unit ladder. Labels use the short forms users expect from a
/// folder-size tool even though the steps are 1024.
const UNITS: [(&str, u64); 4] = [
    ("TB", 1 << 40),
    ("GB", 1 << 30),
    ("MB", 1 << 20),
    ("KB", 1 << 10),
];

/// Format a byte count with the largest unit that keeps the value >= 1.
///
/// KB and MB get one decimal, GB and TB two.
pub fn format_size(bytes: u64) -> String {
    for (label, step) in UNITS {
        if bytes >= step {
            let value = bytes as f64 / step as f64;
            return match label {
                "KB" | "MB" => format!("{value:.1} {label}"),
                _ => format!("{value:.2} {label}"),
            };
        }
    }
    format!("{bytes} B")
}

/// Format a file count with thousand separators (`1234567` -> `1,234,567`).
pub fn format_count(count: u64) -> String {
    let digits = count.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size_bytes() {
        assert_eq!(format_size(0), "0 B");
        assert_eq!(format_size(150), "150 B");
        assert_eq!(format_size(1023), "1023 B");
    }

    #[test]
    fn test_format_size_units() {
        assert_eq!(format_size(1024), "1.0 KB");
        assert_eq!(format_size(1536), "1.5 KB");
        assert_eq!(format_size(1_048_576), "1.0 MB");
        assert_eq!(format_size(1_073_741_824), "1.00 GB");
        assert_eq!(format_size(1_099_511_627_776), "1.00 TB");
    }

    #[test]
    fn test_format_count() {
        assert_eq!(format_count(0), "0");
        assert_eq!(format_count(999), "999");
        assert_eq!(format_count(1_000), "1,000");
        assert_eq!(format_count(12_345), "12,345");
        assert_eq!(format_count(1_234_567), "1,234,567");
    }
}

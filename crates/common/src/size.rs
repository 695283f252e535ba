//! Human readable sizes.

const UNITS: [(&str, u64); 6] = [
    ("EB", 1_000_000_000_000_000_000),
    ("PB", 1_000_000_000_000_000),
    ("TB", 1_000_000_000_000),
    ("GB", 1_000_000_000),
    ("MB", 1_000_000),
    ("KB", 1_000),
];

/// Format a byte count with base-10 units, e.g. `3 B`, `1.5 KB`, `2.0 GB`.
///
/// A unit is used once the value reaches two thirds of it, rounded down,
/// so 666 bytes reads as `0.7 KB`.
pub fn format_base10(bytes: u64) -> String {
    if bytes == 0 {
        return "0 B".to_string();
    }
    for (unit, scale) in UNITS {
        if bytes >= scale * 2 / 3 {
            return format!("{:.1} {}", bytes as f64 / scale as f64, unit);
        }
    }
    format!("{} B", bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_base10() {
        assert_eq!(format_base10(0), "0 B");
        assert_eq!(format_base10(3), "3 B");
        assert_eq!(format_base10(665), "665 B");
        assert_eq!(format_base10(666), "0.7 KB");
        assert_eq!(format_base10(667), "0.7 KB");
        assert_eq!(format_base10(1_500), "1.5 KB");
        assert_eq!(format_base10(2_000_000), "2.0 MB");
        assert_eq!(format_base10(5_000_000_000_000), "5.0 TB");
    }
}

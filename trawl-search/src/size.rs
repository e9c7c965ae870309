//! Human-readable size text to byte counts.

use std::sync::LazyLock;

use regex::Regex;

static SIZE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([0-9][0-9,]*(?:\.[0-9]+)?)\s*([A-Za-z]*)$").expect("size pattern is valid")
});

/// Parses size text such as `"1.2 GiB"`, `"700 MB"` or `"1,024 KB"`.
///
/// Decimal units (`KB`, `MB`, ...) are powers of 1000 and binary units
/// (`KiB`, `MiB`, ...) powers of 1024. A bare number is a byte count.
/// Missing or malformed text yields 0.
pub fn parse_size(text: &str) -> u64 {
    let Some(captures) = SIZE_PATTERN.captures(text.trim()) else {
        return 0;
    };

    let Ok(value) = captures[1].replace(',', "").parse::<f64>() else {
        return 0;
    };
    let Some(multiplier) = unit_multiplier(&captures[2]) else {
        return 0;
    };

    (value * multiplier as f64) as u64
}

fn unit_multiplier(unit: &str) -> Option<u64> {
    const KB: u64 = 1000;
    const KIB: u64 = 1024;

    let multiplier = match unit.to_ascii_lowercase().as_str() {
        "" | "b" | "byte" | "bytes" => 1,
        "k" | "kb" => KB,
        "kib" => KIB,
        "m" | "mb" => KB.pow(2),
        "mib" => KIB.pow(2),
        "g" | "gb" => KB.pow(3),
        "gib" => KIB.pow(3),
        "t" | "tb" => KB.pow(4),
        "tib" => KIB.pow(4),
        "p" | "pb" => KB.pow(5),
        "pib" => KIB.pow(5),
        _ => return None,
    };
    Some(multiplier)
}

//! Small helpers shared by every operation

use uuid::Uuid;

const SIZE_UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

/// Format a byte count for display, e.g. `1536` → `"1.5 KB"`
pub fn format_file_size(bytes: u64) -> String {
    if bytes < 1024 {
        return format!("{} B", bytes);
    }

    let mut unit = 0;
    let mut divisor = 1u64;
    while unit + 1 < SIZE_UNITS.len() && bytes / divisor >= 1024 {
        divisor *= 1024;
        unit += 1;
    }

    format!("{:.1} {}", bytes as f64 / divisor as f64, SIZE_UNITS[unit])
}

/// Short random id for tagging a job, e.g. `"k3x9a0q"`
pub fn generate_id() -> String {
    const ALPHABET: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

    let mut value = Uuid::new_v4().as_u128();
    let mut id = String::with_capacity(7);
    for _ in 0..7 {
        id.push(ALPHABET[(value % 36) as usize] as char);
        value /= 36;
    }
    id
}

use uuid::Uuid;

use crate::utils::code_filter;

/// Length of the issued scan code (hex chars from a v4 UUID).
const CODE_LEN: usize = 8;

/// How often to retry before giving up on the filter and trusting the
/// UNIQUE key on `barcode` to catch a real collision.
const MAX_ATTEMPTS: usize = 16;

fn random_code() -> String {
    Uuid::new_v4()
        .to_string()
        .chars()
        .filter(|c| *c != '-')
        .take(CODE_LEN)
        .collect::<String>()
        .to_uppercase()
}

/// Generate a scan code that, per the in-memory filter, has not been issued
/// yet. Filter false positives only cost a regeneration; the database still
/// holds the authoritative UNIQUE constraint.
pub fn generate_scan_code() -> String {
    for _ in 0..MAX_ATTEMPTS {
        let code = random_code();
        if !code_filter::might_exist(&code) {
            return code;
        }
    }
    random_code()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_is_eight_uppercase_hex_chars() {
        let code = generate_scan_code();
        assert_eq!(code.len(), CODE_LEN);
        assert!(code.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(code, code.to_uppercase());
    }

    #[test]
    fn consecutive_codes_differ() {
        // Not a uniqueness proof, just a sanity check on the entropy source.
        let a = generate_scan_code();
        let b = generate_scan_code();
        assert_ne!(a, b);
    }

    #[test]
    fn issued_code_is_seen_by_filter() {
        let code = generate_scan_code();
        code_filter::insert(&code);
        assert!(code_filter::might_exist(&code));
    }
}

use rand::Rng;

const PREFIX: &str = "BK";
const SUFFIX_LEN: usize = 5;
const SUFFIX_CHARSET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Generate a human-readable booking reference: `BK<epoch-millis><5 x base36>`.
///
/// Unique with overwhelming probability; the storage layer additionally
/// enforces a unique constraint and the manager retries on the rare collision.
pub fn generate() -> String {
    let millis = chrono::Utc::now().timestamp_millis();
    let mut rng = rand::thread_rng();
    let suffix: String = (0..SUFFIX_LEN)
        .map(|_| SUFFIX_CHARSET[rng.gen_range(0..SUFFIX_CHARSET.len())] as char)
        .collect();
    format!("{}{}{}", PREFIX, millis, suffix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_reference_format() {
        let reference = generate();
        assert!(reference.starts_with("BK"));

        let body = &reference[2..];
        let (millis, suffix) = body.split_at(body.len() - SUFFIX_LEN);
        assert!(!millis.is_empty());
        assert!(millis.chars().all(|c| c.is_ascii_digit()));
        assert_eq!(suffix.len(), SUFFIX_LEN);
        assert!(suffix
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
    }

    #[test]
    fn test_references_do_not_repeat() {
        // Many generations share a millisecond, so hold the suffix space to
        // the "overwhelming probability" bar rather than exact disjointness.
        let mut seen = HashSet::new();
        for _ in 0..10_000 {
            seen.insert(generate());
        }
        assert!(seen.len() >= 9_996, "too many colliding references: {}", seen.len());
    }
}

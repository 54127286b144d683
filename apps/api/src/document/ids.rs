use chrono::Utc;
use uuid::Uuid;

/// Mints a list-entry id: `<unix millis>-<random suffix>`.
///
/// The timestamp keeps ids roughly ordered by creation; the suffix keeps them
/// unique when a migration mints many ids inside the same millisecond.
pub fn new_id() -> String {
    format!(
        "{}-{}",
        Utc::now().timestamp_millis(),
        Uuid::new_v4().simple()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_ids_unique_within_same_instant() {
        let ids: HashSet<String> = (0..1_000).map(|_| new_id()).collect();
        assert_eq!(ids.len(), 1_000);
    }

    #[test]
    fn test_id_starts_with_timestamp() {
        let before = Utc::now().timestamp_millis();
        let id = new_id();
        let (millis, suffix) = id.split_once('-').unwrap();
        assert!(millis.parse::<i64>().unwrap() >= before);
        assert_eq!(suffix.len(), 32);
    }
}

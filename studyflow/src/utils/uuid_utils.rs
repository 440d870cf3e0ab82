//! UUID generation.

use uuid::Uuid;

/// Generates a new UUID v4.
#[must_use]
pub fn generate_uuid() -> Uuid {
    Uuid::new_v4()
}

/// Generates a new UUID v7 (time-ordered).
///
/// Used for run identifiers so logs from one worker sort by start time.
#[must_use]
pub fn generate_uuid_v7() -> Uuid {
    Uuid::now_v7()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uuid_versions() {
        assert_eq!(generate_uuid().get_version_num(), 4);
        assert_eq!(generate_uuid_v7().get_version_num(), 7);
    }

    #[test]
    fn test_uuids_are_unique() {
        assert_ne!(generate_uuid(), generate_uuid());
    }
}

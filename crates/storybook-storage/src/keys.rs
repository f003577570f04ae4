//! Slot key constants and validation.

use crate::traits::{StorageError, StorageResult};

/// Slot holding the guest's full draft payload, including inline photo data.
pub const PENDING_PERSONALIZATION_SLOT: &str = "pendingPersonalization";

/// Slot holding the guest session id.
pub const GUEST_SESSION_SLOT: &str = "guestSessionId";

const MAX_SLOT_LENGTH: usize = 64;

/// Reject anything that could escape the store directory or collide with temp files.
pub(crate) fn validate_slot(slot: &str) -> StorageResult<()> {
    if slot.is_empty() || slot.len() > MAX_SLOT_LENGTH {
        return Err(StorageError::InvalidKey(format!(
            "Slot name must be 1-{} characters",
            MAX_SLOT_LENGTH
        )));
    }

    if !slot
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(StorageError::InvalidKey(format!(
            "Slot '{}' contains invalid characters",
            slot
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_slots_are_valid() {
        assert!(validate_slot(PENDING_PERSONALIZATION_SLOT).is_ok());
        assert!(validate_slot(GUEST_SESSION_SLOT).is_ok());
    }

    #[test]
    fn traversal_and_separators_are_rejected() {
        for slot in ["", "../etc/passwd", "a/b", "a.json", "with space"] {
            assert!(
                matches!(validate_slot(slot), Err(StorageError::InvalidKey(_))),
                "{:?} should be rejected",
                slot
            );
        }
        assert!(validate_slot(&"a".repeat(65)).is_err());
    }
}

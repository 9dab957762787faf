//! Canonical serialization and fingerprinting.
//!
//! ## Determinism Guarantees
//!
//! - Stable field order: Struct fields serialize in declaration order
//! - Stable Vec order: Vectors serialize in index order
//! - No HashMap in persisted types
//!
//! A fingerprint only changes when the persisted projection changes, so a
//! derived `unlockable` flip never counts as a new state.

use serde::Serialize;
use xxhash_rust::xxh64::xxh64;

use crate::types::PersistedTreeState;

/// Serialize a value to canonical JSON bytes.
///
/// The kernel only passes plain structs of strings, numbers and enums,
/// which cannot fail to encode.
pub fn to_canonical_bytes<T: Serialize>(value: &T) -> Vec<u8> {
    serde_json::to_vec(value).expect("Canonical serialization failed")
}

/// Serialize a value to a canonical JSON string.
pub fn to_canonical_string<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).expect("Canonical serialization failed")
}

/// Compute canonical hash of a serializable value.
pub fn canonical_hash<T: Serialize>(value: &T) -> u64 {
    let bytes = to_canonical_bytes(value);
    xxh64(&bytes, 0)
}

/// Compute canonical hash and return as hex string.
pub fn canonical_hash_hex<T: Serialize>(value: &T) -> String {
    format!("{:016x}", canonical_hash(value))
}

/// Fingerprint of a persisted tree record.
pub fn state_fingerprint(state: &PersistedTreeState) -> String {
    canonical_hash_hex(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Position, PrerequisiteEdge, SkillData, SkillNode, SkillStatus, TreeState};

    fn state(status: SkillStatus) -> TreeState {
        TreeState::new(
            vec![SkillNode::new("A", Position::default(), SkillData::new("A", status))],
            vec![PrerequisiteEdge::between("A", "B")],
        )
    }

    #[test]
    fn test_determinism() {
        let s = state(SkillStatus::Locked).to_persisted();
        assert_eq!(state_fingerprint(&s), state_fingerprint(&s));
        assert_eq!(state_fingerprint(&s).len(), 16);
    }

    #[test]
    fn test_derived_status_does_not_change_fingerprint() {
        let locked = state(SkillStatus::Locked).to_persisted();
        let unlockable = state(SkillStatus::Unlockable).to_persisted();
        assert_eq!(state_fingerprint(&locked), state_fingerprint(&unlockable));
    }

    #[test]
    fn test_real_change_changes_fingerprint() {
        let locked = state(SkillStatus::Locked).to_persisted();
        let completed = state(SkillStatus::Completed).to_persisted();
        assert_ne!(state_fingerprint(&locked), state_fingerprint(&completed));
    }
}

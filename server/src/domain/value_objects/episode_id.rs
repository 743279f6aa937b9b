//! Deterministic episode id scheme
//!
//! Episode ids are stable across re-imports so player-side bookmarks keep
//! working. The id packs the owning anime, the rank of the source under that
//! anime, and the episode index into fixed decimal slots:
//!
//! ```text
//! 25 AAAAAA OO EEEE
//!    |      |  '--- episode index  (4 digits)
//!    |      '------ source order   (2 digits, 1-based)
//!    '------------- anime id       (6 digits)
//! ```

use crate::shared::error::DomainError;

const PREFIX: i64 = 25_000_000_000_000;

// Slot capacities
const MAX_ANIME_ID: i64 = 1_000_000;
const MAX_SOURCE_ORDER: i64 = 100;
const MAX_EPISODE_INDEX: i64 = 10_000;

// Decimal position of each slot
const ANIME_ID_BASE: i64 = 1_000_000;
const SOURCE_ORDER_BASE: i64 = 10_000;

/// Builds the deterministic 64-bit episode id.
///
/// `source_order` is the 1-based rank of the source among its anime's
/// sources ordered by id ascending. Each field must fit its decimal slot;
/// an overflow aborts the import rather than silently colliding.
pub fn deterministic_episode_id(
    anime_id: i64,
    source_order: i64,
    episode_index: i32,
) -> Result<i64, DomainError> {
    if !(0..MAX_ANIME_ID).contains(&anime_id) {
        return Err(DomainError::InvariantViolation(format!(
            "anime id {anime_id} does not fit the episode id scheme"
        )));
    }
    if !(1..MAX_SOURCE_ORDER).contains(&source_order) {
        return Err(DomainError::InvariantViolation(format!(
            "source order {source_order} does not fit the episode id scheme"
        )));
    }
    let episode_index = i64::from(episode_index);
    if !(0..MAX_EPISODE_INDEX).contains(&episode_index) {
        return Err(DomainError::InvariantViolation(format!(
            "episode index {episode_index} does not fit the episode id scheme"
        )));
    }

    Ok(PREFIX
        + anime_id * ANIME_ID_BASE
        + source_order * SOURCE_ORDER_BASE
        + episode_index)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packs_fields_into_slots() {
        // anime 42, second source, episode 7
        assert_eq!(
            deterministic_episode_id(42, 2, 7).unwrap(),
            25_000_042_020_007
        );
    }

    #[test]
    fn is_stable() {
        let a = deterministic_episode_id(123, 1, 12).unwrap();
        let b = deterministic_episode_id(123, 1, 12).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn distinct_triples_never_collide() {
        let base = deterministic_episode_id(1, 1, 1).unwrap();
        assert_ne!(base, deterministic_episode_id(1, 1, 2).unwrap());
        assert_ne!(base, deterministic_episode_id(1, 2, 1).unwrap());
        assert_ne!(base, deterministic_episode_id(2, 1, 1).unwrap());
    }

    #[test]
    fn rejects_overflowing_slots() {
        assert!(deterministic_episode_id(1_000_000, 1, 1).is_err());
        assert!(deterministic_episode_id(1, 100, 1).is_err());
        assert!(deterministic_episode_id(1, 0, 1).is_err());
        assert!(deterministic_episode_id(1, 1, 10_000).is_err());
    }
}

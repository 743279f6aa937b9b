//! Episode-group materialization
//!
//! Turns a TMDB episode-group detail payload into the flat mapping rows the
//! match pipeline reads:
//!
//! - `custom_season_number` is the group's `order` (groups sorted by order
//!   ascending)
//! - `custom_episode_number` is the episode's 1-based position inside its
//!   group
//! - `absolute_episode_number` is the episode's `order` across the whole
//!   group, plus one

use crate::domain::entities::EpisodeGroupMapping;
use crate::infrastructure::metadata::tmdb::dto::EpisodeGroupDetails;

/// Flattens a group detail payload into mapping rows
pub fn materialize_group_mappings(
    tmdb_tv_id: i64,
    details: &EpisodeGroupDetails,
) -> Vec<EpisodeGroupMapping> {
    let mut groups: Vec<_> = details.groups.iter().collect();
    groups.sort_by_key(|g| g.order);

    let mut mappings = Vec::new();
    for season_group in groups {
        if season_group.episodes.is_empty() {
            continue;
        }
        for (episode_idx, episode) in season_group.episodes.iter().enumerate() {
            mappings.push(EpisodeGroupMapping {
                tmdb_tv_id,
                tmdb_episode_group_id: details.id.clone(),
                tmdb_episode_id: episode.id,
                tmdb_season_number: episode.season_number,
                tmdb_episode_number: episode.episode_number,
                custom_season_number: season_group.order,
                custom_episode_number: episode_idx as i32 + 1,
                absolute_episode_number: episode.order + 1,
            });
        }
    }
    mappings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::metadata::tmdb::dto::{GroupEpisode, GroupSeason};

    fn episode(id: i64, season: i32, number: i32, order: i32) -> GroupEpisode {
        GroupEpisode {
            id,
            name: format!("Episode {number}"),
            episode_number: number,
            season_number: season,
            order,
        }
    }

    #[test]
    fn materializes_custom_and_absolute_numbering() {
        let details = EpisodeGroupDetails {
            id: "g1".to_string(),
            name: "Broadcast Order".to_string(),
            groups: vec![
                GroupSeason {
                    id: "s2".to_string(),
                    name: "Part 2".to_string(),
                    order: 2,
                    episodes: vec![episode(201, 1, 13, 12), episode(202, 1, 14, 13)],
                },
                GroupSeason {
                    id: "s1".to_string(),
                    name: "Part 1".to_string(),
                    order: 1,
                    episodes: vec![episode(101, 1, 1, 0), episode(102, 1, 2, 1)],
                },
            ],
        };

        let mappings = materialize_group_mappings(1396, &details);
        assert_eq!(mappings.len(), 4);

        // Groups sorted by order: Part 1 first
        assert_eq!(mappings[0].tmdb_episode_id, 101);
        assert_eq!(mappings[0].custom_season_number, 1);
        assert_eq!(mappings[0].custom_episode_number, 1);
        assert_eq!(mappings[0].absolute_episode_number, 1);

        // Part 2's first episode: custom (2,1), absolute 13
        let part2_first = &mappings[2];
        assert_eq!(part2_first.tmdb_episode_id, 201);
        assert_eq!(part2_first.custom_season_number, 2);
        assert_eq!(part2_first.custom_episode_number, 1);
        assert_eq!(part2_first.absolute_episode_number, 13);
    }

    #[test]
    fn skips_empty_groups() {
        let details = EpisodeGroupDetails {
            id: "g2".to_string(),
            name: "Sparse".to_string(),
            groups: vec![GroupSeason {
                id: "s0".to_string(),
                name: "Specials".to_string(),
                order: 0,
                episodes: vec![],
            }],
        };
        assert!(materialize_group_mappings(1, &details).is_empty());
    }
}

//! Local leaderboard over the profiles stored on one device.
//!
//! Ordering is points, then level, then unlocked achievements (all
//! descending), then profile id ascending so the table is stable. Ranks use
//! competition numbering: entries tied on points, level and achievements
//! share a rank and the next rank skips ahead ("1, 2, 2, 4").

use std::cmp::Ordering;

use approb_core::stats::StatisticsView;
use approb_core::types::ProfileId;
use serde::Serialize;
use tracing::debug;

/// One profile's standing before ranking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    /// Profile the stats belong to.
    pub profile_id: ProfileId,
    /// Name shown in the table.
    pub display_name: String,
    /// Cumulative points.
    pub points: u64,
    /// Current level.
    pub level: u32,
    /// Number of unlocked achievements.
    pub achievements: usize,
}

impl LeaderboardEntry {
    /// Take the ranking fields from a profile's stats.
    #[must_use]
    pub fn from_stats(profile_id: ProfileId, display_name: impl Into<String>, stats: &StatisticsView) -> Self {
        Self {
            profile_id,
            display_name: display_name.into(),
            points: stats.points,
            level: stats.level,
            achievements: stats.achievements,
        }
    }

    fn score_cmp(&self, other: &Self) -> Ordering {
        other
            .points
            .cmp(&self.points)
            .then_with(|| other.level.cmp(&self.level))
            .then_with(|| other.achievements.cmp(&self.achievements))
    }
}

/// A ranked row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankedEntry {
    /// 1-based competition rank.
    pub rank: usize,
    /// The profile's standing.
    #[serde(flatten)]
    pub entry: LeaderboardEntry,
}

/// A ranked table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Leaderboard {
    rows: Vec<RankedEntry>,
}

impl Leaderboard {
    /// Sort and rank `entries`.
    #[must_use]
    pub fn rank(entries: impl IntoIterator<Item = LeaderboardEntry>) -> Self {
        let mut entries: Vec<_> = entries.into_iter().collect();
        entries.sort_by(|a, b| a.score_cmp(b).then_with(|| a.profile_id.cmp(&b.profile_id)));

        let mut rows: Vec<RankedEntry> = Vec::with_capacity(entries.len());
        for (index, entry) in entries.into_iter().enumerate() {
            let rank = match rows.last() {
                Some(prev) if prev.entry.score_cmp(&entry) == Ordering::Equal => prev.rank,
                _ => index + 1,
            };
            rows.push(RankedEntry { rank, entry });
        }

        debug!(profiles = rows.len(), "Leaderboard ranked");
        Self { rows }
    }

    /// All rows in rank order.
    #[must_use]
    pub fn rows(&self) -> &[RankedEntry] {
        &self.rows
    }

    /// The first `n` rows.
    #[must_use]
    pub fn top(&self, n: usize) -> &[RankedEntry] {
        &self.rows[..n.min(self.rows.len())]
    }

    /// The row for `profile_id`, if it was ranked.
    #[must_use]
    pub fn position_of(&self, profile_id: &ProfileId) -> Option<&RankedEntry> {
        self.rows.iter().find(|row| &row.entry.profile_id == profile_id)
    }

    /// Number of ranked profiles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether no profiles were ranked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str, points: u64, level: u32, achievements: usize) -> LeaderboardEntry {
        LeaderboardEntry {
            profile_id: ProfileId::from(id),
            display_name: id.to_uppercase(),
            points,
            level,
            achievements,
        }
    }

    fn ids(board: &Leaderboard) -> Vec<&str> {
        board.rows().iter().map(|r| r.entry.profile_id.as_str()).collect()
    }

    #[test]
    fn sorts_by_points_then_level_then_achievements() {
        let board = Leaderboard::rank([
            entry("a", 100, 2, 1),
            entry("b", 300, 3, 2),
            entry("c", 100, 3, 0),
            entry("d", 100, 3, 4),
        ]);
        assert_eq!(ids(&board), ["b", "d", "c", "a"]);
        let ranks: Vec<_> = board.rows().iter().map(|r| r.rank).collect();
        assert_eq!(ranks, [1, 2, 3, 4]);
    }

    #[test]
    fn ties_share_rank_and_skip() {
        let board = Leaderboard::rank([
            entry("zoe", 50, 1, 1),
            entry("amy", 50, 1, 1),
            entry("max", 80, 1, 1),
            entry("bob", 10, 1, 0),
        ]);
        assert_eq!(ids(&board), ["max", "amy", "zoe", "bob"]);
        let ranks: Vec<_> = board.rows().iter().map(|r| r.rank).collect();
        assert_eq!(ranks, [1, 2, 2, 4]);
    }

    #[test]
    fn lookup_and_top() {
        let board = Leaderboard::rank([entry("a", 1, 1, 0), entry("b", 2, 1, 0)]);
        assert_eq!(board.position_of(&ProfileId::from("a")).map(|r| r.rank), Some(2));
        assert!(board.position_of(&ProfileId::from("nobody")).is_none());
        assert_eq!(board.top(1).len(), 1);
        assert_eq!(board.top(10).len(), 2);
    }

    #[test]
    fn empty_board() {
        let board = Leaderboard::rank(Vec::<LeaderboardEntry>::new());
        assert!(board.is_empty());
        assert!(board.top(3).is_empty());
    }

    #[test]
    fn entry_from_stats() {
        let stats = StatisticsView::from_state(&approb_core::ProgressionState::default());
        let e = LeaderboardEntry::from_stats(ProfileId::from("p1"), "Dr. A", &stats);
        assert_eq!(e.level, 1);
        assert_eq!(e.points, 0);
        assert_eq!(e.display_name, "Dr. A");
    }
}

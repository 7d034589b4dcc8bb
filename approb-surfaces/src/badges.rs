//! Static badge metadata for the achievement shelf.
//!
//! The engine only knows achievement ids; titles, descriptions, icons and
//! tiers live here so copy changes never touch stored progress.

use approb_core::achievements::{Achievement, AchievementStatus};
use serde::Serialize;

/// Rarity tier, used for badge frame colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BadgeTier {
    /// First contact with a feature.
    Bronze,
    /// Sustained use.
    Silver,
    /// Serious commitment.
    Gold,
    /// Long-haul mastery.
    Platinum,
}

impl BadgeTier {
    /// CSS class for the badge frame.
    #[must_use]
    pub const fn css_class(self) -> &'static str {
        match self {
            Self::Bronze => "badge-bronze",
            Self::Silver => "badge-silver",
            Self::Gold => "badge-gold",
            Self::Platinum => "badge-platinum",
        }
    }
}

/// Display metadata for one achievement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BadgeInfo {
    /// Short title.
    pub title: &'static str,
    /// One-line unlock condition shown under the title.
    pub description: &'static str,
    /// Emoji icon.
    pub icon: &'static str,
    /// Rarity tier.
    pub tier: BadgeTier,
}

/// Metadata for `achievement`.
#[must_use]
pub const fn badge_info(achievement: Achievement) -> BadgeInfo {
    use BadgeTier::{Bronze, Gold, Platinum, Silver};

    let (title, description, icon, tier) = match achievement {
        Achievement::FirstSteps => ("First Steps", "Complete your first task", "👣", Bronze),
        Achievement::TaskMaster => ("Task Master", "Complete 10 tasks", "✅", Silver),
        Achievement::MilestoneReached => ("Milestone Reached", "Complete your first checklist step", "🚩", Bronze),
        Achievement::HalfwayThere => ("Halfway There", "Complete 5 checklist steps", "🏁", Gold),
        Achievement::QuizRookie => ("Quiz Rookie", "Finish your first quiz", "📝", Bronze),
        Achievement::QuizMaster => ("Quiz Master", "Finish 10 quizzes averaging at least 80%", "🎓", Gold),
        Achievement::Perfectionist => ("Perfectionist", "Finish 5 or more quizzes, every one at 100%", "💯", Platinum),
        Achievement::AiExplorer => ("AI Explorer", "Ask the AI tutor 10 questions", "🤖", Silver),
        Achievement::DocumentPro => ("Document Pro", "Upload 5 documents", "📄", Silver),
        Achievement::DedicatedLearner => ("Dedicated Learner", "Study for 10 hours", "📚", Gold),
        Achievement::WeekWarrior => ("Week Warrior", "Keep a 7-day streak", "🔥", Silver),
        Achievement::MonthChampion => ("Month Champion", "Keep a 30-day streak", "🏆", Platinum),
        Achievement::Level5 => ("Level 5", "Reach level 5", "⭐", Bronze),
        Achievement::Level10 => ("Level 10", "Reach level 10", "🌟", Silver),
        Achievement::Level15 => ("Level 15", "Reach level 15", "💫", Gold),
        Achievement::Level20 => ("Level 20", "Reach level 20", "👑", Platinum),
        Achievement::PointCollector => ("Point Collector", "Collect 1000 points", "💎", Silver),
    };

    BadgeInfo {
        title,
        description,
        icon,
        tier,
    }
}

/// One badge on the shelf: an achievement row joined with its metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Badge {
    /// Stable achievement id.
    pub id: Achievement,
    /// Whether the badge is earned (rendered greyed out otherwise).
    pub unlocked: bool,
    /// Display metadata.
    #[serde(flatten)]
    pub info: BadgeInfo,
}

/// Join `get_achievements()` rows with their metadata, keeping row order.
#[must_use]
pub fn badge_shelf(rows: &[AchievementStatus]) -> Vec<Badge> {
    rows.iter()
        .map(|row| Badge {
            id: row.id,
            unlocked: row.unlocked,
            info: badge_info(row.id),
        })
        .collect()
}

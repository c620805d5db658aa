use serde::{Deserialize, Serialize};

/// Number of real fixtures in one matchday of the reference league
pub const FIXTURES_PER_MATCHDAY: usize = 9;

/// A real match of the matchday, identified by its two team names
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fixture {
    /// Home team name as written in the tip sheet
    pub home: String,

    /// Away team name as written in the tip sheet
    pub away: String,
}

impl Fixture {
    pub fn new(home: impl Into<String>, away: impl Into<String>) -> Self {
        Self {
            home: home.into(),
            away: away.into(),
        }
    }

    /// Whether both team names occur somewhere in an already lowercased line
    pub fn is_mentioned_in(&self, lowered_line: &str) -> bool {
        lowered_line.contains(&self.home.to_lowercase())
            && lowered_line.contains(&self.away.to_lowercase())
    }
}

/// A participant's predicted final score for one fixture
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tip {
    pub fixture: Fixture,
    pub home_goals: u32,
    pub away_goals: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_mentioned_in_ignores_case() {
        let fixture = Fixture::new("Bayern", "Dortmund");

        assert!(fixture.is_mentioned_in("sa 15:30 bayern - dortmund 2:1"));
        assert!(fixture.is_mentioned_in("dortmund gegen bayern"));
        assert!(!fixture.is_mentioned_in("bayern gewinnt 2:1"));
    }
}

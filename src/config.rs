use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::debug;

use crate::matching::ScoreStrategyKind;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// File listing the leagues and their tip sheets
    pub leagues_file: PathBuf,

    /// User agent sent to the forum
    pub forum_user_agent: String,

    /// Timeout in seconds for a single forum request
    pub forum_timeout: u64,

    /// How scores are picked out of tip lines
    pub score_strategy: ScoreStrategyKind,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Config {
            leagues_file: env::var("LEAGUES_FILE")
                .unwrap_or_else(|_| "leagues.txt".to_string())
                .into(),

            forum_user_agent: env::var("FORUM_USER_AGENT")
                .unwrap_or_else(|_| format!("matchday-tips/{}", env!("CARGO_PKG_VERSION"))),

            forum_timeout: env::var("FORUM_TIMEOUT_SECS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .context("FORUM_TIMEOUT_SECS must be a valid number")?,

            score_strategy: env::var("TIP_SCORE_STRATEGY")
                .unwrap_or_else(|_| ScoreStrategyKind::default().as_str().to_string())
                .parse()
                .context("TIP_SCORE_STRATEGY must be 'trailing' or 'kickoff'")?,
        })
    }

    pub fn forum_timeout(&self) -> Duration {
        Duration::from_secs(self.forum_timeout)
    }
}

/// One league entry of the leagues file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeagueSettings {
    /// Display name of the league
    pub name: String,

    /// Tip sheet of the league
    pub sheet_path: PathBuf,
}

impl LeagueSettings {
    pub fn database_url(&self) -> String {
        format!("sqlite:{}", self.sheet_path.display())
    }
}

/// Read the leagues file.
///
/// Line format: `League Name = path/to/sheet.db`. `#` starts a comment.
/// Relative sheet paths are taken from the leagues file's directory.
pub fn load_leagues(path: &Path) -> Result<Vec<LeagueSettings>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read leagues file {}", path.display()))?;
    let base_dir = path.parent().unwrap_or_else(|| Path::new(""));

    parse_leagues(&content, base_dir)
}

fn parse_leagues(content: &str, base_dir: &Path) -> Result<Vec<LeagueSettings>> {
    let mut leagues = Vec::new();

    for (number, line) in content.lines().enumerate() {
        let relevant = line.split('#').next().unwrap_or_default().trim();
        if relevant.is_empty() {
            continue;
        }

        let (name, sheet) = relevant
            .split_once('=')
            .with_context(|| format!("Line {} of leagues file has no '='", number + 1))?;
        let (name, sheet) = (name.trim(), sheet.trim());
        if name.is_empty() || sheet.is_empty() {
            anyhow::bail!("Line {} of leagues file needs a name and a sheet", number + 1);
        }

        let sheet_path = base_dir.join(sheet);
        if !sheet_path.is_file() {
            anyhow::bail!("Tip sheet \"{}\" not found", sheet_path.display());
        }

        debug!("League {} uses {}", name, sheet_path.display());
        leagues.push(LeagueSettings {
            name: name.to_string(),
            sheet_path,
        });
    }

    Ok(leagues)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_leagues_with_comments() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bl.db"), b"").unwrap();
        std::fs::write(dir.path().join("bl2.db"), b"").unwrap();
        let leagues_file = dir.path().join("leagues.txt");
        std::fs::write(
            &leagues_file,
            "# leagues\n\nBundesliga = bl.db # first\n2. Bundesliga=bl2.db\n",
        )
        .unwrap();

        let leagues = load_leagues(&leagues_file).unwrap();

        assert_eq!(leagues.len(), 2);
        assert_eq!(leagues[0].name, "Bundesliga");
        assert_eq!(leagues[0].sheet_path, dir.path().join("bl.db"));
        assert_eq!(leagues[1].name, "2. Bundesliga");
        assert!(leagues[1].database_url().starts_with("sqlite:"));
    }

    #[test]
    fn test_missing_sheet_is_an_error() {
        let dir = tempfile::tempdir().unwrap();

        let result = parse_leagues("Bundesliga = missing.db", dir.path());

        assert!(result.is_err());
    }

    #[test]
    fn test_line_without_separator_is_an_error() {
        let dir = tempfile::tempdir().unwrap();

        let err = parse_leagues("Bundesliga", dir.path()).unwrap_err();

        assert!(err.to_string().contains("Line 1"));
    }
}

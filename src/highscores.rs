//! Persist the best score (XDG config or ~/.config/candytui).

use anyhow::Result;
use std::fs;
use std::path::PathBuf;

const FILENAME: &str = "highscore";

/// `$XDG_CONFIG_HOME/candytui/highscore`, falling back to `~/.config`.
fn config_path() -> PathBuf {
    let base = match std::env::var("XDG_CONFIG_HOME") {
        Ok(xdg) if !xdg.is_empty() => PathBuf::from(xdg),
        _ => std::env::var("HOME")
            .map(|h| PathBuf::from(h).join(".config"))
            .unwrap_or_else(|_| PathBuf::from(".")),
    };
    base.join("candytui").join(FILENAME)
}

/// First line as a score; anything unreadable counts as 0.
fn parse_high_score(content: &str) -> u32 {
    content
        .lines()
        .next()
        .and_then(|l| l.trim().parse().ok())
        .unwrap_or(0)
}

/// Best score on disk; 0 on missing or unreadable file.
pub fn load_high_score() -> u32 {
    fs::read_to_string(config_path())
        .map(|c| parse_high_score(&c))
        .unwrap_or(0)
}

/// Save the best score. Creates the config directory if needed.
pub fn save_high_score(score: u32) -> Result<()> {
    let path = config_path();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, format!("{score}\n"))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_first_line_or_zero() {
        assert_eq!(parse_high_score("4200\n"), 4200);
        assert_eq!(parse_high_score("  17  \nextra"), 17);
        assert_eq!(parse_high_score("garbage"), 0);
        assert_eq!(parse_high_score(""), 0);
    }
}

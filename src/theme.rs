//! Theme loading: btop-style `theme[key]="value"` and hex → ratatui Color.

use crate::Palette;
use candytui::config::DEFAULT_TOKEN_TYPES;
use ratatui::style::Color;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// One Dark token colours, in `DEFAULT_TOKEN_TYPES` order.
const ONEDARK_TOKENS: [Color; 6] = [
    Color::Rgb(0x98, 0xC3, 0x79), // green
    Color::Rgb(0xE5, 0xC0, 0x7B), // yellow
    Color::Rgb(0xE0, 0x6C, 0x75), // red
    Color::Rgb(0x61, 0xAF, 0xEF), // blue
    Color::Rgb(0xC6, 0x78, 0xDD), // magenta
    Color::Rgb(0x56, 0xB6, 0xC2), // cyan
];

const HIGH_CONTRAST_TOKENS: [Color; 6] = [
    Color::Rgb(0x00, 0xFF, 0x00),
    Color::Rgb(0xFF, 0xFF, 0x00),
    Color::Rgb(0xFF, 0x00, 0x00),
    Color::Rgb(0x00, 0x88, 0xFF),
    Color::Rgb(0xFF, 0x00, 0xFF),
    Color::Rgb(0x00, 0xFF, 0xFF),
];

/// Tol's bright scheme; no red/green pair carries meaning alone.
const COLORBLIND_TOKENS: [Color; 6] = [
    Color::Rgb(0x00, 0x77, 0xBB),
    Color::Rgb(0xEE, 0x77, 0x33),
    Color::Rgb(0x00, 0x99, 0x88),
    Color::Rgb(0xCC, 0x33, 0x11),
    Color::Rgb(0xEE, 0x33, 0x77),
    Color::Rgb(0xBB, 0xBB, 0x00),
];

#[derive(Debug, Clone)]
pub struct Theme {
    /// Token colours, indexed like `DEFAULT_TOKEN_TYPES`.
    pub tokens: [Color; 6],
    /// Board background.
    pub bg: Color,
    /// Borders.
    pub div_line: Color,
    pub main_fg: Color,
    /// Titles, cursor and menu highlight.
    pub title: Color,
    /// Secondary text and the hint outline.
    pub inactive_fg: Color,
    /// Background of the selected cell.
    pub selected_bg: Color,
}

#[derive(Debug, Error)]
pub enum ThemeError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid hex: {0}")]
    InvalidHex(String),
}

impl Default for Theme {
    fn default() -> Self {
        Self::onedark_default()
    }
}

impl Theme {
    pub fn onedark_default() -> Self {
        Self {
            tokens: ONEDARK_TOKENS,
            bg: Color::Rgb(0x31, 0x35, 0x3F),
            div_line: Color::Rgb(0x3F, 0x44, 0x4F),
            main_fg: Color::Rgb(0xAB, 0xB2, 0xBF),
            title: Color::Rgb(0xE5, 0xC0, 0x7B),
            inactive_fg: Color::Rgb(0x5C, 0x63, 0x70),
            selected_bg: Color::Rgb(0x4B, 0x52, 0x63),
        }
    }

    /// Load a btop-style theme file, then apply `palette`.
    /// A missing path means One Dark.
    pub fn load(path: Option<&Path>, palette: Palette) -> Result<Self, ThemeError> {
        let mut theme = match path {
            Some(p) if p.exists() => Self::from_map(&parse_theme_file(&std::fs::read_to_string(p)?)),
            _ => Self::onedark_default(),
        };
        theme.apply_palette(palette);
        Ok(theme)
    }

    /// Swap token colours for high-contrast or colorblind play.
    pub fn apply_palette(&mut self, palette: Palette) {
        match palette {
            Palette::Normal => {}
            Palette::HighContrast => self.tokens = HIGH_CONTRAST_TOKENS,
            Palette::Colorblind => self.tokens = COLORBLIND_TOKENS,
        }
    }

    fn from_map(map: &HashMap<String, String>) -> Self {
        let get = |keys: &[&str]| keys.iter().find_map(|k| map.get(*k).and_then(|v| parse_hex(v).ok()));
        let d = Self::onedark_default();
        // Token keys follow onedark.theme: each colour comes from the box that uses it.
        Self {
            tokens: [
                get(&["mem_box", "cpu_start"]).unwrap_or(d.tokens[0]),
                get(&["title", "cpu_mid"]).unwrap_or(d.tokens[1]),
                get(&["cpu_end", "temp_end"]).unwrap_or(d.tokens[2]),
                get(&["cpu_box"]).unwrap_or(d.tokens[3]),
                get(&["net_box"]).unwrap_or(d.tokens[4]),
                get(&["hi_fg", "proc_misc"]).unwrap_or(d.tokens[5]),
            ],
            bg: get(&["meter_bg"]).unwrap_or(d.bg),
            div_line: get(&["div_line"]).unwrap_or(d.div_line),
            main_fg: get(&["main_fg"]).unwrap_or(d.main_fg),
            title: get(&["title"]).unwrap_or(d.title),
            inactive_fg: get(&["inactive_fg"]).unwrap_or(d.inactive_fg),
            selected_bg: get(&["selected_bg"]).unwrap_or(d.selected_bg),
        }
    }

    /// Colour of an ordinary token type. Unknown types share the first colour.
    pub fn token_color(&self, type_id: &str) -> Color {
        let index = DEFAULT_TOKEN_TYPES
            .iter()
            .position(|t| *t == type_id)
            .unwrap_or(0);
        self.tokens[index]
    }

    /// Colour-clear tokens cycle through the palette.
    pub fn rainbow_color(&self, frame: u64, column: usize) -> Color {
        self.tokens[((frame / 6) as usize + column) % self.tokens.len()]
    }
}

/// Parse btop-style theme file into key -> value map.
fn parse_theme_file(s: &str) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for line in s.lines().map(str::trim) {
        if line.starts_with('#') {
            continue;
        }
        let Some(stripped) = line.strip_prefix("theme[") else {
            continue;
        };
        let Some((key, rest)) = stripped.split_once(']') else {
            continue;
        };
        let Some((_, value)) = rest.split_once('=') else {
            continue;
        };
        let value = value.trim().trim_matches('"').trim_matches('\'');
        if !value.is_empty() {
            map.insert(key.trim().to_string(), value.to_string());
        }
    }
    map
}

/// Parse hex colour "#RRGGBB" or "#RGB" into ratatui Color.
pub fn parse_hex(s: &str) -> Result<Color, ThemeError> {
    let s = s.trim().trim_start_matches('#');
    let invalid = || ThemeError::InvalidHex(s.to_string());
    let channel = |digits: &str| u8::from_str_radix(digits, 16).map_err(|_| invalid());
    match s.len() {
        6 if s.is_ascii() => Ok(Color::Rgb(
            channel(&s[0..2])?,
            channel(&s[2..4])?,
            channel(&s[4..6])?,
        )),
        3 if s.is_ascii() => Ok(Color::Rgb(
            channel(&s[0..1])? * 17,
            channel(&s[1..2])? * 17,
            channel(&s[2..3])? * 17,
        )),
        _ => Err(invalid()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_6() {
        let c = parse_hex("#98C379").unwrap();
        assert!(matches!(c, Color::Rgb(0x98, 0xC3, 0x79)));
    }

    #[test]
    fn test_parse_hex_3() {
        let c = parse_hex("#FFF").unwrap();
        assert!(matches!(c, Color::Rgb(255, 255, 255)));
        assert!(parse_hex("#12345").is_err());
    }

    #[test]
    fn test_parse_theme_line() {
        let map = parse_theme_file(r##"theme[meter_bg]="#31353F""##);
        assert_eq!(map.get("meter_bg"), Some(&"#31353F".to_string()));
    }

    #[test]
    fn theme_keys_override_token_colours() {
        let map = parse_theme_file("theme[cpu_box]=\"#010203\"\n# theme[net_box]=\"#FFFFFF\"");
        let theme = Theme::from_map(&map);
        assert_eq!(theme.token_color("blue"), Color::Rgb(1, 2, 3));
        assert_eq!(theme.token_color("magenta"), ONEDARK_TOKENS[4]);
    }

    #[test]
    fn palettes_replace_token_colours() {
        let mut theme = Theme::default();
        theme.apply_palette(Palette::Colorblind);
        assert_eq!(theme.tokens, COLORBLIND_TOKENS);
        assert_eq!(theme.bg, Theme::default().bg);
    }
}

//! Dashboard colours, picked to suit the terminal background.

use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::block::BorderType;

use crate::data::{HealthStatus, Trend};

/// Colours and styles used by every dashboard view.
#[derive(Debug, Clone)]
pub struct Theme {
    /// Titles, the selected tab and other accents.
    pub accent: Color,
    pub ok: Color,
    pub warn: Color,
    pub crit: Color,
    /// Secondary text such as timestamps and NULL values.
    pub muted: Color,
    pub border: Color,
    /// Column headings and panel titles.
    pub title: Style,
    pub tab_active: Style,
    pub tab_inactive: Style,
    pub border_type: BorderType,
}

impl Theme {
    /// For dark terminal backgrounds.
    pub fn dark() -> Self {
        Self {
            accent: Color::Cyan,
            ok: Color::Green,
            warn: Color::Yellow,
            crit: Color::Red,
            muted: Color::DarkGray,
            border: Color::Gray,
            title: Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            tab_active: Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            tab_inactive: Style::default().fg(Color::Gray),
            border_type: BorderType::Rounded,
        }
    }

    /// For light terminal backgrounds.
    pub fn light() -> Self {
        Self {
            accent: Color::Blue,
            ok: Color::Green,
            warn: Color::Yellow,
            crit: Color::Red,
            muted: Color::Gray,
            border: Color::DarkGray,
            title: Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
            tab_active: Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
            tab_inactive: Style::default().fg(Color::DarkGray),
            border_type: BorderType::Rounded,
        }
    }

    /// Pick light or dark from the terminal's background luminance.
    pub fn auto_detect() -> Self {
        match terminal_light::luma() {
            Ok(luma) if luma > 0.5 => Self::light(),
            _ => Self::dark(),
        }
    }

    pub fn health_style(&self, status: HealthStatus) -> Style {
        match status {
            HealthStatus::Healthy => Style::default().fg(self.ok),
            HealthStatus::Warning => Style::default().fg(self.warn),
            HealthStatus::Critical => Style::default().fg(self.crit).add_modifier(Modifier::BOLD),
        }
    }

    /// Green for a running replication thread, bold red otherwise.
    pub fn thread_style(&self, running: bool) -> Style {
        if running {
            Style::default().fg(self.ok)
        } else {
            Style::default().fg(self.crit).add_modifier(Modifier::BOLD)
        }
    }

    pub fn trend_style(&self, trend: Trend) -> Style {
        match trend {
            Trend::CatchingUp(_) => Style::default().fg(self.ok),
            Trend::FallingBehind(_) => Style::default().fg(self.warn),
            Trend::Steady => Style::default().fg(self.muted),
        }
    }

    pub fn muted_style(&self) -> Style {
        Style::default().fg(self.muted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_critical_is_bold() {
        let theme = Theme::dark();
        let style = theme.health_style(HealthStatus::Critical);
        assert_eq!(style.fg, Some(Color::Red));
        assert!(style.add_modifier.contains(Modifier::BOLD));
        assert_eq!(theme.health_style(HealthStatus::Healthy).fg, Some(Color::Green));
    }

    #[test]
    fn test_trend_colours() {
        let theme = Theme::light();
        assert_eq!(theme.trend_style(Trend::CatchingUp(1.0)).fg, Some(theme.ok));
        assert_eq!(theme.trend_style(Trend::FallingBehind(1.0)).fg, Some(theme.warn));
        assert_eq!(theme.trend_style(Trend::Steady).fg, Some(theme.muted));
        assert_eq!(theme.thread_style(false).fg, Some(theme.crit));
    }
}

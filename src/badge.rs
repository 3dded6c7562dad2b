//! Counter indicator shown next to the sites list.

use parking_lot::Mutex;

/// Background colour used whenever the counter is updated after an insert.
pub const ACCENT_COLOR: &str = "#4CAF50";

pub trait Badge: Send + Sync {
    fn set_text(&self, text: &str);
    fn set_background_color(&self, color: &str);
}

/// Badge that only reports changes through tracing.
#[derive(Debug, Default)]
pub struct TracingBadge;

impl Badge for TracingBadge {
    fn set_text(&self, text: &str) {
        tracing::debug!("Badge text: {:?}", text);
    }

    fn set_background_color(&self, color: &str) {
        tracing::debug!("Badge color: {}", color);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BadgeState {
    pub text: String,
    pub color: Option<String>,
    pub updates: usize,
}

/// Badge that remembers its last state.
#[derive(Debug, Default)]
pub struct RecordingBadge {
    state: Mutex<BadgeState>,
}

impl RecordingBadge {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> BadgeState {
        self.state.lock().clone()
    }
}

impl Badge for RecordingBadge {
    fn set_text(&self, text: &str) {
        let mut state = self.state.lock();
        state.text = text.to_string();
        state.updates += 1;
    }

    fn set_background_color(&self, color: &str) {
        self.state.lock().color = Some(color.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_badge_tracks_updates() {
        let badge = RecordingBadge::new();
        assert_eq!(badge.state(), BadgeState::default());

        badge.set_text("3");
        badge.set_background_color(ACCENT_COLOR);
        badge.set_text("4");

        let state = badge.state();
        assert_eq!(state.text, "4");
        assert_eq!(state.color.as_deref(), Some(ACCENT_COLOR));
        assert_eq!(state.updates, 2);
    }
}

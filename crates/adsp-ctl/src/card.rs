/// Virtual front-end half of a dynamic routing path.
///
/// Resolved from a link name once at topology load; the control layer
/// only flips activity state on an already-resolved handle.
#[derive(Debug, Clone)]
pub struct FrontEnd {
    link_name: String,
    supports_playback: bool,
    supports_capture: bool,
    pub playback_active: bool,
    pub capture_active: bool,
    pub active_streams: u32,
}

impl FrontEnd {
    pub fn new(
        link_name: impl Into<String>,
        supports_playback: bool,
        supports_capture: bool,
    ) -> Self {
        Self {
            link_name: link_name.into(),
            supports_playback,
            supports_capture,
            playback_active: false,
            capture_active: false,
            active_streams: 0,
        }
    }

    pub fn link_name(&self) -> &str {
        &self.link_name
    }

    pub(crate) fn set_active(&mut self, active: bool) {
        if self.supports_playback {
            self.playback_active = active;
        }
        if self.supports_capture {
            self.capture_active = active;
        }
        if active {
            self.active_streams += 1;
        } else {
            self.active_streams = self.active_streams.saturating_sub(1);
        }
    }
}

/// Runtime services the card provides to the control layer.
pub trait CardRuntime {
    /// Front-end previously registered for `link_name`, if any.
    fn front_end_mut(&mut self, link_name: &str) -> Option<&mut FrontEnd>;

    /// Ask the card to re-evaluate dynamic routing so back-end paths
    /// matching the active front-ends are brought up.
    fn request_runtime_update(&mut self);
}

/// Default card registry: the link-name → front-end mapping built at
/// topology load.
#[derive(Debug, Default)]
pub struct Card {
    front_ends: Vec<FrontEnd>,
    pending_runtime_updates: u32,
}

impl Card {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_front_end(&mut self, fe: FrontEnd) {
        self.front_ends.push(fe);
    }

    pub fn front_end(&self, link_name: &str) -> Option<&FrontEnd> {
        self.front_ends.iter().find(|fe| fe.link_name == link_name)
    }

    /// Number of runtime re-evaluations requested since the last call.
    pub fn take_runtime_updates(&mut self) -> u32 {
        std::mem::take(&mut self.pending_runtime_updates)
    }
}

impl CardRuntime for Card {
    fn front_end_mut(&mut self, link_name: &str) -> Option<&mut FrontEnd> {
        self.front_ends
            .iter_mut()
            .find(|fe| fe.link_name == link_name)
    }

    fn request_runtime_update(&mut self) {
        self.pending_runtime_updates += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_active_touches_only_supported_directions() {
        let mut fe = FrontEnd::new("Media", true, false);
        fe.set_active(true);
        assert!(fe.playback_active);
        assert!(!fe.capture_active);
        assert_eq!(fe.active_streams, 1);

        fe.set_active(false);
        assert!(!fe.playback_active);
        assert_eq!(fe.active_streams, 0);
    }

    #[test]
    fn active_stream_count_does_not_underflow() {
        let mut fe = FrontEnd::new("Media", true, true);
        fe.set_active(false);
        assert_eq!(fe.active_streams, 0);
    }

    #[test]
    fn card_resolves_front_ends_by_link_name() {
        let mut card = Card::new();
        card.add_front_end(FrontEnd::new("Media", true, true));
        card.add_front_end(FrontEnd::new("Tone", true, false));

        assert!(card.front_end_mut("Tone").is_some());
        assert!(card.front_end_mut("Voice").is_none());

        card.request_runtime_update();
        assert_eq!(card.take_runtime_updates(), 1);
        assert_eq!(card.take_runtime_updates(), 0);
    }
}

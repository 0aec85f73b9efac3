//! Fade/slide transition state on the main region.

use std::time::Duration;

use crate::dom::Element;

pub const TRANSITIONING_CLASS: &str = "page-transitioning";
pub const LOADED_CLASS: &str = "page-loaded";

pub const SLIDE_TRANSITION: &str = "transform 0.7s ease-out, opacity 0.7s ease-out";

/// Delays that shape a page swap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionTimings {
    /// Wait between starting the fade-out and swapping the markup.
    pub fade_out: Duration,
    /// Wait between starting the slide-in and clearing transition state.
    pub settle: Duration,
    /// Length of one animation frame.
    pub frame: Duration,
}

impl Default for TransitionTimings {
    fn default() -> Self {
        Self {
            fade_out: Duration::from_millis(300),
            settle: Duration::from_millis(700),
            frame: Duration::from_millis(16),
        }
    }
}

impl TransitionTimings {
    /// No waiting at all; frame boundaries still yield to other tasks.
    pub fn instant() -> Self {
        Self {
            fade_out: Duration::ZERO,
            settle: Duration::ZERO,
            frame: Duration::ZERO,
        }
    }

    /// Wait for the next frame boundary.
    pub async fn next_frame(&self) {
        if self.frame.is_zero() {
            tokio::task::yield_now().await;
        } else {
            tokio::time::sleep(self.frame).await;
        }
    }
}

/// Place the freshly swapped region at its start position.
pub fn reset_for_entry(main: &mut Element) {
    main.set_style("transform", "translateY(30px)");
    main.set_style("opacity", "0");
}

/// Start the timed slide-in.
pub fn start_entry(main: &mut Element) {
    main.set_style("transition", SLIDE_TRANSITION);
    main.set_style("transform", "translateY(0)");
    main.set_style("opacity", "1");
}

/// Clear the transition and mark the region loaded.
pub fn finish(main: &mut Element) {
    main.set_style("transition", "");
    main.remove_class(TRANSITIONING_CLASS);
    main.add_class(LOADED_CLASS);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_sequence_styles() {
        let mut main = Element::new("main");
        reset_for_entry(&mut main);
        assert_eq!(main.style("transform").as_deref(), Some("translateY(30px)"));
        assert_eq!(main.style("opacity").as_deref(), Some("0"));

        start_entry(&mut main);
        assert_eq!(main.style("transition").as_deref(), Some(SLIDE_TRANSITION));
        assert_eq!(main.style("transform").as_deref(), Some("translateY(0)"));
        assert_eq!(main.style("opacity").as_deref(), Some("1"));
    }

    #[test]
    fn test_finish_clears_transition() {
        let mut main = Element::new("main").with_attr("class", TRANSITIONING_CLASS);
        start_entry(&mut main);
        finish(&mut main);

        assert_eq!(main.style("transition"), None);
        assert_eq!(main.style("opacity").as_deref(), Some("1"));
        assert!(!main.has_class(TRANSITIONING_CLASS));
        assert!(main.has_class(LOADED_CLASS));
    }

    #[test]
    fn test_default_timings() {
        let timings = TransitionTimings::default();
        assert_eq!(timings.fade_out, Duration::from_millis(300));
        assert_eq!(timings.settle, Duration::from_millis(700));
        assert!(TransitionTimings::instant().frame.is_zero());
    }
}

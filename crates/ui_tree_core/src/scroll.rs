use std::time::Duration;

use crate::geometry::Viewport;

/// Clock-driven scroll nudger used while a drag hovers near a viewport edge.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AutoScroller {
    enabled: bool,
    velocity: f32,
    last_tick: Option<Duration>,
}

impl AutoScroller {
    pub fn start(&mut self) {
        self.enabled = true;
        self.velocity = 0.0;
        self.last_tick = None;
    }

    pub fn stop(&mut self) {
        self.enabled = false;
        self.velocity = 0.0;
        self.last_tick = None;
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.enabled
    }

    /// Signed speed in pixels per second; positive scrolls towards the end.
    #[inline]
    pub fn velocity(&self) -> f32 {
        self.velocity
    }

    pub fn set_velocity(&mut self, velocity: f32) {
        if velocity != self.velocity {
            tracing::trace!(message = "ui_tree.autoscroll", from = self.velocity, to = velocity);
        }
        self.velocity = velocity;
    }

    /// Advance the viewport by `velocity × elapsed`. Returns the applied scroll delta.
    ///
    /// A tick while stopped or idle (zero velocity) only records the timing baseline,
    /// so resuming never jumps by the whole pause.
    pub fn tick(&mut self, now: Duration, viewport: &mut dyn Viewport) -> Option<f32> {
        if !self.enabled {
            return None;
        }

        let Some(last) = self.last_tick.filter(|_| self.velocity != 0.0) else {
            self.last_tick = Some(now);
            return None;
        };
        self.last_tick = Some(now);

        let elapsed = now.saturating_sub(last).as_secs_f32();
        let before = viewport.scroll_top();
        let target = (before + self.velocity * elapsed).clamp(0.0, viewport.max_scroll_top());
        viewport.set_scroll_top(target);
        Some(viewport.scroll_top() - before)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::ViewportMetrics;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    #[test]
    fn first_tick_is_a_baseline() {
        let mut viewport = ViewportMetrics::new(100.0, 1000.0, 200.0);
        let mut scroller = AutoScroller::default();
        scroller.start();
        scroller.set_velocity(200.0);

        assert_eq!(scroller.tick(ms(5_000), &mut viewport), None);
        assert_eq!(viewport.scroll_top, 100.0);

        let delta = scroller.tick(ms(5_100), &mut viewport).unwrap();
        assert!((delta - 20.0).abs() < 1e-3);
        assert!((viewport.scroll_top - 120.0).abs() < 1e-3);
    }

    #[test]
    fn zero_velocity_keeps_rebasing() {
        let mut viewport = ViewportMetrics::new(100.0, 1000.0, 200.0);
        let mut scroller = AutoScroller::default();
        scroller.start();
        scroller.tick(ms(0), &mut viewport);
        scroller.tick(ms(2_000), &mut viewport);

        scroller.set_velocity(-200.0);
        let delta = scroller.tick(ms(2_050), &mut viewport).unwrap();
        assert!((delta + 10.0).abs() < 1e-3);
    }

    #[test]
    fn clamps_to_scrollable_range() {
        let mut viewport = ViewportMetrics::new(790.0, 1000.0, 200.0);
        let mut scroller = AutoScroller::default();
        scroller.start();
        scroller.set_velocity(200.0);
        scroller.tick(ms(0), &mut viewport);
        scroller.tick(ms(1_000), &mut viewport);
        assert_eq!(viewport.scroll_top, 800.0);
    }

    #[test]
    fn stopped_scroller_ignores_ticks() {
        let mut viewport = ViewportMetrics::new(0.0, 1000.0, 200.0);
        let mut scroller = AutoScroller::default();
        scroller.set_velocity(200.0);
        assert_eq!(scroller.tick(ms(0), &mut viewport), None);
        assert_eq!(scroller.tick(ms(100), &mut viewport), None);
        assert_eq!(viewport.scroll_top, 0.0);
    }
}

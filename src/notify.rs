use std::time::{Duration, Instant};

pub const TOAST_DURATION: Duration = Duration::from_millis(3000);

#[derive(Debug, Clone)]
struct Timer {
    deadline: Instant,
}

/// Single-slot, self-expiring user message.
///
/// Each `show` replaces the current message and re-arms the dismissal timer.
/// Expiry is observed by calling [`ToastNotifier::tick`] from the event loop.
#[derive(Debug, Clone)]
pub struct ToastNotifier {
    message: String,
    timer: Option<Timer>,
    duration: Duration,
}

impl Default for ToastNotifier {
    fn default() -> Self {
        Self::with_duration(TOAST_DURATION)
    }
}

impl ToastNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_duration(duration: Duration) -> Self {
        Self {
            message: String::new(),
            timer: None,
            duration,
        }
    }

    pub fn show(&mut self, message: impl Into<String>) {
        self.show_at(message, Instant::now());
    }

    pub fn show_at(&mut self, message: impl Into<String>, now: Instant) {
        self.message = message.into();
        // dropping the previous timer cancels it
        self.timer = if self.message.is_empty() {
            None
        } else {
            Some(Timer {
                deadline: now + self.duration,
            })
        };
    }

    /// Clears the slot once the timer has run out. Returns true if it did.
    pub fn tick(&mut self, now: Instant) -> bool {
        match &self.timer {
            Some(timer) if now >= timer.deadline => {
                self.message.clear();
                self.timer = None;
                true
            }
            _ => false,
        }
    }

    /// The message currently in the slot, `""` when nothing is shown.
    pub fn current(&self) -> &str {
        &self.message
    }

    pub fn is_visible(&self) -> bool {
        !self.message.is_empty()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.timer.as_ref().map(|t| t.deadline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn message_expires_after_three_seconds() {
        let start = Instant::now();
        let mut toast = ToastNotifier::new();
        toast.show_at("m", start);
        assert_eq!(toast.current(), "m");

        assert!(!toast.tick(start + ms(2999)));
        assert_eq!(toast.current(), "m");

        assert!(toast.tick(start + ms(3000)));
        assert_eq!(toast.current(), "");
    }

    #[test]
    fn second_show_rearms_the_timer() {
        let start = Instant::now();
        let mut toast = ToastNotifier::new();
        toast.show_at("m", start);
        toast.show_at("n", start + ms(1000));

        toast.tick(start + ms(3000));
        assert_eq!(toast.current(), "n");
        toast.tick(start + ms(3500));
        assert_eq!(toast.current(), "n");
        toast.tick(start + ms(4000));
        assert_eq!(toast.current(), "");
    }

    #[test]
    fn empty_message_clears_immediately() {
        let start = Instant::now();
        let mut toast = ToastNotifier::new();
        toast.show_at("m", start);
        toast.show_at("", start + ms(10));
        assert!(!toast.is_visible());
        assert!(toast.deadline().is_none());
        assert!(!toast.tick(start + ms(5000)));
    }
}

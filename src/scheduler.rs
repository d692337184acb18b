//! ScanScheduler: when to rescan the render tree
//!
//! Pure timing state. The host feeds it observations (mutation batches,
//! location changes, search submits) stamped with a millisecond clock and
//! asks `take_due(now)` whether a rescan should run. Nothing here reads the
//! tree or owns a timer; the host arms one timer for `next_wakeup()`.
//!
//! # Sources
//! - Mutations reset a single debounce deadline (`now + debounce_ms`). A new
//!   batch never stacks a second deadline.
//! - A location change or search submit schedules a burst of rescans at
//!   increasing delays to catch staggered re-renders.
//! - The location is also polled every `location_poll_ms` as a fallback for
//!   navigations that bypass the history hooks.
//!
//! Everything due at one `take_due` call is coalesced into one rescan.

use serde::{Deserialize, Serialize};

use crate::config::CollectorConfig;
use crate::logging;
use crate::tree::MutationRecord;

/// Why a rescan runs; the highest-priority due source is reported
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ScanTrigger {
    Initial,
    Navigation,
    SearchSubmit,
    Mutations,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Pending {
    at: u64,
    trigger: ScanTrigger,
}

#[derive(Debug)]
pub struct ScanScheduler {
    debounce_ms: u64,
    burst_delays_ms: Vec<u64>,
    location_poll_ms: u64,

    /// Single quiescence deadline for mutation batches
    debounce_at: Option<u64>,
    /// Burst entries, unordered
    burst: Vec<Pending>,

    last_location: Option<String>,
    next_poll_at: Option<u64>,
}

impl ScanScheduler {
    pub fn new(config: &CollectorConfig) -> Self {
        Self {
            debounce_ms: config.debounce_ms,
            burst_delays_ms: config.burst_delays_ms.clone(),
            location_poll_ms: config.location_poll_ms,
            debounce_at: None,
            burst: Vec::new(),
            last_location: None,
            next_poll_at: None,
        }
    }

    /// Start watching: remember the location, schedule the first scan now and
    /// arm the location poll.
    pub fn install(&mut self, location: &str, now: u64) {
        self.last_location = Some(location.to_string());
        self.burst.push(Pending { at: now, trigger: ScanTrigger::Initial });
        self.next_poll_at = Some(now + self.location_poll_ms);
    }

    pub fn is_installed(&self) -> bool {
        self.last_location.is_some()
    }

    /// Feed one MutationObserver batch. Returns whether it reset the debounce.
    pub fn on_mutations(&mut self, records: &[MutationRecord], now: u64) -> bool {
        if !self.is_installed() || !records.iter().any(MutationRecord::is_relevant) {
            return false;
        }
        self.debounce_at = Some(now + self.debounce_ms);
        true
    }

    /// History hook or poll observed `location`. Starts a burst on change.
    pub fn check_location(&mut self, location: &str, now: u64) -> bool {
        if !self.is_installed() || self.last_location.as_deref() == Some(location) {
            return false;
        }
        self.last_location = Some(location.to_string());
        logging::debug(&format!("[ScanScheduler] location changed: {}", location));
        self.start_burst(ScanTrigger::Navigation, now);
        true
    }

    /// Search button pressed; results may re-render without a URL change
    pub fn on_search_submit(&mut self, now: u64) {
        if self.is_installed() {
            self.start_burst(ScanTrigger::SearchSubmit, now);
        }
    }

    /// Whether the fallback location poll is due
    pub fn poll_due(&self, now: u64) -> bool {
        self.next_poll_at.map_or(false, |at| now >= at)
    }

    /// Run the fallback poll: compare `location` and re-arm the poll
    pub fn poll(&mut self, location: &str, now: u64) -> bool {
        self.next_poll_at = Some(now + self.location_poll_ms);
        self.check_location(location, now)
    }

    /// Take every source due at `now`. `Some` means run exactly one rescan.
    pub fn take_due(&mut self, now: u64) -> Option<ScanTrigger> {
        let mut due: Option<ScanTrigger> = None;
        let mut note = |trigger: ScanTrigger| {
            due = Some(due.map_or(trigger, |d| d.min(trigger)));
        };

        if self.debounce_at.map_or(false, |at| now >= at) {
            self.debounce_at = None;
            note(ScanTrigger::Mutations);
        }
        self.burst.retain(|p| {
            if now >= p.at {
                note(p.trigger);
                false
            } else {
                true
            }
        });
        due
    }

    /// Earliest instant something becomes due, for the host's single timer
    pub fn next_wakeup(&self) -> Option<u64> {
        self.burst
            .iter()
            .map(|p| p.at)
            .chain(self.debounce_at)
            .chain(self.next_poll_at)
            .min()
    }

    /// Scheduled rescans (debounce plus burst entries)
    pub fn pending_scans(&self) -> usize {
        self.burst.len() + usize::from(self.debounce_at.is_some())
    }

    fn start_burst(&mut self, trigger: ScanTrigger, now: u64) {
        for delay in &self.burst_delays_ms {
            self.burst.push(Pending { at: now + delay, trigger });
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const URL: &str = "https://wordstat.yandex.ru/?words=gopro";

    fn installed() -> ScanScheduler {
        let mut s = ScanScheduler::new(&CollectorConfig::default());
        s.install(URL, 0);
        assert_eq!(s.take_due(0), Some(ScanTrigger::Initial));
        s
    }

    // -------------------------------------------------------------------------
    // Debounce
    // -------------------------------------------------------------------------

    #[test]
    fn test_nothing_before_install() {
        let mut s = ScanScheduler::new(&CollectorConfig::default());
        assert!(!s.on_mutations(&[MutationRecord::child_list(1, 0)], 0));
        assert!(!s.check_location(URL, 0));
        assert_eq!(s.take_due(10_000), None);
        assert_eq!(s.next_wakeup(), None);
    }

    #[test]
    fn test_mutation_burst_coalesces_into_one_scan() {
        let mut s = installed();
        assert!(s.on_mutations(&[MutationRecord::child_list(1, 0)], 1000));
        assert!(s.on_mutations(&[MutationRecord::character_data()], 1050));
        assert!(s.on_mutations(&[MutationRecord::child_list(0, 3)], 1100));
        assert_eq!(s.pending_scans(), 1);

        // Deadline moved to 1100 + 120
        assert_eq!(s.take_due(1170), None);
        assert_eq!(s.take_due(1220), Some(ScanTrigger::Mutations));
        assert_eq!(s.take_due(1500), None);
    }

    #[test]
    fn test_attribute_only_batches_are_ignored() {
        let mut s = installed();
        assert!(!s.on_mutations(&[MutationRecord::attributes(), MutationRecord::child_list(0, 0)], 500));
        assert_eq!(s.pending_scans(), 0);
    }

    // -------------------------------------------------------------------------
    // Navigation
    // -------------------------------------------------------------------------

    #[test]
    fn test_navigation_burst_delays() {
        let mut s = installed();
        assert!(s.check_location("https://wordstat.yandex.ru/?words=dji", 2000));
        assert!(!s.check_location("https://wordstat.yandex.ru/?words=dji", 2010));
        assert_eq!(s.pending_scans(), 5);

        let mut fired = Vec::new();
        for t in (2000..=3300).step_by(10) {
            if s.take_due(t).is_some() {
                fired.push(t);
            }
        }
        assert_eq!(fired, vec![2000, 2120, 2300, 2700, 3200]);
    }

    #[test]
    fn test_poll_detects_silent_navigation() {
        let mut s = installed();
        assert!(!s.poll_due(1000));
        assert!(s.poll_due(1200));
        assert!(!s.poll(URL, 1200));
        assert_eq!(s.next_wakeup(), Some(2400));

        assert!(s.poll("https://wordstat.yandex.ru/?words=insta360", 2400));
        assert_eq!(s.take_due(2400), Some(ScanTrigger::Navigation));
    }

    #[test]
    fn test_search_submit_starts_burst() {
        let mut s = installed();
        s.on_search_submit(500);
        assert_eq!(s.take_due(500), Some(ScanTrigger::SearchSubmit));
        assert_eq!(s.pending_scans(), 4);
    }

    #[test]
    fn test_simultaneous_sources_coalesce() {
        let mut s = installed();
        s.on_mutations(&[MutationRecord::child_list(1, 0)], 0);
        s.check_location("https://wordstat.yandex.ru/?words=x", 120);
        // Debounce and first burst entry both due at 120
        assert_eq!(s.take_due(120), Some(ScanTrigger::Navigation));
        assert_eq!(s.take_due(120), None);
    }

    #[test]
    fn test_next_wakeup_is_earliest() {
        let mut s = installed();
        assert_eq!(s.next_wakeup(), Some(1200));
        s.on_mutations(&[MutationRecord::character_data()], 100);
        assert_eq!(s.next_wakeup(), Some(220));
    }
}

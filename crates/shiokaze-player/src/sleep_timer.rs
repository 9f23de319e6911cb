use crate::event::Event;
use crate::stream::EventSender;
use chrono::{DateTime, Local, NaiveTime};
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// One-shot sleep timer: stops playback at a scheduled wall-clock time.
///
/// At most one timer is pending; `set` atomically replaces any previous one.
/// The scheduled fire is a spawned task sending `Event::SleepTimerFired` back
/// to the owner context, tagged with a generation so a fire from a replaced
/// or cancelled timer is discarded. Wake-from-sleep revalidation covers the
/// case where the host was suspended past the scheduled time and the task's
/// sleep never elapsed in monotonic time.
pub struct SleepTimer {
    events: EventSender,
    end: Option<DateTime<Local>>,
    generation: u64,
    task: Option<JoinHandle<()>>,
}

impl SleepTimer {
    pub fn new(events: EventSender) -> Self {
        Self {
            events,
            end: None,
            generation: 0,
            task: None,
        }
    }

    pub fn end_date(&self) -> Option<DateTime<Local>> {
        self.end
    }

    pub fn is_active(&self) -> bool {
        self.end.is_some()
    }

    #[cfg(test)]
    pub(crate) fn generation(&self) -> u64 {
        self.generation
    }

    /// Schedules a one-shot stop at the next calendar occurrence of
    /// `hour:minute` — today if still in the future, otherwise tomorrow.
    /// Replaces any pending timer.
    pub fn set(&mut self, hour: u32, minute: u32) -> anyhow::Result<DateTime<Local>> {
        let now = Local::now();
        let end = next_occurrence(now, hour, minute)
            .ok_or_else(|| anyhow::anyhow!("invalid sleep timer time {:02}:{:02}", hour, minute))?;
        self.cancel();
        self.end = Some(end);

        let delay = (end - now).to_std().unwrap_or(std::time::Duration::ZERO);
        info!("sleep timer set for {} (in {:?})", end.format("%H:%M"), delay);

        let events = self.events.clone();
        let generation = self.generation;
        self.task = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = events.send(Event::SleepTimerFired { generation });
        }));
        Ok(end)
    }

    /// Clears any pending timer. No-op when nothing is pending.
    pub fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
        if self.end.take().is_some() {
            debug!("sleep timer cancelled");
        }
        self.generation = self.generation.wrapping_add(1);
    }

    /// Consumes a scheduled fire. Returns true when the fire is current and
    /// the caller should pause playback; fires from replaced or cancelled
    /// timers return false.
    pub fn acknowledge_fire(&mut self, generation: u64) -> bool {
        if generation != self.generation || self.end.is_none() {
            debug!(
                "discarding stale sleep timer fire gen={} (current={})",
                generation, self.generation
            );
            return false;
        }
        info!("sleep timer fired");
        self.task.take();
        self.end = None;
        self.generation = self.generation.wrapping_add(1);
        true
    }

    /// Wake-from-sleep revalidation. Returns true when the end time elapsed
    /// while suspended and the caller should pause playback now.
    pub fn check_on_wake(&mut self) -> bool {
        self.fire_if_due(Local::now())
    }

    fn fire_if_due(&mut self, now: DateTime<Local>) -> bool {
        match self.end {
            Some(end) if end <= now => {
                info!("sleep timer elapsed during suspend, firing now");
                self.cancel();
                true
            }
            _ => false,
        }
    }
}

impl Drop for SleepTimer {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Next wall-clock occurrence of `hour:minute` strictly after `now`.
/// `None` when hour/minute are out of range (or the date math overflows).
pub fn next_occurrence(now: DateTime<Local>, hour: u32, minute: u32) -> Option<DateTime<Local>> {
    let time = NaiveTime::from_hms_opt(hour, minute, 0)?;
    let mut date = now.date_naive();
    let mut candidate = date.and_time(time);
    if candidate <= now.naive_local() {
        date = date.succ_opt()?;
        candidate = date.and_time(time);
    }
    candidate.and_local_timezone(Local).earliest()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Timelike};
    use tokio::sync::mpsc;

    fn timer() -> (SleepTimer, mpsc::UnboundedReceiver<Event>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (SleepTimer::new(tx), rx)
    }

    #[test]
    fn test_next_occurrence_future_time_is_today() {
        let now = Local::now()
            .with_hour(10)
            .unwrap()
            .with_minute(0)
            .unwrap()
            .with_second(0)
            .unwrap();
        let end = next_occurrence(now, 15, 30).unwrap();
        assert_eq!(end.date_naive(), now.date_naive());
        assert!(end > now);
    }

    #[test]
    fn test_next_occurrence_past_time_rolls_to_tomorrow() {
        let now = Local::now()
            .with_hour(15)
            .unwrap()
            .with_minute(0)
            .unwrap()
            .with_second(0)
            .unwrap();
        let end = next_occurrence(now, 10, 0).unwrap();
        assert!(end > now);
        assert_eq!(end.date_naive(), now.date_naive().succ_opt().unwrap());
    }

    #[test]
    fn test_next_occurrence_is_strictly_after_now() {
        let now = Local::now().with_second(0).unwrap().with_nanosecond(0).unwrap();
        let end = next_occurrence(now, now.hour(), now.minute()).unwrap();
        assert!(end > now);
    }

    #[test]
    fn test_next_occurrence_rejects_invalid_input() {
        let now = Local::now();
        assert!(next_occurrence(now, 24, 0).is_none());
        assert!(next_occurrence(now, 0, 60).is_none());
    }

    #[tokio::test]
    async fn test_set_schedules_in_the_future() {
        let (mut t, _rx) = timer();
        let past = Local::now() - Duration::hours(1);
        let end = t.set(past.hour(), past.minute()).unwrap();
        assert!(t.is_active());
        assert!(end > Local::now());
    }

    #[tokio::test]
    async fn test_set_replaces_pending_timer() {
        let (mut t, _rx) = timer();
        let now = Local::now();
        let first = (now + Duration::hours(1)).time();
        let second = (now + Duration::hours(2)).time();

        let end1 = t.set(first.hour(), first.minute()).unwrap();
        let gen1 = t.generation;
        let end2 = t.set(second.hour(), second.minute()).unwrap();

        assert_ne!(end1, end2);
        assert_eq!(t.end_date(), Some(end2));
        // A late fire from the replaced timer must be ignored
        assert!(!t.acknowledge_fire(gen1));
        assert!(t.is_active());
    }

    #[tokio::test]
    async fn test_cancel_is_idempotent() {
        let (mut t, _rx) = timer();
        t.cancel();
        assert!(!t.is_active());

        let future = Local::now() + Duration::hours(1);
        t.set(future.hour(), future.minute()).unwrap();
        t.cancel();
        t.cancel();
        assert!(!t.is_active());
        assert!(t.end_date().is_none());
    }

    #[tokio::test]
    async fn test_acknowledge_fire_clears_and_fires_once() {
        let (mut t, _rx) = timer();
        let future = Local::now() + Duration::hours(1);
        t.set(future.hour(), future.minute()).unwrap();
        let gen = t.generation;

        assert!(t.acknowledge_fire(gen));
        assert!(!t.is_active());
        // Second delivery of the same fire is stale
        assert!(!t.acknowledge_fire(gen));
    }

    #[tokio::test]
    async fn test_wake_after_end_fires_exactly_once() {
        let (mut t, _rx) = timer();
        let future = Local::now() + Duration::hours(1);
        t.set(future.hour(), future.minute()).unwrap();

        // Pretend the host slept well past the scheduled end
        let much_later = Local::now() + Duration::hours(30);
        assert!(t.fire_if_due(much_later));
        assert!(!t.is_active());
        assert!(!t.fire_if_due(much_later));
    }

    #[tokio::test]
    async fn test_wake_before_end_does_nothing() {
        let (mut t, _rx) = timer();
        let future = Local::now() + Duration::hours(1);
        t.set(future.hour(), future.minute()).unwrap();

        assert!(!t.check_on_wake());
        assert!(t.is_active());
    }

    #[tokio::test]
    async fn test_set_rejects_invalid_time() {
        let (mut t, _rx) = timer();
        assert!(t.set(24, 0).is_err());
        assert!(t.set(12, 60).is_err());
        assert!(!t.is_active());
    }
}

// Timer queue - One-shot and interval timers of the control loop
//
// Timers never run concurrently: the owner pops due timers one at a time and
// dispatches them. A cancelled timer is dropped lazily when it reaches the
// top of the heap.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use std::time::Duration;

pub type TimerId = u64;

/// Shortest interval an interval timer may have
const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// What a timer does when it fires
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerTask {
    NotePass,
    MetronomePass,
    /// Background playhead poll (page hidden)
    PlayheadPoll,
    /// Suspend the render context once a stop has settled
    SuspendContext,
}

#[derive(Debug, Clone, Copy)]
struct Timer {
    task: TimerTask,
    due: Duration,
    interval: Option<Duration>,
    /// Heap entry this timer currently answers to
    seq: u64,
}

#[derive(Debug, Default)]
pub struct TimerQueue {
    heap: BinaryHeap<Reverse<(Duration, u64, TimerId)>>,
    timers: HashMap<TimerId, Timer>,
    next_id: TimerId,
    next_seq: u64,
    fired: HashMap<TimerTask, u64>,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fire `task` once at `due`
    pub fn schedule_once(&mut self, task: TimerTask, due: Duration) -> TimerId {
        self.insert(task, due, None)
    }

    /// Fire `task` at `first`, then every `interval`
    pub fn schedule_interval(
        &mut self,
        task: TimerTask,
        first: Duration,
        interval: Duration,
    ) -> TimerId {
        self.insert(task, first, Some(interval.max(MIN_INTERVAL)))
    }

    /// Returns false if the timer already fired (one-shot) or was cancelled
    pub fn cancel(&mut self, id: TimerId) -> bool {
        self.timers.remove(&id).is_some()
    }

    pub fn is_scheduled(&self, id: TimerId) -> bool {
        self.timers.contains_key(&id)
    }

    /// Live timers running `task`
    pub fn scheduled_count(&self, task: TimerTask) -> usize {
        self.timers.values().filter(|t| t.task == task).count()
    }

    /// Pop the next timer due at or before `now`
    ///
    /// Interval timers are re-armed from their due time; periods already
    /// missed at `now` are skipped, so a timer fires at most once per call
    /// sequence at a given `now`.
    pub fn pop_due(&mut self, now: Duration) -> Option<(TimerId, TimerTask)> {
        loop {
            let &Reverse((due, seq, id)) = self.heap.peek()?;
            let live = self.timers.get(&id).is_some_and(|t| t.seq == seq);
            if !live {
                self.heap.pop();
                continue;
            }
            if due > now {
                return None;
            }
            self.heap.pop();

            let timer = self.timers[&id];
            match timer.interval {
                Some(interval) => {
                    let missed = now.saturating_sub(timer.due).as_nanos() / interval.as_nanos();
                    let next =
                        timer.due + Duration::from_nanos(((missed + 1) * interval.as_nanos()) as u64);
                    let seq = self.bump_seq();
                    self.timers.insert(
                        id,
                        Timer {
                            due: next,
                            seq,
                            ..timer
                        },
                    );
                    self.heap.push(Reverse((next, seq, id)));
                }
                None => {
                    self.timers.remove(&id);
                }
            }

            *self.fired.entry(timer.task).or_insert(0) += 1;
            return Some((id, timer.task));
        }
    }

    /// Due time of the earliest live timer
    pub fn next_due(&self) -> Option<Duration> {
        self.timers.values().map(|t| t.due).min()
    }

    /// Drop every timer without firing it
    pub fn clear(&mut self) {
        self.timers.clear();
        self.heap.clear();
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    /// How many times `task` has fired since the queue was created
    pub fn fired(&self, task: TimerTask) -> u64 {
        self.fired.get(&task).copied().unwrap_or(0)
    }

    fn insert(&mut self, task: TimerTask, due: Duration, interval: Option<Duration>) -> TimerId {
        self.next_id += 1;
        let id = self.next_id;
        let seq = self.bump_seq();
        self.timers.insert(
            id,
            Timer {
                task,
                due,
                interval,
                seq,
            },
        );
        self.heap.push(Reverse((due, seq, id)));
        id
    }

    fn bump_seq(&mut self) -> u64 {
        self.next_seq += 1;
        self.next_seq
    }
}

/// Every timer of one play session, cancelled together
#[derive(Debug, Default)]
pub struct CancelHandle {
    timers: Vec<TimerId>,
    cancelled: bool,
}

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn track(&mut self, id: TimerId) {
        self.timers.push(id);
    }

    /// Cancel every tracked timer; returns how many were still live
    pub fn cancel(&mut self, queue: &mut TimerQueue) -> usize {
        self.cancelled = true;
        self.timers.drain(..).filter(|&id| queue.cancel(id)).count()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    #[test]
    fn test_one_shot_fires_once() {
        let mut queue = TimerQueue::new();
        let id = queue.schedule_once(TimerTask::SuspendContext, ms(100));

        assert_eq!(queue.pop_due(ms(99)), None);
        assert_eq!(queue.pop_due(ms(100)), Some((id, TimerTask::SuspendContext)));
        assert_eq!(queue.pop_due(ms(200)), None);
        assert!(!queue.is_scheduled(id));
    }

    #[test]
    fn test_due_timers_pop_in_order() {
        let mut queue = TimerQueue::new();
        queue.schedule_once(TimerTask::MetronomePass, ms(20));
        queue.schedule_once(TimerTask::NotePass, ms(10));

        assert_eq!(queue.pop_due(ms(50)).map(|(_, t)| t), Some(TimerTask::NotePass));
        assert_eq!(queue.pop_due(ms(50)).map(|(_, t)| t), Some(TimerTask::MetronomePass));
    }

    #[test]
    fn test_interval_skips_missed_periods() {
        let mut queue = TimerQueue::new();
        let id = queue.schedule_interval(TimerTask::NotePass, ms(0), ms(100));

        assert!(queue.pop_due(ms(0)).is_some());
        assert_eq!(queue.next_due(), Some(ms(100)));

        // Host stalled for 350 ms: one fire, next period aligned to 400
        assert_eq!(queue.pop_due(ms(350)), Some((id, TimerTask::NotePass)));
        assert_eq!(queue.pop_due(ms(350)), None);
        assert_eq!(queue.next_due(), Some(ms(400)));
        assert_eq!(queue.fired(TimerTask::NotePass), 2);
    }

    #[test]
    fn test_cancelled_timer_never_fires() {
        let mut queue = TimerQueue::new();
        let id = queue.schedule_interval(TimerTask::PlayheadPoll, ms(17), ms(17));

        assert!(queue.cancel(id));
        assert!(!queue.cancel(id));
        assert_eq!(queue.pop_due(ms(1000)), None);
        assert_eq!(queue.fired(TimerTask::PlayheadPoll), 0);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_cancel_handle_covers_all_session_timers() {
        let mut queue = TimerQueue::new();
        let mut handle = CancelHandle::new();
        handle.track(queue.schedule_interval(TimerTask::NotePass, ms(0), ms(2000)));
        handle.track(queue.schedule_interval(TimerTask::MetronomePass, ms(0), ms(200)));
        let suspend = queue.schedule_once(TimerTask::SuspendContext, ms(500));

        assert_eq!(handle.cancel(&mut queue), 2);
        assert!(handle.is_cancelled());
        assert!(handle.is_empty());
        assert!(queue.is_scheduled(suspend));
        assert_eq!(queue.scheduled_count(TimerTask::NotePass), 0);
    }
}

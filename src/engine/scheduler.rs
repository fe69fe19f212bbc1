//! Millisecond work queue for loop playback and voice teardown.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use crate::io::VoiceId;
use crate::pitch::Note;
use crate::voice::Instrument;

/// Work the engine has deferred to a future millisecond.
#[derive(Debug, Clone, PartialEq)]
pub enum Task {
    /// Sound one note from a looping layer's take.
    LoopNote {
        layer: usize,
        note: Note,
        instrument: Instrument,
        velocity: f32,
    },
    /// Re-arm a layer for its next pass. Carries the generation it was
    /// queued under; stale cycles from a stopped loop are dropped on fire.
    LoopCycle { layer: usize, generation: u64 },
    /// Tear down a sounding voice at the end of its fixed lifetime.
    ReleaseVoice { id: VoiceId },
}

#[derive(Debug, Clone)]
struct Entry {
    fire_at_ms: u64,
    /// Insertion order, to keep same-millisecond tasks FIFO.
    seq: u64,
    task: Task,
}

// The heap keys on `(fire_at_ms, seq)` alone; the task payload takes no
// part in comparison or equality.
impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        (self.fire_at_ms, self.seq) == (other.fire_at_ms, other.seq)
    }
}

impl Eq for Entry {}

impl Ord for Entry {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (self.fire_at_ms, self.seq).cmp(&(other.fire_at_ms, other.seq))
    }
}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// Min-heap of timed tasks, drained by the engine's tick.
///
/// The scheduler does not own a clock; callers pass `now_ms` in, which is
/// what lets tests replay exact timelines.
#[derive(Default)]
pub struct TickScheduler {
    queue: BinaryHeap<Reverse<Entry>>,
    next_seq: u64,
}

impl TickScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, fire_at_ms: u64, task: Task) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.queue.push(Reverse(Entry {
            fire_at_ms,
            seq,
            task,
        }));
    }

    /// Pop the next task due at or before `now_ms`, with its fire time.
    pub fn pop_due(&mut self, now_ms: u64) -> Option<(u64, Task)> {
        let Reverse(head) = self.queue.peek()?;
        if head.fire_at_ms > now_ms {
            return None;
        }
        let Reverse(entry) = self.queue.pop()?;
        Some((entry.fire_at_ms, entry.task))
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn clear(&mut self) {
        self.queue.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pops_in_fire_time_order() {
        let mut sched = TickScheduler::new();
        sched.schedule(300, Task::ReleaseVoice { id: 3 });
        sched.schedule(100, Task::ReleaseVoice { id: 1 });
        sched.schedule(200, Task::ReleaseVoice { id: 2 });

        let mut fired = Vec::new();
        while let Some((at, task)) = sched.pop_due(1_000) {
            fired.push((at, task));
        }
        assert_eq!(
            fired,
            vec![
                (100, Task::ReleaseVoice { id: 1 }),
                (200, Task::ReleaseVoice { id: 2 }),
                (300, Task::ReleaseVoice { id: 3 }),
            ]
        );
    }

    #[test]
    fn same_millisecond_tasks_stay_fifo() {
        let mut sched = TickScheduler::new();
        for id in 0..5 {
            sched.schedule(50, Task::ReleaseVoice { id });
        }
        for id in 0..5 {
            assert_eq!(sched.pop_due(50), Some((50, Task::ReleaseVoice { id })));
        }
    }

    #[test]
    fn duplicate_tasks_in_one_millisecond_both_fire() {
        let mut sched = TickScheduler::new();
        sched.schedule(10, Task::ReleaseVoice { id: 7 });
        sched.schedule(10, Task::ReleaseVoice { id: 7 });
        assert_eq!(sched.pop_due(10), Some((10, Task::ReleaseVoice { id: 7 })));
        assert_eq!(sched.pop_due(10), Some((10, Task::ReleaseVoice { id: 7 })));
        assert!(sched.is_empty());
    }

    #[test]
    fn future_tasks_stay_queued() {
        let mut sched = TickScheduler::new();
        sched.schedule(500, Task::ReleaseVoice { id: 1 });
        assert_eq!(sched.pop_due(499), None);
        assert_eq!(sched.len(), 1);
        assert!(sched.pop_due(500).is_some());
        assert!(sched.is_empty());
    }
}

//! Job control for pause/resume/cancel, shared by all segment workers.
//!
//! One `JobSignal` per job. Workers call [`JobSignal::checkpoint`] once per
//! received chunk: it returns immediately while running, blocks on a condvar
//! while paused, and reports the stop reason once the job is stopped.

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

/// Why workers were told to stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The user cancelled the job.
    Cancelled,
    /// Another segment failed; the rest of the job is pointless.
    Aborted,
}

#[derive(Debug, Default)]
struct Gate {
    paused: bool,
    stop: Option<StopReason>,
}

#[derive(Debug, Default)]
pub struct JobSignal {
    gate: Mutex<Gate>,
    wake: Condvar,
}

impl JobSignal {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Gate> {
        self.gate.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Close the gate. Returns false if already paused or stopped.
    pub fn pause(&self) -> bool {
        let mut gate = self.lock();
        if gate.paused || gate.stop.is_some() {
            return false;
        }
        gate.paused = true;
        true
    }

    /// Reopen the gate and wake every paused worker. Returns false if not paused.
    pub fn resume(&self) -> bool {
        let mut gate = self.lock();
        if !gate.paused {
            return false;
        }
        gate.paused = false;
        self.wake.notify_all();
        true
    }

    pub fn is_paused(&self) -> bool {
        self.lock().paused
    }

    /// Stop all workers, including paused ones. The first reason sticks.
    pub fn stop(&self, reason: StopReason) {
        let mut gate = self.lock();
        if gate.stop.is_none() {
            gate.stop = Some(reason);
        }
        self.wake.notify_all();
    }

    pub fn stop_reason(&self) -> Option<StopReason> {
        self.lock().stop
    }

    pub fn is_stopped(&self) -> bool {
        self.lock().stop.is_some()
    }

    /// Blocks while paused; `Err` once the job has been stopped.
    pub fn checkpoint(&self) -> Result<(), StopReason> {
        let mut gate = self.lock();
        loop {
            if let Some(reason) = gate.stop {
                return Err(reason);
            }
            if !gate.paused {
                return Ok(());
            }
            gate = self.wake.wait(gate).unwrap_or_else(PoisonError::into_inner);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn checkpoint_passes_when_running() {
        let s = JobSignal::new();
        assert_eq!(s.checkpoint(), Ok(()));
        assert!(!s.is_paused());
    }

    #[test]
    fn pause_blocks_until_resume() {
        let s = Arc::new(JobSignal::new());
        assert!(s.pause());
        assert!(!s.pause(), "second pause is a no-op");

        let passed = Arc::new(AtomicBool::new(false));
        let worker = {
            let s = Arc::clone(&s);
            let passed = Arc::clone(&passed);
            thread::spawn(move || {
                let r = s.checkpoint();
                passed.store(true, Ordering::SeqCst);
                r
            })
        };

        thread::sleep(Duration::from_millis(50));
        assert!(!passed.load(Ordering::SeqCst), "worker must wait while paused");
        assert!(s.resume());
        assert_eq!(worker.join().unwrap(), Ok(()));
        assert!(!s.resume(), "resume when not paused is a no-op");
    }

    #[test]
    fn stop_wakes_paused_worker() {
        let s = Arc::new(JobSignal::new());
        s.pause();
        let worker = {
            let s = Arc::clone(&s);
            thread::spawn(move || s.checkpoint())
        };
        thread::sleep(Duration::from_millis(20));
        s.stop(StopReason::Cancelled);
        assert_eq!(worker.join().unwrap(), Err(StopReason::Cancelled));
    }

    #[test]
    fn first_stop_reason_wins() {
        let s = JobSignal::new();
        s.stop(StopReason::Aborted);
        s.stop(StopReason::Cancelled);
        assert_eq!(s.stop_reason(), Some(StopReason::Aborted));
        assert!(!s.pause(), "cannot pause a stopped job");
    }
}

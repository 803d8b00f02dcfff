//! Oneshot Event - binary semaphore dengan reset-on-wait
//!
//! `signal()` membangunkan tepat satu `wait()`, lalu event kembali ke
//! state unsignaled. Signal yang datang sebelum ada waiter di-latch
//! sampai `wait()` berikutnya mengkonsumsinya.

use std::time::Duration;

#[cfg(not(feature = "loom"))]
use parking_lot::{Condvar, Mutex};
#[cfg(not(feature = "loom"))]
use std::time::Instant;

#[cfg(not(feature = "loom"))]
pub struct OneshotEvent {
    signaled: Mutex<bool>,
    cond: Condvar,
}

#[cfg(not(feature = "loom"))]
impl OneshotEvent {
    pub fn new() -> Self {
        Self {
            signaled: Mutex::new(false),
            cond: Condvar::new(),
        }
    }

    pub fn signal(&self) {
        let mut signaled = self.signaled.lock();
        *signaled = true;
        self.cond.notify_one();
    }

    /// Block sampai signaled atau `timeout` habis.
    ///
    /// Returns `true` jika signal dikonsumsi, `false` jika timeout.
    /// `Duration::MAX` berarti tunggu selamanya.
    pub fn wait(&self, timeout: Duration) -> bool {
        let mut signaled = self.signaled.lock();

        match Instant::now().checked_add(timeout) {
            Some(deadline) => {
                while !*signaled {
                    if self.cond.wait_until(&mut signaled, deadline).timed_out() {
                        break;
                    }
                }
            }
            None => {
                while !*signaled {
                    self.cond.wait(&mut signaled);
                }
            }
        }

        // Reset-on-wait: signal hanya berlaku untuk satu waiter
        let consumed = *signaled;
        *signaled = false;
        consumed
    }

    /// Cek tanpa block apakah ada signal yang ter-latch
    pub fn is_signaled(&self) -> bool {
        *self.signaled.lock()
    }
}

// Loom tidak memodelkan waktu: timeout diabaikan dan wait selalu
// menunggu signal. Test loom hanya boleh menunggu kondisi yang pasti terjadi.
#[cfg(feature = "loom")]
pub struct OneshotEvent {
    signaled: loom::sync::Mutex<bool>,
    cond: loom::sync::Condvar,
}

#[cfg(feature = "loom")]
impl OneshotEvent {
    pub fn new() -> Self {
        Self {
            signaled: loom::sync::Mutex::new(false),
            cond: loom::sync::Condvar::new(),
        }
    }

    pub fn signal(&self) {
        let mut signaled = self.signaled.lock().unwrap();
        *signaled = true;
        self.cond.notify_one();
    }

    pub fn wait(&self, _timeout: Duration) -> bool {
        let mut signaled = self.signaled.lock().unwrap();
        while !*signaled {
            signaled = self.cond.wait(signaled).unwrap();
        }
        *signaled = false;
        true
    }

    pub fn is_signaled(&self) -> bool {
        *self.signaled.lock().unwrap()
    }
}

impl Default for OneshotEvent {
    fn default() -> Self {
        Self::new()
    }
}

//! Rotatable bearer secret (C4): `current` always matches; `previous`
//! matches only inside the grace window, enabling zero-downtime rotation.

use std::sync::RwLock;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
struct SecretState {
    current: String,
    previous: Option<String>,
    rotated_at: Option<Instant>,
}

pub struct RotatableSecret {
    state: RwLock<SecretState>,
    grace_window: Duration,
}

impl RotatableSecret {
    pub fn new(current: String, grace_window_seconds: u64) -> Self {
        RotatableSecret {
            state: RwLock::new(SecretState {
                current,
                previous: None,
                rotated_at: None,
            }),
            grace_window: Duration::from_secs(grace_window_seconds),
        }
    }

    /// `previous := current; current := new; rotated_at := now`. The previous
    /// value keeps validating until `grace_window` elapses.
    pub fn rotate(&self, new_secret: String) {
        let mut state = self.state.write().expect("secret lock poisoned");
        state.previous = Some(std::mem::replace(&mut state.current, new_secret));
        state.rotated_at = Some(Instant::now());
    }

    /// Constant-time comparison against the current secret, and against the
    /// previous secret while still inside the grace window. Unequal-length
    /// inputs are rejected in constant time relative to the candidate's own
    /// length (never short-circuiting on the first differing byte).
    pub fn verify(&self, provided: &str) -> bool {
        let state = self.state.read().expect("secret lock poisoned");

        if constant_time_eq(provided.as_bytes(), state.current.as_bytes()) {
            return true;
        }

        if let (Some(previous), Some(rotated_at)) = (&state.previous, state.rotated_at) {
            if rotated_at.elapsed() <= self.grace_window
                && constant_time_eq(provided.as_bytes(), previous.as_bytes())
            {
                return true;
            }
        }

        false
    }
}

/// Byte-for-byte XOR accumulation with no early return, so execution time
/// depends only on `a.len().max(b.len())`, never on where the first mismatch
/// occurs.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    let len = a.len().max(b.len());
    let mut diff: u8 = (a.len() != b.len()) as u8;
    for i in 0..len {
        let x = a.get(i).copied().unwrap_or(0);
        let y = b.get(i).copied().unwrap_or(0);
        diff |= x ^ y;
    }
    diff == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_accepts_current_secret() {
        let secret = RotatableSecret::new("correct-horse-battery-staple-32chars".into(), 300);
        assert!(secret.verify("correct-horse-battery-staple-32chars"));
    }

    #[test]
    fn verify_rejects_wrong_secret() {
        let secret = RotatableSecret::new("correct-horse-battery-staple-32chars".into(), 300);
        assert!(!secret.verify("wrong"));
    }

    #[test]
    fn rotate_keeps_previous_valid_within_grace_window() {
        let secret = RotatableSecret::new("old-secret-value-that-is-long-enough".into(), 300);
        secret.rotate("new-secret-value-that-is-long-enough".into());
        assert!(secret.verify("new-secret-value-that-is-long-enough"));
        assert!(secret.verify("old-secret-value-that-is-long-enough"));
    }

    #[test]
    fn rotate_rejects_previous_outside_grace_window() {
        let secret = RotatableSecret::new("old-secret-value-that-is-long-enough".into(), 0);
        secret.rotate("new-secret-value-that-is-long-enough".into());
        std::thread::sleep(Duration::from_millis(5));
        assert!(!secret.verify("old-secret-value-that-is-long-enough"));
    }

    #[test]
    fn constant_time_eq_handles_unequal_lengths() {
        assert!(!constant_time_eq(b"short", b"much longer value"));
        assert!(constant_time_eq(b"same", b"same"));
    }
}

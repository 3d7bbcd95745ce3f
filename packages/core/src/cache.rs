use std::time::{Duration, Instant};

/// Single value that expires after a per-entry TTL.
pub struct ExpiringCache<T: Clone> {
    value: Option<T>,
    expires_at: Option<Instant>,
}

impl<T: Clone> Default for ExpiringCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> ExpiringCache<T> {
    pub fn new() -> Self {
        Self {
            value: None,
            expires_at: None,
        }
    }

    /// Returns the cached value only while it has not expired.
    pub fn get(&self) -> Option<T> {
        if self.is_fresh() {
            self.value.clone()
        } else {
            None
        }
    }

    pub fn set(&mut self, value: T, ttl: Duration) {
        self.value = Some(value);
        self.expires_at = Some(Instant::now() + ttl);
    }

    pub fn invalidate(&mut self) {
        self.value = None;
        self.expires_at = None;
    }

    pub fn is_fresh(&self) -> bool {
        match (self.value.as_ref(), self.expires_at) {
            (Some(_), Some(expires_at)) => Instant::now() < expires_at,
            _ => false,
        }
    }
}

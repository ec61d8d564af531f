// Task id allocation

/// Hands out task ids derived from the clock, never repeating one.
///
/// Two tasks created in the same millisecond would share a raw timestamp, so
/// each id is `max(now_ms, last + 1)`. Once `last` reaches `i64::MAX` there is
/// no room above it, and ids are taken from the largest free value below.
#[derive(Debug, Clone, Default)]
pub struct IdGenerator {
    last: i64,
}

impl IdGenerator {
    /// Start after the largest id already in use
    pub fn seeded<I: IntoIterator<Item = i64>>(existing: I) -> Self {
        let last = existing.into_iter().max().unwrap_or(0);
        Self { last }
    }

    /// `in_use` reports whether an id is already taken; it is only consulted
    /// when the counter has run out of headroom.
    pub fn next_id(&mut self, now_ms: i64, in_use: impl Fn(i64) -> bool) -> i64 {
        match self.last.checked_add(1) {
            Some(next) => {
                let id = now_ms.max(next);
                self.last = id;
                id
            }
            // A finite task list always leaves a gap
            None => (i64::MIN..i64::MAX).rev().find(|id| !in_use(*id)).unwrap_or(i64::MIN),
        }
    }

    pub fn last(&self) -> i64 {
        self.last
    }
}

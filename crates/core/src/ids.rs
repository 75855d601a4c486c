use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn from_string(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }
    };
}

entity_id!(
    /// Stable identifier of a project.  
    /// 專案的穩定代號。
    ProjectId
);

entity_id!(
    /// Stable identifier of a file; tabs reuse it as their own id.  
    /// 檔案的穩定代號；分頁沿用相同代號。
    FileId
);

/// Issues decimal ids derived from wall-clock milliseconds.
///
/// Values are strictly increasing: when the clock has not moved past the last
/// issued value the generator bumps it by one instead of repeating it.
#[derive(Debug)]
pub struct IdGenerator {
    last: u64,
    clock: fn() -> u64,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::with_clock(unix_millis)
    }

    pub fn with_clock(clock: fn() -> u64) -> Self {
        Self { last: 0, clock }
    }

    /// Records an existing id so later values never collide with it.  
    /// 登記既有代號，避免之後產生重複值。
    pub fn observe(&mut self, id: &str) {
        if let Ok(value) = id.parse::<u64>() {
            self.last = self.last.max(value);
        }
    }

    pub fn next_id(&mut self) -> String {
        let now = (self.clock)();
        let value = if now > self.last {
            now
        } else {
            self.last.saturating_add(1)
        };
        self.last = value;
        value.to_string()
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frozen_clock() -> u64 {
        1_700_000_000_000
    }

    #[test]
    fn same_tick_ids_do_not_collide() {
        let mut ids = IdGenerator::with_clock(frozen_clock);
        let first = ids.next_id();
        let second = ids.next_id();
        assert_eq!(first, "1700000000000");
        assert_eq!(second, "1700000000001");
    }

    #[test]
    fn observed_ids_push_the_sequence_forward() {
        let mut ids = IdGenerator::with_clock(frozen_clock);
        ids.observe("1800000000000");
        ids.observe("not-a-number");
        assert_eq!(ids.next_id(), "1800000000001");
    }

    #[test]
    fn ids_serialize_as_plain_strings() {
        let id = FileId::from_string("42");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"42\"");
        assert_eq!(id.to_string(), "42");
    }
}

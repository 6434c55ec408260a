//! Time-slot swap engine: exchanging values between data times 0 and 1800.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use grib2_codec::MessageSource;
use tracing::debug;

use crate::Result;

/// The early data time of the swap pair (00:00 as HHMM).
pub const SLOT_EARLY: u32 = 0;
/// The late data time of the swap pair (18:00 as HHMM).
pub const SLOT_LATE: u32 = 1800;

/// Which direction values move between the two data times.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseShift {
    /// Slot-0 messages take slot-1800 values; slot 1800 untouched.
    Future,
    /// Slot-1800 messages take slot-0 values; slot 0 untouched.
    Past,
    /// A true exchange in both directions.
    Both,
}

impl PhaseShift {
    pub fn as_str(&self) -> &'static str {
        match self {
            PhaseShift::Future => "future",
            PhaseShift::Past => "past",
            PhaseShift::Both => "both",
        }
    }
}

impl fmt::Display for PhaseShift {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PhaseShift {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "future" => Ok(PhaseShift::Future),
            "past" => Ok(PhaseShift::Past),
            "both" => Ok(PhaseShift::Both),
            other => Err(format!(
                "unknown phase shift {:?} (expected future, past or both)",
                other
            )),
        }
    }
}

/// Values captured at the two swap slots during pass 1, keyed by
/// (variable, level). Built once, consumed read-only during pass 2, so
/// the emitted result never depends on iteration order.
#[derive(Debug, Default)]
pub struct TimeSlotBuffer {
    slot_early: HashMap<(String, u32), Vec<f64>>,
    slot_late: HashMap<(String, u32), Vec<f64>>,
}

impl TimeSlotBuffer {
    /// Pass 1: buffer the value arrays of every message at data time 0
    /// or 1800. Messages at other times are ignored.
    pub fn capture<S: MessageSource>(source: &mut S) -> Result<Self> {
        let mut buffer = Self::default();

        while let Some(message) = source.next_message()? {
            let data_time = message.data_time();
            if data_time != SLOT_EARLY && data_time != SLOT_LATE {
                continue;
            }

            let key = (message.short_name().to_string(), message.level());
            let values = message.values()?;

            if data_time == SLOT_EARLY {
                buffer.slot_early.insert(key, values);
            } else {
                buffer.slot_late.insert(key, values);
            }
        }

        debug!(
            early = buffer.slot_early.len(),
            late = buffer.slot_late.len(),
            "buffered time-slot values"
        );

        Ok(buffer)
    }

    /// Pass 2: the replacement values for a message, if the shift policy
    /// moves anything into its slot and the counterpart exists.
    pub fn replacement(
        &self,
        shift: PhaseShift,
        data_time: u32,
        variable: &str,
        level: u32,
    ) -> Option<&[f64]> {
        let key = (variable.to_string(), level);
        match (shift, data_time) {
            (PhaseShift::Future, SLOT_EARLY) | (PhaseShift::Both, SLOT_EARLY) => {
                self.slot_late.get(&key).map(Vec::as_slice)
            }
            (PhaseShift::Past, SLOT_LATE) | (PhaseShift::Both, SLOT_LATE) => {
                self.slot_early.get(&key).map(Vec::as_slice)
            }
            _ => None,
        }
    }
}

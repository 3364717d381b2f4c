use std::fmt;

use crate::host::VesselClass;

// ---------------------------------------------------------------------------
// Recorded flight events
// ---------------------------------------------------------------------------

/// What a separation command throws away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JettisonTarget {
    Boosters,
    Tank,
}

/// Events a vessel writes to the flight recorder and reacts to on replay.
///
/// On the wire each event is an `(event_type, event)` string pair, e.g.
/// `("JET", "SRB")`.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedEvent {
    SrbIgnition,
    Jettison(JettisonTarget),
    /// Overwrite the liftoff epoch (simulation time, s).
    AdjustLaunchTime(f64),
}

impl RecordedEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            RecordedEvent::SrbIgnition => "STATUS",
            RecordedEvent::Jettison(_) => "JET",
            RecordedEvent::AdjustLaunchTime(_) => "ADJUST_LAUNCHTIME",
        }
    }

    pub fn payload(&self) -> String {
        match self {
            RecordedEvent::SrbIgnition => "SRB_IGNITION".to_string(),
            RecordedEvent::Jettison(JettisonTarget::Boosters) => "SRB".to_string(),
            RecordedEvent::Jettison(JettisonTarget::Tank) => "ET".to_string(),
            RecordedEvent::AdjustLaunchTime(t) => format!("{t:.3}"),
        }
    }

    /// Decode a replayed event. Unknown events yield `None`.
    pub fn parse(event_type: &str, event: &str) -> Option<Self> {
        let event = event.trim();
        if event_type.eq_ignore_ascii_case("JET") {
            if event.eq_ignore_ascii_case("SRB") {
                Some(RecordedEvent::Jettison(JettisonTarget::Boosters))
            } else if event.eq_ignore_ascii_case("ET") {
                Some(RecordedEvent::Jettison(JettisonTarget::Tank))
            } else {
                None
            }
        } else if event_type.eq_ignore_ascii_case("STATUS") {
            event
                .eq_ignore_ascii_case("SRB_IGNITION")
                .then_some(RecordedEvent::SrbIgnition)
        } else if event_type.eq_ignore_ascii_case("ADJUST_LAUNCHTIME") {
            event.parse().ok().map(RecordedEvent::AdjustLaunchTime)
        } else {
            None
        }
    }
}

impl fmt::Display for RecordedEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.event_type(), self.payload())
    }
}

// ---------------------------------------------------------------------------
// Simulation log
// ---------------------------------------------------------------------------

/// Kinds of simulation events.
#[derive(Debug, Clone, PartialEq)]
pub enum EventKind {
    /// The vessel's stack configuration index changed.
    Staging { from: i64, to: i64 },
    Spawned { name: String, class: VesselClass },
    Recorded(RecordedEvent),
    Deleted,
}

/// A discrete event that occurred during simulation.
#[derive(Debug, Clone, PartialEq)]
pub struct SimEvent {
    pub time: f64,
    pub vessel: String,
    pub kind: EventKind,
}

impl fmt::Display for SimEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t={:8.2}  {:<16} ", self.time, self.vessel)?;
        match &self.kind {
            EventKind::Staging { from, to } => write!(f, "configuration {from} -> {to}"),
            EventKind::Spawned { name, class } => write!(f, "spawned {name} ({class})"),
            EventKind::Recorded(ev) => write!(f, "recorded {ev}"),
            EventKind::Deleted => write!(f, "deleted"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_pairs_parse_back() {
        let events = [
            RecordedEvent::SrbIgnition,
            RecordedEvent::Jettison(JettisonTarget::Boosters),
            RecordedEvent::Jettison(JettisonTarget::Tank),
            RecordedEvent::AdjustLaunchTime(12.5),
        ];
        for ev in events {
            let back = RecordedEvent::parse(ev.event_type(), &ev.payload());
            assert_eq!(back, Some(ev));
        }
    }

    #[test]
    fn unknown_events_are_ignored() {
        assert_eq!(RecordedEvent::parse("JET", "PAYLOAD"), None);
        assert_eq!(RecordedEvent::parse("GEAR", "UP"), None);
        assert_eq!(RecordedEvent::parse("ADJUST_LAUNCHTIME", "soon"), None);
    }

    #[test]
    fn display_is_readable() {
        let ev = SimEvent {
            time: 3.0,
            vessel: "STS-101".into(),
            kind: EventKind::Staging { from: 0, to: 1 },
        };
        assert!(ev.to_string().contains("configuration 0 -> 1"));
    }
}

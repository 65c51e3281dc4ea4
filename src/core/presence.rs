//! Presence state machine: turns successive membership tests into Enter/Exit
//! events, one per transition.

use crate::models::position::PositionSample;
use crate::models::presence::{PresenceEvent, PresenceEventType, ZoneMembershipState};
use crate::models::zone::Zone;
use std::collections::HashMap;
use tokio::sync::broadcast;

const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Per (user, zone) membership plus the append-only presence log.
///
/// Samples for one user must be evaluated in arrival order; the machine
/// itself does not reorder anything.
#[derive(Debug)]
pub struct PresenceStateMachine {
    states: HashMap<(String, i64), ZoneMembershipState>,
    log: Vec<PresenceEvent>,
    next_id: i64,
    publisher: broadcast::Sender<PresenceEvent>,
}

impl Default for PresenceStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl PresenceStateMachine {
    pub fn new() -> Self {
        let (publisher, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            states: HashMap::new(),
            log: Vec::new(),
            next_id: 1,
            publisher,
        }
    }

    /// Continue event numbering after ids already handed to storage.
    pub fn resume_after(&mut self, last_id: i64) {
        self.next_id = self.next_id.max(last_id + 1);
    }

    /// Seed membership from a previously persisted state without emitting anything.
    pub fn restore(&mut self, user_id: &str, zone_id: i64, state: ZoneMembershipState) {
        self.states.insert((user_id.to_string(), zone_id), state);
    }

    /// Evaluate one sample against one zone.
    ///
    /// Returns the event when membership flipped, `None` when it did not.
    /// With no prior state the user is assumed to be outside.
    pub fn evaluate(
        &mut self,
        user_id: &str,
        sample: &PositionSample,
        zone: &Zone,
    ) -> Option<PresenceEvent> {
        debug_assert!(
            zone.radius_meters > 0.0,
            "zone {} reached presence evaluation without validation",
            zone.id
        );

        let inside = zone.contains(sample.coordinate);
        let key = (user_id.to_string(), zone.id);
        let was_inside = self.states.get(&key).is_some_and(|s| s.inside);

        self.states.insert(
            key,
            ZoneMembershipState {
                inside,
                last_evaluated_at: sample.captured_at,
            },
        );

        let event_type = match (was_inside, inside) {
            (false, true) => PresenceEventType::Enter,
            (true, false) => PresenceEventType::Exit,
            _ => return None,
        };

        let event = PresenceEvent {
            id: self.next_id,
            user_id: user_id.to_string(),
            zone_id: zone.id,
            event_type,
            coordinate: sample.coordinate,
            accuracy: sample.accuracy,
            occurred_at: sample.captured_at,
        };
        self.next_id += 1;

        tracing::info!(
            user_id,
            zone_id = zone.id,
            event = %event_type,
            at = %sample.captured_at,
            "presence transition"
        );

        self.log.push(event.clone());
        // no subscribers is fine, the log keeps the event
        let _ = self.publisher.send(event.clone());
        Some(event)
    }

    /// Evaluate one sample against every zone given, in order.
    pub fn evaluate_all(
        &mut self,
        user_id: &str,
        sample: &PositionSample,
        zones: &[Zone],
    ) -> Vec<PresenceEvent> {
        zones
            .iter()
            .filter_map(|z| self.evaluate(user_id, sample, z))
            .collect()
    }

    pub fn membership(&self, user_id: &str, zone_id: i64) -> Option<ZoneMembershipState> {
        self.states.get(&(user_id.to_string(), zone_id)).copied()
    }

    /// Drop membership state for a zone that no longer exists.
    pub fn forget_zone(&mut self, zone_id: i64) {
        self.states.retain(|(_, z), _| *z != zone_id);
    }

    pub fn events(&self) -> Vec<PresenceEvent> {
        self.log.clone()
    }

    pub fn events_for(&self, user_id: &str) -> Vec<PresenceEvent> {
        self.log
            .iter()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PresenceEvent> {
        self.publisher.subscribe()
    }
}

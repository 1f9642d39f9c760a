use crate::config::GenerationConfig;
use crate::data::{Room, TimeSlot};
use std::cmp::Reverse;

/// Candidate rooms for an hour type: preferred room type first, then the
/// rest, largest capacity first within each group. Inactive rooms are dropped.
/// Ties keep their catalog order.
pub fn order_rooms<'a>(
    rooms: &'a [Room],
    hour_type: &str,
    config: &GenerationConfig,
) -> Vec<&'a Room> {
    let preferred = config.preferred_room_type(hour_type);
    let mut ordered: Vec<&Room> = rooms.iter().filter(|r| r.active).collect();
    ordered.sort_by_key(|r| (r.room_type != preferred, Reverse(r.capacity)));
    ordered
}

/// Slots in canonical (day, start) order.
pub fn order_slots(slots: &[TimeSlot]) -> Vec<&TimeSlot> {
    let mut ordered: Vec<&TimeSlot> = slots.iter().collect();
    ordered.sort_by_key(|s| s.sort_key());
    ordered
}

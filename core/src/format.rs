//! Chat rendering of slot listings.

use crate::slot::{Slot, SlotFilter, SlotId};

/// Renders one slot as a single line.
///
/// Reserved slots read `FE3: reserved by bob on 2024-01-01 for ABC-1. NOTES: ...`;
/// the `NOTES:` suffix is dropped when there are no notes.
#[must_use]
pub fn slot_line(id: SlotId, slot: &Slot) -> String {
    if slot.is_available() {
        return format!("{id}: available");
    }

    let line = format!(
        "{id}: reserved by {} on {} for {}. NOTES: {}",
        slot.owner,
        slot.reserved_on,
        slot.tickets.join(", "),
        slot.notes,
    );
    let line = line.trim();

    match line.strip_suffix("NOTES:") {
        Some(head) => head.trim_end().to_string(),
        None => line.to_string(),
    }
}

/// One comma-joined line of available slot names, ascending
#[must_use]
pub fn available_line(slots: &[(SlotId, Slot)]) -> String {
    let names: Vec<String> = slots
        .iter()
        .filter(|(_, slot)| slot.is_available())
        .map(|(id, _)| id.to_string())
        .collect();

    if names.is_empty() {
        "Currently Available FEs: none".to_string()
    } else {
        format!("Currently Available FEs: {}", names.join(", "))
    }
}

/// Renders a listing as the lines to send back, in order.
///
/// `slots` is expected sorted by id, as the registry returns it.
#[must_use]
pub fn listing(filter: SlotFilter, slots: &[(SlotId, Slot)]) -> Vec<String> {
    match filter {
        SlotFilter::Available => vec![available_line(slots)],
        SlotFilter::Single(id) if slots.is_empty() => vec![format!("{id} is not on the board")],
        SlotFilter::All | SlotFilter::Single(_) => {
            slots.iter().map(|(id, slot)| slot_line(*id, slot)).collect()
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reserved(owner: &str, date: &str, tickets: &[&str], notes: &str) -> Slot {
        Slot {
            owner: owner.to_string(),
            tickets: tickets.iter().map(ToString::to_string).collect(),
            reserved_on: date.to_string(),
            notes: notes.to_string(),
        }
    }

    #[test]
    fn listing_without_notes_drops_suffix() {
        let slots = vec![
            (SlotId::new(3), reserved("bob", "2024-01-01", &[], "")),
            (SlotId::new(4), Slot::default()),
        ];

        assert_eq!(
            listing(SlotFilter::All, &slots),
            vec![
                "FE3: reserved by bob on 2024-01-01 for .".to_string(),
                "FE4: available".to_string(),
            ]
        );
    }

    #[test]
    fn reserved_line_with_tickets_and_notes() {
        let slot = reserved("alice", "2024-02-03", &["ABC-1", "ABC-2"], "soak (reserved by fesbot)");

        assert_eq!(
            slot_line(SlotId::new(1), &slot),
            "FE1: reserved by alice on 2024-02-03 for ABC-1, ABC-2. NOTES: soak (reserved by fesbot)"
        );
    }

    #[test]
    fn available_view_is_one_line() {
        let slots = vec![
            (SlotId::new(1), Slot::default()),
            (SlotId::new(2), reserved("bob", "2024-01-01", &[], "")),
            (SlotId::new(10), Slot::default()),
        ];

        assert_eq!(
            listing(SlotFilter::Available, &slots),
            vec!["Currently Available FEs: FE1, FE10".to_string()]
        );
    }

    #[test]
    fn available_view_when_everything_is_taken() {
        let slots = vec![(SlotId::new(2), reserved("bob", "2024-01-01", &[], ""))];
        assert_eq!(available_line(&slots), "Currently Available FEs: none");
    }

    #[test]
    fn single_slot_missing_from_board() {
        assert_eq!(
            listing(SlotFilter::Single(SlotId::new(9)), &[]),
            vec!["FE9 is not on the board".to_string()]
        );
    }
}

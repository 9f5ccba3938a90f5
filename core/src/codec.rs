//! Wiki row grammar.
//!
//! Every slot is one line of a wiki table:
//!
//! ```text
//! | [FE7|Env 7 page] | alice | {ticket-macro:key=OPS-1} | 2024-01-01 | smoke tests |
//! ```
//!
//! [`RowCodec::parse`] turns a document body into slot records and
//! [`RowCodec::render_update`] rewrites the four mutable cells of one row,
//! leaving every other byte of the body untouched. Nothing outside this
//! module knows what a row looks like.

use crate::NaiveDate;
use crate::slot::{SLOT_PREFIX, Slot, SlotId};
use regex::{Captures, Regex};
use std::collections::BTreeMap;
use std::sync::LazyLock;
use thiserror::Error;

/// `| [<name>|<link>] | <owner> | <tickets> | <date> | <notes> |`
#[allow(clippy::expect_used)] // literal pattern, covered by tests
static ROW_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"\|.?\[(?P<name>{}[0-9]+)\|(?P<link>.*?)\].?\|(?P<owner>.*?)\|(?P<tickets>.*?)\|(?P<date>.*?)\|(?P<notes>.*?)\|",
        regex::escape(SLOT_PREFIX)
    ))
    .expect("row pattern is a valid regex")
});

/// Errors produced while rewriting a document body
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// No row in the body carries the requested slot name
    #[error("no row for {0} in the document")]
    RowNotFound(SlotId),
}

/// The embedded ticket reference markup, `{<name>:<key>=<TOKEN>}`
///
/// `{<name>:<key>=}` (empty token) means "no ticket".
#[derive(Clone, Debug)]
pub struct TicketMacro {
    name: String,
    key: String,
    pattern: Regex,
}

impl TicketMacro {
    /// Creates a macro spelling from its name and parameter key
    #[must_use]
    #[allow(clippy::expect_used)] // every user-supplied part is escaped
    pub fn new(name: impl Into<String>, key: impl Into<String>) -> Self {
        let name = name.into();
        let key = key.into();
        let pattern = Regex::new(&format!(
            r"{}(?P<token>[^}}]*)\}}",
            regex::escape(&format!("{{{name}:{key}="))
        ))
        .expect("escaped macro pattern is a valid regex");

        Self { name, key, pattern }
    }

    /// Parses the `name:key` configuration form (`jstat:t`)
    #[must_use]
    pub fn from_spec(spec: &str) -> Option<Self> {
        let (name, key) = spec.split_once(':')?;
        let valid = |part: &str| {
            !part.is_empty() && !part.contains(|c: char| matches!(c, '{' | '}' | ':' | '=' | '|'))
        };

        (valid(name) && valid(key)).then(|| Self::new(name, key))
    }

    /// Wraps a ticket token in the macro; an empty token renders the empty form
    #[must_use]
    pub fn render(&self, token: &str) -> String {
        format!("{{{}:{}={token}}}", self.name, self.key)
    }

    /// Every non-empty ticket token in `text`, in order
    #[must_use]
    pub fn extract(&self, text: &str) -> Vec<String> {
        self.pattern
            .captures_iter(text)
            .map(|caps| caps["token"].trim().to_string())
            .filter(|token| !token.is_empty())
            .collect()
    }

    /// Replaces every macro in `text` with its bare token
    #[must_use]
    pub fn unwrap_inline(&self, text: &str) -> String {
        self.pattern.replace_all(text, "${token}").into_owned()
    }
}

impl PartialEq for TicketMacro {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.key == other.key
    }
}

impl Eq for TicketMacro {}

impl Default for TicketMacro {
    fn default() -> Self {
        Self::new("ticket-macro", "key")
    }
}

/// New contents for the mutable cells of one row
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RowUpdate {
    /// New owner; empty releases the slot
    pub owner: String,
    /// Single ticket token; empty renders the empty macro
    pub ticket: String,
    /// Reservation date, empty on release
    pub reserved_on: String,
    /// Notes as they should appear in the cell
    pub notes: String,
}

impl RowUpdate {
    /// The available state: every mutable cell blank
    #[must_use]
    pub fn cleared() -> Self {
        Self::default()
    }

    /// A reservation stamped with `date`
    #[must_use]
    pub fn reserved(
        owner: impl Into<String>,
        ticket: impl Into<String>,
        date: NaiveDate,
        notes: impl Into<String>,
    ) -> Self {
        Self {
            owner: owner.into(),
            ticket: ticket.into(),
            reserved_on: date.format("%Y-%m-%d").to_string(),
            notes: notes.into(),
        }
    }
}

/// Parser and row rewriter for the slot table
#[derive(Clone, Debug, Default)]
pub struct RowCodec {
    ticket_macro: TicketMacro,
}

impl RowCodec {
    /// Creates a codec for documents using `ticket_macro`
    #[must_use]
    pub const fn new(ticket_macro: TicketMacro) -> Self {
        Self { ticket_macro }
    }

    /// The ticket macro this codec reads and writes
    #[must_use]
    pub const fn ticket_macro(&self) -> &TicketMacro {
        &self.ticket_macro
    }

    /// Parses every well-formed row of `body`.
    ///
    /// Lines that do not follow the row grammar are ignored. When two rows
    /// carry the same id the later one wins.
    #[must_use]
    pub fn parse(&self, body: &str) -> BTreeMap<SlotId, Slot> {
        let mut slots = BTreeMap::new();

        for caps in ROW_PATTERN.captures_iter(body) {
            let Ok(id) = SlotId::parse_token(&caps["name"]) else {
                tracing::debug!(name = &caps["name"], "Skipping row with unusable slot number");
                continue;
            };

            let tickets = normalize(&caps["tickets"]);
            let notes = normalize(&caps["notes"]);

            slots.insert(
                id,
                Slot {
                    owner: normalize(&caps["owner"]),
                    tickets: self.ticket_macro.extract(&tickets),
                    reserved_on: normalize(&caps["date"]),
                    notes: self.ticket_macro.unwrap_inline(&notes),
                },
            );
        }

        slots
    }

    /// Rewrites the owner, ticket, date and notes cells of `slot_id`'s row.
    ///
    /// The name and link cell is kept as written and every byte outside the
    /// matched row is preserved.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::RowNotFound`] when no row carries `slot_id`.
    pub fn render_update(
        &self,
        body: &str,
        slot_id: SlotId,
        update: &RowUpdate,
    ) -> Result<String, CodecError> {
        let mut found = false;

        let rewritten = ROW_PATTERN.replace_all(body, |caps: &Captures<'_>| {
            if SlotId::parse_token(&caps["name"]) != Ok(slot_id) {
                return caps[0].to_string();
            }
            found = true;
            self.render_row(&caps["name"], &caps["link"], update)
        });

        if found {
            Ok(rewritten.into_owned())
        } else {
            Err(CodecError::RowNotFound(slot_id))
        }
    }

    fn render_row(&self, name: &str, link: &str, update: &RowUpdate) -> String {
        let cells = [
            format!("[{name}|{link}]"),
            sanitize(&update.owner),
            self.ticket_macro.render(&sanitize(&update.ticket).replace(['{', '}'], "")),
            sanitize(&update.reserved_on),
            sanitize(&update.notes),
        ];

        let mut row = String::from("|");
        for cell in &cells {
            if cell.is_empty() {
                row.push_str(" |");
            } else {
                row.push(' ');
                row.push_str(cell);
                row.push_str(" |");
            }
        }
        row
    }
}

/// Trims whitespace and escape markers and drops non-breaking-space artifacts
fn normalize(cell: &str) -> String {
    cell.replace("&nbsp;", "")
        .replace('\u{a0}', " ")
        .trim_matches(|c: char| c.is_whitespace() || c == '\\')
        .to_string()
}

/// Keeps user text from breaking out of its cell
fn sanitize(text: &str) -> String {
    text.trim()
        .chars()
        .map(|c| match c {
            '|' => '/',
            '\n' | '\r' => ' ',
            other => other,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::expect_used)]

    use super::*;
    use proptest::prelude::*;

    const BOARD: &str = "h1. Shared FEs\n\
        || FE || Owner || Ticket || Date || Notes ||\n\
        | [FE1|Env 1] | alice | {ticket-macro:key=ABC-1}{ticket-macro:key=ABC-2} | 2024-01-02 | load test \\\\ |\n\
        | [FE2|Env 2] | | {ticket-macro:key=} | | |\n\
        | [FE3|Env 3] | bob&nbsp; | | 2024-01-01 | see {ticket-macro:key=OPS-9} first |\n\
        Some trailing prose.\n";

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn parses_every_row() {
        let slots = RowCodec::default().parse(BOARD);

        assert_eq!(slots.keys().map(|id| id.get()).collect::<Vec<_>>(), vec![1, 2, 3]);

        let fe1 = &slots[&SlotId::new(1)];
        assert_eq!(fe1.owner, "alice");
        assert_eq!(fe1.tickets, vec!["ABC-1".to_string(), "ABC-2".to_string()]);
        assert_eq!(fe1.reserved_on, "2024-01-02");
        assert_eq!(fe1.notes, "load test");
    }

    #[test]
    fn empty_owner_is_available() {
        let slots = RowCodec::default().parse(BOARD);
        let fe2 = &slots[&SlotId::new(2)];

        assert!(fe2.is_available());
        assert!(fe2.tickets.is_empty());
        assert!(fe2.reserved_on.is_empty());
        assert!(fe2.notes.is_empty());
    }

    #[test]
    fn normalizes_nbsp_and_unwraps_inline_tickets() {
        let slots = RowCodec::default().parse(BOARD);
        let fe3 = &slots[&SlotId::new(3)];

        assert_eq!(fe3.owner, "bob");
        assert!(fe3.tickets.is_empty());
        assert_eq!(fe3.notes, "see OPS-9 first");
    }

    #[test]
    fn ignores_lines_outside_the_grammar() {
        let body = "| [XY1|nope] | a | b | c | d |\n| FE4 | a | b | c | d |\nplain text";
        assert!(RowCodec::default().parse(body).is_empty());
    }

    #[test]
    fn duplicate_rows_last_wins() {
        let body = "| [FE5|a] | first | | | |\n| [FE5|b] | second | | | |";
        let slots = RowCodec::default().parse(body);

        assert_eq!(slots.len(), 1);
        assert_eq!(slots[&SlotId::new(5)].owner, "second");
    }

    #[test]
    fn reserve_round_trips_through_parse() {
        let codec = RowCodec::default();
        let update = RowUpdate::reserved("carol", "ABC-3", date("2024-03-04"), "perf run");

        let body = codec.render_update(BOARD, SlotId::new(2), &update).unwrap();
        let fe2 = &codec.parse(&body)[&SlotId::new(2)];

        assert_eq!(fe2.owner, "carol");
        assert_eq!(fe2.tickets, vec!["ABC-3".to_string()]);
        assert_eq!(fe2.reserved_on, "2024-03-04");
        assert_eq!(fe2.notes, "perf run");
    }

    #[test]
    fn reserve_renders_exact_ticket_macro() {
        let codec = RowCodec::default();
        let update = RowUpdate::reserved("carol", "ABC-3", date("2024-03-04"), "");

        let body = codec.render_update(BOARD, SlotId::new(2), &update).unwrap();

        assert!(body.contains("| [FE2|Env 2] | carol | {ticket-macro:key=ABC-3} | 2024-03-04 | |\n"));
    }

    #[test]
    fn whole_body_is_preserved_around_the_row() {
        let codec = RowCodec::default();
        let update = RowUpdate::reserved("dave", "", date("2024-05-06"), "x");

        let body = codec.render_update(BOARD, SlotId::new(2), &update).unwrap();
        let expected = BOARD.replace(
            "| [FE2|Env 2] | | {ticket-macro:key=} | | |",
            "| [FE2|Env 2] | dave | {ticket-macro:key=} | 2024-05-06 | x |",
        );

        assert_eq!(body, expected);
    }

    #[test]
    fn release_clears_every_cell_and_is_idempotent() {
        let codec = RowCodec::default();

        let once = codec.render_update(BOARD, SlotId::new(1), &RowUpdate::cleared()).unwrap();
        let twice = codec.render_update(&once, SlotId::new(1), &RowUpdate::cleared()).unwrap();

        assert_eq!(once, twice);
        assert!(once.contains("| [FE1|Env 1] | | {ticket-macro:key=} | | |\n"));
        assert_eq!(codec.parse(&once)[&SlotId::new(1)], Slot::default());
    }

    #[test]
    fn missing_row_leaves_body_alone() {
        let result = RowCodec::default().render_update(BOARD, SlotId::new(9), &RowUpdate::cleared());
        assert_eq!(result, Err(CodecError::RowNotFound(SlotId::new(9))));
    }

    #[test]
    fn id_match_is_exact_and_keeps_original_name() {
        let body = "| [FE1|one] | a | | | |\n| [FE10|ten] | b | | | |\n| [FE07|seven] | c | | | |";
        let codec = RowCodec::default();

        let out = codec.render_update(body, SlotId::new(1), &RowUpdate::cleared()).unwrap();
        assert!(out.contains("| [FE10|ten] | b | | | |"));

        let out = codec.render_update(body, SlotId::new(7), &RowUpdate::cleared()).unwrap();
        assert!(out.ends_with("| [FE07|seven] | | {ticket-macro:key=} | | |"));
    }

    #[test]
    fn user_text_cannot_break_the_row() {
        let codec = RowCodec::default();
        let update = RowUpdate::reserved("eve", "", date("2024-01-01"), "a | b\nc");

        let body = codec.render_update(BOARD, SlotId::new(2), &update).unwrap();

        assert_eq!(body.lines().count(), BOARD.lines().count());
        assert_eq!(codec.parse(&body)[&SlotId::new(2)].notes, "a / b c");
    }

    #[test]
    fn braces_in_a_ticket_cannot_close_the_macro() {
        let codec = RowCodec::default();
        let update = RowUpdate::reserved("eve", "AB}C{", date("2024-01-01"), "");

        let body = codec.render_update(BOARD, SlotId::new(2), &update).unwrap();

        assert!(body.contains("| [FE2|Env 2] | eve | {ticket-macro:key=ABC} | 2024-01-01 | |\n"));
        assert_eq!(codec.parse(&body)[&SlotId::new(2)].tickets, vec!["ABC".to_string()]);
    }

    #[test]
    fn dollar_signs_are_literal() {
        let codec = RowCodec::default();
        let update = RowUpdate::reserved("$1", "", date("2024-01-01"), "costs $5");

        let body = codec.render_update(BOARD, SlotId::new(2), &update).unwrap();
        let fe2 = &codec.parse(&body)[&SlotId::new(2)];

        assert_eq!(fe2.owner, "$1");
        assert_eq!(fe2.notes, "costs $5");
    }

    #[test]
    fn custom_ticket_macro() {
        let codec = RowCodec::new(TicketMacro::from_spec("jstat:t").unwrap());
        let body = "| [FE1|x] | a | {jstat:t=OPS-1} | | ping {jstat:t=OPS-2} |";
        let fe1 = &codec.parse(body)[&SlotId::new(1)];

        assert_eq!(fe1.tickets, vec!["OPS-1".to_string()]);
        assert_eq!(fe1.notes, "ping OPS-2");
        assert_eq!(codec.ticket_macro().render(""), "{jstat:t=}");
    }

    #[test]
    fn ticket_macro_spec_validation() {
        assert!(TicketMacro::from_spec("jstat").is_none());
        assert!(TicketMacro::from_spec(":t").is_none());
        assert!(TicketMacro::from_spec("a{b:t").is_none());
        assert_eq!(TicketMacro::from_spec("ticket-macro:key"), Some(TicketMacro::default()));
    }

    #[test]
    fn unterminated_macro_is_left_as_text() {
        let m = TicketMacro::default();
        assert_eq!(m.unwrap_inline("see {ticket-macro:key=ABC"), "see {ticket-macro:key=ABC");
        assert!(m.extract("{ticket-macro:key=ABC").is_empty());
    }

    fn board(owners: &[String]) -> String {
        owners
            .iter()
            .enumerate()
            .map(|(i, owner)| format!("| [FE{}|Env] | {owner} | {{ticket-macro:key=}} | | |\n", i + 1))
            .collect()
    }

    proptest! {
        #[test]
        fn render_update_touches_only_its_row(
            owners in proptest::collection::vec("[a-z]{0,8}", 1..12),
            pick in any::<proptest::sample::Index>(),
            new_owner in "[a-z]{1,8}",
        ) {
            let body = board(&owners);
            let target = pick.index(owners.len());
            let update = RowUpdate::reserved(new_owner, "T-1", date("2024-01-01"), "n");

            let out = RowCodec::default()
                .render_update(&body, SlotId::new(u32::try_from(target + 1).unwrap()), &update)
                .unwrap();

            let before: Vec<_> = body.lines().collect();
            let after: Vec<_> = out.lines().collect();
            prop_assert_eq!(before.len(), after.len());
            for (i, (old, new)) in before.iter().zip(&after).enumerate() {
                if i != target {
                    prop_assert_eq!(old, new);
                }
            }
        }
    }
}

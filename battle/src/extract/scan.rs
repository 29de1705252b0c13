//! Single forward pass turning a log into an [`ExtractedBattle`]

use replaydex_protocol::{
    ProtocolLine, Side, line_type, names_match, normalize_species, parse_tokens, tokenize,
};

use super::record::{
    EventRecord, ExtractedBattle, PreviewRecord, RevealedRecord, SideRecord,
};

/// Turn and time context of the line being read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Cursor {
    pub turn: u32,
    pub time_marker: Option<i64>,
}

impl Cursor {
    /// Cursor after reading `line`. Only `turn` and `t:` lines move it.
    pub fn advance(self, line: &ProtocolLine) -> Cursor {
        match line {
            ProtocolLine::Turn(turn) => Cursor {
                turn: *turn,
                ..self
            },
            ProtocolLine::Timestamp(time) => Cursor {
                time_marker: Some(*time),
                ..self
            },
            _ => self,
        }
    }
}

/// Per-side team preview slot counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SlotCounters([u32; 2]);

impl SlotCounters {
    /// Claim the next 1-based slot for `side`
    pub fn next(&mut self, side: Side) -> u32 {
        let slot = &mut self.0[side.index()];
        *slot += 1;
        *slot
    }
}

/// Extract events and per-line facts from a full battle log.
///
/// `operator_name` is compared against each player declaration to flag the
/// user's side. Never fails: every line yields exactly one event.
pub fn extract_battle(log: &str, operator_name: Option<&str>) -> ExtractedBattle {
    let mut battle = ExtractedBattle::default();
    let mut cursor = Cursor::default();
    let mut slots = SlotCounters::default();

    for (index, raw) in log.lines().enumerate() {
        let tokens = tokenize(raw);
        let line = parse_tokens(&tokens);

        cursor = cursor.advance(&line);

        battle.events.push(EventRecord {
            index: index as u32,
            turn: cursor.turn,
            time_marker: cursor.time_marker,
            line_type: line_type(&tokens).to_string(),
            raw: raw.to_string(),
        });

        apply_line(&mut battle, &mut slots, line, operator_name);
    }

    battle
}

/// Fold one classified line into the battle being built
fn apply_line(
    battle: &mut ExtractedBattle,
    slots: &mut SlotCounters,
    line: ProtocolLine,
    operator_name: Option<&str>,
) {
    match line {
        ProtocolLine::Player {
            side,
            username,
            avatar,
            rating,
        } => {
            let is_user = operator_name.is_some_and(|op| names_match(op, &username));
            upsert_side(battle, SideRecord {
                side,
                player_name: username,
                avatar,
                rating,
                is_user,
            });
        }

        ProtocolLine::Poke {
            side,
            details,
            raw_details,
        } => {
            battle.preview.push(PreviewRecord {
                side,
                slot_index: slots.next(side),
                species: details.species,
                level: details.level,
                gender: details.gender,
                raw_details,
            });
        }

        ProtocolLine::ShowTeam { side, entries } => {
            for entry in entries {
                let key = normalize_species(&entry.species);
                let seen = battle
                    .revealed
                    .iter()
                    .any(|r| r.side == side && normalize_species(&r.entry.species) == key);
                if !seen {
                    battle.revealed.push(RevealedRecord { side, entry });
                }
            }
        }

        ProtocolLine::Generation(generation) => {
            battle.generation.get_or_insert(generation);
        }

        ProtocolLine::GameType(game_type) => {
            battle.game_type.get_or_insert(game_type);
        }

        ProtocolLine::Tier(tier) => {
            battle.tier.get_or_insert(tier);
        }

        ProtocolLine::Rated(_) => {
            battle.is_rated = true;
        }

        ProtocolLine::Timestamp(time) => {
            battle.started_at.get_or_insert(time);
        }

        ProtocolLine::Win(name) => {
            battle.winner_name = Some(name);
        }

        ProtocolLine::Tie => {
            battle.tie = true;
        }

        // Switches and faints are resolved later from the committed events
        ProtocolLine::Turn(_)
        | ProtocolLine::Switch { .. }
        | ProtocolLine::Faint(_)
        | ProtocolLine::Other => {}
    }
}

/// Merge a player declaration into the side list.
///
/// Showdown repeats `|player|` lines (e.g. when a player leaves); blank
/// fields in a repeat never erase what an earlier line declared.
fn upsert_side(battle: &mut ExtractedBattle, record: SideRecord) {
    match battle.sides.iter_mut().find(|s| s.side == record.side) {
        Some(existing) => {
            if !record.player_name.is_empty() {
                existing.player_name = record.player_name;
                existing.is_user = record.is_user;
            }
            if record.avatar.is_some() {
                existing.avatar = record.avatar;
            }
            if record.rating.is_some() {
                existing.rating = record.rating;
            }
        }
        None => battle.sides.push(record),
    }
}

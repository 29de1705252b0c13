//! Tests for `BattleStore` against an in-memory database.

use chrono::{TimeZone, Utc};
use replaydex_battle::{
    BroughtFact, ExtractedBattle, RevealedEntry, RevealedRecord, derive_brought, extract_battle,
};
use replaydex_protocol::Side;
use replaydex_team::{EvidenceSource, LinkDecision, LinkMethod};

use crate::{BattleStore, Error, MANUAL_LINK_METHOD, MatchedBy, NewBattle, NewTeamVersion};

const LOG: &str = "\
|j|☆Ash
|player|p1|Ash|red|1500
|player|p2|Gary|blue|
|gametype|doubles
|gen|9
|tier|[Gen 9] VGC 2024 Reg G
|rated|
|poke|p1|Incineroar, L50, M|
|poke|p1|Flutter Mane, L50|
|poke|p2|Amoonguss, L50, F|
|poke|p2|Rillaboom, L50, M|
|teampreview
|t:|1700000000
|start
|switch|p1a: Incineroar|Incineroar, L50, M|100/100
|switch|p2a: Fungus|Amoonguss, L50, F|100/100
|turn|1
|move|p1a: Incineroar|Fake Out|p2a: Fungus
|faint|p2a: Fungus
|switch|p2a: Rillaboom|Rillaboom, L50, M|100/100
|turn|2
|win|Ash";

fn store() -> BattleStore {
    BattleStore::open_in_memory().expect("in-memory store")
}

fn header(replay_id: &str, extracted: &ExtractedBattle) -> NewBattle {
    let winner = extracted.winner();
    NewBattle {
        replay_id: replay_id.to_string(),
        format_id: Some("gen9vgc2024regg".to_string()),
        format_name: extracted.tier.clone(),
        generation: extracted.generation,
        game_type: extracted.game_type.clone(),
        is_rated: extracted.is_rated,
        rating: None,
        views: Some(3),
        is_private: false,
        played_at: extracted.started_at,
        uploaded_at: Some(1_700_000_500),
        winner_side: winner.side(),
        winner_name: winner.name().map(str::to_string),
        is_tie: extracted.tie,
        log_text: LOG.to_string(),
        metadata_json: "{}".to_string(),
    }
}

fn ingest(store: &mut BattleStore, replay_id: &str) -> i64 {
    let extracted = extract_battle(LOG, Some("ash"));
    let id = store
        .rebuild_battle(&header(replay_id, &extracted), &extracted)
        .unwrap();
    let facts = derive_brought(&store.derivation_events(id).unwrap());
    store.replace_brought_pokemon(id, &facts).unwrap();
    id
}

fn team(name: &str, species: &[&str]) -> NewTeamVersion {
    NewTeamVersion {
        team_name: name.to_string(),
        format_id: Some("gen9vgc2024regg".to_string()),
        species: species.iter().map(|s| s.to_string()).collect(),
        created_at: None,
    }
}

fn auto_decision(team_version_id: i64) -> LinkDecision {
    LinkDecision {
        team_version_id: Some(team_version_id),
        linked: true,
        confidence: 0.75,
        overlap: 4,
        method: LinkMethod::BroughtOverlap,
        source: Some(EvidenceSource::Brought),
    }
}

// ─── Battles ─────────────────────────────────────────────────────────────────

#[test]
fn rebuild_stores_header_and_children() {
    let mut s = store();
    let id = ingest(&mut s, "gen9vgc2024regg-1");

    let battle = s.battle(id).unwrap().unwrap();
    assert_eq!(battle.replay_id, "gen9vgc2024regg-1");
    assert_eq!(battle.generation, Some(9));
    assert_eq!(battle.game_type.as_deref(), Some("doubles"));
    assert!(battle.is_rated);
    assert_eq!(battle.played_at, Some(1_700_000_000));
    assert_eq!(battle.winner_side, Some(Side::P1));

    let events = s.events(id).unwrap();
    assert_eq!(events.len(), LOG.lines().count());
    assert!(events.windows(2).all(|w| w[0].index < w[1].index));

    let sides = s.sides(id).unwrap();
    assert_eq!(sides.len(), 2);
    assert_eq!(s.user_side(id).unwrap(), Some(Side::P1));

    assert_eq!(
        s.preview_species(id, Side::P2).unwrap(),
        vec!["Amoonguss", "Rillaboom"]
    );
}

#[test]
fn rebuild_is_idempotent() {
    let mut s = store();
    let first = ingest(&mut s, "gen9vgc2024regg-1");
    let events = s.events(first).unwrap();
    let brought = s.brought_pokemon(first).unwrap();
    let preview = s.preview(first).unwrap();

    let second = ingest(&mut s, "gen9vgc2024regg-1");
    assert_eq!(first, second);
    assert_eq!(s.events(second).unwrap(), events);
    assert_eq!(s.preview(second).unwrap(), preview);

    let again = s.brought_pokemon(second).unwrap();
    assert_eq!(again.len(), brought.len());
    for (a, b) in again.iter().zip(&brought) {
        assert_eq!((a.side, &a.species, a.is_lead, a.fainted), (b.side, &b.species, b.is_lead, b.fainted));
    }
}

#[test]
fn rebuild_keeps_created_at() {
    let mut s = store();
    let id = ingest(&mut s, "gen9vgc2024regg-1");
    let created = s.battle(id).unwrap().unwrap().created_at;

    ingest(&mut s, "gen9vgc2024regg-1");
    let battle = s.battle(id).unwrap().unwrap();
    assert_eq!(battle.created_at, created);
    assert!(battle.updated_at >= created);
}

#[test]
fn battle_by_replay_id_missing_returns_none() {
    let s = store();
    assert!(s.battle_by_replay_id("nope").unwrap().is_none());
}

#[test]
fn derivation_events_only_switch_family_and_faint() {
    let mut s = store();
    let id = ingest(&mut s, "gen9vgc2024regg-1");

    let events = s.derivation_events(id).unwrap();
    assert_eq!(events.len(), 4);
    assert!(
        events
            .iter()
            .all(|e| ["switch", "drag", "replace", "faint"].contains(&e.line_type.as_str()))
    );
}

// ─── Brought pokemon ─────────────────────────────────────────────────────────

#[test]
fn brought_pokemon_flags() {
    let mut s = store();
    let id = ingest(&mut s, "gen9vgc2024regg-1");

    let p2 = s
        .brought_pokemon(id)
        .unwrap()
        .into_iter()
        .filter(|b| b.side == Side::P2)
        .collect::<Vec<_>>();
    assert_eq!(p2.len(), 2);

    let amoonguss = p2.iter().find(|b| b.species == "Amoonguss").unwrap();
    assert!(amoonguss.is_lead);
    assert!(amoonguss.fainted);

    let rillaboom = p2.iter().find(|b| b.species == "Rillaboom").unwrap();
    assert!(!rillaboom.is_lead);
    assert!(!rillaboom.fainted);
}

#[test]
fn brought_merge_case_insensitive_by_max() {
    let mut s = store();
    let id = ingest(&mut s, "gen9vgc2024regg-1");

    let facts = [
        BroughtFact {
            side: Side::P1,
            species: "Gholdengo".to_string(),
            first_event_index: 3,
            is_lead: true,
            fainted: false,
        },
        BroughtFact {
            side: Side::P1,
            species: "GHOLDENGO".to_string(),
            first_event_index: 9,
            is_lead: false,
            fainted: true,
        },
    ];
    s.replace_brought_pokemon(id, &facts).unwrap();

    let rows = s.brought_pokemon(id).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].species, "Gholdengo");
    assert!(rows[0].is_lead);
    assert!(rows[0].fainted);
}

#[test]
fn brought_merge_folds_non_ascii_case() {
    let mut s = store();
    let id = ingest(&mut s, "gen9vgc2024regg-1");

    let fact = |species: &str, is_lead, fainted| BroughtFact {
        side: Side::P2,
        species: species.to_string(),
        first_event_index: 4,
        is_lead,
        fainted,
    };
    s.replace_brought_pokemon(id, &[fact("Flabébé", true, false), fact("FLABÉBÉ", false, true)])
        .unwrap();

    let rows = s.brought_pokemon(id).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].species, "Flabébé");
    assert!(rows[0].is_lead && rows[0].fainted);
}

#[test]
fn brought_flags_survive_later_lower_run() {
    let mut s = store();
    let id = ingest(&mut s, "gen9vgc2024regg-1");

    let fact = |species: &str, flag| BroughtFact {
        side: Side::P1,
        species: species.to_string(),
        first_event_index: 3,
        is_lead: flag,
        fainted: flag,
    };
    s.replace_brought_pokemon(id, &[fact("Gholdengo", true)]).unwrap();
    s.replace_brought_pokemon(id, &[fact("gholdengo", false)]).unwrap();

    let rows = s.brought_pokemon(id).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].species, "Gholdengo");
    assert!(rows[0].is_lead);
    assert!(rows[0].fainted);

    // Re-ingestion drops the instances, so flags start over
    let again = ingest(&mut s, "gen9vgc2024regg-1");
    assert_eq!(again, id);
    assert!(
        s.brought_pokemon(id)
            .unwrap()
            .iter()
            .all(|b| b.species != "Gholdengo")
    );
}

#[test]
fn replace_brought_unknown_battle() {
    let mut s = store();
    assert!(matches!(
        s.replace_brought_pokemon(42, &[]),
        Err(Error::BattleNotFound(42))
    ));
}

// ─── Revealed sets ───────────────────────────────────────────────────────────

#[test]
fn revealed_unique_per_normalized_species() {
    let mut s = store();
    let mut extracted = extract_battle(LOG, Some("ash"));
    let reveal = |species: &str, item: &str| RevealedRecord {
        side: Side::P2,
        entry: RevealedEntry {
            species: species.to_string(),
            item: Some(item.to_string()),
            moves: vec!["Spore".to_string()],
            ..RevealedEntry::default()
        },
    };
    extracted.revealed = vec![
        reveal("Amoonguss", "Rocky Helmet"),
        reveal("AMOONGUSS ", "Sitrus Berry"),
        reveal("Rillaboom", "Miracle Seed"),
    ];

    let id = s
        .rebuild_battle(&header("gen9vgc2024regg-1", &extracted), &extracted)
        .unwrap();

    let revealed = s.revealed(id).unwrap();
    assert_eq!(revealed.len(), 2);
    assert_eq!(revealed[0].entry.species, "Amoonguss");
    assert_eq!(revealed[0].entry.item.as_deref(), Some("Rocky Helmet"));
    assert_eq!(revealed[0].entry.moves, vec!["Spore"]);
    assert_eq!(
        s.revealed_species(id, Side::P2).unwrap(),
        vec!["Amoonguss", "Rillaboom"]
    );
}

// ─── Team versions ───────────────────────────────────────────────────────────

#[test]
fn team_versions_most_recent_first() {
    let mut s = store();
    let mut old = team("old", &["Incineroar"]);
    old.created_at = Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
    let mut new = team("new", &["Rillaboom"]);
    new.created_at = Some(Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap());
    let mut other = team("other", &["Pikachu"]);
    other.format_id = Some("gen9ou".to_string());

    let old_id = s.register_team_version(&old).unwrap();
    let new_id = s.register_team_version(&new).unwrap();
    s.register_team_version(&other).unwrap();

    let ids = s
        .team_versions(Some("gen9vgc2024regg"))
        .unwrap()
        .into_iter()
        .map(|t| t.team_version_id)
        .collect::<Vec<_>>();
    assert_eq!(ids, vec![new_id, old_id]);
    assert_eq!(s.team_versions(None).unwrap().len(), 3);
}

#[test]
fn team_version_roster_in_slot_order() {
    let mut s = store();
    let id = s
        .register_team_version(&team("rain", &["Pelipper", "Archaludon", "Basculegion"]))
        .unwrap();

    let roster = s.team_version(id).unwrap().unwrap();
    assert_eq!(roster.team_name, "rain");
    assert_eq!(roster.species, vec!["Pelipper", "Archaludon", "Basculegion"]);
    assert!(s.team_version(id + 1).unwrap().is_none());
}

// ─── Links ───────────────────────────────────────────────────────────────────

#[test]
fn auto_link_written_and_replaced() {
    let mut s = store();
    let id = ingest(&mut s, "gen9vgc2024regg-1");
    let a = s.register_team_version(&team("a", &["Incineroar"])).unwrap();
    let b = s.register_team_version(&team("b", &["Incineroar"])).unwrap();

    assert!(s.write_auto_link(id, Side::P1, &auto_decision(a)).unwrap());
    assert!(s.write_auto_link(id, Side::P1, &auto_decision(b)).unwrap());

    let link = s.link(id, Side::P1).unwrap().unwrap();
    assert_eq!(link.team_version_id, Some(b));
    assert_eq!(link.matched_by, MatchedBy::Auto);
    assert_eq!(link.method, "team-link_brought_overlap");
}

#[test]
fn user_link_blocks_auto_write() {
    let mut s = store();
    let id = ingest(&mut s, "gen9vgc2024regg-1");
    let mine = s.register_team_version(&team("mine", &["Incineroar"])).unwrap();
    let other = s.register_team_version(&team("other", &["Incineroar"])).unwrap();

    s.set_user_link(id, Side::P1, Some(mine)).unwrap();
    assert!(!s.write_auto_link(id, Side::P1, &auto_decision(other)).unwrap());

    let link = s.link(id, Side::P1).unwrap().unwrap();
    assert_eq!(link.team_version_id, Some(mine));
    assert_eq!(link.matched_by, MatchedBy::User);
    assert_eq!(link.method, MANUAL_LINK_METHOD);
    assert_eq!(link.confidence, 1.0);
}

#[test]
fn user_link_survives_rebuild_auto_does_not() {
    let mut s = store();
    let id = ingest(&mut s, "gen9vgc2024regg-1");
    let t = s.register_team_version(&team("t", &["Incineroar"])).unwrap();

    s.set_user_link(id, Side::P1, Some(t)).unwrap();
    s.write_auto_link(id, Side::P2, &auto_decision(t)).unwrap();

    ingest(&mut s, "gen9vgc2024regg-1");

    assert_eq!(s.link(id, Side::P1).unwrap().unwrap().matched_by, MatchedBy::User);
    assert!(s.link(id, Side::P2).unwrap().is_none());
}

#[test]
fn user_link_to_no_team() {
    let mut s = store();
    let id = ingest(&mut s, "gen9vgc2024regg-1");

    s.set_user_link(id, Side::P1, None).unwrap();
    let link = s.link(id, Side::P1).unwrap().unwrap();
    assert_eq!(link.team_version_id, None);
    assert_eq!(link.matched_by, MatchedBy::User);
}

#[test]
fn user_link_validates_references() {
    let mut s = store();
    let id = ingest(&mut s, "gen9vgc2024regg-1");

    assert!(matches!(
        s.set_user_link(id + 1, Side::P1, None),
        Err(Error::BattleNotFound(_))
    ));
    assert!(matches!(
        s.set_user_link(id, Side::P1, Some(99)),
        Err(Error::TeamVersionNotFound(99))
    ));
}

#[test]
fn clear_link_removes_user_link() {
    let mut s = store();
    let id = ingest(&mut s, "gen9vgc2024regg-1");
    s.set_user_link(id, Side::P1, None).unwrap();

    assert!(s.clear_link(id, Side::P1).unwrap());
    assert!(!s.clear_link(id, Side::P1).unwrap());
    assert!(s.links(id).unwrap().is_empty());
}

#[test]
fn battles_missing_user_link_skips_linked() {
    let mut s = store();
    let first = ingest(&mut s, "gen9vgc2024regg-1");
    let second = ingest(&mut s, "gen9vgc2024regg-2");

    assert_eq!(s.battles_missing_user_link(None, 10).unwrap(), vec![second, first]);

    s.set_user_link(first, Side::P1, None).unwrap();
    assert_eq!(s.battles_missing_user_link(None, 10).unwrap(), vec![second]);
    assert!(s.battles_missing_user_link(Some("gen9ou"), 10).unwrap().is_empty());
    assert_eq!(s.battles_missing_user_link(None, 0).unwrap(), Vec::<i64>::new());
}

// ─── Analysis cache ──────────────────────────────────────────────────────────

#[test]
fn analysis_cache_cleared_on_rebuild() {
    let mut s = store();
    let id = ingest(&mut s, "gen9vgc2024regg-1");

    let payload = serde_json::json!({ "turns": 2 });
    s.put_analysis(id, "summary", &payload).unwrap();
    assert_eq!(s.analysis(id, "summary").unwrap(), Some(payload));

    ingest(&mut s, "gen9vgc2024regg-1");
    assert!(s.analysis(id, "summary").unwrap().is_none());
}

// ─── Battle sets ─────────────────────────────────────────────────────────────

#[test]
fn battle_set_identity_by_key() {
    let mut s = store();
    let a = ingest(&mut s, "gen9vgc2024regg-1");
    let b = ingest(&mut s, "gen9vgc2024regg-2");

    let first = s.attach_battle_set("key", &[a, b]).unwrap();
    let second = s.attach_battle_set("key", &[b, a]).unwrap();
    assert_eq!(first, second);

    let set = s.battle_set_by_key("key").unwrap().unwrap();
    assert_eq!(set.game_count, 2);
    let games = set
        .games
        .iter()
        .map(|g| (g.battle_id, g.game_number))
        .collect::<Vec<_>>();
    assert_eq!(games, vec![(b, 1), (a, 2)]);
    assert_eq!(set.games[0].replay_id, "gen9vgc2024regg-2");
}

#[test]
fn battle_set_unknown_battle() {
    let mut s = store();
    assert!(matches!(
        s.attach_battle_set("key", &[7]),
        Err(Error::BattleNotFound(7))
    ));
    assert!(s.battle_set_by_key("key").unwrap().is_none());
}

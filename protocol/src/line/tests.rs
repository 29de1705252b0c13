use crate::{PokemonDetails, ProtocolLine, Side, SwitchKind, line_type, parse_line, tokenize};

#[test]
fn test_parse_player() {
    let line = parse_line("|player|p1|☆Ash|ash-kanto|1532");

    assert_eq!(
        line,
        ProtocolLine::Player {
            side: Side::P1,
            username: "☆Ash".into(),
            avatar: Some("ash-kanto".into()),
            rating: Some(1532),
        }
    );
}

#[test]
fn test_parse_player_without_rating() {
    let line = parse_line("|player|p2|Misty|");

    assert_eq!(
        line,
        ProtocolLine::Player {
            side: Side::P2,
            username: "Misty".into(),
            avatar: None,
            rating: None,
        }
    );
}

#[test]
fn test_parse_poke() {
    let ProtocolLine::Poke {
        side,
        details,
        raw_details,
    } = parse_line("|poke|p1|Incineroar, L50, M|")
    else {
        panic!("expected poke");
    };

    assert_eq!(side, Side::P1);
    assert_eq!(details.species, "Incineroar");
    assert_eq!(details.level, Some(50));
    assert_eq!(details.gender, Some('M'));
    assert_eq!(raw_details, "Incineroar, L50, M");
}

#[test]
fn test_parse_switch_family() {
    let line = parse_line("|drag|p2a: Fluffy|Amoonguss, L50, F|100/100");

    let ProtocolLine::Switch {
        kind,
        pokemon,
        details,
    } = line
    else {
        panic!("expected switch");
    };
    assert_eq!(kind, SwitchKind::Drag);
    assert_eq!(pokemon.side, Side::P2);
    assert_eq!(pokemon.name, "Fluffy");
    assert_eq!(
        details,
        PokemonDetails {
            species: "Amoonguss".into(),
            level: Some(50),
            gender: Some('F'),
            shiny: false,
            tera_type: None,
        }
    );
}

#[test]
fn test_parse_progress_lines() {
    assert_eq!(parse_line("|turn|12"), ProtocolLine::Turn(12));
    assert_eq!(parse_line("|t:|1700000000"), ProtocolLine::Timestamp(1_700_000_000));
    assert_eq!(parse_line("|win|Misty"), ProtocolLine::Win("Misty".into()));
    assert_eq!(parse_line("|tie"), ProtocolLine::Tie);
    assert_eq!(parse_line("|rated|"), ProtocolLine::Rated(None));
    assert_eq!(parse_line("|gen|9"), ProtocolLine::Generation(9));
    assert_eq!(
        parse_line("|gametype|doubles"),
        ProtocolLine::GameType("doubles".into())
    );
}

#[test]
fn test_malformed_known_line_is_other() {
    assert_eq!(parse_line("|turn|soon"), ProtocolLine::Other);
    assert_eq!(parse_line("|player|p7|Nobody"), ProtocolLine::Other);
    assert_eq!(parse_line("|switch|nonsense|Pikachu"), ProtocolLine::Other);
}

#[test]
fn test_parse_unknown() {
    assert_eq!(parse_line("|someunknown|data"), ProtocolLine::Other);
}

#[test]
fn test_parse_empty() {
    assert_eq!(parse_line(""), ProtocolLine::Other);
    assert_eq!(line_type(&tokenize("")), "unknown");
    assert_eq!(line_type(&tokenize("|")), "unknown");
}

#[test]
fn test_line_type() {
    assert_eq!(line_type(&tokenize("|-damage|p1a: X|50/100")), "-damage");
    assert_eq!(line_type(&tokenize("|t:|1")), "t:");
}

//! Confidence-scored matching of battle evidence against team rosters

use std::collections::BTreeSet;
use std::fmt;

use replaydex_protocol::normalize_species;
use serde::{Deserialize, Serialize};

use crate::roster::TeamRoster;

/// Minimum distinct revealed species before a team reveal counts as evidence
pub const DEFAULT_REVEALED_TRUST_FLOOR: usize = 4;

/// Which derived fact set a decision was based on, strongest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvidenceSource {
    Brought,
    Revealed,
    Preview,
}

/// A battle's inferred species set for one side
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evidence {
    pub source: EvidenceSource,
    /// Normalized species names
    pub species: BTreeSet<String>,
}

impl Evidence {
    pub fn new<S: AsRef<str>>(source: EvidenceSource, species: &[S]) -> Self {
        Self {
            source,
            species: normalized_set(species),
        }
    }
}

fn normalized_set<S: AsRef<str>>(species: &[S]) -> BTreeSet<String> {
    species
        .iter()
        .map(|s| normalize_species(s.as_ref()))
        .filter(|s| !s.is_empty())
        .collect()
}

/// Pick the most trustworthy evidence available.
///
/// Brought species win when present. Revealed species are used only when
/// at least `trust_floor` distinct species were revealed. Preview species
/// are the last resort.
pub fn select_evidence<S: AsRef<str>>(
    brought: &[S],
    revealed: &[S],
    preview: &[S],
    trust_floor: usize,
) -> Option<Evidence> {
    let brought = normalized_set(brought);
    if !brought.is_empty() {
        return Some(Evidence {
            source: EvidenceSource::Brought,
            species: brought,
        });
    }

    let revealed = normalized_set(revealed);
    if !revealed.is_empty() && revealed.len() >= trust_floor {
        return Some(Evidence {
            source: EvidenceSource::Revealed,
            species: revealed,
        });
    }

    let preview = normalized_set(preview);
    if !preview.is_empty() {
        return Some(Evidence {
            source: EvidenceSource::Preview,
            species: preview,
        });
    }

    None
}

/// Acceptance bar for one evidence source
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SourceThreshold {
    pub min_overlap: usize,
    pub min_confidence: f64,
}

impl SourceThreshold {
    pub fn accepts(&self, overlap: usize, confidence: f64) -> bool {
        overlap >= self.min_overlap && confidence >= self.min_confidence
    }
}

/// Per-source acceptance bars. Preview evidence is species-only, so it
/// has to clear a higher bar than brought or revealed evidence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchThresholds {
    /// Applies to brought and revealed evidence
    pub corroborated: SourceThreshold,
    pub preview: SourceThreshold,
}

impl Default for MatchThresholds {
    fn default() -> Self {
        Self {
            corroborated: SourceThreshold {
                min_overlap: 4,
                min_confidence: 0.66,
            },
            preview: SourceThreshold {
                min_overlap: 5,
                min_confidence: 0.83,
            },
        }
    }
}

impl MatchThresholds {
    pub fn for_source(&self, source: EvidenceSource) -> SourceThreshold {
        match source {
            EvidenceSource::Brought | EvidenceSource::Revealed => self.corroborated,
            EvidenceSource::Preview => self.preview,
        }
    }
}

/// Auditable tag describing how a decision was reached
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LinkMethod {
    #[serde(rename = "team-link_brought_overlap")]
    BroughtOverlap,
    #[serde(rename = "team-link_revealed_overlap")]
    RevealedOverlap,
    #[serde(rename = "team-link_preview_overlap")]
    PreviewOverlap,
    #[serde(rename = "team-link_no_data")]
    NoData,
    #[serde(rename = "team_empty")]
    TeamEmpty,
    #[serde(rename = "battle_species_empty")]
    BattleSpeciesEmpty,
}

impl LinkMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            LinkMethod::BroughtOverlap => "team-link_brought_overlap",
            LinkMethod::RevealedOverlap => "team-link_revealed_overlap",
            LinkMethod::PreviewOverlap => "team-link_preview_overlap",
            LinkMethod::NoData => "team-link_no_data",
            LinkMethod::TeamEmpty => "team_empty",
            LinkMethod::BattleSpeciesEmpty => "battle_species_empty",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "team-link_brought_overlap" => Some(LinkMethod::BroughtOverlap),
            "team-link_revealed_overlap" => Some(LinkMethod::RevealedOverlap),
            "team-link_preview_overlap" => Some(LinkMethod::PreviewOverlap),
            "team-link_no_data" => Some(LinkMethod::NoData),
            "team_empty" => Some(LinkMethod::TeamEmpty),
            "battle_species_empty" => Some(LinkMethod::BattleSpeciesEmpty),
            _ => None,
        }
    }

    fn for_source(source: EvidenceSource) -> Self {
        match source {
            EvidenceSource::Brought => LinkMethod::BroughtOverlap,
            EvidenceSource::Revealed => LinkMethod::RevealedOverlap,
            EvidenceSource::Preview => LinkMethod::PreviewOverlap,
        }
    }
}

impl fmt::Display for LinkMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of scoring one battle side against one roster
#[derive(Debug, Clone, PartialEq)]
pub struct LinkDecision {
    pub team_version_id: Option<i64>,
    pub linked: bool,
    /// overlap / roster size, in [0, 1]
    pub confidence: f64,
    pub overlap: usize,
    pub method: LinkMethod,
    pub source: Option<EvidenceSource>,
}

impl LinkDecision {
    /// A non-link with nothing to score
    pub fn no_data() -> Self {
        Self {
            team_version_id: None,
            linked: false,
            confidence: 0.0,
            overlap: 0,
            method: LinkMethod::NoData,
            source: None,
        }
    }
}

/// Score `evidence` against one roster.
pub fn score(
    evidence: Option<&Evidence>,
    roster: &TeamRoster,
    thresholds: &MatchThresholds,
) -> LinkDecision {
    let Some(evidence) = evidence else {
        return LinkDecision {
            team_version_id: Some(roster.team_version_id),
            ..LinkDecision::no_data()
        };
    };

    let team = roster.species_set();
    let rejected = |method| LinkDecision {
        team_version_id: Some(roster.team_version_id),
        linked: false,
        confidence: 0.0,
        overlap: 0,
        method,
        source: Some(evidence.source),
    };

    if team.is_empty() {
        return rejected(LinkMethod::TeamEmpty);
    }
    if evidence.species.is_empty() {
        return rejected(LinkMethod::BattleSpeciesEmpty);
    }

    let overlap = evidence.species.intersection(&team).count();
    let confidence = overlap as f64 / team.len() as f64;
    let linked = thresholds
        .for_source(evidence.source)
        .accepts(overlap, confidence);

    LinkDecision {
        team_version_id: Some(roster.team_version_id),
        linked,
        confidence,
        overlap,
        method: LinkMethod::for_source(evidence.source),
        source: Some(evidence.source),
    }
}

/// Highest-confidence roster that clears its threshold.
///
/// Rosters are evaluated in the given order and a later roster only
/// replaces the current best with a strictly higher confidence, so ties
/// keep the first one evaluated.
pub fn best_match(
    evidence: Option<&Evidence>,
    rosters: &[TeamRoster],
    thresholds: &MatchThresholds,
) -> Option<LinkDecision> {
    let evidence = evidence?;

    rosters
        .iter()
        .map(|roster| score(Some(evidence), roster, thresholds))
        .filter(|decision| decision.linked)
        .fold(None, |best: Option<LinkDecision>, decision| match best {
            Some(best) if best.confidence >= decision.confidence => Some(best),
            _ => Some(decision),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEAM: [&str; 6] = [
        "Incineroar",
        "Flutter Mane",
        "Rillaboom",
        "Urshifu-Rapid-Strike",
        "Landorus",
        "Ogerpon-Hearthflame",
    ];

    fn roster(id: i64, species: &[&str]) -> TeamRoster {
        TeamRoster {
            team_version_id: id,
            team_name: format!("team {id}"),
            format_id: None,
            species: species.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_evidence_prefers_brought() {
        let evidence = select_evidence(&["Incineroar"], &TEAM, &TEAM, 4).unwrap();
        assert_eq!(evidence.source, EvidenceSource::Brought);
        assert_eq!(evidence.species.len(), 1);
    }

    #[test]
    fn test_revealed_needs_trust_floor() {
        let empty: [&str; 0] = [];
        let evidence = select_evidence(&empty, &TEAM[..3], &TEAM, 4).unwrap();
        assert_eq!(evidence.source, EvidenceSource::Preview);

        let evidence = select_evidence(&empty, &TEAM[..4], &TEAM, 4).unwrap();
        assert_eq!(evidence.source, EvidenceSource::Revealed);
    }

    #[test]
    fn test_no_evidence() {
        let empty: [&str; 0] = [];
        assert!(select_evidence(&empty, &empty, &empty, 4).is_none());
        assert!(select_evidence(&["  "], &empty, &empty, 4).is_none());
    }

    #[test]
    fn test_confidence_bounds_and_superset() {
        let thresholds = MatchThresholds::default();
        let mut battle = TEAM.to_vec();
        battle.push("Amoonguss");
        let evidence = Evidence::new(EvidenceSource::Brought, &battle);

        let decision = score(Some(&evidence), &roster(1, &TEAM), &thresholds);
        assert_eq!(decision.confidence, 1.0);
        assert_eq!(decision.overlap, 6);
        assert!(decision.linked);

        let disjoint = Evidence::new(EvidenceSource::Brought, &["Pikachu"]);
        let decision = score(Some(&disjoint), &roster(1, &TEAM), &thresholds);
        assert_eq!(decision.confidence, 0.0);
        assert!(!decision.linked);
    }

    #[test]
    fn test_case_insensitive_overlap() {
        let evidence = Evidence::new(
            EvidenceSource::Brought,
            &["incineroar", " FLUTTER MANE", "rillaboom", "landorus"],
        );
        let decision = score(Some(&evidence), &roster(1, &TEAM), &MatchThresholds::default());
        assert_eq!(decision.overlap, 4);
    }

    #[test]
    fn test_threshold_accept_brought() {
        let evidence = Evidence::new(EvidenceSource::Brought, &TEAM[..4]);
        let decision = score(Some(&evidence), &roster(7, &TEAM), &MatchThresholds::default());

        assert!((decision.confidence - 4.0 / 6.0).abs() < 1e-9);
        assert!(decision.linked);
        assert_eq!(decision.method, LinkMethod::BroughtOverlap);
        assert_eq!(decision.method.as_str(), "team-link_brought_overlap");
        assert_eq!(decision.team_version_id, Some(7));
    }

    #[test]
    fn test_threshold_reject_preview() {
        let evidence = Evidence::new(EvidenceSource::Preview, &TEAM[..4]);
        let decision = score(Some(&evidence), &roster(7, &TEAM), &MatchThresholds::default());

        assert!((decision.confidence - 4.0 / 6.0).abs() < 1e-9);
        assert!(!decision.linked);
        assert_eq!(decision.method, LinkMethod::PreviewOverlap);
    }

    #[test]
    fn test_preview_accepts_five_of_six() {
        let evidence = Evidence::new(EvidenceSource::Preview, &TEAM[..5]);
        let decision = score(Some(&evidence), &roster(7, &TEAM), &MatchThresholds::default());
        assert!(decision.linked);
    }

    #[test]
    fn test_thresholds_overridable() {
        let evidence = Evidence::new(EvidenceSource::Preview, &TEAM[..4]);
        let relaxed = MatchThresholds {
            preview: SourceThreshold {
                min_overlap: 4,
                min_confidence: 0.5,
            },
            ..MatchThresholds::default()
        };
        assert!(score(Some(&evidence), &roster(7, &TEAM), &relaxed).linked);
    }

    #[test]
    fn test_empty_team_and_no_data() {
        let evidence = Evidence::new(EvidenceSource::Brought, &TEAM);
        let decision = score(Some(&evidence), &roster(2, &[]), &MatchThresholds::default());
        assert_eq!(decision.method, LinkMethod::TeamEmpty);
        assert!(!decision.linked);

        let decision = score(None, &roster(2, &TEAM), &MatchThresholds::default());
        assert_eq!(decision.method, LinkMethod::NoData);
        assert!(!decision.linked);
    }

    #[test]
    fn test_battle_species_empty() {
        let evidence = Evidence {
            source: EvidenceSource::Brought,
            species: BTreeSet::new(),
        };
        let decision = score(Some(&evidence), &roster(2, &TEAM), &MatchThresholds::default());
        assert_eq!(decision.method, LinkMethod::BattleSpeciesEmpty);
    }

    #[test]
    fn test_best_match_picks_highest_confidence() {
        let evidence = Evidence::new(EvidenceSource::Brought, &TEAM);
        let mut partial = TEAM[..4].to_vec();
        partial.extend(["Pikachu", "Raichu"]);

        let rosters = vec![roster(1, &partial), roster(2, &TEAM), roster(3, &["Pikachu"])];
        let best = best_match(Some(&evidence), &rosters, &MatchThresholds::default()).unwrap();
        assert_eq!(best.team_version_id, Some(2));
    }

    #[test]
    fn test_best_match_tie_keeps_first() {
        let evidence = Evidence::new(EvidenceSource::Brought, &TEAM);
        let rosters = vec![roster(10, &TEAM), roster(11, &TEAM)];
        let best = best_match(Some(&evidence), &rosters, &MatchThresholds::default()).unwrap();
        assert_eq!(best.team_version_id, Some(10));
    }

    #[test]
    fn test_best_match_none_qualifies() {
        let evidence = Evidence::new(EvidenceSource::Brought, &TEAM[..2]);
        let rosters = vec![roster(1, &TEAM)];
        assert!(best_match(Some(&evidence), &rosters, &MatchThresholds::default()).is_none());
        assert!(best_match(None, &rosters, &MatchThresholds::default()).is_none());
    }

    #[test]
    fn test_method_round_trips_through_tag() {
        for method in [
            LinkMethod::BroughtOverlap,
            LinkMethod::PreviewOverlap,
            LinkMethod::TeamEmpty,
        ] {
            assert_eq!(LinkMethod::parse(method.as_str()), Some(method));
        }
    }
}

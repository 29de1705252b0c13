//! `replaydex` - ingest Pokemon Showdown replays and link them to teams.
//!
//! # Usage
//!
//! ```text
//! replaydex import https://replay.pokemonshowdown.com/gen9vgc2024regg-1 gen9vgc2024regg-2
//! replaydex ingest-file gen9ou-42 ./battle.log --format-id gen9ou
//! replaydex rederive
//! replaydex link 17
//! replaydex backfill 3 --limit 50
//! replaydex confirm 17 --team-version 3
//! ```
//!
//! Settings come from `replaydex.toml` (or `--config`) and `REPLAYDEX_*`
//! environment variables.

use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use replaydex_ingest::{IngestConfig, Ingestor, ItemOutcome};
use replaydex_protocol::Side;
use replaydex_replay::{ReplayPayload, ShowdownReplaySource};
use replaydex_store::BattleStore;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Pokemon Showdown replay ingestion")]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "replaydex.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch and ingest replays; two or more successes form a battle set.
    Import {
        /// Replay ids or URLs
        #[arg(required = true)]
        references: Vec<String>,
    },

    /// Ingest a battle log from a local file.
    IngestFile {
        replay_id: String,
        path: PathBuf,
        #[arg(long)]
        format_id: Option<String>,
    },

    /// Recompute brought pokemon for every stored battle.
    Rederive,

    /// Auto-link the user side of one battle.
    Link { battle_id: i64 },

    /// Link unlinked battles that match one team version.
    Backfill {
        team_version_id: i64,
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Record the team a battle side was played with.
    Confirm {
        battle_id: i64,
        /// Side to confirm; defaults to the user side
        #[arg(long)]
        side: Option<Side>,
        /// Omit to record that no registered team was used
        #[arg(long)]
        team_version: Option<i64>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .init();

    let cli = Cli::parse();

    let config = IngestConfig::load(&cli.config).context("failed to read configuration")?;
    let store = BattleStore::open(&config.database_path)
        .with_context(|| format!("failed to open store at {:?}", config.database_path))?;
    let mut ingestor = Ingestor::new(store, config);

    match cli.command {
        Command::Import { references } => {
            let config = ingestor.config();
            let source =
                ShowdownReplaySource::new(config.replay_base_url.clone(), config.fetch_timeout())
                    .context("failed to build replay client")?;

            let report = ingestor.import_batch(&source, &references).await?;
            for item in &report.items {
                match &item.outcome {
                    ItemOutcome::Ingested(outcome) => {
                        println!("ok     {} -> battle {}", outcome.replay_id, outcome.battle_id)
                    }
                    ItemOutcome::Failed(message) => println!("failed {}: {message}", item.reference),
                }
            }
            if let Some(set_id) = report.set_id {
                println!("battle set {set_id}");
            }
        }

        Command::IngestFile {
            replay_id,
            path,
            format_id,
        } => {
            let log = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            let mut payload = ReplayPayload::from_log(replay_id, log);
            payload.format_id = format_id;

            let outcome = ingestor.ingest_payload(&payload)?;
            println!(
                "battle {}: {} events, {} brought",
                outcome.battle_id, outcome.events, outcome.brought
            );
        }

        Command::Rederive => {
            let report = ingestor.rederive_all()?;
            println!(
                "{} battles, {} facts, {} failed",
                report.battles, report.facts, report.failed
            );
        }

        Command::Link { battle_id } => {
            let link = ingestor.auto_link(battle_id, None)?;
            let decision = &link.decision;
            println!(
                "{} (team {:?}, confidence {:.2}, written {})",
                decision.method, decision.team_version_id, decision.confidence, link.written
            );
        }

        Command::Backfill {
            team_version_id,
            limit,
        } => {
            let report = ingestor.backfill(team_version_id, limit, None)?;
            println!("scanned {}, linked {}", report.scanned, report.linked);
        }

        Command::Confirm {
            battle_id,
            side,
            team_version,
        } => {
            let side = match side {
                Some(side) => side,
                None => ingestor
                    .store()
                    .user_side(battle_id)?
                    .with_context(|| format!("battle {battle_id} has no user side; pass --side"))?,
            };
            ingestor.confirm_link(battle_id, side, team_version)?;
        }
    }

    Ok(())
}

//! Plays a seeded rehearsal match through an in-memory store and prints the
//! history table, final standings and the last overlay snapshot.
//!
//! Usage: cargo run --example scripted_match -- [seed] [settings.json]

use anyhow::Result;
use mjcast_core::codes::CodeGenerator;
use mjcast_core::history::HistoryRow;
use mjcast_core::rehearsal::rehearse_session;
use mjcast_core::{MatchSession, MatchSettings, MemoryStore};
use mjcast_engine::Player;

fn main() -> Result<()> {
    let mut args = std::env::args().skip(1);
    let seed: u64 = match args.next() {
        Some(s) => s.parse()?,
        None => 7,
    };
    let settings = match args.next() {
        Some(path) => MatchSettings::from_path(path)?,
        None => MatchSettings::default(),
    };

    let mut seed_bytes = [0u8; 32];
    seed_bytes[..8].copy_from_slice(&seed.to_le_bytes());
    let mut codes = CodeGenerator::new(seed_bytes);

    let players = [
        Player::new("East Player"),
        Player::new("South Player"),
        Player::new("West Player"),
        Player::new("North Player"),
    ];
    let mut session =
        MatchSession::create(MemoryStore::new(), players, settings, &mut codes, "demo")?;
    let resolved = rehearse_session(&mut session, seed)?;

    println!(
        "match {} ({} rounds)",
        session.match_record().code,
        resolved
    );
    for row in session.history_table()? {
        match row {
            HistoryRow::Opening { scores } => println!("{:<20} {:?}", "start", scores),
            HistoryRow::Round { label, deltas, .. } => println!("{:<20} {:?}", label, deltas),
            HistoryRow::Correction { label, scores, .. } => {
                println!("{:<20} = {:?}", format!("{} (fix)", label), scores)
            }
            HistoryRow::Closing { scores } => println!("{:<20} {:?}", "final", scores),
        }
    }

    println!();
    for standing in session.standings() {
        let name = &session.match_record().player(standing.slot).name;
        println!(
            "#{} {:<14} {:>6} {:>+7.1}",
            standing.rank, name, standing.score, standing.points
        );
    }

    println!();
    println!("{}", serde_json::to_string_pretty(&session.overlay()?)?);
    Ok(())
}

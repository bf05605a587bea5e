//! Bull Arena table demo
//!
//! Runs one table with fast ticks and a handful of simulated bettors,
//! printing each settlement as JSON. Pass a JSON table config as the
//! first argument to override the defaults.

use std::time::Duration;

use arena_core::{ArenaError, ArenaResult, ParticipantId, Phase, PoolId, RoundConfig, RoundId};
use arena_round::RoundSnapshot;
use arena_runtime::{init_logging, Lobby, LoggingConfig, TableConfig, TableHandle};
use rand::Rng;

const ROUNDS: u64 = 3;
const BETTORS: u64 = 6;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging(&LoggingConfig::default());

    let config = match std::env::args().nth(1) {
        Some(json) => TableConfig::from_json(&json)?,
        None => TableConfig::continuous(RoundConfig::quick(), Duration::from_millis(200)),
    };

    println!("=== Bull Arena ===");
    println!(
        "   {} barns, {}s betting, {}s lock, {}s attack, tick every {:?}\n",
        config.round.pool_count,
        config.round.betting_secs,
        config.round.lock_secs,
        config.round.attack_secs,
        config.tick_interval()
    );

    let lobby = Lobby::new();
    let table = lobby.open(&config)?;

    let bettors: Vec<_> = (1..=BETTORS)
        .map(|id| tokio::spawn(bettor(table.clone(), ParticipantId::new(id), config.round.pool_count)))
        .collect();

    // A table without auto reset is reset here once its result is shown
    let manual_reset = config.auto_reset_after.is_none();
    for state in report_rounds(&table, ROUNDS, config.tick_interval() / 4, manual_reset).await? {
        println!("Round {} - barn {:?} destroyed", state.round, state.eliminated);
        println!("   totals {:?}", state.totals());
        if let Some(settlement) = &state.settlement {
            println!("{}", serde_json::to_string_pretty(settlement)?);
        }
    }

    lobby.close_all().await;
    for bettor in bettors {
        bettor.await?;
    }
    Ok(())
}

/// Collect the RESULT snapshot of the next `rounds` rounds
async fn report_rounds(
    table: &TableHandle,
    rounds: u64,
    poll: Duration,
    manual_reset: bool,
) -> ArenaResult<Vec<RoundSnapshot>> {
    let mut reported = RoundId::default();
    let mut results = Vec::new();
    while (results.len() as u64) < rounds {
        let state = table.latest();
        if state.phase == Phase::Result && state.round > reported {
            reported = state.round;
            results.push(state);
            if manual_reset && (results.len() as u64) < rounds {
                table.reset().await?;
            }
        }
        tokio::time::sleep(poll).await;
    }
    Ok(results)
}

/// Bet at random moments until the table goes away
async fn bettor(table: TableHandle, me: ParticipantId, pool_count: u32) {
    loop {
        let (pool, amount, pause) = {
            let mut rng = rand::thread_rng();
            (
                PoolId::new(rng.gen_range(1..=pool_count)),
                rng.gen_range(10..=500),
                Duration::from_millis(rng.gen_range(50..400)),
            )
        };

        match table.place_bet(me, pool, amount).await {
            Ok(_) => tracing::info!(participant = %me, %pool, amount, "bet placed"),
            Err(ArenaError::TableClosed) => break,
            Err(_) => {}
        }
        tokio::time::sleep(pause).await;
    }
}

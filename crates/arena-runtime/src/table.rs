//! Table - single owner task for one round coordinator

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use arena_core::{Amount, ArenaError, ArenaResult, ParticipantId, Phase, PoolId, RoundId};
use arena_round::{RoundCoordinator, RoundSnapshot};
use arena_state::Replaced;
use parking_lot::RwLock;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{Interval, MissedTickBehavior};

use crate::TableConfig;

/// Table identity - one per concurrently running round
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct TableId(pub u64);

impl fmt::Debug for TableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Table({})", self.0)
    }
}

impl fmt::Display for TableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where clock ticks come from
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickSource {
    /// One tick per interval of wall-clock time
    Interval(Duration),
    /// Only `TableHandle::tick`
    Manual,
}

/// Requests processed by the table task
enum Command {
    PlaceBet {
        participant: ParticipantId,
        pool: PoolId,
        amount: Amount,
        reply: oneshot::Sender<ArenaResult<Option<Replaced>>>,
    },
    Tick {
        reply: oneshot::Sender<ArenaResult<Option<Phase>>>,
    },
    Reset {
        reply: oneshot::Sender<ArenaResult<RoundId>>,
    },
    Snapshot {
        reply: oneshot::Sender<RoundSnapshot>,
    },
    Shutdown,
}

/// The task side of a table
struct Table {
    id: TableId,
    coordinator: RoundCoordinator,
    commands: mpsc::Receiver<Command>,
    published: Arc<RwLock<RoundSnapshot>>,
    auto_reset_after: Option<u32>,
    /// Ticks spent in RESULT so far
    result_ticks: u32,
}

impl Table {
    async fn run(mut self, ticks: TickSource) {
        let mut interval = match ticks {
            TickSource::Interval(period) => {
                let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
                interval.set_missed_tick_behavior(MissedTickBehavior::Burst);
                Some(interval)
            }
            TickSource::Manual => None,
        };

        tracing::info!(table = %self.id, ?ticks, "table started");
        loop {
            tokio::select! {
                biased;
                command = self.commands.recv() => match command {
                    Some(Command::Shutdown) | None => break,
                    Some(command) => self.handle(command),
                },
                _ = next_tick(&mut interval) => {
                    if let Err(e) = self.on_tick() {
                        tracing::error!(table = %self.id, error = %e, "tick failed");
                    }
                }
            }
            self.publish();
        }
        tracing::info!(table = %self.id, "table stopped");
    }

    fn handle(&mut self, command: Command) {
        // A dropped reply receiver only means the caller stopped waiting
        match command {
            Command::PlaceBet {
                participant,
                pool,
                amount,
                reply,
            } => {
                let _ = reply.send(self.coordinator.place_bet(participant, pool, amount));
            }
            Command::Tick { reply } => {
                let _ = reply.send(self.on_tick());
            }
            Command::Reset { reply } => {
                let result = self.coordinator.reset();
                if result.is_ok() {
                    self.result_ticks = 0;
                }
                let _ = reply.send(result);
            }
            Command::Snapshot { reply } => {
                let _ = reply.send(self.coordinator.current_state());
            }
            Command::Shutdown => {}
        }
    }

    fn on_tick(&mut self) -> ArenaResult<Option<Phase>> {
        if self.coordinator.phase() == Phase::Result {
            if let Some(limit) = self.auto_reset_after {
                self.result_ticks += 1;
                if self.result_ticks >= limit {
                    self.result_ticks = 0;
                    self.coordinator.reset()?;
                    return Ok(Some(Phase::Betting));
                }
            }
        }
        self.coordinator.tick()
    }

    fn publish(&self) {
        *self.published.write() = self.coordinator.current_state();
    }
}

async fn next_tick(interval: &mut Option<Interval>) {
    match interval {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}

/// Client side of a table. Cheap to clone; every clone talks to the same task.
#[derive(Clone)]
pub struct TableHandle {
    id: TableId,
    commands: mpsc::Sender<Command>,
    published: Arc<RwLock<RoundSnapshot>>,
    task: Arc<parking_lot::Mutex<Option<JoinHandle<()>>>>,
}

impl TableHandle {
    /// Spawn the table task on the current tokio runtime
    pub fn spawn(
        id: TableId,
        coordinator: RoundCoordinator,
        config: &TableConfig,
        ticks: TickSource,
    ) -> Self {
        let (tx, rx) = mpsc::channel(config.command_buffer.max(1));
        let published = Arc::new(RwLock::new(coordinator.current_state()));

        let table = Table {
            id,
            coordinator,
            commands: rx,
            published: Arc::clone(&published),
            auto_reset_after: config.auto_reset_after,
            result_ticks: 0,
        };
        let task = tokio::spawn(table.run(ticks));

        TableHandle {
            id,
            commands: tx,
            published,
            task: Arc::new(parking_lot::Mutex::new(Some(task))),
        }
    }

    pub fn id(&self) -> TableId {
        self.id
    }

    async fn request<T>(&self, build: impl FnOnce(oneshot::Sender<T>) -> Command) -> ArenaResult<T> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(build(reply))
            .await
            .map_err(|_| ArenaError::TableClosed)?;
        response.await.map_err(|_| ArenaError::TableClosed)
    }

    /// Queue a bet; resolved in order with ticks and other bets
    pub async fn place_bet(
        &self,
        participant: ParticipantId,
        pool: PoolId,
        amount: Amount,
    ) -> ArenaResult<Option<Replaced>> {
        self.request(|reply| Command::PlaceBet {
            participant,
            pool,
            amount,
            reply,
        })
        .await?
    }

    /// Inject one clock tick
    pub async fn tick(&self) -> ArenaResult<Option<Phase>> {
        self.request(|reply| Command::Tick { reply }).await?
    }

    pub async fn reset(&self) -> ArenaResult<RoundId> {
        self.request(|reply| Command::Reset { reply }).await?
    }

    /// Snapshot taken in queue order, after everything sent before it
    pub async fn snapshot(&self) -> ArenaResult<RoundSnapshot> {
        self.request(|reply| Command::Snapshot { reply }).await
    }

    /// Latest published snapshot, without queueing
    pub fn latest(&self) -> RoundSnapshot {
        self.published.read().clone()
    }

    pub fn is_closed(&self) -> bool {
        self.commands.is_closed()
    }

    /// Stop the task and wait for it to finish
    pub async fn shutdown(&self) {
        let _ = self.commands.send(Command::Shutdown).await;
        let task = self.task.lock().take();
        if let Some(task) = task {
            if let Err(e) = task.await {
                tracing::error!(table = %self.id, error = %e, "table task failed");
            }
        }
    }
}

impl fmt::Debug for TableHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TableHandle")
            .field("id", &self.id)
            .field("closed", &self.is_closed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arena_core::RoundConfig;
    use arena_round::{FixedSelector, OpenLedger};

    fn p(id: u64) -> ParticipantId {
        ParticipantId::new(id)
    }

    fn pool(id: u32) -> PoolId {
        PoolId::new(id)
    }

    fn manual_table(target: u32, config: TableConfig) -> TableHandle {
        let coordinator =
            RoundCoordinator::with_parts(config.round.clone(), FixedSelector(pool(target)), OpenLedger)
                .unwrap();
        TableHandle::spawn(TableId(1), coordinator, &config, TickSource::Manual)
    }

    async fn tick_n(table: &TableHandle, n: u32) {
        for _ in 0..n {
            table.tick().await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_bet_then_lock() {
        let table = manual_table(3, TableConfig::default());
        assert_eq!(table.place_bet(p(1), pool(3), 50).await, Ok(None));

        tick_n(&table, 59).await;
        assert_eq!(table.snapshot().await.unwrap().countdown, 1);
        assert_eq!(table.tick().await, Ok(Some(Phase::Locked)));

        assert_eq!(
            table.place_bet(p(1), pool(5), 50).await,
            Err(ArenaError::BettingClosed(Phase::Locked))
        );
        table.shutdown().await;
    }

    #[tokio::test]
    async fn test_full_round_over_queue() {
        let table = manual_table(3, TableConfig::default());
        table.place_bet(p(1), pool(3), 50).await.unwrap();
        table.place_bet(p(2), pool(4), 30).await.unwrap();

        tick_n(&table, 65).await;
        let state = table.snapshot().await.unwrap();
        assert_eq!(state.phase, Phase::Result);
        assert_eq!(state.eliminated, Some(pool(3)));
        let settlement = state.settlement.unwrap();
        assert_eq!(settlement.surviving_total(), 30);

        assert_eq!(table.reset().await, Ok(RoundId(2)));
        assert_eq!(table.latest().phase, Phase::Betting);
        table.shutdown().await;
    }

    #[tokio::test]
    async fn test_concurrent_bets_all_answered() {
        let table = manual_table(1, TableConfig::default());

        let mut tasks = Vec::new();
        for id in 0..32u64 {
            let table = table.clone();
            tasks.push(tokio::spawn(async move {
                table.place_bet(p(id), pool((id % 8) as u32 + 1), 10).await
            }));
        }
        for task in tasks {
            assert!(task.await.unwrap().is_ok());
        }

        let state = table.snapshot().await.unwrap();
        assert_eq!(state.selections.len(), 32);
        assert_eq!(state.total_staked(), 320);
        table.shutdown().await;
    }

    #[tokio::test]
    async fn test_bets_racing_the_lock_are_answered() {
        let config = TableConfig {
            round: RoundConfig::quick(),
            ..TableConfig::default()
        };
        let table = manual_table(1, config);
        tick_n(&table, 4).await;

        let mut tasks = Vec::new();
        for id in 0..16u64 {
            let table = table.clone();
            tasks.push(tokio::spawn(async move {
                (id, table.place_bet(p(id), pool(2), 5).await)
            }));
        }
        let locker = {
            let table = table.clone();
            tokio::spawn(async move { table.tick().await })
        };

        let mut accepted = Vec::new();
        for task in tasks {
            let (id, result) = task.await.unwrap();
            match result {
                Ok(_) => accepted.push(p(id)),
                Err(e) => assert_eq!(e, ArenaError::BettingClosed(Phase::Locked)),
            }
        }
        assert_eq!(locker.await.unwrap(), Ok(Some(Phase::Locked)));

        // Exactly the accepted bets are on the board
        let state = table.snapshot().await.unwrap();
        let on_board: Vec<ParticipantId> = state.selections.keys().copied().collect();
        accepted.sort();
        assert_eq!(on_board, accepted);
        table.shutdown().await;
    }

    #[tokio::test]
    async fn test_auto_reset() {
        let config = TableConfig {
            round: RoundConfig::quick(),
            auto_reset_after: Some(2),
            ..TableConfig::default()
        };
        let table = manual_table(2, config);

        tick_n(&table, 7).await;
        assert_eq!(table.snapshot().await.unwrap().phase, Phase::Result);
        assert_eq!(table.tick().await, Ok(None));
        assert_eq!(table.tick().await, Ok(Some(Phase::Betting)));

        let state = table.snapshot().await.unwrap();
        assert_eq!(state.round, RoundId(2));
        assert_eq!(state.countdown, 5);
        table.shutdown().await;
    }

    #[tokio::test]
    async fn test_closed_table() {
        let table = manual_table(1, TableConfig::default());
        table.shutdown().await;

        assert!(table.is_closed());
        assert_eq!(
            table.place_bet(p(1), pool(1), 1).await,
            Err(ArenaError::TableClosed)
        );
        assert!(table.snapshot().await.is_err());
    }

    #[tokio::test]
    async fn test_interval_ticks_drive_round() {
        let config = TableConfig::continuous(RoundConfig::quick(), Duration::from_millis(2));
        let coordinator =
            RoundCoordinator::with_parts(config.round.clone(), FixedSelector(pool(1)), OpenLedger)
                .unwrap();
        let table = TableHandle::spawn(
            TableId(9),
            coordinator,
            &config,
            TickSource::Interval(config.tick_interval()),
        );

        let reached = tokio::time::timeout(Duration::from_secs(10), async {
            loop {
                if table.latest().round > RoundId::FIRST {
                    break;
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await;
        assert!(reached.is_ok(), "table never completed a round");
        table.shutdown().await;
    }
}

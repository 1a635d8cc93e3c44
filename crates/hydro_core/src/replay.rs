//! Agendador de replay em cadência fixa.
//!
//! Máquina de estados:
//!
//! ```text
//! Idle ──begin()──▶ Running ──(cursor == len)──▶ Finished
//!                      │                            ▲
//!                      └──────────stop()────────────┘
//! ```
//!
//! [`ReplayScheduler`] é a máquina de estados pura (um `tick()` por disparo do
//! timer). [`start`] a executa numa thread dedicada com no máximo um disparo
//! pendente por vez: o próximo só é agendado depois que a emissão atual foi
//! entregue ao sink e o cursor avançou.

use crate::alerts::{self, Alert};
use crate::error::ReplayError;
use crate::sink::ReplaySink;
use crate::types::SensorReading;
use crossbeam_channel::{Receiver, Sender, TryRecvError, after, bounded, select};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::{debug, info};

/// Intervalo fixo entre emissões.
pub const REPLAY_INTERVAL: Duration = Duration::from_millis(1500);

/// Snapshot entregue ao sink a cada tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Emission {
    /// Posição da leitura na sessão (0-based)
    pub index: usize,
    pub reading: SensorReading,
    pub alerts: Vec<Alert>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplayState {
    Idle,
    Running,
    Finished,
}

/// Resultado de um disparo do timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Leitura no índice informado foi emitida
    Emitted(usize),
    /// Fim dos registros; transição para `Finished` neste tick
    Finished,
    /// Agendador fora de `Running`, nada acontece
    Inactive,
}

/// Resumo de uma sessão encerrada.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayReport {
    pub emitted: usize,
    pub total: usize,
    /// `true` se `stop()` encerrou antes do fim dos registros
    pub stopped_early: bool,
}

// ──────────────────────────────────────────────
// Sessão
// ──────────────────────────────────────────────

/// Registros (fixos após a criação) + cursor de emissão.
#[derive(Debug, Clone, Default)]
pub struct ReplaySession {
    records: Vec<SensorReading>,
    cursor: usize,
}

impl ReplaySession {
    pub fn new(records: Vec<SensorReading>) -> Self {
        Self { records, cursor: 0 }
    }

    pub fn records(&self) -> &[SensorReading] {
        &self.records
    }

    /// Índice da próxima leitura a emitir.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn remaining(&self) -> usize {
        self.records.len() - self.cursor
    }

    pub fn is_exhausted(&self) -> bool {
        self.cursor >= self.records.len()
    }
}

// ──────────────────────────────────────────────
// Máquina de estados
// ──────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct ReplayScheduler {
    session: ReplaySession,
    state: ReplayState,
}

impl ReplayScheduler {
    pub fn new(records: Vec<SensorReading>) -> Self {
        Self {
            session: ReplaySession::new(records),
            state: ReplayState::Idle,
        }
    }

    pub fn state(&self) -> ReplayState {
        self.state
    }

    pub fn session(&self) -> &ReplaySession {
        &self.session
    }

    pub fn into_session(self) -> ReplaySession {
        self.session
    }

    /// `Idle → Running`. Retorna `false` se já iniciado ou encerrado.
    pub fn begin(&mut self) -> bool {
        if self.state != ReplayState::Idle {
            return false;
        }
        self.state = ReplayState::Running;
        info!("Replay iniciado: {} leituras", self.session.len());
        true
    }

    /// Processa um disparo do timer.
    pub fn tick<S: ReplaySink + ?Sized>(&mut self, sink: &mut S) -> TickOutcome {
        if self.state != ReplayState::Running {
            return TickOutcome::Inactive;
        }

        let index = self.session.cursor;
        let Some(reading) = self.session.records.get(index) else {
            self.state = ReplayState::Finished;
            info!("Replay concluído: {} leituras emitidas", index);
            return TickOutcome::Finished;
        };

        let emission = Emission {
            index,
            reading: reading.clone(),
            alerts: alerts::evaluate(reading),
        };
        debug!(
            "Tick {index}: {} | {} alertas",
            emission.reading.timestamp,
            emission.alerts.len()
        );
        sink.on_tick(&emission);
        self.session.cursor += 1;

        TickOutcome::Emitted(index)
    }

    /// Encerra a sessão. Idempotente: retorna `false` se já estava encerrada.
    pub fn stop(&mut self) -> bool {
        if self.state == ReplayState::Finished {
            return false;
        }
        self.state = ReplayState::Finished;
        info!(
            "Replay interrompido após {} de {} leituras",
            self.session.cursor,
            self.session.len()
        );
        true
    }

    pub fn report(&self) -> ReplayReport {
        ReplayReport {
            emitted: self.session.cursor,
            total: self.session.len(),
            stopped_early: self.state == ReplayState::Finished && !self.session.is_exhausted(),
        }
    }
}

// ──────────────────────────────────────────────
// Execução em thread
// ──────────────────────────────────────────────

/// Handle de um replay em execução.
///
/// Soltar o handle sem `join()` também encerra o replay no próximo disparo.
pub struct ReplayHandle {
    stop_tx: Sender<()>,
    finished: Arc<AtomicBool>,
    worker: JoinHandle<ReplayReport>,
}

impl ReplayHandle {
    /// Pede o encerramento e cancela o disparo pendente. Idempotente.
    pub fn stop(&self) {
        // Canal de capacidade 1: pedidos repetidos ou após o fim são descartados
        let _ = self.stop_tx.try_send(());
    }

    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::Acquire)
    }

    /// Aguarda o término da sessão.
    pub fn join(self) -> Result<ReplayReport, ReplayError> {
        let Self { stop_tx, worker, .. } = self;
        let report = worker.join().map_err(|_| ReplayError::WorkerPanicked);
        drop(stop_tx);
        report
    }
}

/// Inicia o replay numa thread dedicada.
///
/// O primeiro disparo é imediato; os seguintes ocorrem a cada `interval`.
pub fn start<S>(
    records: Vec<SensorReading>,
    sink: S,
    interval: Duration,
) -> Result<ReplayHandle, ReplayError>
where
    S: ReplaySink + 'static,
{
    let (stop_tx, stop_rx) = bounded::<()>(1);
    let finished = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&finished);
    let scheduler = ReplayScheduler::new(records);

    let worker = std::thread::Builder::new()
        .name("replay-scheduler".into())
        .spawn(move || run_loop(scheduler, sink, interval, &stop_rx, &flag))
        .map_err(ReplayError::Spawn)?;

    Ok(ReplayHandle {
        stop_tx,
        finished,
        worker,
    })
}

fn stop_requested(stop_rx: &Receiver<()>) -> bool {
    !matches!(stop_rx.try_recv(), Err(TryRecvError::Empty))
}

fn run_loop<S: ReplaySink>(
    mut scheduler: ReplayScheduler,
    mut sink: S,
    interval: Duration,
    stop_rx: &Receiver<()>,
    finished: &AtomicBool,
) -> ReplayReport {
    scheduler.begin();

    loop {
        if stop_requested(stop_rx) {
            scheduler.stop();
            break;
        }
        match scheduler.tick(&mut sink) {
            TickOutcome::Emitted(_) => {}
            TickOutcome::Finished | TickOutcome::Inactive => break,
        }
        // Único disparo pendente: só agenda após a emissão atual
        select! {
            recv(stop_rx) -> _ => {
                scheduler.stop();
                break;
            }
            recv(after(interval)) -> _ => {}
        }
    }

    let report = scheduler.report();
    sink.on_finished(&report);
    finished.store(true, Ordering::Release);
    report
}

// ──────────────────────────────────────────────
// Testes
// ──────────────────────────────────────────────

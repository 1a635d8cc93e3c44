//! # Hydro Core
//!
//! Replay de leituras gravadas de qualidade da água: parsing do recurso
//! tabular, avaliação de thresholds e agendador de cadência fixa.
//!
//! ## Módulos
//! - [`types`] – Colunas e [`SensorReading`] (tokens brutos + conversão sob demanda)
//! - [`parser`] – Localiza o header e converte linhas em leituras
//! - [`alerts`] – Thresholds fixos de pH, turbidez e oxigênio dissolvido
//! - [`replay`] – Sessão, máquina de estados e thread do agendador
//! - [`sink`] – Consumidores das emissões (console, UDP)
//! - [`protocol`] – Frames binários (emissões e resumo final) do sink UDP
//! - [`config`] – Configuração via TOML
//! - [`error`] – Erros fatais

pub mod types;
pub mod parser;
pub mod alerts;
pub mod replay;
pub mod sink;
pub mod protocol;
pub mod config;
pub mod error;

// Re-exports convenientes
pub use types::{Column, SensorReading};
pub use alerts::{Alert, evaluate};
pub use replay::{Emission, REPLAY_INTERVAL, ReplayHandle, ReplayReport, ReplayScheduler, ReplayState};
pub use sink::ReplaySink;
pub use config::AppConfig;
pub use error::ReplayError;

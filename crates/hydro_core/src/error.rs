//! Erros fatais do replay.
//!
//! Erros recuperáveis ([`crate::parser::MalformedRow`] e
//! [`crate::types::NumericParseFailure`]) são tratados por omissão e nunca
//! chegam aqui.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ReplayError {
    #[error("Recurso de dados indisponível ({}): {source}", path.display())]
    ResourceUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Falha ao criar thread do agendador: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("Thread do agendador terminou com pânico")]
    WorkerPanicked,
}

//! Parser do recurso tabular de leituras.
//!
//! Formato esperado:
//!
//! ```text
//! <zero ou mais linhas de preâmbulo>
//! TIMESTAMP,DN,D_Water,TW,EC,SCOND,pH,ORP,TURBF,CHLF,O2SAT,O2,BGAPC,FDOM
//! <linhas de dados até o fim do recurso>
//! ```
//!
//! Linhas de dados com menos de [`FIELD_COUNT`] campos são descartadas em
//! silêncio (contadas em [`ParseStats::malformed_rows`]). Os tokens são
//! mantidos como texto; a conversão numérica fica para quem consome.

use crate::error::ReplayError;
use crate::types::{FIELD_COUNT, SensorReading};
use std::io::BufRead;
use std::path::Path;
use tracing::{debug, info, warn};

/// Prefixo da linha que marca o início da seção de dados.
pub const HEADER_PREFIX: &str = "TIMESTAMP,DN,D_Water";

/// Nome do recurso embutido no binário.
pub const BUNDLED_NAME: &str = "sensor_reading.csv";

/// Recurso de dados embutido em tempo de compilação.
pub const BUNDLED_RESOURCE: &str = include_str!("../data/sensor_reading.csv");

/// Linha de dados descartada por estar truncada.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Linha {line_number} malformada: {field_count} campos (mínimo {FIELD_COUNT})")]
pub struct MalformedRow {
    pub line_number: usize,
    pub field_count: usize,
}

/// Estatísticas de parsing, apenas para diagnóstico.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseStats {
    /// Total de linhas lidas (incluindo preâmbulo e header)
    pub lines_read: usize,
    /// Linhas antes do header
    pub preamble_lines: usize,
    /// Linhas de dados descartadas
    pub malformed_rows: usize,
    pub header_found: bool,
}

/// Resultado do parsing: leituras em ordem + estatísticas.
#[derive(Debug, Clone, Default)]
pub struct ParsedRecords {
    pub records: Vec<SensorReading>,
    pub stats: ParseStats,
}

/// Estado incremental do parser, alimentado linha a linha.
#[derive(Default)]
struct LineParser {
    in_data_section: bool,
    out: ParsedRecords,
}

impl LineParser {
    fn feed(&mut self, line: &str) {
        self.out.stats.lines_read += 1;
        let line_number = self.out.stats.lines_read;

        if !self.in_data_section {
            let line = line.strip_prefix('\u{feff}').unwrap_or(line);
            if line.starts_with(HEADER_PREFIX) {
                self.in_data_section = true;
                self.out.stats.header_found = true;
            } else {
                self.out.stats.preamble_lines += 1;
            }
            return;
        }

        match parse_row(line_number, line) {
            Ok(reading) => self.out.records.push(reading),
            Err(e) => {
                debug!("{e}");
                self.out.stats.malformed_rows += 1;
            }
        }
    }

    fn finish(self) -> ParsedRecords {
        let out = self.out;
        if !out.stats.header_found {
            warn!(
                "Header \"{HEADER_PREFIX}\" não encontrado em {} linhas – nenhuma leitura",
                out.stats.lines_read
            );
        } else {
            info!(
                "{} leituras carregadas ({} linhas descartadas)",
                out.records.len(),
                out.stats.malformed_rows
            );
        }
        out
    }
}

/// Divide a linha em campos, descartando campos vazios no final.
fn split_fields(line: &str) -> Vec<&str> {
    let mut fields: Vec<&str> = line.split(',').collect();
    while fields.last().is_some_and(|f| f.is_empty()) {
        fields.pop();
    }
    fields
}

/// Converte uma linha da seção de dados em [`SensorReading`].
pub fn parse_row(line_number: usize, line: &str) -> Result<SensorReading, MalformedRow> {
    let fields = split_fields(line);
    SensorReading::from_tokens(&fields).ok_or(MalformedRow {
        line_number,
        field_count: fields.len(),
    })
}

/// Faz o parsing de um texto já carregado em memória.
pub fn parse_str(text: &str) -> ParsedRecords {
    let mut parser = LineParser::default();
    for line in text.lines() {
        parser.feed(line);
    }
    parser.finish()
}

/// Faz o parsing de um leitor linha a linha.
///
/// Bytes fora de UTF-8 viram `U+FFFD`; só erro de I/O no meio da leitura é
/// fatal ([`ReplayError::ResourceUnavailable`]).
pub fn parse_reader<R: BufRead>(mut reader: R, origin: &Path) -> Result<ParsedRecords, ReplayError> {
    let mut parser = LineParser::default();
    let mut buf = Vec::new();
    loop {
        buf.clear();
        let n = reader
            .read_until(b'\n', &mut buf)
            .map_err(|source| ReplayError::ResourceUnavailable {
                path: origin.to_path_buf(),
                source,
            })?;
        if n == 0 {
            break;
        }
        let line = String::from_utf8_lossy(&buf);
        let line = line.strip_suffix('\n').unwrap_or(&line);
        parser.feed(line.strip_suffix('\r').unwrap_or(line));
    }
    Ok(parser.finish())
}

/// Carrega o texto do recurso: arquivo externo se informado, senão o embutido.
///
/// O arquivo externo é decodificado de forma tolerante: um `°` em Latin-1 no
/// preâmbulo não impede o replay.
pub fn load_resource(path: Option<&Path>) -> Result<String, ReplayError> {
    match path {
        Some(path) => {
            let bytes = std::fs::read(path).map_err(|source| ReplayError::ResourceUnavailable {
                path: path.to_path_buf(),
                source,
            })?;
            let text = match String::from_utf8(bytes) {
                Ok(text) => text,
                Err(e) => {
                    warn!(
                        "{} contém bytes fora de UTF-8 – substituídos por U+FFFD",
                        path.display()
                    );
                    String::from_utf8_lossy(e.as_bytes()).into_owned()
                }
            };
            info!("Recurso carregado de {}", path.display());
            Ok(text)
        }
        None => {
            info!("Usando recurso embutido {BUNDLED_NAME}");
            Ok(BUNDLED_RESOURCE.to_string())
        }
    }
}

// ──────────────────────────────────────────────
// Testes
// ──────────────────────────────────────────────

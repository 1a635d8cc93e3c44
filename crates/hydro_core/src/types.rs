//! Definição de tipos para leituras de qualidade da água.
//!
//! Cada [`SensorReading`] guarda o token textual original de cada coluna.
//! A conversão numérica é feita sob demanda ([`SensorReading::value`]), de
//! modo que exibição e avaliação de thresholds sempre derivam do mesmo token.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Número de colunas do contrato de dados.
pub const FIELD_COUNT: usize = 14;

// ──────────────────────────────────────────────
// Colunas
// ──────────────────────────────────────────────

/// Colunas do recurso de dados, na ordem posicional do header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Column {
    Timestamp,
    DepthOrNode,
    WaterDepth,
    Temperature,
    Conductivity,
    SpecificConductance,
    Ph,
    Orp,
    Turbidity,
    Chlorophyll,
    OxygenSaturation,
    DissolvedOxygen,
    Phycocyanin,
    FluorescentDom,
}

impl Column {
    /// Todas as colunas em ordem posicional.
    pub const ALL: [Column; FIELD_COUNT] = [
        Column::Timestamp,
        Column::DepthOrNode,
        Column::WaterDepth,
        Column::Temperature,
        Column::Conductivity,
        Column::SpecificConductance,
        Column::Ph,
        Column::Orp,
        Column::Turbidity,
        Column::Chlorophyll,
        Column::OxygenSaturation,
        Column::DissolvedOxygen,
        Column::Phycocyanin,
        Column::FluorescentDom,
    ];

    /// Posição (0-based) da coluna na linha.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Nome da coluna no header do arquivo.
    pub fn header(self) -> &'static str {
        match self {
            Column::Timestamp => "TIMESTAMP",
            Column::DepthOrNode => "DN",
            Column::WaterDepth => "D_Water",
            Column::Temperature => "TW",
            Column::Conductivity => "EC",
            Column::SpecificConductance => "SCOND",
            Column::Ph => "pH",
            Column::Orp => "ORP",
            Column::Turbidity => "TURBF",
            Column::Chlorophyll => "CHLF",
            Column::OxygenSaturation => "O2SAT",
            Column::DissolvedOxygen => "O2",
            Column::Phycocyanin => "BGAPC",
            Column::FluorescentDom => "FDOM",
        }
    }

    /// Rótulo de unidade usado na exibição, quando existe.
    pub fn unit(self) -> Option<&'static str> {
        match self {
            Column::Temperature => Some("℃"),
            Column::Conductivity | Column::SpecificConductance => Some("μS/cm"),
            Column::DissolvedOxygen => Some("mg/L"),
            _ => None,
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.header())
    }
}

// ──────────────────────────────────────────────
// Falha de conversão numérica
// ──────────────────────────────────────────────

/// Campo que não pôde ser convertido para número.
///
/// Erro recuperável: quem avalia simplesmente ignora o campo.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Valor não numérico em {column}: {raw:?}")]
pub struct NumericParseFailure {
    pub column: Column,
    pub raw: String,
}

// ──────────────────────────────────────────────
// Leitura
// ──────────────────────────────────────────────

/// Uma linha da série temporal (um timestep), imutável após a construção.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensorReading {
    pub timestamp: String,
    pub depth_or_node: String,
    pub water_depth: String,
    /// TW (℃)
    pub temperature: String,
    /// EC (μS/cm)
    pub conductivity: String,
    /// SCOND (μS/cm)
    pub specific_conductance: String,
    pub ph: String,
    /// ORP (mV)
    pub orp: String,
    /// TURBF (NTU)
    pub turbidity: String,
    pub chlorophyll: String,
    /// O2SAT (%)
    pub oxygen_saturation: String,
    /// O2 (mg/L)
    pub dissolved_oxygen: String,
    pub phycocyanin: String,
    pub fluorescent_dom: String,
}

impl SensorReading {
    /// Constrói a leitura a partir dos tokens de uma linha.
    ///
    /// Retorna `None` com menos de [`FIELD_COUNT`] tokens; tokens extras são ignorados.
    pub fn from_tokens(tokens: &[&str]) -> Option<Self> {
        if tokens.len() < FIELD_COUNT {
            return None;
        }
        let t = |c: Column| tokens[c.index()].to_string();
        Some(Self {
            timestamp: t(Column::Timestamp),
            depth_or_node: t(Column::DepthOrNode),
            water_depth: t(Column::WaterDepth),
            temperature: t(Column::Temperature),
            conductivity: t(Column::Conductivity),
            specific_conductance: t(Column::SpecificConductance),
            ph: t(Column::Ph),
            orp: t(Column::Orp),
            turbidity: t(Column::Turbidity),
            chlorophyll: t(Column::Chlorophyll),
            oxygen_saturation: t(Column::OxygenSaturation),
            dissolved_oxygen: t(Column::DissolvedOxygen),
            phycocyanin: t(Column::Phycocyanin),
            fluorescent_dom: t(Column::FluorescentDom),
        })
    }

    /// Token textual original da coluna.
    pub fn raw(&self, column: Column) -> &str {
        match column {
            Column::Timestamp => &self.timestamp,
            Column::DepthOrNode => &self.depth_or_node,
            Column::WaterDepth => &self.water_depth,
            Column::Temperature => &self.temperature,
            Column::Conductivity => &self.conductivity,
            Column::SpecificConductance => &self.specific_conductance,
            Column::Ph => &self.ph,
            Column::Orp => &self.orp,
            Column::Turbidity => &self.turbidity,
            Column::Chlorophyll => &self.chlorophyll,
            Column::OxygenSaturation => &self.oxygen_saturation,
            Column::DissolvedOxygen => &self.dissolved_oxygen,
            Column::Phycocyanin => &self.phycocyanin,
            Column::FluorescentDom => &self.fluorescent_dom,
        }
    }

    /// Valor numérico da coluna.
    ///
    /// Espaços nas bordas são ignorados. `NaN` conta como falha (dado ausente
    /// do sensor); `Infinity` é um valor válido e segue para as regras.
    pub fn value(&self, column: Column) -> Result<f64, NumericParseFailure> {
        let raw = self.raw(column);
        match raw.trim().parse::<f64>() {
            Ok(v) if !v.is_nan() => Ok(v),
            _ => Err(NumericParseFailure {
                column,
                raw: raw.to_string(),
            }),
        }
    }

    pub fn ph_value(&self) -> Result<f64, NumericParseFailure> {
        self.value(Column::Ph)
    }

    pub fn turbidity_value(&self) -> Result<f64, NumericParseFailure> {
        self.value(Column::Turbidity)
    }

    pub fn dissolved_oxygen_value(&self) -> Result<f64, NumericParseFailure> {
        self.value(Column::DissolvedOxygen)
    }

    pub fn temperature_value(&self) -> Result<f64, NumericParseFailure> {
        self.value(Column::Temperature)
    }

    pub fn conductivity_value(&self) -> Result<f64, NumericParseFailure> {
        self.value(Column::Conductivity)
    }

    /// Token formatado com o rótulo de unidade da coluna (ex: `"25.0 ℃"`).
    pub fn display_with_unit(&self, column: Column) -> String {
        match column.unit() {
            Some(unit) => format!("{} {unit}", self.raw(column)),
            None => self.raw(column).to_string(),
        }
    }
}

// ──────────────────────────────────────────────
// Testes
// ──────────────────────────────────────────────

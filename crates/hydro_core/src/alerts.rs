//! Sistema de alertas – avaliação de thresholds de qualidade da água.
//!
//! As três regras são avaliadas de forma independente a cada chamada. Um campo
//! que não converte para número apenas pula a sua regra.

use crate::types::{Column, NumericParseFailure, SensorReading};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Limite inferior de pH seguro.
pub const PH_MIN: f64 = 6.5;
/// Limite superior de pH seguro.
pub const PH_MAX: f64 = 8.5;
/// Turbidez máxima (NTU).
pub const TURBIDITY_MAX: f64 = 5.0;
/// Oxigênio dissolvido mínimo (mg/L).
pub const DISSOLVED_OXYGEN_MIN: f64 = 5.0;

/// Um alerta disparado, com o valor que violou o limite.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Alert {
    PhOutOfRange(f64),
    TurbidityHigh(f64),
    DissolvedOxygenLow(f64),
}

impl Alert {
    /// Texto curto exibido ao usuário.
    pub fn message(&self) -> &'static str {
        match self {
            Alert::PhOutOfRange(_) => "Warning: pH out of range!",
            Alert::TurbidityHigh(_) => "Warning: Turbidity high!",
            Alert::DissolvedOxygenLow(_) => "Warning: Dissolved Oxygen is low!",
        }
    }

    /// Coluna que originou o alerta.
    pub fn column(&self) -> Column {
        match self {
            Alert::PhOutOfRange(_) => Column::Ph,
            Alert::TurbidityHigh(_) => Column::Turbidity,
            Alert::DissolvedOxygenLow(_) => Column::DissolvedOxygen,
        }
    }

    pub fn value(&self) -> f64 {
        match *self {
            Alert::PhOutOfRange(v) | Alert::TurbidityHigh(v) | Alert::DissolvedOxygenLow(v) => v,
        }
    }
}

impl fmt::Display for Alert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Resultado completo da avaliação: alertas + campos ignorados.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Evaluation {
    pub alerts: Vec<Alert>,
    pub skipped: Vec<NumericParseFailure>,
}

/// Avalia a leitura contra os thresholds fixos.
///
/// Ordem dos alertas: pH, turbidez, oxigênio dissolvido.
pub fn evaluate(reading: &SensorReading) -> Vec<Alert> {
    evaluate_detailed(reading).alerts
}

/// Como [`evaluate`], mas expõe as falhas de conversão suprimidas.
pub fn evaluate_detailed(reading: &SensorReading) -> Evaluation {
    let mut eval = Evaluation::default();

    check(&mut eval, reading.ph_value(), |ph| {
        (ph < PH_MIN || ph > PH_MAX).then_some(Alert::PhOutOfRange(ph))
    });
    check(&mut eval, reading.turbidity_value(), |t| {
        (t > TURBIDITY_MAX).then_some(Alert::TurbidityHigh(t))
    });
    check(&mut eval, reading.dissolved_oxygen_value(), |o2| {
        (o2 < DISSOLVED_OXYGEN_MIN).then_some(Alert::DissolvedOxygenLow(o2))
    });

    eval
}

fn check(
    eval: &mut Evaluation,
    value: Result<f64, NumericParseFailure>,
    rule: impl FnOnce(f64) -> Option<Alert>,
) {
    match value {
        Ok(v) => eval.alerts.extend(rule(v)),
        Err(e) => {
            debug!("{e} – regra ignorada");
            eval.skipped.push(e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::tests::sample_reading;

    fn reading_with(ph: &str, turbidity: &str, o2: &str) -> SensorReading {
        SensorReading {
            ph: ph.into(),
            turbidity: turbidity.into(),
            dissolved_oxygen: o2.into(),
            ..sample_reading()
        }
    }

    #[test]
    fn no_alerts_for_normal_values() {
        assert!(evaluate(&sample_reading()).is_empty());
    }

    #[test]
    fn high_ph_triggers_only_ph_alert() {
        let alerts = evaluate(&reading_with("9.0", "2", "6.0"));
        assert_eq!(alerts, vec![Alert::PhOutOfRange(9.0)]);
    }

    #[test]
    fn low_ph_triggers_alert() {
        let alerts = evaluate(&reading_with("6.4", "2", "6.0"));
        assert_eq!(alerts, vec![Alert::PhOutOfRange(6.4)]);
    }

    #[test]
    fn turbidity_and_oxygen_co_occur() {
        let alerts = evaluate(&reading_with("7.0", "6", "3"));
        assert_eq!(
            alerts,
            vec![Alert::TurbidityHigh(6.0), Alert::DissolvedOxygenLow(3.0)]
        );
    }

    #[test]
    fn bounds_are_exclusive() {
        assert!(evaluate(&reading_with("6.5", "5", "5")).is_empty());
        assert!(evaluate(&reading_with("8.5", "5", "5")).is_empty());
    }

    #[test]
    fn nan_ph_is_suppressed_not_escalated() {
        let eval = evaluate_detailed(&reading_with("NaN", "6", "6.0"));
        assert_eq!(eval.alerts, vec![Alert::TurbidityHigh(6.0)]);
        assert_eq!(eval.skipped.len(), 1);
        assert_eq!(eval.skipped[0].column, Column::Ph);
    }

    #[test]
    fn infinite_values_still_trigger_alerts() {
        let alerts = evaluate(&reading_with("7.0", "Infinity", "-Infinity"));
        assert_eq!(
            alerts,
            vec![
                Alert::TurbidityHigh(f64::INFINITY),
                Alert::DissolvedOxygenLow(f64::NEG_INFINITY)
            ]
        );
    }

    #[test]
    fn every_field_unparseable() {
        let eval = evaluate_detailed(&reading_with("", "n/a", "-"));
        assert!(eval.alerts.is_empty());
        assert_eq!(eval.skipped.len(), 3);
    }

    #[test]
    fn evaluation_is_idempotent() {
        let r = reading_with("9.1", "7", "2");
        assert_eq!(evaluate(&r), evaluate(&r));
        assert_eq!(evaluate(&r).len(), 3);
    }

    #[test]
    fn messages_and_columns() {
        let a = Alert::DissolvedOxygenLow(3.0);
        assert_eq!(a.to_string(), "Warning: Dissolved Oxygen is low!");
        assert_eq!(a.column(), Column::DissolvedOxygen);
        assert_eq!(a.value(), 3.0);
        assert_eq!(Alert::PhOutOfRange(9.0).message(), "Warning: pH out of range!");
        assert_eq!(Alert::TurbidityHigh(6.0).message(), "Warning: Turbidity high!");
    }
}

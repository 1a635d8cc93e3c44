//! Sinks de apresentação – recebem cada emissão do agendador.
//!
//! O agendador depende apenas de [`ReplaySink`]; quem exibe (console, rede,
//! UI) fica do lado de fora. Falhas de saída são logadas e nunca interrompem
//! o replay.

use crate::protocol::{Frame, encode_frame};
use crate::replay::{Emission, ReplayReport};
use crate::types::Column;
use std::io::Write;
use std::net::UdpSocket;
use tracing::{debug, error, info, warn};

/// Consumidor das emissões do replay.
///
/// Cada [`Emission`] é um snapshot somente leitura.
pub trait ReplaySink: Send {
    fn on_tick(&mut self, emission: &Emission);

    /// Chamado uma vez, após a transição para `Finished`.
    fn on_finished(&mut self, _report: &ReplayReport) {}
}

impl<F> ReplaySink for F
where
    F: FnMut(&Emission) + Send,
{
    fn on_tick(&mut self, emission: &Emission) {
        self(emission)
    }
}

// ──────────────────────────────────────────────
// Console
// ──────────────────────────────────────────────

/// Renderiza as leituras em texto, uma linha por tick.
pub struct ConsoleSink<W> {
    out: W,
    show_units: bool,
}

impl ConsoleSink<std::io::Stdout> {
    pub fn stdout(show_units: bool) -> Self {
        Self::new(std::io::stdout(), show_units)
    }
}

impl<W: Write> ConsoleSink<W> {
    pub fn new(out: W, show_units: bool) -> Self {
        Self { out, show_units }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn field(&self, emission: &Emission, column: Column) -> String {
        if self.show_units {
            emission.reading.display_with_unit(column)
        } else {
            emission.reading.raw(column).to_string()
        }
    }

    fn render(&mut self, emission: &Emission) -> std::io::Result<()> {
        let line = format!(
            "[{:>4}] {}  pH {}  EC {}  TW {}  O2 {}",
            emission.index + 1,
            emission.reading.timestamp,
            self.field(emission, Column::Ph),
            self.field(emission, Column::Conductivity),
            self.field(emission, Column::Temperature),
            self.field(emission, Column::DissolvedOxygen),
        );
        writeln!(self.out, "{line}")?;
        for alert in &emission.alerts {
            writeln!(self.out, "       ⚠ {alert}")?;
        }
        self.out.flush()
    }
}

impl<W: Write + Send> ReplaySink for ConsoleSink<W> {
    fn on_tick(&mut self, emission: &Emission) {
        for alert in &emission.alerts {
            warn!(
                "{} ({} = {}) em {}",
                alert,
                alert.column(),
                alert.value(),
                emission.reading.timestamp
            );
        }
        if let Err(e) = self.render(emission) {
            warn!("Erro ao escrever leitura: {e}");
        }
    }

    fn on_finished(&mut self, report: &ReplayReport) {
        let status = if report.stopped_early {
            "interrompido"
        } else {
            "concluído"
        };
        if let Err(e) = writeln!(
            self.out,
            "Replay {status}: {}/{} leituras",
            report.emitted, report.total
        ) {
            warn!("Erro ao escrever resumo: {e}");
        }
    }
}

// ──────────────────────────────────────────────
// UDP
// ──────────────────────────────────────────────

/// Envia cada emissão, e o resumo final, como frames para um painel remoto.
pub struct UdpSink {
    sock: UdpSocket,
    dest_addr: String,
    frames_sent: usize,
}

impl UdpSink {
    /// Cria o socket. `bind_ip` vazio = todas as interfaces.
    pub fn connect(bind_ip: &str, dest_ip: &str, port: u16) -> std::io::Result<Self> {
        let bind_addr = if bind_ip.is_empty() {
            "0.0.0.0:0".to_string()
        } else {
            format!("{bind_ip}:0")
        };
        let sock = UdpSocket::bind(bind_addr)?;

        if dest_ip == "255.255.255.255" {
            sock.set_broadcast(true)?;
            info!("Modo BROADCAST ativado");
        } else {
            info!("Modo UNICAST → {dest_ip}");
        }

        Ok(Self {
            sock,
            dest_addr: format!("{dest_ip}:{port}"),
            frames_sent: 0,
        })
    }

    pub fn frames_sent(&self) -> usize {
        self.frames_sent
    }

    fn send(&mut self, frame: &Frame) {
        let bytes = match encode_frame(frame) {
            Ok(bytes) => bytes,
            Err(e) => {
                error!("Erro ao montar frame {:?}: {e}", frame.kind());
                return;
            }
        };
        match self.sock.send_to(&bytes, &self.dest_addr) {
            Ok(sent) => {
                self.frames_sent += 1;
                debug!("→ {sent} bytes ({:?}) para {}", frame.kind(), self.dest_addr);
            }
            Err(e) => error!("Erro ao enviar UDP: {e}"),
        }
    }
}

impl ReplaySink for UdpSink {
    fn on_tick(&mut self, emission: &Emission) {
        self.send(&Frame::Emission(emission.clone()));
    }

    /// Avisa o painel que a sessão acabou.
    fn on_finished(&mut self, report: &ReplayReport) {
        self.send(&Frame::Summary(*report));
        info!(
            "{} frames enviados para {} ({}/{} leituras)",
            self.frames_sent, self.dest_addr, report.emitted, report.total
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alerts::Alert;
    use crate::protocol::decode_frame;
    use crate::types::tests::sample_reading;
    use std::time::Duration;

    fn emission(alerts: Vec<Alert>) -> Emission {
        Emission {
            index: 2,
            reading: sample_reading(),
            alerts,
        }
    }

    fn render(sink_units: bool, e: &Emission) -> String {
        let mut sink = ConsoleSink::new(Vec::new(), sink_units);
        sink.on_tick(e);
        String::from_utf8(sink.into_inner()).unwrap()
    }

    #[test]
    fn console_shows_units() {
        let out = render(true, &emission(Vec::new()));
        assert_eq!(
            out,
            "[   3] 2024-01-01T00:00  pH 7.0  EC 500 μS/cm  TW 25.0 ℃  O2 6.0 mg/L\n"
        );
    }

    #[test]
    fn console_without_units() {
        let out = render(false, &emission(Vec::new()));
        assert!(out.contains("EC 500  TW 25.0  O2 6.0"));
    }

    #[test]
    fn console_lists_alert_messages() {
        let out = render(
            true,
            &emission(vec![Alert::TurbidityHigh(6.0), Alert::DissolvedOxygenLow(3.0)]),
        );
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].ends_with("Warning: Turbidity high!"));
        assert!(lines[2].ends_with("Warning: Dissolved Oxygen is low!"));
    }

    #[test]
    fn console_summary() {
        let mut sink = ConsoleSink::new(Vec::new(), true);
        sink.on_finished(&ReplayReport {
            emitted: 3,
            total: 3,
            stopped_early: false,
        });
        let out = String::from_utf8(sink.into_inner()).unwrap();
        assert_eq!(out, "Replay concluído: 3/3 leituras\n");
    }

    #[test]
    fn closure_is_a_sink() {
        let mut seen = Vec::new();
        {
            let mut sink = |e: &Emission| seen.push(e.index);
            sink.on_tick(&emission(Vec::new()));
        }
        assert_eq!(seen, vec![2]);
    }

    fn listener() -> (UdpSocket, u16) {
        let sock = UdpSocket::bind("127.0.0.1:0").unwrap();
        sock.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
        let port = sock.local_addr().unwrap().port();
        (sock, port)
    }

    fn recv_frame(sock: &UdpSocket) -> Frame {
        let mut buf = [0u8; 65536];
        let (size, _) = sock.recv_from(&mut buf).unwrap();
        decode_frame(&buf[..size]).unwrap()
    }

    #[test]
    fn udp_sink_delivers_emission_frames() {
        let (panel, port) = listener();
        let mut sink = UdpSink::connect("127.0.0.1", "127.0.0.1", port).unwrap();
        let sent = emission(vec![Alert::PhOutOfRange(9.0)]);
        sink.on_tick(&sent);
        assert_eq!(sink.frames_sent(), 1);
        assert_eq!(recv_frame(&panel), Frame::Emission(sent));
    }

    #[test]
    fn udp_sink_sends_summary_when_finished() {
        let (panel, port) = listener();
        let mut sink = UdpSink::connect("127.0.0.1", "127.0.0.1", port).unwrap();
        let report = ReplayReport {
            emitted: 1,
            total: 2,
            stopped_early: true,
        };
        sink.on_tick(&emission(Vec::new()));
        sink.on_finished(&report);

        assert!(matches!(recv_frame(&panel), Frame::Emission(e) if e.index == 2));
        assert_eq!(recv_frame(&panel), Frame::Summary(report));
        assert_eq!(sink.frames_sent(), 2);
    }
}

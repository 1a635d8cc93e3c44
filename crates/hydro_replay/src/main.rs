//! # Hydro Replay
//!
//! Reproduz leituras gravadas de qualidade da água, uma a cada 1,5 s, e
//! dispara alertas quando pH, turbidez ou oxigênio dissolvido saem da faixa
//! segura.
//!
//! ## Uso
//! ```bash
//! hydro_replay                      # Recurso embutido, saída no console
//! hydro_replay --data sonda.csv     # Arquivo CSV externo
//! hydro_replay --udp                # Envia frames para o painel remoto
//! ```

use hydro_core::config::AppConfig;
use hydro_core::parser::{load_resource, parse_str};
use hydro_core::replay::{self, Emission, REPLAY_INTERVAL, ReplayReport};
use hydro_core::sink::{ConsoleSink, ReplaySink, UdpSink};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info, warn};

/// Opções de linha de comando (sobrescrevem o config.toml).
#[derive(Debug, Default)]
struct CliArgs {
    data: Option<PathBuf>,
    udp: bool,
}

impl CliArgs {
    fn parse(args: impl IntoIterator<Item = String>) -> Self {
        let mut cli = CliArgs::default();
        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--data" => cli.data = args.next().map(PathBuf::from),
                "--udp" => cli.udp = true,
                other => warn!("Argumento ignorado: {other}"),
            }
        }
        cli
    }
}

/// Sink escolhido pela configuração.
enum OutputSink {
    Console(ConsoleSink<std::io::Stdout>),
    Udp(UdpSink),
}

impl ReplaySink for OutputSink {
    fn on_tick(&mut self, emission: &Emission) {
        match self {
            OutputSink::Console(s) => s.on_tick(emission),
            OutputSink::Udp(s) => s.on_tick(emission),
        }
    }

    fn on_finished(&mut self, report: &ReplayReport) {
        match self {
            OutputSink::Console(s) => s.on_finished(report),
            OutputSink::Udp(s) => s.on_finished(report),
        }
    }
}

fn build_sink(config: &AppConfig) -> std::io::Result<OutputSink> {
    let sink_cfg = &config.sink;
    if sink_cfg.mode == "udp" {
        let udp = UdpSink::connect(&sink_cfg.bind_ip, &sink_cfg.dest_ip, sink_cfg.port)?;
        Ok(OutputSink::Udp(udp))
    } else {
        Ok(OutputSink::Console(ConsoleSink::stdout(sink_cfg.show_units)))
    }
}

fn main() -> ExitCode {
    // ── Logging ──
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = CliArgs::parse(std::env::args().skip(1));

    // ── Carregar config ──
    let config_path = AppConfig::default_path();
    let mut config = match AppConfig::read(&config_path) {
        Ok(Some(config)) => {
            info!("Configuração carregada de {}", config_path.display());
            config
        }
        Ok(None) => {
            let config = AppConfig::default();
            if let Err(e) = config.save(&config_path) {
                warn!("Não foi possível salvar config padrão: {e}");
            }
            config
        }
        Err(e) => {
            warn!("{e} – usando configuração padrão");
            AppConfig::default()
        }
    };

    if let Some(data) = &cli.data {
        config.replay.data_path = data.display().to_string();
    }
    if cli.udp {
        config.sink.mode = "udp".into();
    }

    let errors = config.validate();
    if !errors.is_empty() {
        for e in &errors {
            error!("Configuração inválida: {e}");
        }
        return ExitCode::FAILURE;
    }

    // ── Recurso de dados ──
    let text = match load_resource(config.replay.data_path()) {
        Ok(text) => text,
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };
    let parsed = parse_str(&text);

    let sink = match build_sink(&config) {
        Ok(sink) => sink,
        Err(e) => {
            error!("Falha ao criar sink {}: {e}", config.sink.mode);
            return ExitCode::FAILURE;
        }
    };

    // ── Banner ──
    println!();
    println!("══════════════════════════════════════════════");
    println!("   💧 HYDRO REPLAY – ATIVO");
    println!("══════════════════════════════════════════════");
    println!(
        "  Fonte:     {}",
        config.replay.data_path().map_or_else(
            || hydro_core::parser::BUNDLED_NAME.to_string(),
            |p| p.display().to_string()
        )
    );
    println!("  Leituras:  {}", parsed.records.len());
    println!("  Intervalo: {:.1}s", REPLAY_INTERVAL.as_secs_f64());
    println!("  Saída:     {}", config.sink.mode);
    println!("══════════════════════════════════════════════");
    println!();

    // ── Replay ──
    let handle = match replay::start(parsed.records, sink, REPLAY_INTERVAL) {
        Ok(handle) => handle,
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    match handle.join() {
        Ok(report) => {
            info!("Replay encerrado: {}/{} leituras", report.emitted, report.total);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

//! Configuração via TOML (`config.toml` ao lado do executável).
//!
//! O intervalo de replay não é configurável; ver [`crate::replay::REPLAY_INTERVAL`].

use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Variável de ambiente que aponta para um config.toml alternativo.
pub const CONFIG_ENV: &str = "HYDRO_REPLAY_CONFIG";

const CONFIG_FILE: &str = "config.toml";

fn resolve_path(env: Option<OsString>, exe: Option<PathBuf>) -> PathBuf {
    if let Some(path) = env.filter(|p| !p.is_empty()) {
        return PathBuf::from(path);
    }
    exe.as_deref()
        .and_then(Path::parent)
        .unwrap_or(Path::new("."))
        .join(CONFIG_FILE)
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Erro ao ler {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Erro ao parsear {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Erro ao serializar configuração: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Erro ao escrever {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Origem dos dados.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplayConfig {
    /// Arquivo CSV externo (vazio = recurso embutido)
    pub data_path: String,
}

impl ReplayConfig {
    pub fn data_path(&self) -> Option<&Path> {
        (!self.data_path.is_empty()).then(|| Path::new(&self.data_path))
    }
}

/// Destino das emissões.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SinkConfig {
    /// "console" ou "udp"
    pub mode: String,
    /// IP de destino do modo UDP (255.255.255.255 para broadcast)
    pub dest_ip: String,
    /// Porta UDP
    pub port: u16,
    /// IP local para bind (vazio = auto)
    pub bind_ip: String,
    /// Exibe rótulos de unidade (μS/cm, ℃, mg/L) no console
    pub show_units: bool,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            mode: "console".into(),
            dest_ip: "255.255.255.255".into(),
            port: 5006,
            bind_ip: String::new(),
            show_units: true,
        }
    }
}

/// Configuração raiz do aplicativo.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub replay: ReplayConfig,
    pub sink: SinkConfig,
}

impl AppConfig {
    /// Lê o arquivo de configuração. `Ok(None)` se ele não existe.
    pub fn read(path: &Path) -> Result<Option<Self>, ConfigError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        toml::from_str(&content)
            .map(Some)
            .map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })
    }

    /// Como [`AppConfig::read`], mas nunca falha: problemas viram `warn!` e
    /// a configuração padrão é usada.
    pub fn load(path: &Path) -> Self {
        match Self::read(path) {
            Ok(Some(config)) => {
                info!("Configuração carregada de {}", path.display());
                config
            }
            Ok(None) => {
                info!("{} ausente – usando configuração padrão", path.display());
                Self::default()
            }
            Err(e) => {
                warn!("{e} – usando configuração padrão");
                Self::default()
            }
        }
    }

    /// Salva configuração em arquivo TOML.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })?;
        info!("Configuração salva em {}", path.display());
        Ok(())
    }

    /// Caminho do config: `$HYDRO_REPLAY_CONFIG`, senão `config.toml` ao lado
    /// do executável, senão no diretório atual.
    pub fn default_path() -> PathBuf {
        resolve_path(
            std::env::var_os(CONFIG_ENV),
            std::env::current_exe().ok(),
        )
    }

    /// Valida a configuração e retorna lista de erros.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        match self.sink.mode.as_str() {
            "console" => {}
            "udp" => {
                if self.sink.port == 0 {
                    errors.push("Porta UDP do sink não pode ser 0".into());
                }
                if self.sink.dest_ip.is_empty() {
                    errors.push("IP de destino do sink UDP vazio".into());
                }
            }
            other => errors.push(format!("Modo de sink inválido: {other:?} (console|udp)")),
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        let errors = config.validate();
        assert!(errors.is_empty(), "Erros: {:?}", errors);
        assert!(config.replay.data_path().is_none());
    }

    #[test]
    fn partial_toml_uses_defaults() {
        let partial = r#"
[sink]
mode = "udp"
port = 9999
"#;
        let config: AppConfig = toml::from_str(partial).unwrap();
        assert_eq!(config.sink.port, 9999);
        assert_eq!(config.sink.dest_ip, "255.255.255.255");
        assert!(config.sink.show_units);
        assert!(config.replay.data_path.is_empty());
        assert!(config.validate().is_empty());
    }

    #[test]
    fn invalid_sink_mode_is_reported() {
        let mut config = AppConfig::default();
        config.sink.mode = "toast".into();
        assert_eq!(config.validate().len(), 1);

        config.sink.mode = "udp".into();
        config.sink.port = 0;
        assert_eq!(config.validate().len(), 1);
    }

    #[test]
    fn data_path_override() {
        let config: AppConfig = toml::from_str("[replay]\ndata_path = \"lago.csv\"\n").unwrap();
        assert_eq!(config.replay.data_path(), Some(Path::new("lago.csv")));
    }

    #[test]
    fn save_then_load() {
        let path = std::env::temp_dir().join(format!("hydro_core_cfg_{}.toml", std::process::id()));
        let mut config = AppConfig::default();
        config.sink.show_units = false;
        config.replay.data_path = "boia2.csv".into();
        config.save(&path).unwrap();

        let loaded = AppConfig::load(&path);
        let _ = std::fs::remove_file(&path);
        assert!(!loaded.sink.show_units);
        assert_eq!(loaded.replay.data_path, "boia2.csv");
    }

    #[test]
    fn missing_file_reads_as_none() {
        let path = std::env::temp_dir().join("hydro_core_cfg_ausente.toml");
        assert!(matches!(AppConfig::read(&path), Ok(None)));
        assert_eq!(AppConfig::load(&path).sink.mode, "console");
    }

    #[test]
    fn unparseable_file_is_a_parse_error() {
        let path = std::env::temp_dir().join(format!("hydro_core_parse_{}.toml", std::process::id()));
        std::fs::write(&path, "[sink]\nport = \"cinco\"\n").unwrap();
        let result = AppConfig::read(&path);
        let _ = std::fs::remove_file(&path);
        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn path_from_env_wins() {
        let path = resolve_path(
            Some(OsString::from("/etc/hydro/boia.toml")),
            Some(PathBuf::from("/opt/hydro/hydro_replay")),
        );
        assert_eq!(path, PathBuf::from("/etc/hydro/boia.toml"));
    }

    #[test]
    fn path_next_to_executable() {
        let exe = Some(PathBuf::from("/opt/hydro/hydro_replay"));
        assert_eq!(resolve_path(None, exe.clone()), PathBuf::from("/opt/hydro/config.toml"));
        assert_eq!(
            resolve_path(Some(OsString::new()), exe),
            PathBuf::from("/opt/hydro/config.toml")
        );
        assert_eq!(resolve_path(None, None), PathBuf::from("./config.toml"));
    }

    #[test]
    fn unparseable_file_falls_back_to_default() {
        let path = std::env::temp_dir().join(format!("hydro_core_bad_{}.toml", std::process::id()));
        std::fs::write(&path, "[sink\nmode = ").unwrap();
        let loaded = AppConfig::load(&path);
        let _ = std::fs::remove_file(&path);
        assert_eq!(loaded.sink.mode, "console");
    }
}

use crate::error::{Result, RunwayError};
use crate::step::{StepDefinition, StepKind};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

pub const CONFIG_FILE: &str = "runway.yaml";

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// ServerConfig
// ---------------------------------------------------------------------------

/// The terminal foreground process. Defaults reproduce the original
/// deployment: uwsgi on `:9000` serving `app.wsgi` with four workers,
/// a master process, and threads enabled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_program")]
    pub program: String,
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_module")]
    pub module: String,
    #[serde(default = "default_workers")]
    pub workers: u32,
    #[serde(default = "default_true")]
    pub master: bool,
    #[serde(default = "default_true")]
    pub enable_threads: bool,
    #[serde(default)]
    pub extra_args: Vec<String>,
    /// Exact argv override. When set, all the structured fields above
    /// are ignored and this argv is launched verbatim.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<Vec<String>>,
}

fn default_program() -> String {
    "uwsgi".to_string()
}

fn default_bind() -> String {
    ":9000".to_string()
}

fn default_module() -> String {
    "app.wsgi".to_string()
}

fn default_workers() -> u32 {
    4
}

fn default_true() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            program: default_program(),
            bind: default_bind(),
            module: default_module(),
            workers: default_workers(),
            master: true,
            enable_threads: true,
            extra_args: Vec::new(),
            command: None,
        }
    }
}

impl ServerConfig {
    /// Build the launch argv. Flag order matches the original launcher.
    pub fn to_argv(&self) -> Vec<String> {
        if let Some(cmd) = &self.command {
            return cmd.clone();
        }
        let mut argv = vec![
            self.program.clone(),
            "--socket".to_string(),
            self.bind.clone(),
            "--workers".to_string(),
            self.workers.to_string(),
        ];
        if self.master {
            argv.push("--master".to_string());
        }
        if self.enable_threads {
            argv.push("--enable-threads".to_string());
        }
        argv.push("--module".to_string());
        argv.push(self.module.clone());
        argv.extend(self.extra_args.iter().cloned());
        argv
    }
}

// ---------------------------------------------------------------------------
// Config (top-level)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default = "default_steps")]
    pub steps: Vec<StepDefinition>,
}

fn default_version() -> u32 {
    1
}

fn default_steps() -> Vec<StepDefinition> {
    vec![
        StepDefinition::wait_tcp("wait-db", "127.0.0.1:5432"),
        StepDefinition::command(
            "collect-static",
            &["python", "manage.py", "collectstatic", "--noinput"],
        ),
        StepDefinition::command("migrate", &["python", "manage.py", "migrate"]),
    ]
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: default_version(),
            server: ServerConfig::default(),
            steps: default_steps(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(RunwayError::ConfigNotFound(path.display().to_string()));
        }
        let data = std::fs::read_to_string(path)?;
        let cfg: Config = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    /// Resolve the effective configuration.
    ///
    /// Priority:
    /// 1. Explicit path (`--config` flag / `RUNWAY_CONFIG` env var) — must exist.
    /// 2. `runway.yaml` in the current directory, if present.
    /// 3. Built-in defaults. The file is optional: with zero
    ///    configuration the tool behaves exactly like the original
    ///    deployment script.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        let local = Path::new(CONFIG_FILE);
        if local.exists() {
            return Self::load(local);
        }
        Ok(Self::default())
    }

    /// Render to YAML and write through a tempfile in the target
    /// directory, so a crash mid-write cannot leave a truncated file.
    pub fn save(&self, path: &Path) -> Result<()> {
        use std::io::Write as _;

        let data = serde_yaml::to_string(self)?;
        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => {
                std::fs::create_dir_all(p)?;
                p
            }
            _ => Path::new("."),
        };
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(data.as_bytes())?;
        tmp.persist(path).map_err(|e| e.error)?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();
        let mut seen: HashSet<&str> = HashSet::new();

        for step in &self.steps {
            if step.name.trim().is_empty() {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Error,
                    message: "step with an empty name".to_string(),
                });
            } else if !seen.insert(step.name.as_str()) {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Warning,
                    message: format!("duplicate step name '{}'", step.name),
                });
            }

            if let StepKind::Command { argv } = &step.action {
                if argv.is_empty() || argv[0].trim().is_empty() {
                    warnings.push(ConfigWarning {
                        level: WarnLevel::Error,
                        message: format!("step '{}' has an empty command", step.name),
                    });
                } else if which::which(&argv[0]).is_err() {
                    warnings.push(ConfigWarning {
                        level: WarnLevel::Warning,
                        message: format!(
                            "step '{}': program '{}' not found on PATH",
                            step.name, argv[0]
                        ),
                    });
                }
            }
        }

        let server_argv = self.server.to_argv();
        match server_argv.first() {
            None => warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "server command is empty".to_string(),
            }),
            Some(program) => {
                if which::which(program).is_err() {
                    warnings.push(ConfigWarning {
                        level: WarnLevel::Warning,
                        message: format!("server program '{}' not found on PATH", program),
                    });
                }
            }
        }

        if self.server.command.is_none() {
            if self.server.workers == 0 {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Warning,
                    message: "server.workers is 0".to_string(),
                });
            }
            if !self.server.bind.contains(':') {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Warning,
                    message: format!(
                        "server.bind '{}' has no port (expected host:port or :port)",
                        self.server.bind
                    ),
                });
            }
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let yaml = serde_yaml::to_string(&cfg).unwrap();
        let parsed: Config = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed, cfg);
        assert_eq!(parsed.version, 1);
    }

    #[test]
    fn default_server_argv_matches_original_deployment() {
        let argv = ServerConfig::default().to_argv();
        assert_eq!(
            argv,
            vec![
                "uwsgi",
                "--socket",
                ":9000",
                "--workers",
                "4",
                "--master",
                "--enable-threads",
                "--module",
                "app.wsgi",
            ]
        );
    }

    #[test]
    fn default_steps_match_original_deployment() {
        let cfg = Config::default();
        let names: Vec<&str> = cfg.steps.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["wait-db", "collect-static", "migrate"]);
    }

    #[test]
    fn server_command_override_wins() {
        let server = ServerConfig {
            command: Some(vec!["gunicorn".to_string(), "app.wsgi".to_string()]),
            ..ServerConfig::default()
        };
        assert_eq!(server.to_argv(), vec!["gunicorn", "app.wsgi"]);
    }

    #[test]
    fn extra_args_appended_last() {
        let server = ServerConfig {
            extra_args: vec!["--harakiri".to_string(), "30".to_string()],
            ..ServerConfig::default()
        };
        let argv = server.to_argv();
        assert_eq!(&argv[argv.len() - 2..], &["--harakiri", "30"]);
    }

    #[test]
    fn empty_yaml_uses_all_defaults() {
        let cfg: Config = serde_yaml::from_str("version: 1\n").unwrap();
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn partial_server_section_fills_defaults() {
        let yaml = "version: 1\nserver:\n  bind: ':8080'\n";
        let cfg: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(cfg.server.bind, ":8080");
        assert_eq!(cfg.server.module, "app.wsgi");
        assert_eq!(cfg.server.workers, 4);
    }

    #[test]
    fn command_override_not_serialized_when_absent() {
        let yaml = serde_yaml::to_string(&Config::default()).unwrap();
        assert!(!yaml.contains("command"));
    }

    #[test]
    fn resolve_explicit_missing_file_errors() {
        let err = Config::resolve(Some(Path::new("/nonexistent/runway.yaml"))).unwrap_err();
        assert!(matches!(err, RunwayError::ConfigNotFound(_)));
    }

    #[test]
    fn load_save_roundtrip() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("runway.yaml");
        let cfg = Config::default();
        cfg.save(&path).unwrap();
        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded, cfg);
    }

    #[test]
    fn save_creates_parent_dirs() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("deploy/conf/runway.yaml");
        Config::default().save(&path).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn validate_default_config_path_warnings_only() {
        // Defaults reference python/uwsgi which may be absent in the test
        // environment, so only PATH-level warnings are acceptable here.
        let warnings = Config::default().validate();
        assert!(warnings.iter().all(|w| w.level == WarnLevel::Warning));
    }

    #[test]
    fn validate_duplicate_step_names() {
        let mut cfg = Config::default();
        cfg.steps.push(StepDefinition::command("migrate", &["true"]));
        let warnings = cfg.validate();
        assert!(warnings
            .iter()
            .any(|w| w.message.contains("duplicate step name 'migrate'")));
    }

    #[test]
    fn validate_empty_argv_is_error() {
        let mut cfg = Config::default();
        cfg.steps.push(StepDefinition {
            name: "broken".to_string(),
            action: StepKind::Command { argv: vec![] },
        });
        let warnings = cfg.validate();
        assert!(warnings
            .iter()
            .any(|w| w.level == WarnLevel::Error && w.message.contains("empty command")));
    }

    #[test]
    fn validate_empty_step_name_is_error() {
        let mut cfg = Config::default();
        cfg.steps.push(StepDefinition::command("  ", &["true"]));
        let warnings = cfg.validate();
        assert!(warnings
            .iter()
            .any(|w| w.level == WarnLevel::Error && w.message.contains("empty name")));
    }

    #[test]
    fn validate_zero_workers_warns() {
        let cfg = Config {
            server: ServerConfig {
                workers: 0,
                ..ServerConfig::default()
            },
            steps: vec![],
            ..Config::default()
        };
        let warnings = cfg.validate();
        assert!(warnings.iter().any(|w| w.message.contains("workers is 0")));
    }

    #[test]
    fn validate_bind_without_port_warns() {
        let cfg = Config {
            server: ServerConfig {
                bind: "9000".to_string(),
                ..ServerConfig::default()
            },
            steps: vec![],
            ..Config::default()
        };
        let warnings = cfg.validate();
        assert!(warnings.iter().any(|w| w.message.contains("no port")));
    }

    #[test]
    fn validate_command_override_skips_structured_checks() {
        let cfg = Config {
            server: ServerConfig {
                workers: 0,
                bind: "bogus".to_string(),
                command: Some(vec!["sh".to_string(), "-c".to_string(), "true".to_string()]),
                ..ServerConfig::default()
            },
            steps: vec![],
            ..Config::default()
        };
        let warnings = cfg.validate();
        assert!(!warnings.iter().any(|w| w.message.contains("workers")));
        assert!(!warnings.iter().any(|w| w.message.contains("no port")));
    }

    #[test]
    fn validate_missing_program_warns() {
        let cfg = Config {
            steps: vec![StepDefinition::command(
                "ghost",
                &["definitely-not-a-real-binary-9f2c"],
            )],
            ..Config::default()
        };
        let warnings = cfg.validate();
        assert!(warnings
            .iter()
            .any(|w| w.message.contains("not found on PATH")));
    }
}

use anyhow::Context;
use runway_core::config::CONFIG_FILE;
use std::path::Path;

/// Default scaffold. Mirrors the built-in defaults, with knobs spelled
/// out so there is something to edit.
const DEFAULT_CONFIG: &str = r#"version: 1

# The long-lived foreground process. `runway up` launches this after
# every pre-flight step has succeeded, then exits with its exit code.
server:
  program: uwsgi
  bind: ":9000"
  module: app.wsgi
  workers: 4
  master: true
  enable_threads: true
  # extra_args: ["--harakiri", "30"]
  # command: ["gunicorn", "app.wsgi"]  # exact argv override

# Pre-flight steps, run strictly in order. The first failure aborts the
# whole sequence and becomes the process exit code.
steps:
  - name: wait-db
    action:
      type: wait_tcp
      addr: 127.0.0.1:5432
      interval_ms: 1000
      timeout_seconds: 60

  - name: collect-static
    action:
      type: command
      argv: [python, manage.py, collectstatic, --noinput]

  - name: migrate
    action:
      type: command
      argv: [python, manage.py, migrate]
"#;

pub fn run(config_path: Option<&Path>) -> anyhow::Result<i32> {
    let path = config_path.unwrap_or(Path::new(CONFIG_FILE));

    // Never clobber an edited config; re-running init must be safe.
    if path.exists() {
        println!("{} already exists, leaving it untouched", path.display());
        return Ok(0);
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    std::fs::write(path, DEFAULT_CONFIG)
        .with_context(|| format!("failed to write {}", path.display()))?;
    println!("Wrote {}", path.display());
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use runway_core::config::Config;

    #[test]
    fn scaffold_parses_to_default_config() {
        let parsed: Config = serde_yaml::from_str(DEFAULT_CONFIG).unwrap();
        assert_eq!(parsed, Config::default());
    }
}

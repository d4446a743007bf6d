use std::{
    collections::HashMap,
    env,
    fs,
    io::{BufRead, BufReader},
    path::PathBuf,
    time::Duration,
};

use directories::BaseDirs;

use crate::{
    request::{DEFAULT_HEIGHT, DEFAULT_SESSION, DEFAULT_WIDTH},
    transport::{PollPolicy, MAX_LINE_LENGTH},
};

#[derive(Debug, Clone)]
pub struct Config {
    inner: HashMap<String, String>,
    pub config_path: PathBuf,
}

impl Config {
    pub fn load() -> Self {
        Self::load_from(default_config_path())
    }

    pub fn load_from(config_path: PathBuf) -> Self {
        let mut map = default_map();

        // Read .juliababrc if exists
        if config_path.exists() {
            if let Ok(file) = fs::File::open(&config_path) {
                let reader = BufReader::new(file);
                for line in reader.lines().map_while(Result::ok) {
                    let line = line.trim();
                    if line.is_empty() || line.starts_with('#') {
                        continue;
                    }
                    if let Some((k, v)) = line.split_once('=') {
                        map.insert(k.trim().to_string(), v.trim().to_string());
                    }
                }
            }
        }

        // Overlay environment variables (take precedence)
        for (k, v) in env::vars() {
            if is_config_key(&k) {
                map.insert(k, v);
            }
        }

        Self { inner: map, config_path }
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.inner.get(key).cloned()
    }

    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        self.inner.insert(key.to_string(), value.into());
    }

    pub fn get_bool(&self, key: &str) -> bool {
        self.get(key)
            .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
            .unwrap_or(false)
    }

    pub fn get_usize(&self, key: &str) -> Option<usize> {
        self.get(key).and_then(|v| v.parse::<usize>().ok())
    }

    pub fn get_u32(&self, key: &str) -> Option<u32> {
        self.get(key).and_then(|v| v.parse::<u32>().ok())
    }

    pub fn julia_program(&self) -> String {
        self.get("JULIA_PROGRAM").unwrap_or_else(|| "julia".into())
    }

    pub fn julia_args(&self) -> Vec<String> {
        self.get("JULIA_ARGS")
            .map(|v| v.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default()
    }

    pub fn default_session(&self) -> String {
        self.get("DEFAULT_SESSION").unwrap_or_else(|| DEFAULT_SESSION.into())
    }

    pub fn poll_policy(&self) -> PollPolicy {
        let base = PollPolicy::default();
        PollPolicy {
            interval: self
                .get_usize("POLL_INTERVAL_MS")
                .map(|ms| Duration::from_millis(ms as u64))
                .unwrap_or(base.interval),
            attempts: self.get_u32("POLL_ATTEMPTS").unwrap_or(base.attempts),
        }
    }

    pub fn max_line_length(&self) -> usize {
        self.get_usize("MAX_LINE_LENGTH").unwrap_or(MAX_LINE_LENGTH)
    }

    pub fn graphics_size(&self) -> (u32, u32) {
        (
            self.get_u32("GRAPHICS_WIDTH").unwrap_or(DEFAULT_WIDTH),
            self.get_u32("GRAPHICS_HEIGHT").unwrap_or(DEFAULT_HEIGHT),
        )
    }
}

fn is_config_key(k: &str) -> bool {
    // Accept known keys or JULIABAB_* for forward-compat
    const KEYS: &[&str] = &[
        "JULIA_PROGRAM",
        "JULIA_ARGS",
        "DEFAULT_SESSION",
        "POLL_INTERVAL_MS",
        "POLL_ATTEMPTS",
        "MAX_LINE_LENGTH",
        "GRAPHICS_WIDTH",
        "GRAPHICS_HEIGHT",
        "REPORT_SIDE_FILES",
    ];

    KEYS.contains(&k) || k.starts_with("JULIABAB_")
}

fn default_config_path() -> PathBuf {
    let base = BaseDirs::new()
        .map(|b| b.config_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("~/.config"));
    base.join("juliabab").join(".juliababrc")
}

fn default_map() -> HashMap<String, String> {
    let mut m = HashMap::new();

    // Interpreter
    m.insert("JULIA_PROGRAM".into(), "julia".into());
    m.insert("JULIA_ARGS".into(), "--banner=no --color=no -i".into());
    m.insert("DEFAULT_SESSION".into(), DEFAULT_SESSION.into());

    // Numbers
    m.insert("POLL_INTERVAL_MS".into(), "100".into());
    m.insert("POLL_ATTEMPTS".into(), "100".into());
    m.insert("MAX_LINE_LENGTH".into(), MAX_LINE_LENGTH.to_string());
    m.insert("GRAPHICS_WIDTH".into(), DEFAULT_WIDTH.to_string());
    m.insert("GRAPHICS_HEIGHT".into(), DEFAULT_HEIGHT.to_string());

    // Bools as strings
    m.insert("JULIABAB_DEBUG".into(), "false".into());
    m.insert("REPORT_SIDE_FILES".into(), "false".into());

    m
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let cfg = Config::load_from(PathBuf::from("/nonexistent/.juliababrc"));
        assert_eq!(cfg.max_line_length(), 12000);
        assert_eq!(cfg.graphics_size(), (600, 400));
        assert_eq!(cfg.julia_args(), vec!["--banner=no", "--color=no", "-i"]);
    }

    #[test]
    fn test_rc_file_overrides_defaults() {
        let mut rc = tempfile::NamedTempFile::new().unwrap();
        writeln!(rc, "# comment").unwrap();
        writeln!(rc, "POLL_INTERVAL_MS = 5").unwrap();
        writeln!(rc, "POLL_ATTEMPTS=7").unwrap();
        writeln!(rc, "JULIA_ARGS=--project=. -i").unwrap();
        let cfg = Config::load_from(rc.path().to_path_buf());
        assert_eq!(
            cfg.poll_policy(),
            PollPolicy { interval: Duration::from_millis(5), attempts: 7 }
        );
        assert_eq!(cfg.julia_args(), vec!["--project=.", "-i"]);
    }

    #[test]
    fn test_bools_and_garbage_numbers() {
        let mut cfg = Config::load_from(PathBuf::from("/nonexistent/.juliababrc"));
        cfg.set("JULIABAB_DEBUG", "TRUE");
        cfg.set("MAX_LINE_LENGTH", "lots");
        assert!(cfg.get_bool("JULIABAB_DEBUG"));
        assert!(!cfg.get_bool("REPORT_SIDE_FILES"));
        assert_eq!(cfg.max_line_length(), MAX_LINE_LENGTH);
    }
}

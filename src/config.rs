use std::path::PathBuf;

use crate::export::FontSource;

pub const DEFAULT_UPLOAD_LIMIT: usize = 10 * 1024 * 1024; // 10 MB

/// Runtime settings derived from env. Unparsable values fall back to defaults.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub fonts: FontSource,
    /// Per-file upload ceiling in bytes.
    pub upload_limit: usize,
    pub seed_demo: bool,
    pub frontend_url: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 8080,
            fonts: FontSource { dir: PathBuf::from("./fonts"), family: "DejaVuSans".into() },
            upload_limit: DEFAULT_UPLOAD_LIMIT,
            seed_demo: true,
            frontend_url: None,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        fn string_env(name: &str) -> Option<String> {
            std::env::var(name).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
        }
        fn parsed_env<T: std::str::FromStr>(name: &str, default: T) -> T {
            string_env(name).and_then(|v| v.parse().ok()).unwrap_or(default)
        }
        fn bool_env(name: &str, default: bool) -> bool {
            match string_env(name).map(|v| v.to_ascii_lowercase()).as_deref() {
                Some("1" | "true" | "yes" | "on") => true,
                Some("0" | "false" | "no" | "off") => false,
                _ => default,
            }
        }

        let d = Self::default();
        Self {
            host: string_env("PADAELO_HOST").unwrap_or(d.host),
            port: parsed_env("PADAELO_PORT", d.port),
            fonts: FontSource {
                dir: string_env("PADAELO_FONT_DIR").map(PathBuf::from).unwrap_or(d.fonts.dir),
                family: string_env("PADAELO_FONT_FAMILY").unwrap_or(d.fonts.family),
            },
            upload_limit: parsed_env("PADAELO_UPLOAD_LIMIT", d.upload_limit),
            seed_demo: bool_env("PADAELO_SEED_DEMO", d.seed_demo),
            frontend_url: string_env("FRONTEND_URL"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: [&str; 7] = [
        "PADAELO_HOST",
        "PADAELO_PORT",
        "PADAELO_FONT_DIR",
        "PADAELO_FONT_FAMILY",
        "PADAELO_UPLOAD_LIMIT",
        "PADAELO_SEED_DEMO",
        "FRONTEND_URL",
    ];

    fn clear() {
        for v in VARS {
            std::env::remove_var(v);
        }
    }

    #[test]
    #[serial]
    fn defaults_when_unset() {
        clear();
        assert_eq!(AppConfig::from_env(), AppConfig::default());
    }

    #[test]
    #[serial]
    fn reads_overrides_and_ignores_garbage() {
        clear();
        std::env::set_var("PADAELO_PORT", "9090");
        std::env::set_var("PADAELO_UPLOAD_LIMIT", "not-a-number");
        std::env::set_var("PADAELO_SEED_DEMO", "false");
        std::env::set_var("PADAELO_FONT_DIR", "/usr/share/fonts/liberation");
        std::env::set_var("FRONTEND_URL", "http://localhost:5173");
        let cfg = AppConfig::from_env();
        clear();

        assert_eq!(cfg.port, 9090);
        assert_eq!(cfg.upload_limit, DEFAULT_UPLOAD_LIMIT);
        assert!(!cfg.seed_demo);
        assert_eq!(cfg.fonts.dir, PathBuf::from("/usr/share/fonts/liberation"));
        assert_eq!(cfg.fonts.family, "DejaVuSans");
        assert_eq!(cfg.frontend_url.as_deref(), Some("http://localhost:5173"));
    }
}

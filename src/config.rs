use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::model::UserProfile;

/// Runtime settings, read from `projectnote.toml` and then the environment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectNoteConfig {
    pub app_name: String,
    pub environment: String,
    pub database: String,
    pub bind: String,
    pub cors_allow_origins: Vec<String>,
    pub super_admin_file: String,
    /// Idle minutes before a sign-in session expires
    pub session_ttl_minutes: u64,
    pub demo_user: DemoUser,
}

impl Default for ProjectNoteConfig {
    fn default() -> Self {
        Self {
            app_name: "ProjectNote API".to_string(),
            environment: "local".to_string(),
            database: "projectnote.db".to_string(),
            bind: "127.0.0.1:8000".to_string(),
            cors_allow_origins: vec!["http://localhost:3000".to_string()],
            super_admin_file: "super_admin_accounts.json".to_string(),
            session_ttl_minutes: 720,
            demo_user: DemoUser::default(),
        }
    }
}

/// Fallback sign-in used when no super-admin file exists.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DemoUser {
    pub username: String,
    pub password: String,
    pub name: String,
    pub role: String,
    pub email: String,
    pub organization: String,
    pub major: String,
}

impl Default for DemoUser {
    fn default() -> Self {
        Self {
            username: "admin".to_string(),
            password: "admin1234".to_string(),
            name: "Administrator".to_string(),
            role: "Research lead".to_string(),
            email: "admin@example.com".to_string(),
            organization: "ProjectNote Lab".to_string(),
            major: "Research management".to_string(),
        }
    }
}

impl DemoUser {
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            username: self.username.clone(),
            name: self.name.clone(),
            role: self.role.clone(),
            email: self.email.clone(),
            organization: self.organization.clone(),
            major: self.major.clone(),
            signature_data_url: String::new(),
        }
    }
}

impl ProjectNoteConfig {
    /// Apply `PROJECTNOTE_*` overrides from the process environment.
    pub fn with_env(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from any lookup; blank values are ignored.
    pub fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("PROJECTNOTE_DATABASE") {
            self.database = v;
        }
        if let Some(v) = get("PROJECTNOTE_BIND") {
            self.bind = v;
        }
        if let Some(v) = get("PROJECTNOTE_ENVIRONMENT") {
            self.environment = v;
        }
        if let Some(v) = get("PROJECTNOTE_SESSION_TTL_MINUTES").and_then(|v| v.trim().parse().ok()) {
            self.session_ttl_minutes = v;
        }
        if let Some(v) = get("PROJECTNOTE_CORS_ALLOW_ORIGINS") {
            self.cors_allow_origins = v
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(String::from)
                .collect();
        }

        let demo = &mut self.demo_user;
        for (key, slot) in [
            ("PROJECTNOTE_DEMO_USER", &mut demo.username),
            ("PROJECTNOTE_DEMO_PASSWORD", &mut demo.password),
            ("PROJECTNOTE_DEMO_NAME", &mut demo.name),
            ("PROJECTNOTE_DEMO_EMAIL", &mut demo.email),
            ("PROJECTNOTE_DEMO_ORG", &mut demo.organization),
            ("PROJECTNOTE_DEMO_MAJOR", &mut demo.major),
        ] {
            if let Some(v) = get(key) {
                *slot = v;
            }
        }
        self
    }
}

impl ProjectNoteConfig {
    pub fn session_ttl(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.session_ttl_minutes.saturating_mul(60))
    }
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("projectnote.toml")
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Option<ProjectNoteConfig>> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path)?;
    let config: ProjectNoteConfig = toml::from_str(&contents)?;
    Ok(Some(config))
}

/// File config (or defaults) with environment overrides applied.
pub fn resolve_config(path: Option<&Path>) -> anyhow::Result<ProjectNoteConfig> {
    Ok(load_config(path)?.unwrap_or_default().with_env())
}

pub fn write_config(path: &Path, config: &ProjectNoteConfig, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!("config already exists at {} (use --force to overwrite)", path.display());
    }

    let contents = toml::to_string_pretty(config)?;
    std::fs::write(path, contents)?;
    Ok(())
}

pub fn ensure_db_dir(db_path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config: ProjectNoteConfig = toml::from_str(
            r#"
            database = "data/notes.db"

            [demo_user]
            username = "lead"
            "#,
        )
        .unwrap();
        assert_eq!(config.database, "data/notes.db");
        assert_eq!(config.bind, "127.0.0.1:8000");
        assert_eq!(config.demo_user.username, "lead");
        assert_eq!(config.demo_user.password, "admin1234");
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("PROJECTNOTE_BIND", "0.0.0.0:9000"),
            ("PROJECTNOTE_CORS_ALLOW_ORIGINS", "http://a.test, http://b.test,"),
            ("PROJECTNOTE_DEMO_PASSWORD", "s3cret"),
            ("PROJECTNOTE_DATABASE", "  "),
            ("PROJECTNOTE_SESSION_TTL_MINUTES", "30"),
        ]);
        let config = ProjectNoteConfig::default()
            .with_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.bind, "0.0.0.0:9000");
        assert_eq!(config.cors_allow_origins, vec!["http://a.test", "http://b.test"]);
        assert_eq!(config.demo_user.password, "s3cret");
        assert_eq!(config.database, "projectnote.db");
        assert_eq!(config.session_ttl(), std::time::Duration::from_secs(1800));

        let garbled = ProjectNoteConfig::default()
            .with_overrides(|key| (key == "PROJECTNOTE_SESSION_TTL_MINUTES").then(|| "soon".to_string()));
        assert_eq!(garbled.session_ttl_minutes, 720);
    }

    #[test]
    fn test_write_refuses_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("projectnote.toml");
        let config = ProjectNoteConfig::default();

        write_config(&path, &config, false).unwrap();
        assert!(write_config(&path, &config, false).is_err());
        write_config(&path, &config, true).unwrap();

        let loaded = load_config(Some(&path)).unwrap().unwrap();
        assert_eq!(loaded.app_name, "ProjectNote API");
    }
}

use anyhow::Context;
use config::ConfigError;
use serde::Deserialize;
use std::collections::HashMap;

const ENV_PREFIX: &str = "NOTIFIER_";

#[derive(Deserialize, Clone, Debug)]
pub struct Settings {
    pub server: ServerSettings,
    pub http: HttpSettings,
    pub auth: AuthSettings,
    pub store: StoreSettings,
    pub push: PushSettings,
    // shared by store and push unless they name their own
    pub project_id: Option<String>,
}

#[derive(Deserialize, Clone, Debug)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Deserialize, Clone, Debug)]
pub struct HttpSettings {
    pub timeout_secs: u64,
}

#[derive(Deserialize, Clone, Debug)]
pub struct AuthSettings {
    // static bearer token; when unset we ask the metadata server
    pub access_token: Option<String>,
    pub metadata_url: String,
}

#[derive(Deserialize, Clone, Debug)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum StoreSettings {
    Firestore {
        project_id: Option<String>,
        database: String,
        base_url: String,
    },
    Sqlite {
        url: String,
    },
}

#[derive(Deserialize, Clone, Debug)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum PushSettings {
    Fcm {
        project_id: Option<String>,
        base_url: String,
    },
    Log,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());
        let mut env_map = collect_env_vars(std::env::vars());

        // Cloud Run and friends hand us the port unprefixed
        if let Ok(port) = std::env::var("PORT") {
            env_map.entry("server.port".to_string()).or_insert(port);
        }
        if let Some(project) = ["GOOGLE_CLOUD_PROJECT", "GCLOUD_PROJECT"]
            .iter()
            .find_map(|k| std::env::var(k).ok())
        {
            env_map.entry("project_id".to_string()).or_insert(project);
        }

        Self::build(&run_mode, env_map)
    }

    pub fn build(run_mode: &str, env_map: HashMap<String, String>) -> Result<Self, ConfigError> {
        let env_json =
            serde_json::to_string(&env_map).map_err(|e| ConfigError::Foreign(Box::new(e)))?;

        let s = config::Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .set_default("http.timeout_secs", 10)?
            .set_default("auth.metadata_url", storage::DEFAULT_METADATA_TOKEN_URL)?
            .set_default("store.mode", "firestore")?
            .set_default("store.database", "(default)")?
            .set_default("store.base_url", "https://firestore.googleapis.com")?
            .set_default("store.url", "sqlite://data/notifier.db")?
            .set_default("push.mode", "fcm")?
            .set_default("push.base_url", "https://fcm.googleapis.com")?
            .add_source(config::File::with_name("config").required(false))
            .add_source(config::File::with_name(&format!("config.{}", run_mode)).required(false))
            .add_source(config::File::from_str(&env_json, config::FileFormat::Json))
            .build()?;

        s.try_deserialize()
    }

    /// A section's own project id, else the shared one.
    pub fn resolve_project(&self, own: Option<&String>) -> anyhow::Result<String> {
        own.or(self.project_id.as_ref())
            .filter(|p| !p.is_empty())
            .cloned()
            .context("No Google Cloud project configured (set NOTIFIER_PROJECT_ID or GOOGLE_CLOUD_PROJECT)")
    }
}

fn collect_env_vars(vars: impl Iterator<Item = (String, String)>) -> HashMap<String, String> {
    vars.filter(|(k, _)| k.starts_with(ENV_PREFIX))
        .map(|(k, v)| {
            let new_key = k
                .trim_start_matches(ENV_PREFIX)
                .replace("__", ".")
                .to_lowercase();
            (new_key, v)
        })
        .collect()
}

//! Configuration loader, typed settings and path helpers.
//!
//! Uses Figment to merge `config.toml` + `config.<env>.toml` + `APP_*` env vars
//! (`__` separates nested keys, e.g. `APP_INDEXING__BATCH_SIZE=200`).

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::types::{DEFAULT_LIMIT, MAX_LIMIT};

pub struct Config {
    figment: Figment,
    dir: PathBuf,
}

impl Config {
    /// Loads from the working directory.
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new("."))
    }

    /// Loads `config.toml` and the `RUST_ENV` overlay from `dir`. Relative
    /// paths inside the settings resolve against `dir` too.
    pub fn load_from(dir: &Path) -> Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file(dir.join("config.toml")));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file(dir.join("config.dev.toml"))),
            "prod" | "production" => figment = figment.merge(Toml::file(dir.join("config.prod.toml"))),
            "test" | "testing" => figment = figment.merge(Toml::file(dir.join("config.test.toml"))),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));

        Ok(Self { figment, dir: dir.to_path_buf() })
    }

    /// `settings.elasticsearch.index_config_path`, expanded and resolved
    /// against the config directory.
    pub fn index_config_path(&self, settings: &Settings) -> PathBuf {
        resolve_with_base(&self.dir, &settings.elasticsearch.index_config_path)
    }

    /// Extracts and validates the full typed settings tree.
    pub fn settings(&self) -> Result<Settings> {
        let settings: Settings = self
            .figment
            .extract()
            .map_err(|e| Error::Configuration(format!("Failed to read settings: {e}")))?;
        settings.validate()?;
        Ok(settings)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub elasticsearch: ElasticsearchSettings,
    pub embedding: EmbeddingSettings,
    pub indexing: IndexingSettings,
    pub search: SearchSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ElasticsearchSettings {
    pub url: String,
    pub index: String,
    pub index_config_path: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub timeout_secs: u64,
}

impl Default for ElasticsearchSettings {
    fn default() -> Self {
        Self {
            url: "http://localhost:9200".to_string(),
            index: "conferences".to_string(),
            index_config_path: "config/index.json".to_string(),
            username: None,
            password: None,
            timeout_secs: 30,
        }
    }
}

/// Which embedding backend produces document and query vectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProvider {
    /// Self-hosted text-embeddings endpoint (`POST /embed`).
    Tei,
    /// Managed cloud predict endpoint.
    Vertex,
    /// The search backend embeds text itself; no client-side vectors.
    Inference,
    /// Deterministic hashing embedder for tests and local development.
    Fake,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    pub provider: EmbeddingProvider,
    pub endpoint: String,
    pub max_tokens: usize,
    pub chars_per_token: usize,
    pub dimensions: usize,
    pub timeout_secs: u64,
    pub inference_model_id: String,
    pub vertex: VertexSettings,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: EmbeddingProvider::Tei,
            endpoint: "http://localhost:8080".to_string(),
            max_tokens: 400,
            chars_per_token: 4,
            dimensions: 768,
            timeout_secs: 30,
            inference_model_id: "embeddinggemma".to_string(),
            vertex: VertexSettings::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VertexSettings {
    pub project_id: String,
    pub region: String,
    pub model: String,
    pub access_token: Option<String>,
    /// Overrides `https://{region}-aiplatform.googleapis.com`.
    pub base_url: Option<String>,
}

impl Default for VertexSettings {
    fn default() -> Self {
        Self {
            project_id: String::new(),
            region: "us-central1".to_string(),
            model: "text-embedding-005".to_string(),
            access_token: None,
            base_url: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexingSettings {
    pub batch_size: usize,
    pub workers: usize,
    pub queue_capacity: usize,
    pub worker_name: String,
    pub batch_timeout_secs: Option<u64>,
}

impl Default for IndexingSettings {
    fn default() -> Self {
        Self {
            batch_size: 100,
            workers: 4,
            queue_capacity: 100,
            worker_name: "index".to_string(),
            batch_timeout_secs: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    pub k: usize,
    pub num_candidates: usize,
    pub default_limit: usize,
    pub max_limit: usize,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self { k: 5, num_candidates: 100, default_limit: DEFAULT_LIMIT, max_limit: MAX_LIMIT }
    }
}

impl Settings {
    pub fn validate(&self) -> Result<()> {
        let fail = |msg: String| Err(Error::Configuration(msg));
        if self.indexing.batch_size == 0 {
            return fail("indexing.batch_size must be > 0".into());
        }
        if self.indexing.workers == 0 {
            return fail("indexing.workers must be > 0".into());
        }
        if self.indexing.queue_capacity == 0 {
            return fail("indexing.queue_capacity must be > 0".into());
        }
        if self.search.k == 0 || self.search.num_candidates < self.search.k {
            return fail(format!(
                "search.num_candidates ({}) must be >= search.k ({}) and k > 0",
                self.search.num_candidates, self.search.k
            ));
        }
        if self.search.max_limit == 0 || self.search.default_limit > self.search.max_limit {
            return fail(format!(
                "search.default_limit ({}) must be within 1..={}",
                self.search.default_limit, self.search.max_limit
            ));
        }
        if self.embedding.max_tokens == 0 || self.embedding.chars_per_token == 0 {
            return fail("embedding.max_tokens and embedding.chars_per_token must be > 0".into());
        }
        Ok(())
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

/// Expands `p`, then joins it onto `base` unless it is already absolute.
pub fn resolve_with_base<S: AsRef<str>>(base: &Path, p: S) -> PathBuf {
    let p = expand_path(p);
    if p.is_absolute() { p } else { base.join(p) }
}

/// Reads the index schema/settings document. Its content is forwarded to the
/// backend untouched; only JSON well-formedness is checked here.
pub fn load_index_config(path: &Path) -> Result<serde_json::Value> {
    let raw = std::fs::read_to_string(path).map_err(|e| {
        Error::Configuration(format!("Failed to read index config {}: {e}", path.display()))
    })?;
    serde_json::from_str(&raw).map_err(|e| {
        Error::Configuration(format!("Index config {} is not valid JSON: {e}", path.display()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn defaults_are_valid() {
        let s = Settings::default();
        assert!(s.validate().is_ok());
        assert_eq!(s.search.k, 5);
        assert_eq!(s.search.num_candidates, 100);
        assert_eq!(s.embedding.max_tokens * s.embedding.chars_per_token, 1600);
    }

    #[test]
    fn num_candidates_below_k_is_rejected() {
        let mut s = Settings::default();
        s.search.k = 50;
        s.search.num_candidates = 10;
        assert!(matches!(s.validate(), Err(Error::Configuration(_))));
    }

    #[test]
    fn zero_batch_size_is_rejected() {
        let mut s = Settings::default();
        s.indexing.batch_size = 0;
        assert!(s.validate().is_err());
    }

    #[test]
    fn files_and_env_merge_over_defaults() {
        Jail::expect_with(|jail| {
            jail.set_env("RUST_ENV", "test");
            jail.create_file(
                "config.toml",
                r#"
                [elasticsearch]
                index = "events"
                [embedding]
                provider = "fake"
                "#,
            )?;
            jail.create_file("config.test.toml", "[indexing]\nbatch_size = 50\n")?;
            jail.set_env("APP_INDEXING__WORKERS", "2");

            let settings = Config::load().unwrap().settings().unwrap();
            assert_eq!(settings.elasticsearch.index, "events");
            assert_eq!(settings.embedding.provider, EmbeddingProvider::Fake);
            assert_eq!(settings.indexing.batch_size, 50);
            assert_eq!(settings.indexing.workers, 2);
            assert_eq!(settings.search.k, 5);
            Ok(())
        });
    }

    #[test]
    fn config_dir_anchors_files_and_index_config_path() {
        Jail::expect_with(|jail| {
            jail.set_env("RUST_ENV", "dev");
            std::fs::create_dir(jail.directory().join("deploy")).map_err(|e| e.to_string())?;
            jail.create_file(
                "deploy/config.toml",
                "[elasticsearch]\nindex = \"events\"\nindex_config_path = \"mapping/index.json\"\n",
            )?;
            jail.create_file("config.toml", "[elasticsearch]\nindex = \"ignored\"\n")?;

            let dir = jail.directory().join("deploy");
            let config = Config::load_from(&dir).unwrap();
            let settings = config.settings().unwrap();
            assert_eq!(settings.elasticsearch.index, "events");
            assert_eq!(config.index_config_path(&settings), dir.join("mapping/index.json"));

            let mut absolute = settings.clone();
            absolute.elasticsearch.index_config_path = "/etc/confsearch/index.json".into();
            assert_eq!(config.index_config_path(&absolute), PathBuf::from("/etc/confsearch/index.json"));
            Ok(())
        });
    }

    #[test]
    fn index_config_must_be_json() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("index.json");
        std::fs::write(&good, r#"{"mappings":{"properties":{}}}"#).unwrap();
        assert!(load_index_config(&good).unwrap().get("mappings").is_some());

        let bad = dir.path().join("bad.json");
        std::fs::write(&bad, "not json").unwrap();
        assert!(matches!(load_index_config(&bad), Err(Error::Configuration(_))));
    }
}

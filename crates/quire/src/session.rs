//! Wiring of configuration, store, remote client and sync layer.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Args;
use quire_config::{CliSettings, Config, RepositoryConfig};
use quire_github::GithubClient;
use quire_remote::{Entry, file_name, parent_path};
use quire_store::{FileStore, KvStore};
use quire_sync::paths::{content_root, resolve_content_path};
use quire_sync::{Autosave, CacheStore, Coordinator, Drafts, Flusher};
use tracing::{debug, info};

use crate::error::CliError;

/// Version of the on-disk store layout. Bumping it wipes old stores.
const STORE_VERSION: &str = "1";

/// Options shared by every command.
#[derive(Args)]
pub(crate) struct GlobalArgs {
    /// Path to configuration file (default: auto-discover quire.toml).
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Repository id to operate on (default: first configured).
    #[arg(short, long, global = true)]
    repository: Option<String>,

    /// GitHub token (overrides config).
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true, global = true)]
    token: Option<String>,

    /// Local data directory (overrides config).
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Everything a command needs, bound to one repository.
pub(crate) struct Session {
    pub(crate) repository: RepositoryConfig,
    pub(crate) coordinator: Coordinator,
    pub(crate) drafts: Drafts,
    cache: Arc<CacheStore>,
    autosave: Arc<Autosave>,
    flusher: Flusher,
}

impl Session {
    /// Load configuration and connect to the selected repository.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration is invalid or the store can't be opened.
    pub(crate) fn open(args: &GlobalArgs) -> Result<Self, CliError> {
        let cli_settings = CliSettings {
            token: args.token.clone(),
            data_dir: args.data_dir.clone(),
            repository: args.repository.clone(),
        };
        let config = Config::load(args.config.as_deref(), Some(&cli_settings))?;
        let repository = config.repository(None)?.clone();
        let token = config.require_token()?;
        let storage = &config.storage_resolved;

        let store: Arc<dyn KvStore> = Arc::new(FileStore::open(storage.store_dir(), STORE_VERSION)?);
        let cache = Arc::new(CacheStore::with_store(
            Arc::clone(&store),
            storage.cache_debounce,
        ));
        let configured: Vec<&str> = config.repositories.iter().map(|r| r.id.as_str()).collect();
        for removed in cache.retain_repositories(&configured) {
            info!("discarded cache of removed repository '{removed}'");
        }
        if let Some(previous) = cache.restore_active() {
            debug!("previous session used repository '{previous}'");
        }
        cache.set_active_repository(&repository.id);
        let restored = cache.load(&repository.id);
        debug!("restored {restored} cached listing(s) for '{}'", repository.id);

        let autosave = Arc::new(Autosave::new(
            Arc::clone(&store),
            storage.autosave_debounce,
        ));

        let client = GithubClient::new(
            &config.github.api_url,
            &repository.owner,
            &repository.repo,
            &repository.branch,
            token,
            Duration::from_secs(config.github.timeout_secs),
        );
        let coordinator = Coordinator::new(&repository, Arc::new(client), Arc::clone(&cache))
            .with_autosave(Arc::clone(&autosave));
        let drafts = Drafts::new(store).with_autosave(Arc::clone(&autosave));

        let flusher = {
            let cache = Arc::clone(&cache);
            let autosave = Arc::clone(&autosave);
            Flusher::spawn(
                storage.cache_debounce.min(storage.autosave_debounce),
                move || {
                    cache.flush_ready();
                    autosave.flush_ready();
                },
            )
        };

        Ok(Self {
            repository,
            coordinator,
            drafts,
            cache,
            autosave,
            flusher,
        })
    }

    /// Stop background flushing and persist everything pending.
    pub(crate) fn close(self) {
        self.flusher.stop();
        let written = self.cache.flush_all() + self.autosave.flush_all();
        debug!("flushed {written} pending write(s)");
    }

    /// Repository path of a content-root-relative path.
    ///
    /// # Errors
    ///
    /// Returns an error for malformed paths.
    pub(crate) fn content_path(&self, relative: &str) -> Result<String, CliError> {
        let relative = relative.trim_matches('/');
        let layout = &self.repository.layout;
        if relative.is_empty() {
            return Ok(content_root(layout)?);
        }
        Ok(resolve_content_path(
            layout,
            parent_path(relative),
            file_name(relative),
        )?)
    }

    /// Look up the entry at a content-root-relative path.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if nothing exists there.
    pub(crate) fn entry(&self, relative: &str) -> Result<Entry, CliError> {
        let path = self.content_path(relative)?;
        Ok(self.coordinator.stat(&path)?)
    }
}

/// Commit message given on the command line, or a default.
pub(crate) fn commit_message(message: Option<String>, default: impl FnOnce() -> String) -> String {
    message.unwrap_or_else(default)
}

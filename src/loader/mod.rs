//! Load-once guard for the external engine script.
//!
//! One [`ResourceLoader`] serves every widget in the process. The first
//! widget that needs the engine injects the script; every caller, including
//! the first, is queued on the same completion signal and notified in call
//! order when the host reports the script loaded.
//!
//! ```
//! use std::sync::Arc;
//! use map_sync::{HeadlessHost, LoaderConfig, ResourceLoader};
//!
//! let host = HeadlessHost::new("map");
//! let loader = ResourceLoader::new(Arc::new(host.clone()));
//!
//! loader.ensure_loaded(&LoaderConfig::default(), || println!("first"));
//! loader.ensure_loaded(&LoaderConfig::default(), || println!("second"));
//! assert_eq!(host.injected_scripts().len(), 1);
//!
//! loader.complete();
//! assert!(loader.is_loaded());
//! ```

use std::fmt;
use std::sync::{Arc, Mutex, OnceLock};

use crate::config::LoaderConfig;
use crate::host::ScriptHost;
use crate::locks::lock;
use crate::ready::{ReadinessGate, WaitReady};

static GLOBAL: OnceLock<ResourceLoader> = OnceLock::new();

struct LoaderInner {
    host: Arc<dyn ScriptHost>,
    injected: Mutex<Option<String>>,
    loaded: ReadinessGate<()>,
}

/// Clone-friendly handle; clones share the injection state.
#[derive(Clone)]
pub struct ResourceLoader {
    inner: Arc<LoaderInner>,
}

impl ResourceLoader {
    pub fn new(host: Arc<dyn ScriptHost>) -> Self {
        ResourceLoader {
            inner: Arc::new(LoaderInner {
                host,
                injected: Mutex::new(None),
                loaded: ReadinessGate::new(),
            }),
        }
    }

    /// Install the process-wide loader. The first call wins; later calls
    /// return the already installed loader and drop `host`.
    pub fn install(host: Arc<dyn ScriptHost>) -> ResourceLoader {
        GLOBAL.get_or_init(|| ResourceLoader::new(host)).clone()
    }

    /// The process-wide loader, if one was installed.
    pub fn global() -> Option<ResourceLoader> {
        GLOBAL.get().cloned()
    }

    /// Run `on_loaded` once the engine library is available.
    ///
    /// If the library is already present (loaded earlier, or linked by the
    /// page) the load is marked complete and the callback runs before this
    /// returns. Otherwise the script is
    /// injected, unless an earlier call already did, and the callback is
    /// queued behind every earlier caller.
    ///
    /// There is no failure path: if the script never loads, the callback
    /// never runs.
    pub fn ensure_loaded<F>(&self, config: &LoaderConfig, on_loaded: F)
    where
        F: FnOnce() + Send + 'static,
    {
        if !self.inner.loaded.is_resolved() && self.inner.host.library_present() {
            tracing::debug!("map engine library already present");
            self.inner.loaded.resolve(());
        }
        if self.inner.loaded.is_resolved() {
            on_loaded();
            return;
        }

        let url = {
            let mut injected = lock(&self.inner.injected);
            if let Some(current) = injected.as_deref() {
                let requested = config.script_url();
                if requested != current {
                    tracing::debug!(
                        injected = %current,
                        %requested,
                        "engine script already requested, ignoring this caller's script settings"
                    );
                }
                None
            } else {
                let url = config.script_url();
                *injected = Some(url.clone());
                Some(url)
            }
        };

        if let Some(url) = url {
            tracing::debug!(%url, "injecting map engine script");
            self.inner.host.inject_script(&url);
        }

        self.inner.loaded.when_ready(move |()| on_loaded());
    }

    /// Report that the injected script finished loading. Queued callbacks run
    /// in call order. Later reports are ignored.
    pub fn complete(&self) {
        if self.inner.loaded.resolve(()) {
            tracing::debug!("map engine script loaded");
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.inner.loaded.is_resolved()
    }

    /// URL of the injected script, if injection happened.
    pub fn injected_url(&self) -> Option<String> {
        lock(&self.inner.injected).clone()
    }

    /// A future that resolves when the script reports loaded.
    pub fn loaded(&self) -> WaitReady<()> {
        self.inner.loaded.wait()
    }
}

impl fmt::Debug for ResourceLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceLoader")
            .field("injected", &self.injected_url())
            .field("loaded", &self.is_loaded())
            .finish()
    }
}

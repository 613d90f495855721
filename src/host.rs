//! Capabilities consumed from the hosting UI framework and page.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::locks::lock;

/// The widget base: identity, mount point and visibility.
pub trait WidgetHost: Send + Sync {
    fn widget_id(&self) -> String;

    /// Identifier of the surface the engine map is mounted into.
    fn surface(&self) -> String;

    fn is_visible(&self, widget_id: &str) -> bool;
}

/// The page environment the engine script is loaded into.
pub trait ScriptHost: Send + Sync {
    /// Whether the engine library is already available, e.g. linked by the
    /// page itself.
    fn library_present(&self) -> bool;

    /// Start fetching the engine script. Completion is reported back through
    /// [`ResourceLoader::complete`](crate::ResourceLoader::complete).
    fn inject_script(&self, url: &str);
}

struct HeadlessState {
    visible: AtomicBool,
    library_present: AtomicBool,
    injected: Mutex<Vec<String>>,
}

/// In-process [`WidgetHost`] + [`ScriptHost`] with switchable visibility and
/// library presence. Clones share state.
#[derive(Clone)]
pub struct HeadlessHost {
    widget_id: String,
    state: Arc<HeadlessState>,
}

impl HeadlessHost {
    /// A visible host without the engine library.
    pub fn new(widget_id: impl Into<String>) -> Self {
        HeadlessHost {
            widget_id: widget_id.into(),
            state: Arc::new(HeadlessState {
                visible: AtomicBool::new(true),
                library_present: AtomicBool::new(false),
                injected: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn set_visible(&self, visible: bool) {
        self.state.visible.store(visible, Ordering::SeqCst);
    }

    pub fn set_library_present(&self, present: bool) {
        self.state.library_present.store(present, Ordering::SeqCst);
    }

    /// URLs passed to `inject_script`, in order.
    pub fn injected_scripts(&self) -> Vec<String> {
        lock(&self.state.injected).clone()
    }
}

impl WidgetHost for HeadlessHost {
    fn widget_id(&self) -> String {
        self.widget_id.clone()
    }

    fn surface(&self) -> String {
        format!("{}_map_content", self.widget_id)
    }

    fn is_visible(&self, widget_id: &str) -> bool {
        widget_id == self.widget_id && self.state.visible.load(Ordering::SeqCst)
    }
}

impl ScriptHost for HeadlessHost {
    fn library_present(&self) -> bool {
        self.state.library_present.load(Ordering::SeqCst)
    }

    fn inject_script(&self, url: &str) {
        lock(&self.state.injected).push(url.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn visibility_is_per_widget() {
        let host = HeadlessHost::new("map1");
        assert!(host.is_visible("map1"));
        assert!(!host.is_visible("other"));

        host.set_visible(false);
        assert!(!host.is_visible("map1"));
    }

    #[test]
    fn records_injections() {
        let host = HeadlessHost::new("map1");
        assert!(!host.library_present());

        host.inject_script("//a.js");
        assert_eq!(host.injected_scripts(), vec!["//a.js"]);
        assert_eq!(host.surface(), "map1_map_content");
    }
}

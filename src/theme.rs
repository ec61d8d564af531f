// Theme preference store

use crate::gateway::PersistenceGateway;
use tracing::info;

/// Theme used when nothing has been stored
pub const DEFAULT_THEME: &str = "nord";

/// Theme names the front end knows how to render
pub const THEMES: &[&str] = &[
    "light",
    "dark",
    "cupcake",
    "bumblebee",
    "emerald",
    "corporate",
    "synthwave",
    "retro",
    "cyberpunk",
    "valentine",
    "halloween",
    "garden",
    "forest",
    "aqua",
    "lofi",
    "pastel",
    "fantasy",
    "wireframe",
    "black",
    "luxury",
    "dracula",
    "cmyk",
    "autumn",
    "business",
    "acid",
    "lemonade",
    "night",
    "coffee",
    "winter",
    "dim",
    "nord",
    "sunset",
];

pub fn is_known_theme(name: &str) -> bool {
    THEMES.contains(&name)
}

/// Handle returned by `subscribe`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ThemeSubscription(u64);

type ThemeListener = Box<dyn FnMut(&str)>;

/// Current theme, written through to storage on every change
pub struct ThemeStore {
    theme: String,
    gateway: PersistenceGateway,
    listeners: Vec<(ThemeSubscription, ThemeListener)>,
    next_subscription: u64,
}

impl ThemeStore {
    /// Load the persisted theme, or the default
    pub fn load(gateway: PersistenceGateway) -> Self {
        let theme = gateway.load_theme();
        Self {
            theme,
            gateway,
            listeners: Vec::new(),
            next_subscription: 0,
        }
    }

    pub fn theme(&self) -> &str {
        &self.theme
    }

    /// Accepts any name; unknown names are the caller's call
    pub fn set_theme(&mut self, theme: impl Into<String>) {
        let theme = theme.into();
        self.gateway.save_theme(&theme);
        info!(theme = %theme, "Theme changed");
        self.theme = theme;

        for (_, listener) in self.listeners.iter_mut() {
            listener(&self.theme);
        }
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&str) + 'static) -> ThemeSubscription {
        let id = ThemeSubscription(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn unsubscribe(&mut self, subscription: ThemeSubscription) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(id, _)| *id != subscription);
        self.listeners.len() != before
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::THEME_KEY;
    use crate::gateway::tests::FlakyStorage;
    use crate::storage::{MemoryStorage, Storage};
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_default_when_nothing_stored() {
        let store = ThemeStore::load(PersistenceGateway::new(Rc::new(MemoryStorage::new())));
        assert_eq!(store.theme(), DEFAULT_THEME);
    }

    #[test]
    fn test_loads_stored_theme() {
        let storage = Rc::new(MemoryStorage::new());
        storage.set_item(THEME_KEY, "coffee").unwrap();

        let store = ThemeStore::load(PersistenceGateway::new(storage));
        assert_eq!(store.theme(), "coffee");
    }

    #[test]
    fn test_set_theme_persists() {
        let storage = Rc::new(MemoryStorage::new());
        let mut store = ThemeStore::load(PersistenceGateway::new(storage.clone()));

        store.set_theme("dracula");
        assert_eq!(store.theme(), "dracula");
        assert_eq!(storage.get_item(THEME_KEY).unwrap().as_deref(), Some("dracula"));

        let reloaded = ThemeStore::load(PersistenceGateway::new(storage));
        assert_eq!(reloaded.theme(), "dracula");
    }

    #[test]
    fn test_set_theme_accepts_unknown_names() {
        let mut store = ThemeStore::load(PersistenceGateway::new(Rc::new(MemoryStorage::new())));
        store.set_theme("not-a-theme");
        assert_eq!(store.theme(), "not-a-theme");
        assert!(!is_known_theme(store.theme()));
    }

    #[test]
    fn test_failed_write_keeps_new_value_in_memory() {
        let storage = Rc::new(FlakyStorage::default());
        storage.fail_writes.set(true);

        let mut store = ThemeStore::load(PersistenceGateway::new(storage.clone()));
        store.set_theme("night");
        assert_eq!(store.theme(), "night");

        storage.fail_writes.set(false);
        let reloaded = ThemeStore::load(PersistenceGateway::new(storage));
        assert_eq!(reloaded.theme(), DEFAULT_THEME);
    }

    #[test]
    fn test_listeners() {
        let mut store = ThemeStore::load(PersistenceGateway::new(Rc::new(MemoryStorage::new())));
        let seen = Rc::new(RefCell::new(Vec::new()));

        let sink = seen.clone();
        let sub = store.subscribe(move |theme| sink.borrow_mut().push(theme.to_string()));

        store.set_theme("aqua");
        assert!(store.unsubscribe(sub));
        assert!(!store.unsubscribe(sub));
        store.set_theme("lofi");

        assert_eq!(*seen.borrow(), vec!["aqua".to_string()]);
    }

    #[test]
    fn test_known_themes() {
        assert!(is_known_theme(DEFAULT_THEME));
        assert!(is_known_theme("dark"));
        assert!(!is_known_theme("Nord"));
    }
}

//! Style Sheet
//!
//! Root container and the registration entry points. Every registrar
//! flattens its declarations into a scratch cache first, then merges (or
//! wraps) that cache into the sheet, so a failed registration is reported
//! before the caller sees an id.

use std::borrow::Cow;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use fos_cache::{Cache, CacheError, Changes, Container, NodeKind};

use crate::config::Config;
use crate::declarations::Declarations;
use crate::flatten::{Flattened, Flattener, build};
use crate::hash::{Hasher, to_base36};
use crate::nodes::{Rule, RuleChild};
use crate::properties::{escape, interpolate};

/// Source of sheet ids
static NEXT_SHEET_ID: AtomicU64 = AtomicU64::new(1);

/// Flattened registration, not yet merged
struct Composed {
    cache: Cache<RuleChild>,
    seed: String,
    id: String,
}

/// Root of a style tree.
///
/// Mutating methods take `&mut self`. To share a sheet between threads,
/// serialize writers with a `Mutex` or `RwLock`; rendering through a
/// shared reference is safe while no write is in progress.
#[derive(Debug)]
pub struct StyleSheet {
    id: String,
    hasher: Hasher,
    debug: bool,
    /// Force-unique counter
    unique: u64,
    cache: Cache<RuleChild>,
}

impl StyleSheet {
    pub fn new(config: Config) -> Self {
        let id = format!("f{}", to_base36(NEXT_SHEET_ID.fetch_add(1, Ordering::Relaxed)));
        tracing::info!(id = %id, debug = config.debug, "Style sheet created");

        Self {
            id,
            hasher: config.hasher,
            debug: config.debug,
            unique: 0,
            cache: Cache::new(),
        }
    }

    /// Create a sheet that reports top-level changes to `changes`
    pub fn with_changes(config: Config, changes: Arc<dyn Changes<RuleChild>>) -> Self {
        let mut sheet = Self::new(config);
        sheet.cache.set_changes(Some(changes));
        sheet
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn is_debug(&self) -> bool {
        self.debug
    }

    pub fn hasher(&self) -> &Hasher {
        &self.hasher
    }

    /// Top-level rules and styles
    pub fn cache(&self) -> &Cache<RuleChild> {
        &self.cache
    }

    /// Register a style under a generated class and return the class name
    pub fn register_style(
        &mut self,
        styles: &Declarations,
        display_name: Option<&str>,
    ) -> Result<String, CacheError> {
        let name = display_name.filter(|_| self.debug);
        let composed = self.compose("&", styles, true, name)?;
        self.cache.merge(&composed.cache)?;

        tracing::debug!(id = %composed.id, "Registered style");
        Ok(composed.id)
    }

    /// Register `@keyframes` steps and return the animation name
    pub fn register_keyframes(
        &mut self,
        keyframes: &Declarations,
        display_name: Option<&str>,
    ) -> Result<String, CacheError> {
        self.register_hash_rule("@keyframes", keyframes, display_name)
    }

    /// Register a generated at-rule named `<prefix> <id>` and return the id
    pub fn register_hash_rule(
        &mut self,
        prefix: &str,
        styles: &Declarations,
        display_name: Option<&str>,
    ) -> Result<String, CacheError> {
        let name = display_name.filter(|_| self.debug);
        let Composed { cache, seed, id } = self.compose("", styles, false, name)?;

        let mut rule = Rule::with_pid(format!("{} {}", prefix, escape(&id)), "", seed, &self.hasher);
        rule.children_mut().merge(&cache)?;
        self.cache.add(&RuleChild::Rule(rule))?;

        tracing::debug!(prefix, id = %id, "Registered hash rule");
        Ok(id)
    }

    /// Register declarations under a user selector or at-rule
    pub fn register_rule(&mut self, rule: &str, styles: &Declarations) -> Result<(), CacheError> {
        let composed = self.compose(rule, styles, false, None)?;
        self.cache.merge(&composed.cache)?;

        tracing::debug!(rule, "Registered rule");
        Ok(())
    }

    /// Register top-level user selectors, e.g. `{ "body": { ... } }`
    pub fn register_css(&mut self, styles: &Declarations) -> Result<(), CacheError> {
        self.register_rule("", styles)
    }

    /// Render the whole sheet
    pub fn get_styles(&self) -> String {
        self.cache.values().map(RuleChild::styles).collect()
    }

    /// Add a single top-level node
    pub fn add(&mut self, node: &RuleChild) -> Result<&RuleChild, CacheError> {
        self.cache.add(node)
    }

    /// Drop one reference to a top-level node
    pub fn remove(&mut self, node: &RuleChild) {
        self.cache.remove(node);
    }

    /// Merge another sheet, e.g. a component-local one
    pub fn merge(&mut self, other: &StyleSheet) -> Result<(), CacheError> {
        self.cache.merge(&other.cache)
    }

    /// Retract a sheet merged earlier
    pub fn unmerge(&mut self, other: &StyleSheet) {
        self.cache.unmerge(&other.cache);
    }

    fn compose(
        &mut self,
        selector: &str,
        styles: &Declarations,
        is_style: bool,
        display_name: Option<&str>,
    ) -> Result<Composed, CacheError> {
        let Flattened { blocks, seed } = Flattener::new(&mut self.unique).flatten(selector, styles);

        let hash = format!("f{}", self.hasher.hash(&seed));
        let id = match display_name {
            Some(name) => format!("{}_{}", name, hash),
            None => hash,
        };

        let class = format!(".{}", escape(&id));
        let finish = |key: &str| {
            if is_style {
                interpolate(key, &class)
            } else {
                key.to_string()
            }
        };

        let mut cache = Cache::new();
        build(&blocks, &mut cache, &seed, &self.hasher, &finish)?;

        Ok(Composed { cache, seed, id })
    }
}

impl Default for StyleSheet {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

/// Keeps the id, hasher and listener; children are re-merged with a
/// single reference each.
impl Clone for StyleSheet {
    fn clone(&self) -> Self {
        let mut cache = self.cache.clone();
        cache.set_changes(self.cache.changes().cloned());

        Self {
            id: self.id.clone(),
            hasher: self.hasher.clone(),
            debug: self.debug,
            unique: self.unique,
            cache,
        }
    }
}

impl Container for StyleSheet {
    fn id(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> NodeKind {
        NodeKind::Root
    }

    fn identifier(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.id)
    }

    fn styles(&self) -> String {
        self.get_styles()
    }

    fn change_id(&self) -> u64 {
        self.cache.change_id()
    }

    fn check_children(&self, other: &Self) -> Result<(), CacheError> {
        self.cache.check_merge(&other.cache)
    }

    fn merge_children(&mut self, other: &Self) -> Result<(), CacheError> {
        self.merge(other)
    }

    fn unmerge_children(&mut self, other: &Self) {
        self.unmerge(other);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn red() -> Declarations {
        Declarations::new().prop("color", "red")
    }

    #[derive(Default)]
    struct Recorder(Mutex<Vec<String>>);

    impl Changes<RuleChild> for Recorder {
        fn add(&self, item: &RuleChild, index: usize) {
            self.0.lock().unwrap().push(format!("add {} {}", item.styles(), index));
        }

        fn change(&self, item: &RuleChild, old_index: usize, new_index: usize) {
            self.0
                .lock()
                .unwrap()
                .push(format!("change {} {} {}", item.styles(), old_index, new_index));
        }

        fn remove(&self, item: &RuleChild, index: usize) {
            self.0.lock().unwrap().push(format!("remove {} {}", item.styles(), index));
        }
    }

    #[test]
    fn test_register_style() {
        let mut sheet = StyleSheet::default();
        let id = sheet.register_style(&red(), None).unwrap();

        assert_eq!(id, "f1jvcvsh");
        assert_eq!(sheet.get_styles(), ".f1jvcvsh{color:red}");
    }

    #[test]
    fn test_register_nested_style() {
        let mut sheet = StyleSheet::default();
        let styles = red().nest("&:hover", Declarations::new().prop("color", "blue"));
        let id = sheet.register_style(&styles, None).unwrap();

        assert_eq!(id, "fnerj9u");
        assert_eq!(
            sheet.get_styles(),
            ".fnerj9u{color:red}.fnerj9u:hover{color:blue}"
        );
    }

    #[test]
    fn test_register_keyframes() {
        let mut sheet = StyleSheet::default();
        let steps = Declarations::new()
            .nest("100%", Declarations::new().prop("opacity", 0))
            .nest("0%", Declarations::new().prop("opacity", 1));
        let name = sheet.register_keyframes(&steps, None).unwrap();

        assert_eq!(name, "fx1c7hh");
        assert_eq!(
            sheet.get_styles(),
            "@keyframes fx1c7hh{0%{opacity:1}100%{opacity:0}}"
        );
    }

    #[test]
    fn test_register_hash_rule_prefix() {
        let mut sheet = StyleSheet::default();
        let steps = Declarations::new().nest("from", Declarations::new().prop("opacity", 0));
        let id = sheet.register_hash_rule("@-webkit-keyframes", &steps, None).unwrap();

        assert_eq!(
            sheet.get_styles(),
            format!("@-webkit-keyframes {}{{from{{opacity:0}}}}", id)
        );
    }

    #[test]
    fn test_register_rule() {
        let mut sheet = StyleSheet::default();
        sheet
            .register_rule("body", &Declarations::new().prop("margin", 0))
            .unwrap();
        sheet
            .register_rule(
                "@media print",
                &Declarations::new().nest("body", Declarations::new().prop("color", "black")),
            )
            .unwrap();

        assert_eq!(
            sheet.get_styles(),
            "body{margin:0}@media print{body{color:black}}"
        );
    }

    #[test]
    fn test_register_css() {
        let mut sheet = StyleSheet::default();
        let styles = Declarations::new()
            .nest("html, body", Declarations::new().prop("height", "100%"))
            .nest("a", Declarations::new().prop("textDecoration", "none"));
        sheet.register_css(&styles).unwrap();

        assert_eq!(
            sheet.get_styles(),
            "a{text-decoration:none}html, body{height:100%}"
        );
    }

    #[test]
    fn test_display_name_in_debug() {
        let mut sheet = StyleSheet::new(Config::default().with_debug(true));
        let id = sheet.register_style(&red(), Some("my.button")).unwrap();

        assert_eq!(id, "my.button_f1jvcvsh");
        assert_eq!(sheet.get_styles(), ".my\\.button_f1jvcvsh{color:red}");
    }

    #[test]
    fn test_display_name_ignored_without_debug() {
        let mut sheet = StyleSheet::default();
        let id = sheet.register_style(&red(), Some("button")).unwrap();
        assert_eq!(id, "f1jvcvsh");
    }

    #[test]
    fn test_collision() {
        let config = Config::default().with_hasher(Hasher::new(|_| "x".to_string()));
        let mut sheet = StyleSheet::new(config);
        sheet.register_style(&red(), None).unwrap();

        let err = sheet
            .register_style(&Declarations::new().prop("color", "blue"), None)
            .unwrap_err();
        assert_eq!(
            err,
            CacheError::Collision {
                incoming: ".fx{color:blue}".into(),
                existing: ".fx{color:red}".into(),
            }
        );
        assert_eq!(sheet.get_styles(), ".fx{color:red}");
    }

    #[test]
    fn test_change_id_stable_on_repeat() {
        let mut sheet = StyleSheet::default();
        sheet.register_style(&red(), None).unwrap();
        let change_id = sheet.change_id();

        sheet.register_style(&red(), None).unwrap();
        assert_eq!(sheet.change_id(), change_id);

        sheet
            .register_style(&Declarations::new().prop("color", "blue"), None)
            .unwrap();
        assert!(sheet.change_id() > change_id);
    }

    #[test]
    fn test_changes_listener() {
        let recorder = Arc::new(Recorder::default());
        let mut sheet = StyleSheet::with_changes(Config::default(), recorder.clone());
        let blue = Declarations::new().prop("color", "blue");

        sheet.register_style(&red(), None).unwrap();
        sheet.register_style(&blue, None).unwrap();
        sheet.register_style(&red(), None).unwrap();

        let events = recorder.0.lock().unwrap().clone();
        assert_eq!(
            events,
            vec![
                "add .f1jvcvsh{color:red} 0",
                "add .f1mb383g{color:blue} 1",
                "change .f1jvcvsh{color:red} 0 1",
            ]
        );
    }

    #[test]
    fn test_clone_keeps_identity() {
        let mut sheet = StyleSheet::default();
        sheet.register_style(&red(), None).unwrap();
        sheet.register_style(&red(), None).unwrap();

        let copy = sheet.clone();
        assert_eq!(copy.id(), sheet.id());
        assert_eq!(copy.get_styles(), sheet.get_styles());
        assert_eq!(copy.cache().count("c1jvcvsh"), 1);
        assert_eq!(sheet.cache().count("c1jvcvsh"), 2);
    }

    #[test]
    fn test_root_container() {
        let sheet = StyleSheet::default();
        assert_eq!(sheet.kind(), NodeKind::Root);
        assert_eq!(sheet.identifier(), sheet.id());
        assert!(sheet.id().starts_with('f'));
        assert_ne!(StyleSheet::default().id(), sheet.id());
    }
}

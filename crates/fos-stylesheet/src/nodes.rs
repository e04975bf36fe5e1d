//! Style Tree Nodes
//!
//! Sheet -> (Rule | Style) -> Selector. Rules nest further rules and
//! styles, for at-rules that contain rules. Ids are content hashes with a
//! kind prefix, so nodes of different kinds never share an id.

use std::borrow::Cow;

use fos_cache::{Cache, CacheError, Container, NodeKind};

use crate::hash::Hasher;

/// Selector text attached to a style
#[derive(Debug, Clone)]
pub struct Selector {
    id: String,
    selector: String,
    /// Seed of the registration that produced this selector
    pid: String,
}

impl Selector {
    pub fn new(selector: impl Into<String>, pid: impl Into<String>, hasher: &Hasher) -> Self {
        let selector = selector.into();
        Self {
            id: format!("s{}", hasher.hash(&selector)),
            selector,
            pid: pid.into(),
        }
    }

    pub fn selector(&self) -> &str {
        &self.selector
    }

    pub fn pid(&self) -> &str {
        &self.pid
    }
}

impl Container for Selector {
    fn id(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> NodeKind {
        NodeKind::Selector
    }

    fn identifier(&self) -> Cow<'_, str> {
        Cow::Owned(format!("{}.{}", self.pid, self.selector))
    }

    fn styles(&self) -> String {
        self.selector.clone()
    }
}

/// Canonical declaration block and the selectors that share it
#[derive(Debug, Clone)]
pub struct Style {
    id: String,
    style: String,
    selectors: Cache<Selector>,
}

impl Style {
    pub fn new(style: impl Into<String>, hasher: &Hasher) -> Self {
        let style = style.into();
        Self {
            id: format!("c{}", hasher.hash(&style)),
            style,
            selectors: Cache::new(),
        }
    }

    /// Style that never merges with an identical block; `token` must be
    /// fresh for every call.
    pub fn unique(style: impl Into<String>, token: &str, hasher: &Hasher) -> Self {
        let style = style.into();
        Self {
            id: format!("c{}.{}", hasher.hash(&style), token),
            style,
            selectors: Cache::new(),
        }
    }

    pub fn style(&self) -> &str {
        &self.style
    }

    pub fn selectors(&self) -> &Cache<Selector> {
        &self.selectors
    }

    pub fn add_selector(&mut self, selector: &Selector) -> Result<(), CacheError> {
        self.selectors.add(selector).map(|_| ())
    }
}

impl Container for Style {
    fn id(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> NodeKind {
        NodeKind::Style
    }

    fn identifier(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.style)
    }

    fn styles(&self) -> String {
        let selectors: Vec<&str> = self.selectors.values().map(Selector::selector).collect();
        format!("{}{{{}}}", selectors.join(","), self.style)
    }

    fn change_id(&self) -> u64 {
        self.selectors.change_id()
    }

    fn check_children(&self, other: &Self) -> Result<(), CacheError> {
        self.selectors.check_merge(&other.selectors)
    }

    fn merge_children(&mut self, other: &Self) -> Result<(), CacheError> {
        self.selectors.merge(&other.selectors)
    }

    fn unmerge_children(&mut self, other: &Self) {
        self.selectors.unmerge(&other.selectors);
    }
}

/// At-rule or generated block
#[derive(Debug, Clone)]
pub struct Rule {
    id: String,
    rule: String,
    /// Inline declarations rendered before the children
    style: String,
    pid: String,
    children: Cache<RuleChild>,
}

impl Rule {
    pub fn new(rule: impl Into<String>, style: impl Into<String>, hasher: &Hasher) -> Self {
        Self::with_pid(rule, style, "", hasher)
    }

    pub fn with_pid(
        rule: impl Into<String>,
        style: impl Into<String>,
        pid: impl Into<String>,
        hasher: &Hasher,
    ) -> Self {
        let rule = rule.into();
        let style = style.into();
        Self {
            id: format!("a{}", hasher.hash(&format!("{}.{}", rule, style))),
            rule,
            style,
            pid: pid.into(),
            children: Cache::new(),
        }
    }

    pub fn rule(&self) -> &str {
        &self.rule
    }

    pub fn style(&self) -> &str {
        &self.style
    }

    pub fn pid(&self) -> &str {
        &self.pid
    }

    pub fn children(&self) -> &Cache<RuleChild> {
        &self.children
    }

    pub(crate) fn children_mut(&mut self) -> &mut Cache<RuleChild> {
        &mut self.children
    }
}

impl Container for Rule {
    fn id(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> NodeKind {
        NodeKind::Rule
    }

    fn identifier(&self) -> Cow<'_, str> {
        Cow::Owned(format!("{}.{}.{}", self.pid, self.rule, self.style))
    }

    fn styles(&self) -> String {
        let children: String = self.children.values().map(RuleChild::styles).collect();
        format!("{}{{{}{}}}", self.rule, self.style, children)
    }

    fn change_id(&self) -> u64 {
        self.children.change_id()
    }

    fn check_children(&self, other: &Self) -> Result<(), CacheError> {
        self.children.check_merge(&other.children)
    }

    fn merge_children(&mut self, other: &Self) -> Result<(), CacheError> {
        self.children.merge(&other.children)
    }

    fn unmerge_children(&mut self, other: &Self) {
        self.children.unmerge(&other.children);
    }
}

/// Node held by a sheet or a rule
#[derive(Debug, Clone)]
pub enum RuleChild {
    Style(Style),
    Rule(Rule),
}

impl From<Style> for RuleChild {
    fn from(style: Style) -> Self {
        RuleChild::Style(style)
    }
}

impl From<Rule> for RuleChild {
    fn from(rule: Rule) -> Self {
        RuleChild::Rule(rule)
    }
}

impl Container for RuleChild {
    fn id(&self) -> &str {
        match self {
            RuleChild::Style(style) => style.id(),
            RuleChild::Rule(rule) => rule.id(),
        }
    }

    fn kind(&self) -> NodeKind {
        match self {
            RuleChild::Style(style) => style.kind(),
            RuleChild::Rule(rule) => rule.kind(),
        }
    }

    fn identifier(&self) -> Cow<'_, str> {
        match self {
            RuleChild::Style(style) => style.identifier(),
            RuleChild::Rule(rule) => rule.identifier(),
        }
    }

    fn styles(&self) -> String {
        match self {
            RuleChild::Style(style) => style.styles(),
            RuleChild::Rule(rule) => rule.styles(),
        }
    }

    fn change_id(&self) -> u64 {
        match self {
            RuleChild::Style(style) => style.change_id(),
            RuleChild::Rule(rule) => rule.change_id(),
        }
    }

    fn check_children(&self, other: &Self) -> Result<(), CacheError> {
        match (self, other) {
            (RuleChild::Style(style), RuleChild::Style(other)) => style.check_children(other),
            (RuleChild::Rule(rule), RuleChild::Rule(other)) => rule.check_children(other),
            _ => Ok(()),
        }
    }

    fn merge_children(&mut self, other: &Self) -> Result<(), CacheError> {
        match (self, other) {
            (RuleChild::Style(style), RuleChild::Style(other)) => style.merge_children(other),
            (RuleChild::Rule(rule), RuleChild::Rule(other)) => rule.merge_children(other),
            // Kind-prefixed ids keep styles and rules apart
            _ => Ok(()),
        }
    }

    fn unmerge_children(&mut self, other: &Self) {
        match (self, other) {
            (RuleChild::Style(style), RuleChild::Style(other)) => style.unmerge_children(other),
            (RuleChild::Rule(rule), RuleChild::Rule(other)) => rule.unmerge_children(other),
            _ => {}
        }
    }
}

//! Declaration Flattening
//!
//! Walks a nested declaration object once and produces:
//! 1. Canonical declaration text for every block (properties sorted)
//! 2. The blocks themselves, each waiting for its final selector
//! 3. A seed string capturing the shape of the whole registration
//!
//! The seed is hashed into the public id, and only then are selectors
//! finished and the blocks materialized into a scratch cache.

use fos_cache::{Cache, CacheError};

use crate::declarations::{Declaration, Declarations, IS_UNIQUE, Value};
use crate::hash::{Hasher, to_base36};
use crate::nodes::{Rule, RuleChild, Selector, Style};
use crate::properties::{hyphenate, interpolate, stringify_properties};

/// One level of a declaration object, split by entry kind
#[derive(Debug)]
pub(crate) struct Parsed<'a> {
    /// Canonical declaration text
    pub style: String,
    /// Nested blocks, trimmed keys
    pub nested: Vec<(&'a str, &'a Declarations)>,
    pub is_unique: bool,
}

/// Split one level into properties and nested blocks.
///
/// Properties are always sorted by hyphenated name. Nested keys keep their
/// order when `preserve_nested` is set, since selector order matters to the
/// cascade; otherwise they are sorted too.
pub(crate) fn parse_styles(styles: &Declarations, preserve_nested: bool) -> Parsed<'_> {
    let mut properties: Vec<(String, &Value)> = Vec::new();
    let mut nested = Vec::new();
    let mut is_unique = false;

    for declaration in styles {
        match declaration {
            Declaration::Property { name, value } => {
                if value.is_null() {
                    continue;
                }
                if name == IS_UNIQUE {
                    is_unique = true;
                } else {
                    properties.push((hyphenate(name.trim()), value));
                }
            }
            Declaration::Nested { key, body } => {
                if key == IS_UNIQUE {
                    is_unique = true;
                } else {
                    nested.push((key.trim(), body));
                }
            }
        }
    }

    properties.sort_by(|a, b| a.0.cmp(&b.0));
    if !preserve_nested {
        nested.sort_by(|a, b| a.0.cmp(b.0));
    }

    Parsed {
        style: stringify_properties(&properties),
        nested,
        is_unique,
    }
}

/// Block produced by a flattening pass
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Block {
    /// Declarations for `key`, a selector still relative to the root
    Style {
        key: String,
        style: String,
        unique: Option<String>,
    },
    /// At-rule with inline declarations and nested blocks
    Rule {
        rule: String,
        style: String,
        children: Vec<Block>,
    },
}

#[derive(Debug)]
pub(crate) struct Flattened {
    pub blocks: Vec<Block>,
    pub seed: String,
}

pub(crate) struct Flattener<'a> {
    /// Force-unique counter owned by the sheet
    unique: &'a mut u64,
}

impl<'a> Flattener<'a> {
    pub fn new(unique: &'a mut u64) -> Self {
        Self { unique }
    }

    /// Flatten `styles` under `selector`. An empty selector means the top
    /// level has no selector context and its nested keys get sorted.
    pub fn flatten(&mut self, selector: &str, styles: &Declarations) -> Flattened {
        let mut blocks = Vec::new();
        let seed = self.stylize(selector, styles, "", &mut blocks);
        Flattened { blocks, seed }
    }

    fn stylize(
        &mut self,
        selector: &str,
        styles: &Declarations,
        parent: &str,
        out: &mut Vec<Block>,
    ) -> String {
        let Parsed {
            style,
            nested,
            is_unique,
        } = parse_styles(styles, !selector.is_empty());
        let mut pid = style.clone();

        if selector.starts_with('@') {
            let mut children = Vec::new();
            // Outside any selector the declarations sit directly in the rule
            let inline = if parent.is_empty() {
                style.clone()
            } else {
                String::new()
            };

            if !parent.is_empty() && !style.is_empty() {
                let unique = self.unique_token(is_unique);
                if let Some(token) = &unique {
                    pid.push_str(token);
                }
                children.push(Block::Style {
                    key: parent.to_string(),
                    style,
                    unique,
                });
            }

            for (name, body) in nested {
                pid.push_str(name);
                pid.push_str(&self.stylize(name, body, parent, &mut children));
            }

            out.push(Block::Rule {
                rule: selector.to_string(),
                style: inline,
                children,
            });
        } else {
            let key = if parent.is_empty() {
                selector.to_string()
            } else {
                interpolate(selector, parent)
            };

            if !style.is_empty() {
                let unique = self.unique_token(is_unique);
                if let Some(token) = &unique {
                    pid.push_str(token);
                }
                out.push(Block::Style {
                    key: key.clone(),
                    style,
                    unique,
                });
            }

            for (name, body) in nested {
                pid.push_str(name);
                pid.push_str(&self.stylize(name, body, &key, out));
            }
        }

        pid
    }

    fn unique_token(&mut self, is_unique: bool) -> Option<String> {
        if !is_unique {
            return None;
        }
        *self.unique += 1;
        Some(format!("u{}", to_base36(*self.unique)))
    }
}

/// Materialize `blocks` into `cache`, in order.
///
/// `finish` turns a block key into its final selector text; every selector
/// carries `seed` as its parent identity.
pub(crate) fn build(
    blocks: &[Block],
    cache: &mut Cache<RuleChild>,
    seed: &str,
    hasher: &Hasher,
    finish: &dyn Fn(&str) -> String,
) -> Result<(), CacheError> {
    for block in blocks {
        match block {
            Block::Style { key, style, unique } => {
                let mut node = match unique {
                    Some(token) => Style::unique(style.as_str(), token, hasher),
                    None => Style::new(style.as_str(), hasher),
                };
                node.add_selector(&Selector::new(finish(key), seed, hasher))?;
                cache.add(&RuleChild::Style(node))?;
            }
            Block::Rule {
                rule,
                style,
                children,
            } => {
                let mut node = Rule::new(rule.as_str(), style.as_str(), hasher);
                build(children, node.children_mut(), seed, hasher, finish)?;
                cache.add(&RuleChild::Rule(node))?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use fos_cache::Container;

    fn flatten(selector: &str, styles: &Declarations) -> Flattened {
        let mut unique = 0;
        Flattener::new(&mut unique).flatten(selector, styles)
    }

    fn style_block(key: &str, style: &str) -> Block {
        Block::Style {
            key: key.to_string(),
            style: style.to_string(),
            unique: None,
        }
    }

    #[test]
    fn test_parse_sorts_properties() {
        let a = Declarations::new().prop("width", 10).prop("color", "red");
        let b = Declarations::new().prop("color", "red").prop("width", 10);

        assert_eq!(parse_styles(&a, true).style, "color:red;width:10px");
        assert_eq!(parse_styles(&a, true).style, parse_styles(&b, true).style);
    }

    #[test]
    fn test_parse_drops_nulls_and_trims() {
        let decls = Declarations::new()
            .prop(" backgroundColor ", "red")
            .prop("color", Value::Null)
            .nest(" &:hover ", Declarations::new());

        let parsed = parse_styles(&decls, true);
        assert_eq!(parsed.style, "background-color:red");
        assert_eq!(parsed.nested.len(), 1);
        assert_eq!(parsed.nested[0].0, "&:hover");
        assert!(!parsed.is_unique);
    }

    #[test]
    fn test_parse_nested_order() {
        let decls = Declarations::new()
            .nest("b", Declarations::new())
            .nest("a", Declarations::new());

        let kept: Vec<&str> = parse_styles(&decls, true).nested.iter().map(|n| n.0).collect();
        assert_eq!(kept, vec!["b", "a"]);

        let sorted: Vec<&str> = parse_styles(&decls, false).nested.iter().map(|n| n.0).collect();
        assert_eq!(sorted, vec!["a", "b"]);
    }

    #[test]
    fn test_parse_unique_marker() {
        let decls = Declarations::new().prop("color", "red").unique();
        let parsed = parse_styles(&decls, true);

        assert!(parsed.is_unique);
        assert_eq!(parsed.style, "color:red");
    }

    #[test]
    fn test_flatten_nested_selectors() {
        let decls = Declarations::new()
            .prop("color", "red")
            .nest("&:hover", Declarations::new().prop("color", "blue"))
            .nest("span", Declarations::new().prop("margin", 0));

        let flat = flatten("&", &decls);
        assert_eq!(flat.seed, "color:red&:hovercolor:bluespanmargin:0");
        assert_eq!(
            flat.blocks,
            vec![
                style_block("&", "color:red"),
                style_block("&:hover", "color:blue"),
                style_block("& span", "margin:0"),
            ]
        );
    }

    #[test]
    fn test_flatten_at_rule_inside_selector() {
        let decls = Declarations::new().nest(
            "@media print",
            Declarations::new()
                .prop("color", "black")
                .nest("&:hover", Declarations::new().prop("color", "gray")),
        );

        let flat = flatten("&", &decls);
        assert_eq!(flat.seed, "@media printcolor:black&:hovercolor:gray");
        assert_eq!(
            flat.blocks,
            vec![Block::Rule {
                rule: "@media print".to_string(),
                style: String::new(),
                children: vec![
                    style_block("&", "color:black"),
                    style_block("&:hover", "color:gray"),
                ],
            }]
        );
    }

    #[test]
    fn test_flatten_top_level_at_rule() {
        let decls = Declarations::new()
            .prop("fontFamily", "Mono")
            .prop("src", "url(mono.woff)");

        let flat = flatten("@font-face", &decls);
        assert_eq!(
            flat.blocks,
            vec![Block::Rule {
                rule: "@font-face".to_string(),
                style: "font-family:Mono;src:url(mono.woff)".to_string(),
                children: Vec::new(),
            }]
        );
    }

    #[test]
    fn test_flatten_without_selector_sorts_steps() {
        let a = Declarations::new()
            .nest("100%", Declarations::new().prop("opacity", 0))
            .nest("0%", Declarations::new().prop("opacity", 1));
        let b = Declarations::new()
            .nest("0%", Declarations::new().prop("opacity", 1))
            .nest("100%", Declarations::new().prop("opacity", 0));

        let flat = flatten("", &a);
        assert_eq!(flat.seed, "0%opacity:1100%opacity:0");
        assert_eq!(flat.seed, flatten("", &b).seed);
        assert_eq!(
            flat.blocks,
            vec![style_block("0%", "opacity:1"), style_block("100%", "opacity:0")]
        );
    }

    #[test]
    fn test_unique_tokens_are_fresh() {
        let decls = Declarations::new().prop("color", "red").unique();
        let mut counter = 0;

        let first = Flattener::new(&mut counter).flatten("&", &decls);
        let second = Flattener::new(&mut counter).flatten("&", &decls);

        assert_eq!(counter, 2);
        assert_eq!(first.seed, "color:redu1");
        assert_eq!(second.seed, "color:redu2");
    }

    #[test]
    fn test_build_merges_shared_styles() {
        let hasher = Hasher::default();
        let decls = Declarations::new()
            .prop("color", "red")
            .nest("&:focus", Declarations::new().prop("color", "red"));

        let flat = flatten("&", &decls);
        let mut cache = Cache::new();
        build(&flat.blocks, &mut cache, &flat.seed, &hasher, &|key: &str| {
            interpolate(key, ".x")
        })
        .unwrap();

        assert_eq!(cache.len(), 1);
        let rendered: String = cache.values().map(|node| node.styles()).collect();
        assert_eq!(rendered, ".x,.x:focus{color:red}");
    }
}

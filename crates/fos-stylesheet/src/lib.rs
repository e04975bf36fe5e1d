//! fOS Stylesheet
//!
//! Content-addressed style registration.
//!
//! Nested declaration objects are flattened into canonical declaration
//! blocks, deduplicated against everything already registered, and kept in
//! reference-counted rule trees that render to CSS text on demand.
//!
//! # Example
//! ```rust
//! use fos_stylesheet::{Declarations, StyleSheet};
//!
//! let mut sheet = StyleSheet::default();
//! let class = sheet
//!     .register_style(
//!         &Declarations::new()
//!             .prop("color", "red")
//!             .nest("&:hover", Declarations::new().prop("color", "blue")),
//!         None,
//!     )
//!     .unwrap();
//!
//! assert_eq!(
//!     sheet.get_styles(),
//!     format!(".{class}{{color:red}}.{class}:hover{{color:blue}}")
//! );
//! ```

mod config;
mod declarations;
mod flatten;
mod hash;
mod nodes;
mod properties;
mod sheet;

pub use config::Config;
pub use declarations::{Declaration, Declarations, IS_UNIQUE, Value};
pub use hash::{Hasher, string_hash};
pub use nodes::{Rule, RuleChild, Selector, Style};
pub use properties::{escape, hyphenate, interpolate, is_unitless};
pub use sheet::StyleSheet;

pub use fos_cache::{Cache, CacheError, Changes, Container, NodeKind};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Create a style sheet with an optional custom hash function
pub fn create(hasher: Option<Hasher>, debug: bool) -> StyleSheet {
    StyleSheet::new(Config {
        debug,
        hasher: hasher.unwrap_or_default(),
    })
}

//! Example: register a few styles and print the sheet

use anyhow::Result;
use fos_stylesheet::{Config, Declarations, StyleSheet};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut sheet = StyleSheet::new(Config::default().with_debug(true));

    let fade = sheet.register_keyframes(
        &serde_json::from_str::<Declarations>(r#"{ "from": { "opacity": 0 }, "to": { "opacity": 1 } }"#)?,
        Some("fade"),
    )?;

    let button = sheet.register_style(
        &Declarations::new()
            .prop("backgroundColor", "rebeccapurple")
            .prop("padding", 8)
            .prop("animation", format!("{fade} 200ms"))
            .nest("&:hover", Declarations::new().prop("opacity", 0.8)),
        Some("button"),
    )?;

    sheet.register_rule("body", &Declarations::new().prop("margin", 0))?;

    println!("button class: {button}");
    println!("{}", sheet.get_styles());
    Ok(())
}

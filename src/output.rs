//! Terminal styling for `catalog-merge` output.
//!
//! Only the `# STRATEGIES:` / `# MERGED:` header of the YAML output is
//! styled: it is dimmed so the merged document stands out. Documents, JSON
//! output and listings are never colored, whatever `--color` says, so piping
//! them into other tools is always safe.
//!
//! With `--color auto`, styling follows the usual conventions: `NO_COLOR`
//! (any value) and `CLICOLOR=0` turn it off, `CLICOLOR_FORCE` turns it on
//! for non-terminals, and `TERM=dumb` turns it off.

use std::env;

use clap::ValueEnum;

/// Value of the `--color` flag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum ColorChoice {
    Always,
    Never,
    #[default]
    Auto,
}

/// Whether header comments are styled.
#[derive(Debug, Clone)]
pub struct OutputConfig {
    pub use_color: bool,
}

impl OutputConfig {
    pub fn new(choice: ColorChoice) -> Self {
        let use_color = match choice {
            ColorChoice::Always => true,
            ColorChoice::Never => false,
            ColorChoice::Auto => stdout_wants_color(),
        };
        Self { use_color }
    }

    /// Output without any styling.
    pub fn plain() -> Self {
        Self { use_color: false }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self::new(ColorChoice::Auto)
    }
}

fn stdout_wants_color() -> bool {
    if env::var_os("NO_COLOR").is_some() {
        return false;
    }
    if env::var("CLICOLOR").is_ok_and(|v| v == "0") {
        return false;
    }
    if env::var("CLICOLOR_FORCE").is_ok_and(|v| v != "0" && !v.is_empty()) {
        return true;
    }
    if env::var("TERM").is_ok_and(|v| v == "dumb") {
        return false;
    }
    console::Term::stdout().features().colors_supported()
}

/// Render one header comment line.
pub fn comment(config: &OutputConfig, text: &str) -> String {
    if config.use_color {
        console::style(text).dim().to_string()
    } else {
        text.to_string()
    }
}

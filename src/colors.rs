//! Terminal color control
//!
//! Follows NO_COLOR (https://no-color.org/) and the CLICOLOR conventions:
//! - `NO_COLOR` set to anything disables colors
//! - `CLICOLOR_FORCE` other than `0` forces colors, even when piped
//! - `CLICOLOR=0` disables colors
//!
//! Otherwise colors are used only when stdout is a terminal.

use colored::control;

/// Configure `colored` for the whole process. Call once, early in main.
pub fn init_colors() {
    let var = |name: &str| std::env::var(name).ok();
    let is_tty = std::io::IsTerminal::is_terminal(&std::io::stdout());

    control::set_override(use_colors(
        var("NO_COLOR").as_deref(),
        var("CLICOLOR").as_deref(),
        var("CLICOLOR_FORCE").as_deref(),
        is_tty,
    ));
}

fn use_colors(
    no_color: Option<&str>,
    clicolor: Option<&str>,
    clicolor_force: Option<&str>,
    is_tty: bool,
) -> bool {
    if no_color.is_some() {
        return false;
    }
    if clicolor_force.is_some_and(|v| v != "0") {
        return true;
    }
    if clicolor == Some("0") {
        return false;
    }
    is_tty
}

// src/exec/interpolate.rs

//! Placeholder interpolation for `cmd` task bodies.
//!
//! `{name}` is replaced when `name` is a known variable; anything else,
//! including the shell's own `${VAR}`, is left untouched.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::{Captures, Regex};

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$?\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("placeholder regex is valid")
});

/// Replace `{var}` placeholders with values from `vars`.
pub fn interpolate(template: &str, vars: &HashMap<&str, String>) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &Captures| {
            let whole = &caps[0];
            if whole.starts_with('$') {
                return whole.to_string();
            }
            match vars.get(&caps[1]) {
                Some(value) => value.clone(),
                None => whole.to_string(),
            }
        })
        .into_owned()
}

/// Quote a single argument for a POSIX shell if it needs it.
pub fn shell_quote(arg: &str) -> String {
    let safe = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | '/' | ':' | '@' | '+' | ','));
    if safe {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', r"'\''"))
    }
}

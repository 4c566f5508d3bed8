// Macros and helpers for human-readable output.

use owo_colors::OwoColorize;

#[macro_export]
macro_rules! ui_ok {
    ($($arg:tt)*) => {{
        println!("✔ {}", format!($($arg)*));
    }};
}

#[macro_export]
macro_rules! ui_warn {
    ($($arg:tt)*) => {{
        use std::io::IsTerminal;
        let show_icon = std::io::stderr().is_terminal() && std::env::var_os("NO_ICONS").is_none();
        if show_icon {
            eprintln!("⚠ {}", format!($($arg)*));
        } else {
            eprintln!("{}", format!($($arg)*));
        }
    }};
}

#[macro_export]
macro_rules! ui_out {
    ($($arg:tt)*) => {{
        println!("{}", format!($($arg)*));
    }};
}

/// Key name, green when colour is on.
pub fn key(s: &str, use_color: bool) -> String {
    if use_color {
        s.green().to_string()
    } else {
        s.to_string()
    }
}

pub fn path(s: &str, use_color: bool) -> String {
    if use_color {
        s.blue().to_string()
    } else {
        s.to_string()
    }
}

/// Issue or record kind tag.
pub fn kind(s: &str, use_color: bool) -> String {
    if !use_color {
        return s.to_string();
    }
    match s {
        "missing" => s.yellow().to_string(),
        "stale" => s.magenta().to_string(),
        "parse" | "encoding" | "extract" | "io" => s.red().to_string(),
        _ => s.cyan().to_string(),
    }
}

pub fn count(n: usize, use_color: bool) -> String {
    if use_color && n > 0 {
        n.yellow().to_string()
    } else {
        n.to_string()
    }
}

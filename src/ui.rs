//! Short colored status lines. Everything the user reads goes through here.

use owo_colors::OwoColorize;

use crate::error::AppError;
use crate::session::Unavailable;

pub fn title(name: &str) {
    println!("{}\n", format!("----- {} -----", name.to_uppercase()).cyan());
}

pub fn success(msg: impl AsRef<str>) {
    println!("{}\n", msg.as_ref().green());
}

pub fn info(msg: impl AsRef<str>) {
    println!("{}\n", msg.as_ref().blue());
}

pub fn notice(msg: impl AsRef<str>) {
    println!("{}", msg.as_ref().cyan());
}

pub fn warning(msg: impl AsRef<str>) {
    println!("{}\n", msg.as_ref().yellow());
}

pub fn failure(msg: impl AsRef<str>) {
    println!("{}\n", msg.as_ref().red());
}

pub fn unavailable(reason: &Unavailable) {
    match reason {
        Unavailable::NoSavedSession => println!("\n{}\n", reason.to_string().yellow()),
        _ => failure(reason.to_string()),
    }
}

/// Top-level error line; never a backtrace.
pub fn error(err: &AppError) {
    eprintln!("{}", format!(" {err} ").white().on_red());
}

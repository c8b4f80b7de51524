//! # noteview
//!
//! Command-line client for NoteView: show which view a note would get, render
//! it to HTML and manage the view list without leaving the terminal.
//!
//! All of the actual work (rule matching, template rendering, filter chains,
//! settings persistence) lives in the `noteviewapp` crate. This binary only
//! parses arguments, finds the vault and the settings file, and prints.
//!
//! ## Vault and Settings
//!
//! The vault is `--vault DIR`, or the current directory. Settings are read
//! from the first of:
//!
//! 1. `--settings FILE`
//! 2. `<vault>/.noteview/settings.json`, if it exists
//! 3. the per-user config directory (`noteview/settings.json`)
//!
//! Commands that change the view list write back to the same file.
//!
//! ## Commands
//!
//! - `noteview match <note>`: name the view that wins for a note
//! - `noteview render <note>`: render a note through its view
//! - `noteview views list|add|remove|move`: manage the ordered view list
//! - `noteview properties`: list the properties rules can target
//! - `noteview chain <value> <chain>`: try a filter chain on a literal value
//!
//! ## Logging
//!
//! Diagnostics go to stderr through `tracing`. The level comes from
//! `NOTEVIEW_LOG` (an `EnvFilter` directive) and defaults to `warn`; `-v`
//! raises it to `debug`.

mod cli;

fn main() {
    if let Err(e) = cli::run() {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

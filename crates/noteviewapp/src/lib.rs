//! # NoteView Architecture
//!
//! NoteView picks a custom display for a note based on its metadata. Users
//! define an ordered list of **views**; each view has a rule tree and an HTML
//! template. The first view whose rules match a note wins, and its template is
//! rendered with values from that note.
//!
//! This crate is **UI-agnostic**. It never writes to a terminal, never touches
//! a DOM and never runs scripts. It takes documents in and hands markup out.
//!
//! ## Data Flow
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  View Selector (views.rs)                                   │
//! │  - Walks views in order, first match wins                   │
//! └─────────────────────────────────────────────────────────────┘
//!                              │ per candidate view
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Rule Matching (rules/)                                     │
//! │  - AND / OR / NOR groups over typed field comparisons       │
//! └─────────────────────────────────────────────────────────────┘
//!                              │ on first match
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Template Rendering (template/)                             │
//! │  - {{ field[index] | chain }} placeholders                  │
//! │  - attribute vs body context, markdown slots, {{content}}   │
//! └─────────────────────────────────────────────────────────────┘
//!                              │ per placeholder
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Filter Chains (filters/)                                   │
//! │  - date, text, markdown, list and calc transforms           │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Host Boundary
//!
//! Everything outside the core is reached through [`host`]: a link resolver
//! and an async markdown renderer. [`vault::FsVault`] and
//! [`markdown::PulldownRenderer`] implement them for notes on disk, and
//! [`api::NoteViewApi`] wires it all together for clients such as the
//! `noteview` CLI.
//!
//! ## Failure Model
//!
//! Resolution misses render as empty strings, a failing filter step keeps its
//! input, an operator that does not fit a value is a non-match and malformed
//! settings fall back field by field. Only I/O (missing notes, unreadable
//! files) surfaces as [`error::NoteViewError`].
//!
//! ## Module Overview
//!
//! - [`value`]: `FilterValue` and property type inference
//! - [`document`]: `DocumentContext`, frontmatter and body parsing
//! - [`rules`]: rule trees and the matcher
//! - [`filters`]: the filter-chain engine and its registry
//! - [`template`]: placeholder scanning, resolution and rendering
//! - [`views`]: view configs, selection and reordering
//! - [`settings`]: persisted settings with per-field defaults
//! - [`properties`]: property discovery for rule editors

pub mod api;
pub mod document;
pub mod error;
pub mod filters;
pub mod host;
pub mod markdown;
pub mod properties;
pub mod rules;
pub mod settings;
pub mod template;
pub mod value;
pub mod vault;
pub mod views;

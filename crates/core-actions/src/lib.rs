//! Multi-character prompt FSM and navigation-action dispatch (spec §4.5),
//! built on top of `core-keymap`'s byte-sequence trie. This crate owns the
//! layer between "a byte arrived" and "here is the navigation command the
//! user asked for" — it never touches the cache, renderer, or line-number
//! index directly; `core-model`'s command loop carries out whatever
//! `NavCommand` this crate hands back.

pub mod action_ids;
pub mod dispatch;
pub mod keymap_defaults;
pub mod nav;
pub mod prompt;
pub mod search;

pub use dispatch::{ActionDispatcher, DispatchEvent};
pub use keymap_defaults::{default_command_table, default_keymap};
pub use nav::{NavCommand, OptName, OptToggleRequest};
pub use prompt::{Prompt, PromptMode, PromptOutcome, SearchModifiers};
pub use search::{CompiledSearch, SearchError};

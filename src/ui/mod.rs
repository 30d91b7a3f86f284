//! Terminal front-end: event loop, trigger surface, and rendering.

pub mod components;
pub mod hotkeys;
pub mod trigger;
pub mod tui;
pub mod view;

//! Terminal rendition of the single-page form.

pub mod command;
pub mod render;
pub mod terminal;

pub use terminal::Terminal;

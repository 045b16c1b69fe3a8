//! Presentation helpers: form markers, input expansion and toast markup.

pub mod expander;
pub mod form;
pub mod toast;

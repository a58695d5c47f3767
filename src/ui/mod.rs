pub mod pages;

/// Script shared by the index and both viewers.
pub const VIEWER_JS: &str = include_str!("static/viewer.js");

pub const STYLE_CSS: &str = include_str!("static/style.css");

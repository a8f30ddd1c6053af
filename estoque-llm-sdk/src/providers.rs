//! Provider name constants

pub const OPENAI: &str = "openai";

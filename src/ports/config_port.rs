//! Configuration access port.
//!
//! Values are read as raw strings so callers can reject what does not parse.
//! `get_bool` falls back to `default` when a key is absent or unrecognized.

pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;
    fn get_bool(&self, section: &str, key: &str, default: bool) -> bool;
}

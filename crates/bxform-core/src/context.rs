use std::collections::HashMap;

/// A value stored in a [`Context`]: either a signed 64-bit integer or a
/// UTF-8 string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContextValue {
    /// An integer-valued entry.
    Int(i64),
    /// A string-valued entry.
    Text(String),
}

impl From<i64> for ContextValue {
    fn from(value: i64) -> Self {
        ContextValue::Int(value)
    }
}

impl From<String> for ContextValue {
    fn from(value: String) -> Self {
        ContextValue::Text(value)
    }
}

impl From<&str> for ContextValue {
    fn from(value: &str) -> Self {
        ContextValue::Text(value.to_owned())
    }
}

/// A string-keyed bag of [`ContextValue`]s shared between the factory,
/// the sequence engine, and individual transforms.
///
/// Transforms read configuration through typed getters that default
/// silently on a missing key or a type mismatch, since a transform
/// should never hard-fail merely because an unrelated caller left a
/// key absent or used it for something else.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Context {
    values: HashMap<String, ContextValue>,
}

impl Context {
    /// An empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `value` under `key`, replacing any prior value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<ContextValue>) {
        self.values.insert(key.into(), value.into());
    }

    /// The raw value stored under `key`, if any.
    pub fn get(&self, key: &str) -> Option<&ContextValue> {
        self.values.get(key)
    }

    /// The integer stored under `key`, or `default` if absent or not an integer.
    pub fn get_int(&self, key: &str, default: i64) -> i64 {
        match self.values.get(key) {
            Some(ContextValue::Int(value)) => *value,
            _ => default,
        }
    }

    /// The string stored under `key`, or `default` if absent or not a string.
    pub fn get_text<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        match self.values.get(key) {
            Some(ContextValue::Text(value)) => value.as_str(),
            _ => default,
        }
    }

    /// Whether any value is stored under `key`.
    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Removes and returns the value stored under `key`, if any.
    pub fn remove(&mut self, key: &str) -> Option<ContextValue> {
        self.values.remove(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_int_returns_default_when_absent() {
        let ctx = Context::new();
        assert_eq!(ctx.get_int("lz", -1), -1);
    }

    #[test]
    fn get_int_returns_default_on_type_mismatch() {
        let mut ctx = Context::new();
        ctx.set("textcodec", "HUFFMAN");
        assert_eq!(ctx.get_int("textcodec", 0), 0);
    }

    #[test]
    fn set_then_get_round_trips() {
        let mut ctx = Context::new();
        ctx.set("lz", 2i64);
        ctx.set("textcodec", "ANS0");
        assert_eq!(ctx.get_int("lz", 0), 2);
        assert_eq!(ctx.get_text("textcodec", ""), "ANS0");
    }

    #[test]
    fn remove_drops_the_key() {
        let mut ctx = Context::new();
        ctx.set("lz", 1i64);
        assert!(ctx.remove("lz").is_some());
        assert!(!ctx.contains("lz"));
    }
}

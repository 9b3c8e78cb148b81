// The one current message that gets written into the fog.

pub const DEFAULT_MESSAGE: &str = "Te quiero";

/// Holds the message the compositor reads at paint time.
/// The stored value is never empty or whitespace-only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageStore {
    message: String,
}

impl MessageStore {
    /// Start with `initial`, or the default phrase if `initial` is blank.
    pub fn new(initial: &str) -> Self {
        let mut store = Self::default();
        store.set(initial);
        store
    }

    pub fn get(&self) -> &str {
        &self.message
    }

    /// Replace the message. Blank input is ignored and the old value stays.
    /// Returns whether the new value was accepted.
    pub fn set(&mut self, message: &str) -> bool {
        if message.trim().is_empty() {
            log::debug!("ignoring blank message");
            return false;
        }
        self.message = message.to_owned();
        true
    }
}

impl Default for MessageStore {
    fn default() -> Self {
        Self { message: DEFAULT_MESSAGE.to_owned() }
    }
}

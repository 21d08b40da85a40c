/// Entries submitted but not yet sealed into a block, in submission order.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PendingEntries {
    entries: Vec<String>,
}

impl PendingEntries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry and return the buffer length afterwards.
    pub fn push(&mut self, entry: impl Into<String>) -> usize {
        self.entries.push(entry.into());
        self.entries.len()
    }

    /// Move every pending entry out, leaving the buffer empty.
    pub fn take(&mut self) -> Vec<String> {
        std::mem::take(&mut self.entries)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_keeps_submission_order() {
        let mut pending = PendingEntries::new();
        assert_eq!(pending.push("a"), 1);
        assert_eq!(pending.push("b"), 2);
        assert_eq!(pending.as_slice(), &["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_take_empties_buffer() {
        let mut pending = PendingEntries::new();
        pending.push("a");
        pending.push(String::new());
        let taken = pending.take();
        assert_eq!(taken, vec!["a".to_string(), String::new()]);
        assert!(pending.is_empty());
        assert_eq!(pending.len(), 0);
    }
}

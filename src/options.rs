use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OptionError {
    #[error("option cannot be empty")]
    Empty,
    #[error("\"{0}\" is already on the list")]
    Duplicate(String),
    #[error("no option at position {}", .0 + 1)]
    OutOfRange(usize),
    /// Structural changes are refused while a spin holds the list
    #[error("options are locked while spinning")]
    Frozen,
}

/// Ordered list of unique, non-empty option labels
#[derive(Debug, Clone, Default)]
pub struct OptionStore {
    labels: Vec<String>,
    frozen: bool,
}

impl OptionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store, silently skipping blank and repeated labels
    pub fn from_labels<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut store = Self::new();
        for label in labels {
            let _ = store.add(label.as_ref());
        }
        store
    }

    /// Appends a trimmed label, returning its index
    pub fn add(&mut self, label: &str) -> Result<usize, OptionError> {
        if self.frozen {
            return Err(OptionError::Frozen);
        }
        let label = label.trim();
        if label.is_empty() {
            return Err(OptionError::Empty);
        }
        if self.labels.iter().any(|l| l == label) {
            return Err(OptionError::Duplicate(label.to_string()));
        }
        self.labels.push(label.to_string());
        Ok(self.labels.len() - 1)
    }

    pub fn remove(&mut self, index: usize) -> Result<String, OptionError> {
        if self.frozen {
            return Err(OptionError::Frozen);
        }
        if index >= self.labels.len() {
            return Err(OptionError::OutOfRange(index));
        }
        Ok(self.labels.remove(index))
    }

    pub fn clear(&mut self) -> Result<(), OptionError> {
        if self.frozen {
            return Err(OptionError::Frozen);
        }
        self.labels.clear();
        Ok(())
    }

    pub fn count(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn label_at(&self, index: usize) -> Option<&str> {
        self.labels.get(index).map(String::as_str)
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    pub fn thaw(&mut self) {
        self.frozen = false;
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }
}

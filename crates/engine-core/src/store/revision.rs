use chrono::Utc;

/// Store revision: a monotonically increasing counter rendered together
/// with the time it was taken, e.g. `2026-10-17T09:30:00Z(42)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Revision {
    counter: u64,
    text: String,
}

impl Revision {
    pub fn starting_at(counter: u64) -> Self {
        Self {
            counter,
            text: Self::render(counter),
        }
    }

    pub fn bump(&mut self) {
        self.counter += 1;
        self.text = Self::render(self.counter);
    }

    pub fn counter(&self) -> u64 {
        self.counter
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    fn render(counter: u64) -> String {
        format!("{}({counter})", Utc::now().format("%Y-%m-%dT%H:%M:%SZ"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bump_changes_text_even_within_one_second() {
        let mut rev = Revision::starting_at(0);
        let before = rev.as_str().to_string();
        rev.bump();
        assert_ne!(rev.as_str(), before);
        assert!(rev.as_str().ends_with("(1)"));
        assert_eq!(rev.counter(), 1);
    }
}

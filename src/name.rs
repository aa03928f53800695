use std::collections::HashMap;

/// Types that expose a comparable name.
pub trait HasName {
    fn get_name(&self) -> &str;
}

/// Generates default names like `Room_0`, `Room_1`, `Speaker_0`.
///
/// Each prefix has its own sequence. The counter is owned by whoever creates
/// entities (e.g. the scene loader), so two loaders never share numbering.
#[derive(Debug, Default, Clone)]
pub struct NameCounter {
    next_index: HashMap<String, usize>,
}

impl NameCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the next name for `prefix` and advances its sequence.
    pub fn next(&mut self, prefix: &str) -> String {
        let idx = self.next_index.entry(prefix.to_string()).or_insert(0);
        let name = format!("{prefix}_{idx}");
        *idx += 1;
        name
    }

    /// Returns `name` if it is set and non-empty, otherwise the next default name.
    pub fn name_or_next(&mut self, name: Option<String>, prefix: &str) -> String {
        match name {
            Some(n) if !n.is_empty() => n,
            _ => self.next(prefix),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counter_sequences_are_per_prefix() {
        let mut names = NameCounter::new();
        assert_eq!(names.next("Room"), "Room_0");
        assert_eq!(names.next("Room"), "Room_1");
        assert_eq!(names.next("Speaker"), "Speaker_0");
        assert_eq!(names.next("Room"), "Room_2");
    }

    #[test]
    fn test_counters_are_independent() {
        let mut a = NameCounter::new();
        let mut b = NameCounter::new();
        assert_eq!(a.next("Mic"), "Mic_0");
        assert_eq!(a.next("Mic"), "Mic_1");
        assert_eq!(b.next("Mic"), "Mic_0");
    }

    #[test]
    fn test_name_or_next() {
        let mut names = NameCounter::new();
        assert_eq!(names.name_or_next(Some("front".to_string()), "Mic"), "front");
        assert_eq!(names.name_or_next(None, "Mic"), "Mic_0");
        assert_eq!(names.name_or_next(Some(String::new()), "Mic"), "Mic_1");
    }
}

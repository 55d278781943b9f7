use std::collections::HashSet;

use crate::graph::Document;

/// Stem of an fx:id with any trailing counter removed (`button12` → `button`)
pub fn fx_id_stem(fx_id: &str) -> &str {
    let stem = fx_id.trim_end_matches(|c: char| c.is_ascii_digit());
    if stem.is_empty() {
        fx_id
    } else {
        stem
    }
}

/// Sequential fx:id generator that never hands out an id already declared
/// in the document it was seeded from
#[derive(Debug, Clone, Default)]
pub struct FxIdGenerator {
    used: HashSet<String>,
}

impl FxIdGenerator {
    /// Seed with every fx:id currently declared in `doc`
    pub fn new(doc: &Document) -> Self {
        Self {
            used: doc.collect_fx_ids().into_keys().collect(),
        }
    }

    /// Next free id built from the stem of `base`: `base1`, `base2`, ...
    pub fn new_id(&mut self, base: &str) -> String {
        let stem = fx_id_stem(base);
        let mut count = 1u32;
        loop {
            let candidate = format!("{}{}", stem, count);
            if self.used.insert(candidate.clone()) {
                return candidate;
            }
            count += 1;
        }
    }

    /// Claim `fx_id` so it is never generated
    pub fn reserve(&mut self, fx_id: impl Into<String>) {
        self.used.insert(fx_id.into());
    }

    pub fn is_used(&self, fx_id: &str) -> bool {
        self.used.contains(fx_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stem() {
        assert_eq!(fx_id_stem("button12"), "button");
        assert_eq!(fx_id_stem("button"), "button");
        assert_eq!(fx_id_stem("42"), "42");
    }

    #[test]
    fn test_sequential_ids_skip_used() {
        let mut doc = Document::new();
        let root = doc.new_instance("Pane");
        doc.set_fx_id(root, Some("pane1".into()));
        doc.init_root(root);

        let mut ids = FxIdGenerator::new(&doc);
        assert!(ids.is_used("pane1"));
        assert_eq!(ids.new_id("pane"), "pane2");
        assert_eq!(ids.new_id("pane1"), "pane3");

        ids.reserve("label1");
        assert_eq!(ids.new_id("label"), "label2");
    }
}

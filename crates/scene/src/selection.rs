use std::collections::BTreeSet;

/// Deterministic, order-irrelevant set of selected location ids.
///
/// Ordering contract:
/// - Iteration yields ids in ascending lexicographic order.
/// - Equality ignores insertion order, so two selections built from the same ids compare equal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSet {
    ids: BTreeSet<String>,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    /// Optional-id form used for geometries that may lack an id.
    pub fn contains_opt(&self, id: Option<&str>) -> bool {
        id.is_some_and(|id| self.contains(id))
    }

    /// True when any of `ids` is selected.
    pub fn intersects<S: AsRef<str>>(&self, ids: &[S]) -> bool {
        ids.iter().any(|id| self.contains(id.as_ref()))
    }

    /// Set difference: `self \ other`.
    pub fn diff(&self, other: &Self) -> Self {
        Self {
            ids: self.ids.difference(&other.ids).cloned().collect(),
        }
    }

    /// Iterates selected ids in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ {
        self.ids.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for SelectionSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            ids: iter.into_iter().map(Into::into).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::SelectionSet;

    #[test]
    fn contains_and_len() {
        let empty = SelectionSet::new();
        assert!(empty.is_empty());
        assert!(!empty.contains("fr"));

        let s: SelectionSet = ["fr", "fr"].into_iter().collect();
        assert!(s.contains("fr"));
        assert!(s.contains_opt(Some("fr")));
        assert!(!s.contains_opt(None));
        assert_eq!(s.len(), 1);
    }

    #[test]
    fn equality_ignores_insertion_order() {
        let a: SelectionSet = ["b", "a", "c"].into_iter().collect();
        let b: SelectionSet = ["c", "b", "a"].into_iter().collect();
        assert_eq!(a, b);
        assert_eq!(a.iter().collect::<Vec<_>>(), vec!["a", "b", "c"]);
    }

    #[test]
    fn intersects_and_diff() {
        let a: SelectionSet = ["1", "2"].into_iter().collect();
        let b: SelectionSet = ["2", "3"].into_iter().collect();
        assert!(a.intersects(&["9", "2"]));
        assert!(!a.intersects::<&str>(&[]));
        assert_eq!(a.diff(&b).iter().collect::<Vec<_>>(), vec!["1"]);
    }
}

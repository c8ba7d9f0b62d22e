//! Adjacency predicates used to filter mesh (border) geometry.
//!
//! A mesh predicate is called with the two geometries on either side of a border
//! arc. For an outer boundary (an arc used by a single geometry) both arguments are
//! the same object, which is detected by reference identity.

use std::ptr;
use std::sync::{Arc, LazyLock};

use formats::topology::TopoObject;
use scene::selection::SelectionSet;

use crate::layer::MeshFilter;

pub type BorderPredicate = Arc<dyn Fn(&TopoObject, &TopoObject) -> bool + Send + Sync>;

/// True for a border between two different geometries where either side lists the
/// other in its disputes.
pub fn disputed_border(a: &TopoObject, b: &TopoObject) -> bool {
    !ptr::eq(a, b) && (a.is_disputed_with(b) || b.is_disputed_with(a))
}

/// True for outer boundaries and for borders that are not disputed.
pub fn non_disputed_border(a: &TopoObject, b: &TopoObject) -> bool {
    ptr::eq(a, b) || !disputed_border(a, b)
}

/// Borders that outline the selection.
///
/// A border is included when either side is selected or claims (disputes) a selected
/// geometry. It is then excluded when the two sides are in dispute with each other and
/// exactly one of them is selected: the selected geometry's claim covers the other
/// side, so the edge between them is not part of the selection outline.
pub fn selected_border_matches(selection: &SelectionSet, a: &TopoObject, b: &TopoObject) -> bool {
    let a_selected = selection.contains_opt(a.id.as_deref());
    let b_selected = selection.contains_opt(b.id.as_deref());
    let touches_selection = a_selected
        || b_selected
        || selection.intersects(&a.disputes)
        || selection.intersects(&b.disputes);
    let one_sided_dispute = a_selected != b_selected && disputed_border(a, b);
    touches_selection && !one_sided_dispute
}

/// Builds the selection-bound predicate. The selection is captured by value.
pub fn selected_border(selection: Arc<SelectionSet>) -> BorderPredicate {
    Arc::new(move |a: &TopoObject, b: &TopoObject| {
        selected_border_matches(&selection, a, b)
    })
}

static DISPUTED: LazyLock<BorderPredicate> =
    LazyLock::new(|| -> BorderPredicate { Arc::new(disputed_border) });
static NON_DISPUTED: LazyLock<BorderPredicate> =
    LazyLock::new(|| -> BorderPredicate { Arc::new(non_disputed_border) });

/// Owns the predicate closures for each [`MeshFilter`].
///
/// The stateless predicates are shared singletons. The selection predicate is rebuilt
/// only when the selection actually changes; `revision` counts those rebuilds.
pub struct PredicateEngine {
    selection: Arc<SelectionSet>,
    selected: BorderPredicate,
    revision: u64,
}

impl std::fmt::Debug for PredicateEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PredicateEngine")
            .field("selection", &self.selection)
            .field("revision", &self.revision)
            .finish_non_exhaustive()
    }
}

impl Default for PredicateEngine {
    fn default() -> Self {
        Self::new(SelectionSet::new())
    }
}

impl PredicateEngine {
    pub fn new(selection: SelectionSet) -> Self {
        let selection = Arc::new(selection);
        Self {
            selected: selected_border(selection.clone()),
            selection,
            revision: 0,
        }
    }

    pub fn selection(&self) -> &SelectionSet {
        &self.selection
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Replaces the selection. Returns `true` when the predicate was rebuilt.
    pub fn set_selection(&mut self, selection: SelectionSet) -> bool {
        if *self.selection == selection {
            return false;
        }
        self.selection = Arc::new(selection);
        self.selected = selected_border(self.selection.clone());
        self.revision += 1;
        true
    }

    /// Predicate for `filter`; `None` means accept every border.
    pub fn predicate(&self, filter: MeshFilter) -> Option<BorderPredicate> {
        match filter {
            MeshFilter::All => None,
            MeshFilter::Disputed => Some(DISPUTED.clone()),
            MeshFilter::NonDisputed => Some(NON_DISPUTED.clone()),
            MeshFilter::SelectedBorders => Some(self.selected.clone()),
        }
    }
}

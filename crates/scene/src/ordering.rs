/// Render order for sibling paths: unselected items keep their relative order and
/// selected items are moved to the end (so they paint on top), also in relative order.
///
/// Returns indices into `items`.
pub fn selected_last<T>(items: &[T], is_selected: impl Fn(&T) -> bool) -> Vec<usize> {
    let mut order: Vec<usize> = (0..items.len()).collect();
    // `sort_by_key` is stable; `false < true` puts unselected first.
    order.sort_by_key(|&i| is_selected(&items[i]));
    order
}

//! Column packer - arrival-order height balancing.
//!
//! Each item goes to whichever column is currently shortest, lowest index on
//! ties. Items are never sorted by size first: placement stays stable as
//! items are appended, at the cost of not minimizing the tallest column.

use std::num::NonZeroUsize;

use crate::cancel::{CancelToken, Cancelled};

use super::Column;

/// Inputs that shape a column packing pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnParams {
    /// Number of columns to balance across.
    pub count: NonZeroUsize,
    /// Vertical spacing between items in a column.
    pub item_spacing: f32,
}

/// Distribute `items` across `params.count` columns.
///
/// The result always holds exactly `count` columns unless `items` is empty,
/// in which case it holds none.
pub fn pack_columns<K: Clone>(
    items: &[K],
    mut extent_of: impl FnMut(&K) -> f32,
    params: ColumnParams,
    cancel: &CancelToken,
) -> Result<Vec<Column<K>>, Cancelled> {
    if items.is_empty() {
        return Ok(Vec::new());
    }

    let mut columns: Vec<Column<K>> = (0..params.count.get()).map(|_| Column::new()).collect();

    for key in items {
        cancel.check()?;

        let extent = extent_of(key);
        let target = shortest_column(&columns);
        columns[target].push(key.clone(), extent, params.item_spacing);
    }

    tracing::trace!(items = items.len(), columns = columns.len(), "packed columns");
    Ok(columns)
}

/// Index of the shortest column; the first one wins ties.
fn shortest_column<K>(columns: &[Column<K>]) -> usize {
    let mut index = 0;
    let mut best = columns.first().map_or(0.0, |column| column.extent);
    for (i, column) in columns.iter().enumerate().skip(1) {
        if column.extent < best {
            best = column.extent;
            index = i;
        }
    }
    index
}

#[cfg(test)]
mod tests {
    use super::*;

    fn heights(values: &[f32]) -> impl FnMut(&usize) -> f32 + '_ {
        move |index: &usize| values[*index]
    }

    fn params(count: usize, item_spacing: f32) -> ColumnParams {
        ColumnParams {
            count: NonZeroUsize::new(count).unwrap(),
            item_spacing,
        }
    }

    #[test]
    fn test_balances_into_shortest_column() {
        let values = [30.0, 10.0, 10.0, 10.0];
        let columns = pack_columns(&[0, 1, 2, 3], heights(&values), params(2, 5.0), &CancelToken::new()).unwrap();

        assert_eq!(columns[0].items, vec![0]);
        assert_eq!(columns[0].extent, 30.0);
        assert_eq!(columns[1].items, vec![1, 2, 3]);
        assert_eq!(columns[1].extent, 40.0);
    }

    #[test]
    fn test_ties_go_to_lowest_index() {
        let values = [10.0, 10.0, 10.0, 10.0];
        let columns = pack_columns(&[0, 1, 2, 3], heights(&values), params(3, 0.0), &CancelToken::new()).unwrap();

        assert_eq!(columns[0].items, vec![0, 3]);
        assert_eq!(columns[1].items, vec![1]);
        assert_eq!(columns[2].items, vec![2]);
    }

    #[test]
    fn test_arrival_order_is_preserved() {
        // A size-sorted balancer would put the 50 first.
        let values = [5.0, 5.0, 50.0];
        let columns = pack_columns(&[0, 1, 2], heights(&values), params(2, 0.0), &CancelToken::new()).unwrap();

        assert_eq!(columns[0].items, vec![0, 2]);
        assert_eq!(columns[1].items, vec![1]);
    }

    #[test]
    fn test_more_columns_than_items() {
        let values = [12.0];
        let columns = pack_columns(&[0], heights(&values), params(4, 2.0), &CancelToken::new()).unwrap();

        assert_eq!(columns.len(), 4);
        assert_eq!(columns[0].extent, 12.0);
        assert!(columns[1..].iter().all(Column::is_empty));
    }

    #[test]
    fn test_empty_items() {
        let values: [f32; 0] = [];
        let columns = pack_columns(&[], heights(&values), params(2, 0.0), &CancelToken::new()).unwrap();
        assert!(columns.is_empty());
    }

    #[test]
    fn test_cancelled_before_first_item() {
        let values = [1.0, 2.0];
        let token = CancelToken::new();
        token.cancel();
        assert_eq!(
            pack_columns(&[0, 1], heights(&values), params(2, 0.0), &token),
            Err(Cancelled)
        );
    }

    #[test]
    fn test_every_item_placed_once() {
        let values: Vec<f32> = (0..97).map(|i| ((i * 29) % 41) as f32 + 3.0).collect();
        let items: Vec<usize> = (0..values.len()).collect();
        let columns = pack_columns(&items, heights(&values), params(5, 4.0), &CancelToken::new()).unwrap();

        let mut placed: Vec<usize> = columns.iter().flat_map(|column| column.items.iter().copied()).collect();
        placed.sort_unstable();
        assert_eq!(placed, items);
    }
}

//! Property-based tests for the row pipeline using proptest.

use std::collections::HashSet;

use proptest::prelude::*;
use rowdeck::{
    is_visible, paginate, sort_rows, Column, Dir, Edit, EditMerger, FilterContext, FilterSet,
    PageSize, Row, RowKey, SelectionTracker, SortSpec,
};

// ============================================================================
// Test helpers
// ============================================================================

fn columns() -> Vec<Column> {
    vec![
        Column::new("name").filterable(),
        Column::new("qty").kind("number").filterable(),
        Column::new("active").kind("boolean").filterable(),
    ]
}

// Rows keyed 0..n with optional name and quantity.
fn rows_strategy() -> impl Strategy<Value = Vec<Row>> {
    prop::collection::vec(
        (
            prop::option::of("[a-c]{1,2}"),
            prop::option::of(-50i64..50),
            any::<bool>(),
            any::<bool>(),
        ),
        0..60,
    )
    .prop_map(|cells| {
        cells
            .into_iter()
            .enumerate()
            .map(|(i, (name, qty, active, selected))| {
                let mut row = Row::new().with("id", i as i64).with("active", active);
                if let Some(name) = name {
                    row.set("name", name);
                }
                if let Some(qty) = qty {
                    row.set("qty", qty);
                }
                row.selected(selected)
            })
            .collect()
    })
}

fn dir_strategy() -> impl Strategy<Value = Dir> {
    prop_oneof![Just(Dir::Asc), Just(Dir::Desc)]
}

fn visible_keys(rows: &[Row], columns: &[Column], filters: &FilterSet) -> HashSet<RowKey> {
    let ctx = FilterContext {
        search_text: "",
        columns,
        filters,
        show_only_selected: false,
    };
    rows.iter()
        .filter(|row| is_visible(row, &ctx))
        .filter_map(|row| row.key("id"))
        .collect()
}

// ============================================================================
// Property tests
// ============================================================================

proptest! {
    /// Pages cover the input exactly; only the last page may be short.
    #[test]
    fn pages_partition_the_input(len in 0usize..200, size in 1usize..30) {
        let items: Vec<usize> = (0..len).collect();
        let pages = paginate(&items, PageSize::new(size).unwrap());

        prop_assert!(!pages.is_empty());
        prop_assert_eq!(pages.iter().map(Vec::len).sum::<usize>(), len);
        for page in &pages[..pages.len() - 1] {
            prop_assert_eq!(page.len(), size);
        }
        prop_assert!(pages[pages.len() - 1].len() <= size);
        let flat: Vec<usize> = pages.into_iter().flatten().collect();
        prop_assert_eq!(flat, items);
    }

    /// Sorting twice by the same spec changes nothing.
    #[test]
    fn sort_is_idempotent(mut rows in rows_strategy(), dir in dir_strategy()) {
        let spec = SortSpec::new("qty", dir);
        sort_rows(&mut rows, &spec);
        let once = rows.clone();
        sort_rows(&mut rows, &spec);
        prop_assert_eq!(rows, once);
    }

    /// Missing values lead an ascending sort and trail a descending one.
    #[test]
    fn missing_values_placement(mut rows in rows_strategy(), dir in dir_strategy()) {
        sort_rows(&mut rows, &SortSpec::new("name", dir));
        let missing: Vec<bool> = rows.iter().map(|r| r.get("name").is_none()).collect();
        let boundary = missing.iter().filter(|m| **m).count();
        let expected: Vec<bool> = match dir {
            Dir::Asc => (0..missing.len()).map(|i| i < boundary).collect(),
            Dir::Desc => (0..missing.len()).map(|i| i >= missing.len() - boundary).collect(),
        };
        prop_assert_eq!(missing, expected);
    }

    /// Adding a filter never makes a hidden row visible.
    #[test]
    fn filters_are_monotonic(
        rows in rows_strategy(),
        min in -60i64..60,
        name in "[a-c]{1,2}",
        toggle in any::<bool>(),
    ) {
        let columns = columns();
        let mut filters = FilterSet::from_columns(&columns);
        let mut before = visible_keys(&rows, &columns, &filters);

        filters.set_numeric_range("qty", Some(min as f64), None).unwrap();
        let after_numeric = visible_keys(&rows, &columns, &filters);
        prop_assert!(after_numeric.is_subset(&before));
        before = after_numeric;

        filters.set_boolean("active", toggle).unwrap();
        let after_boolean = visible_keys(&rows, &columns, &filters);
        prop_assert!(after_boolean.is_subset(&before));
        before = after_boolean;

        filters.set_text("name", Some(name)).unwrap();
        let after_text = visible_keys(&rows, &columns, &filters);
        prop_assert!(after_text.is_subset(&before));
    }

    /// A selection event on one page leaves every other row's flag alone.
    #[test]
    fn off_page_selection_is_untouched(
        mut rows in rows_strategy(),
        size in 1usize..15,
        page_pick in any::<prop::sample::Index>(),
        picks in prop::collection::vec(any::<bool>(), 15),
    ) {
        let indices: Vec<usize> = (0..rows.len()).collect();
        let pages = paginate(&indices, PageSize::new(size).unwrap());
        let page = &pages[page_pick.index(pages.len())];
        let event: HashSet<RowKey> = page
            .iter()
            .zip(&picks)
            .filter(|(_, pick)| **pick)
            .filter_map(|(&i, _)| rows[i].key("id"))
            .collect();

        let before: Vec<bool> = rows.iter().map(Row::is_selected).collect();
        let tracker = SelectionTracker::new("id", usize::MAX);
        tracker.apply_event(&mut rows, page, &event).unwrap();

        for (i, row) in rows.iter().enumerate() {
            if page.contains(&i) {
                let expected = row.key("id").is_some_and(|k| event.contains(&k));
                prop_assert_eq!(row.is_selected(), expected);
            } else {
                prop_assert_eq!(row.is_selected(), before[i]);
            }
        }
    }

    /// Applying the same edits twice equals applying them once.
    #[test]
    fn edits_are_idempotent(
        mut rows in rows_strategy(),
        targets in prop::collection::vec((0i64..80, -100i64..100), 0..10),
    ) {
        let edits: Vec<Edit> = targets
            .into_iter()
            .map(|(key, qty)| Edit::new(key).set("qty", qty))
            .collect();
        let merger = EditMerger::new("id");

        merger.apply(&mut rows, &edits);
        let once = rows.clone();
        merger.apply(&mut rows, &edits);
        prop_assert_eq!(rows, once);
    }

    /// Edits for keys not in the row set change nothing.
    #[test]
    fn unknown_keys_are_ignored(mut rows in rows_strategy(), qty in any::<i64>()) {
        let before = rows.clone();
        let updated = EditMerger::new("id").apply(&mut rows, &[Edit::new(1_000i64).set("qty", qty)]);
        prop_assert!(updated.is_empty());
        prop_assert_eq!(rows, before);
    }
}

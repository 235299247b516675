//! Which time-series lines are drawn.

use std::collections::HashMap;

/// Per-column visibility flags.
///
/// Keys always mirror the column list it was built from; unknown columns are
/// ignored rather than stored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeriesVisibility {
    columns: Vec<String>,
    visible: HashMap<String, bool>,
}

impl SeriesVisibility {
    /// Every column starts visible.
    pub fn new(columns: &[String]) -> Self {
        let mut store = Self::default();
        store.rebuild(columns);
        store
    }

    /// Replace the column set, making every column visible again.
    pub fn rebuild(&mut self, columns: &[String]) {
        self.columns = columns.to_vec();
        self.visible = columns.iter().map(|c| (c.clone(), true)).collect();
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn set_visible(&mut self, column: &str, visible: bool) {
        match self.visible.get_mut(column) {
            Some(flag) => *flag = visible,
            None => log::debug!("Ignoring visibility change for unknown column '{}'", column),
        }
    }

    /// Flip one column; returns the new flag, or `None` for unknown columns.
    pub fn toggle(&mut self, column: &str) -> Option<bool> {
        let flag = self.visible.get_mut(column)?;
        *flag = !*flag;
        Some(*flag)
    }

    pub fn show_all(&mut self) {
        self.visible.values_mut().for_each(|v| *v = true);
    }

    pub fn hide_all(&mut self) {
        self.visible.values_mut().for_each(|v| *v = false);
    }

    pub fn is_visible(&self, column: &str) -> bool {
        self.visible.get(column).copied().unwrap_or(false)
    }

    /// Visible columns in column order.
    pub fn visible_columns(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|c| self.is_visible(c))
            .map(String::as_str)
            .collect()
    }

    pub fn all_visible(&self) -> bool {
        self.visible.values().all(|v| *v)
    }

    pub fn none_visible(&self) -> bool {
        !self.visible.values().any(|v| *v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_new_store_is_all_visible() {
        let store = SeriesVisibility::new(&cols(&["temp", "humidity"]));
        assert!(store.all_visible());
        assert!(!store.none_visible());
        assert_eq!(store.visible_columns(), vec!["temp", "humidity"]);
    }

    #[test]
    fn test_set_and_toggle() {
        let mut store = SeriesVisibility::new(&cols(&["a", "b", "c"]));
        store.set_visible("b", false);
        assert_eq!(store.visible_columns(), vec!["a", "c"]);

        assert_eq!(store.toggle("b"), Some(true));
        assert_eq!(store.toggle("a"), Some(false));
        assert_eq!(store.visible_columns(), vec!["b", "c"]);
    }

    #[test]
    fn test_unknown_columns_are_not_stored() {
        let mut store = SeriesVisibility::new(&cols(&["a"]));
        store.set_visible("ghost", true);
        assert_eq!(store.toggle("ghost"), None);
        assert!(!store.is_visible("ghost"));
        assert_eq!(store.visible_columns(), vec!["a"]);
    }

    #[test]
    fn test_show_and_hide_all() {
        let mut store = SeriesVisibility::new(&cols(&["a", "b"]));
        store.hide_all();
        assert!(store.none_visible());
        assert!(store.visible_columns().is_empty());
        store.show_all();
        assert!(store.all_visible());
    }

    #[test]
    fn test_rebuild_on_column_change() {
        let mut store = SeriesVisibility::new(&cols(&["a", "b"]));
        store.hide_all();

        store.rebuild(&cols(&["x", "a"]));
        assert!(store.all_visible());
        assert!(!store.is_visible("b"));
        assert_eq!(store.visible_columns(), vec!["x", "a"]);
    }
}

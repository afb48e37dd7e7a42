//! Collection management for dependency entries.
//!
//! This module provides the `DependencyEntries` wrapper used by the CLI to
//! apply measured sizes, order entries, print the summary table and run the
//! interactive selection.

use anyhow::Result;
use colored::Colorize;
use humansize::{BINARY, format_size};
use inquire::MultiSelect;

use super::{DependencyEntry, DependencyKind};
use crate::sizer::SizeTable;

/// Number of rows the interactive selection shows at once.
const SELECTION_PAGE_SIZE: usize = 20;

/// An ordered collection of dependency entries.
#[derive(Clone, Debug, Default)]
pub struct DependencyEntries(Vec<DependencyEntry>);

impl From<Vec<DependencyEntry>> for DependencyEntries {
    fn from(entries: Vec<DependencyEntry>) -> Self {
        Self(entries)
    }
}

impl IntoIterator for DependencyEntries {
    type Item = DependencyEntry;
    type IntoIter = std::vec::IntoIter<DependencyEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl DependencyEntries {
    /// Copy measured sizes into the entries.
    ///
    /// Paths missing from `sizes` could not be measured and are treated as
    /// zero bytes.
    pub fn apply_sizes(&mut self, sizes: &SizeTable) {
        for entry in &mut self.0 {
            entry.size = sizes.get(&entry.path).copied().unwrap_or(0);
        }
    }

    /// Order entries largest first. Entries of equal size keep scan order.
    pub fn sort_by_size_desc(&mut self) {
        self.0.sort_by(|a, b| b.size.cmp(&a.size));
    }

    /// Total size of all entries, in bytes.
    #[must_use]
    pub fn total_size(&self) -> u64 {
        self.0.iter().map(|e| e.size).sum()
    }

    /// Number of entries in the collection.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the collection is empty.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Borrow the entries as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[DependencyEntry] {
        &self.0
    }

    /// Count and total size of the entries of `kind`.
    #[must_use]
    pub fn kind_totals(&self, kind: DependencyKind) -> (usize, u64) {
        self.0
            .iter()
            .filter(|e| e.kind == kind)
            .fold((0, 0), |(count, size), e| (count + 1, size + e.size))
    }

    /// Header and rows of the listing table, uncoloured.
    ///
    /// Columns are `#`, type, relative path and size; the path column is as
    /// wide as the longest path so that sizes line up.
    #[must_use]
    pub fn table_lines(&self) -> (String, Vec<String>) {
        const PATH_HEADING: &str = "Path (relative)";

        let paths: Vec<String> = self
            .0
            .iter()
            .map(|e| e.relative_path.display().to_string())
            .collect();
        let width = paths
            .iter()
            .map(|p| p.chars().count())
            .chain([PATH_HEADING.len()])
            .max()
            .unwrap_or_default();

        let header = format!("  {:>3}  {:<12}  {PATH_HEADING:<width$}  Size", "#", "Type");
        let rows = self
            .0
            .iter()
            .zip(paths)
            .enumerate()
            .map(|(i, (entry, path))| {
                format!(
                    "  {:>3}  {:<12}  {path:<width$}  {}",
                    i + 1,
                    entry.kind.to_string(),
                    format_size(entry.size, BINARY)
                )
            })
            .collect();

        (header, rows)
    }

    /// Print the entries as a numbered table followed by per-kind totals.
    ///
    /// ```text
    ///     #  Type          Path (relative)   Size
    ///     1  node_modules  web/node_modules  412.07 MiB
    ///     2  vendor        api/vendor        38.50 MiB
    ///
    ///   📦 1 node_modules directory (412.07 MiB)
    ///   🐘 1 vendor directory (38.50 MiB)
    ///   💾 Total reclaimable space: 450.57 MiB
    /// ```
    pub fn print_summary(&self) {
        let (header, rows) = self.table_lines();

        println!("{}", header.bold());
        for row in rows {
            println!("{row}");
        }

        println!();
        for kind in DependencyKind::ALL {
            let (count, size) = self.kind_totals(kind);
            if count > 0 {
                let noun = if count == 1 { "directory" } else { "directories" };
                println!(
                    "  {} {} {kind} {noun} ({})",
                    icon_for_kind(kind),
                    count.to_string().bright_white(),
                    format_size(size, BINARY).bright_white()
                );
            }
        }

        println!(
            "  💾 Total reclaimable space: {}",
            format_size(self.total_size(), BINARY).bright_green().bold()
        );
    }

    /// Let the user pick which entries to delete.
    ///
    /// Nothing is preselected. Returns the chosen entries in table order.
    ///
    /// # Errors
    ///
    /// Fails if the terminal is not interactive or the user cancels the
    /// prompt (Ctrl+C / Esc).
    pub fn interactive_selection(&self) -> Result<Vec<DependencyEntry>> {
        let items: Vec<String> = self
            .0
            .iter()
            .map(|e| format!("{e} • {}", format_size(e.size, BINARY)))
            .collect();

        let selections = MultiSelect::new("Select folders to delete", items)
            .with_page_size(SELECTION_PAGE_SIZE)
            .with_help_message("Space = toggle, → = all, ← = none, Enter = confirm, type to filter")
            .raw_prompt()?;

        Ok(selections
            .into_iter()
            .filter_map(|option| self.0.get(option.index).cloned())
            .collect())
    }
}

/// Return the icon for a dependency kind.
const fn icon_for_kind(kind: DependencyKind) -> &'static str {
    match kind {
        DependencyKind::NodeModules => "📦",
        DependencyKind::Vendor => "🐘",
    }
}

//! Terminal output for the CLI

pub mod icons;
pub mod output;
pub mod table;
pub mod theme;

pub use icons::Icons;
pub use output::{dim, error, header, info, section, short_hash, success, summary_row, warn};
pub use table::{revisions_table, table_counts_table};
pub use theme::{theme, Theme};

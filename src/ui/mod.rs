pub mod icons;
pub mod output;
pub mod progress;
pub mod report;
pub mod table;
pub mod theme;

pub use icons::Icons;
pub use output::{bullet, dim, entity, header, info, pattern, section, status, success, warn};
pub use progress::Spinner;
pub use table::{similar_table, stats_table};
pub use theme::{theme, Theme};

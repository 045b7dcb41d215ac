pub mod icons;
pub mod output;
pub mod table;
pub mod theme;

pub use icons::Icons;
pub use output::{added, failure, header, info, model_view, success, user_view, warn};
pub use table::{stats_table, TableBuilder};
pub use theme::{theme, Theme};

//! Co-benefit dashboard core: parse a semicolon-delimited dataset of
//! per-area co-benefit scores, index it once, and answer the aggregate
//! queries the dashboard views are drawn from.

pub mod aggregate;
pub mod config;
pub mod error;
pub mod index;
pub mod loader;
pub mod output;
pub mod reports;
pub mod session;
pub mod types;
pub mod util;

pub use error::{DashboardError, Result};
pub use index::{DatasetIndex, IndexMeta};
pub use session::{LoadOutcome, Session};
pub use types::{AreaRecord, Benefit, BenefitValues, ChartType, RawRow, Region, SelectionState};

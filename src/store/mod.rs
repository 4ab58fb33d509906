//! Client-side state: the space repository and the pure engines deriving
//! filtered, grouped and selected views from it.

pub mod calculation;
pub mod filter;
pub mod grouping;
pub mod repository;
pub mod selection;

pub use calculation::{CalculationCache, ComplianceSummary};
pub use filter::{filter_spaces, Range, SpaceFilters};
pub use grouping::{group_spaces, GroupStats, GroupingConfig, SpaceGroup};
pub use repository::{PropertyUpdate, SpaceRepository};
pub use selection::Selection;

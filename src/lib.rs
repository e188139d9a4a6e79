pub mod actions;
pub mod catalog;
pub mod character;
pub mod derived;
pub mod error;
pub mod logging;
pub mod normalize;
pub mod priority;
pub mod save;
pub mod settings;
pub mod validate;

// Re-export commonly used items for easier access
pub use actions::{Action, Persist, apply, compute_next_state};
pub use catalog::Catalog;
pub use character::{Awakening, CharacterState, Contact};
pub use derived::{DashboardData, MetricsCache, PoolSummary, compute_dashboard};
pub use error::{CatalogError, ChargenError};
pub use normalize::normalize;
pub use priority::{Category, Letter, Priorities, PriorityTable, ResolvedPools, resolve};
pub use save::DraftStore;
pub use settings::Settings;
pub use validate::{Issue, Section, Severity, ValidationResult, validate};

// Service layer - page assembly over the time-index projections and the
// dual-write mutation coordinator.

pub mod mutations;
pub mod pages;

pub use mutations::MutationService;
pub use pages::{PageRequest, PageService, SortOrder};

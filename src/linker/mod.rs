pub mod entity_linker;
pub mod save_advisor;

pub use entity_linker::{AmbiguousName, Candidate, EntityLinker, FailedName, LinkMode, LinkReport, LinkedContact};
pub use save_advisor::{SaveAdvisor, SaveChoice, SaveTarget};

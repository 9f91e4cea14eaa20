// Application layer - Use case interactors

pub mod container;
pub mod session;
pub mod split_interactor;

// Re-export interactors
pub use session::EditSession;
pub use split_interactor::{InspectReport, SplitInteractor};

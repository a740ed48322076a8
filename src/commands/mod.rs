// ABOUTME: Command implementations for each pipeline phase
// ABOUTME: Exports the export, analyze, restore, and reset commands

pub mod analyze;
pub mod export;
pub mod reset;
pub mod restore;

pub use analyze::analyze;
pub use export::export;
pub use reset::reset;
pub use restore::restore;

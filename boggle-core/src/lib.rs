pub mod board;
pub mod dictionary;
pub mod phase;
pub mod scoring;

// Re-export main components
pub use board::*;
pub use dictionary::*;
pub use phase::*;
pub use scoring::*;

// Models module - game payloads, ship state and route description

pub mod ship;
pub mod market;
pub mod navigation;
pub mod transaction;
pub mod responses;
pub mod route;

// Re-export all models for easier imports
pub use ship::*;
pub use market::*;
pub use navigation::*;
pub use transaction::*;
pub use responses::*;
pub use route::*;

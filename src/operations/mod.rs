// Operations module - ship controller and the trading control loop

pub mod ship;
pub mod navigation;
pub mod market;
pub mod trading;
pub mod fuel;
pub mod route;

pub use ship::Ship;
pub use trading::clamp_to_space;
pub use fuel::{partial_units, relief};
pub use route::RouteDriver;

pub mod analysis;
pub mod engine;
pub mod simulation;

#[cfg(feature = "sensitivity")]
pub mod sensitivity;

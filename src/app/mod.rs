//! Host application wiring

pub mod state;

pub use state::AppState;

// Presenter module: HTML dashboard and its HTTP surface.

pub mod error;
pub mod html;
pub mod server;

pub use server::{serve, AppState};

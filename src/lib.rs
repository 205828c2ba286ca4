pub mod android_jni;
pub mod camera;
pub mod config;
pub mod error;
pub mod geo;
pub mod gpx;
pub mod instruction;
pub mod matcher;
pub mod navigator;
pub mod ports;
pub mod route;
pub mod session;

#[cfg(test)]
mod testing;

pub use error::NavError;
pub use navigator::{Navigator, SessionMode};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

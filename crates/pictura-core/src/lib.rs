pub mod compress;
pub mod config;
pub mod consts;
pub mod crop;
pub mod error;
pub mod format;
pub mod intake;
pub mod library;

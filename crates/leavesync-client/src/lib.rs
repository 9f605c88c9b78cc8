pub mod client;
pub mod detail;
pub mod directory;
pub mod error;
pub mod list;
pub mod parse;
pub mod token;

pub use client::UpstreamClient;
pub use error::ClientError;
pub use list::{split_window, Window};

#[allow(clippy::module_inception)]
pub mod api;
pub mod chat;
pub mod document;
pub mod file;
pub mod message;
pub mod photo_size;
pub mod update;
pub mod user;

pub use api::*;
pub use chat::*;
pub use document::*;
pub use file::*;
pub use message::*;
pub use photo_size::*;
pub use update::*;
pub use user::*;

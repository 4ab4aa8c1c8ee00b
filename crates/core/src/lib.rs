// crates/core/src/lib.rs
pub mod error;
pub mod store;
pub mod timeline;
pub mod transcript;
pub mod validate;

pub use error::*;
pub use store::*;
pub use timeline::*;
pub use transcript::*;
pub use validate::*;

//! Retrieval methods: independent strategies for locating a profile picture.

mod chain;
pub mod extract;
mod graph_api;
mod mirrors;
mod profile_page;
mod public_api;
mod traits;

pub use chain::MethodChain;
pub use graph_api::GraphApiMethod;
pub use mirrors::{default_mirrors, MirrorMethod};
pub use profile_page::ProfilePageMethod;
pub use public_api::PublicApiMethod;
pub use traits::{Metadata, RetrievalMethod, Retrieved};

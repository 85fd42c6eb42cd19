//! Review-invocation seam: provider capability, provider selection and the
//! cache-fronted reviewer.

pub mod provider;
pub mod session;

pub use provider::{ProviderSettings, ReviewProvider};
pub use session::{CachedReviewer, ReviewEvent};

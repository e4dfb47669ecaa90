//! Pod sources.
//!
//! Sources answer "which build of this pod is this?": a checksum for
//! released pods, a VCS revision for local dev pods.

pub mod identity;
pub mod revision;

pub use identity::IdentityResolver;
pub use revision::{GitRevisions, RevisionProvider};

mod error;
mod policy;

pub use error::LifecycleError;
pub use policy::*;

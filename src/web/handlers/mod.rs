pub mod application_handlers;
pub mod identity_handlers;
pub mod job_handlers;
pub mod system_handlers;

pub use application_handlers::*;
pub use identity_handlers::*;
pub use job_handlers::*;
pub use system_handlers::*;

pub mod response;
pub mod streamfactory;

// Re-exports for convenience
pub use response::HttpResponse;
pub use streamfactory::{HttpStream, HttpStreamFactory};

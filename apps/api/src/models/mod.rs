pub mod content;
pub mod newsletter;
pub mod source;
pub mod trend;
pub mod user;

pub mod api;

pub use api::ReviztoClient;

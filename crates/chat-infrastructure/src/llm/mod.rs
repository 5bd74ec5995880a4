//! Model runtime clients

mod local_backend;

pub use local_backend::LocalModelBackend;

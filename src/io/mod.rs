pub mod library_io;
pub mod lock;
pub mod state;
pub mod store;

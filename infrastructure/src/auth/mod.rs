//! Local sign-in persistence

mod session_file;

pub use session_file::FileSessionStore;

//! Remembering the signed-in user between runs

use std::io;

pub trait SessionStore: Send + Sync {
    fn load_user_id(&self) -> io::Result<Option<String>>;

    fn save_user_id(&self, user_id: &str) -> io::Result<()>;

    fn clear(&self) -> io::Result<()>;
}

pub mod id;
pub mod slug;
pub mod unicode;

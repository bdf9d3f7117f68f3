pub mod check;
pub mod drop_ops;
pub mod folder_ops;
pub mod search;
pub mod sort;
pub mod template_ops;
pub mod transfer;
pub mod tree;

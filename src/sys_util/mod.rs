//! Small standalone helpers: directory preparation, random tokens, slugs.

pub mod dir;
pub mod random;
pub mod slug;

pub use dir::ensure_dir;
pub use random::random_string;
pub use slug::slugify;

pub(crate) mod error;
pub(crate) mod id;
pub(crate) mod identity;
pub(crate) mod pagination;
pub(crate) mod post;
pub(crate) mod user;

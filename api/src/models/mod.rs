pub mod comment;
pub mod karma;
pub mod like;
pub mod post;
pub mod user;

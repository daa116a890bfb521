pub mod comment;
pub mod gunsmith;
pub mod marker;
pub mod post;
pub mod profile;
pub mod response;

pub mod recipe;
pub mod tag;
pub mod user;

pub use recipe::Recipe;
pub use tag::Tag;
pub use user::User;

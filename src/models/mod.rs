pub mod bid;
pub mod document;
pub mod product;
pub mod results;
pub mod user;

pub use bid::*;
pub use document::*;
pub use product::*;
pub use results::*;
pub use user::*;

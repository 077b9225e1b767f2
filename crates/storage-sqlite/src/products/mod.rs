pub mod model;
pub mod repository;

pub use model::{NewProductDB, ProductDB};
pub use repository::ProductRepository;

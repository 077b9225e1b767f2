pub mod model;
pub mod repository;

pub use model::{InvoiceDB, InvoiceItemDB, NewInvoiceDB, NewInvoiceItemDB};
pub use repository::InvoiceRepository;

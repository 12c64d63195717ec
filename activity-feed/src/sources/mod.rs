pub mod memory;
pub mod postgres;

pub use memory::MemorySource;
pub use postgres::PgContentSource;

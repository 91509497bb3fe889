// SQLite persistence — schema, row models, and query functions.

pub mod models;
pub mod queries;
pub mod schema;

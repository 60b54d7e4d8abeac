pub mod converter;
pub mod database;
pub mod image_input;
pub mod memory;
pub mod prompts;
pub mod providers;

pub use converter::Converter;
pub use database::{ConversionStore, MongoDb, HISTORY_LIMIT};
pub use memory::InMemoryStore;

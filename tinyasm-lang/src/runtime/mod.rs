pub mod executor;
pub mod machine;
pub mod memory;
pub mod parser;
pub mod registers;
pub mod render;
pub mod snapshot;

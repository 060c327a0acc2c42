pub mod mem0;

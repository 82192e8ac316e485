//! Wire protocol types for upstream endpoints

pub mod openai;

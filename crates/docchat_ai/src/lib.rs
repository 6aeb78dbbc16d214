pub mod answer;
pub mod corpus;
pub mod embeddings;
pub mod extract;
pub mod llm;
pub mod ollama;
pub mod retrieve;

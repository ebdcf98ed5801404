pub mod config;
pub mod credentials;
pub mod error;
pub mod http;
pub mod invocation;
pub mod llm;
pub mod output;
pub mod resolver;
pub mod schema;
pub mod tools;

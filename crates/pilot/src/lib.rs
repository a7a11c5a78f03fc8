pub mod agent;
pub mod conversation;
pub mod errors;
pub mod models;
pub mod providers;
pub mod tools;

#[cfg(test)]
mod testing;

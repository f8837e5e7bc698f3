pub mod money;
pub mod scheduler;
pub mod time;

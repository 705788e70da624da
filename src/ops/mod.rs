pub mod check;
pub mod sanitize;
pub mod search;
pub mod todo_ops;

pub mod app_data;
pub mod project;
pub mod settings;
pub mod todo;

pub use app_data::*;
pub use project::*;
pub use settings::*;
pub use todo::*;

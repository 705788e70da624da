pub mod cli;
pub mod convert;
pub mod io;
pub mod model;
pub mod ops;
pub mod util;

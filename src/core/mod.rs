pub mod error;
pub mod types;
pub mod value;

pub use error::{CrudError, Result};
pub use types::{PARAM_SIGIL, Params, Row};
pub use value::{FromValue, IntoValue, Value};

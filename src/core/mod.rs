//! Core types shared by every layer: the error taxonomy and the scalar
//! value model.

pub mod error;
pub mod value;

pub use error::{EngineError, EngineResult};
pub use value::{FieldType, ScalarValue, DATE_TIME_FORMAT};

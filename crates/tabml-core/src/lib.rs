pub mod tensor;
pub mod shape;
pub mod dtype;
pub mod error;
pub mod schema;
pub mod row;
pub mod table;

pub use tensor::Tensor;
pub use shape::Shape;
pub use dtype::Float;
pub use error::{MlError, MlResult};
pub use schema::{Field, FieldKind, Schema, LABEL_COLUMN};
pub use row::{Row, Value};
pub use table::{Column, Table};

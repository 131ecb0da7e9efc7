pub mod coerce;
pub mod error;
pub mod target;
pub mod value;

pub use coerce::coerce;
pub use error::{ErrorKind, ValueError};
pub use target::{FieldType, RecordType, ScalarKind, ShapeCategory, TargetType, Wrapper};
pub use value::{ArrayItems, ArrayValue, DynamicValue, Finish, MapBuilder, MapValue, RecordBuilder, RecordValue};

//! Avro codec: decodes Avro datums and object-container files and
//! materializes them into target types.

mod codec;
mod infer;

pub use codec::{AvroCodec, AvroCodecConfig, load_target};
pub use infer::infer_target;

//! Protocol buffer message types, maintained by hand
//!
//! Two families: the TensorBoard event-file protos (`tensorboard`) decoded
//! from TFRecord frames, and the metadata-service messages (`aiplatform`)
//! carried on the write RPCs. Field numbers for the event-file protos match
//! the TensorFlow definitions so real event files decode unchanged.

pub mod aiplatform;
pub mod tensorboard;

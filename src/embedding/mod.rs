// Text encoders: the embedding capability injected into the pipeline.

pub mod download;
pub mod hashing;
pub mod onnx;
pub mod traits;

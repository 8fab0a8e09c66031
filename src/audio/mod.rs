pub mod capture;
pub mod chunk;
pub mod features;
pub mod window;

pub use capture::{
    list_input_devices, ChunkRead, ChunkStream, DeviceError, DeviceInfo, LevelMeter, MicSource,
};
pub use chunk::{AudioArtifact, AudioChunk};
pub use features::{AudioFeatures, FeatureExtractor};
pub use window::{normalize, smooth, WindowBuffer};

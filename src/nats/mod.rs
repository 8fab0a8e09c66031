//! NATS-backed implementations of the external STT/LLM capabilities.

mod client;
mod messages;

pub use client::NatsClient;
pub use messages::{
    EnhanceReply, EnhanceRequest, RecognitionStatus, StyleReply, StyleRequest, SummaryReply,
    SummaryRequest, TranscribeReply, TranscribeRequest,
};

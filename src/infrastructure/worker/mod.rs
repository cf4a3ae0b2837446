//! Background Workers

mod generation_worker;

pub use generation_worker::GenerationWorker;

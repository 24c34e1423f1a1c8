//! 수집 파이프라인을 위한 도메인 모델.

mod classifier;
mod instrument;
mod record;

pub use classifier::*;
pub use instrument::*;
pub use record::*;

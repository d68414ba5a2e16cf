//! Library side of the exam engine CLI: document loading and logging.

pub mod documents;
pub mod logging;

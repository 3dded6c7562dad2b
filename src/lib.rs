pub mod badge;
pub mod classifier;
pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod page;
pub mod scheduler;
pub mod storage;

pub use classifier::{Classifier, Detection};
pub use config::Config;
pub use error::{Error, Result};
pub use page::{Page, PageSource, ReadyState};
pub use scheduler::{PageEvent, Scheduler};

pub mod classifier;
pub mod command;
pub mod config;
pub mod descriptor;
pub mod detector;
pub mod dispatch;
pub mod error;
pub mod pipeline;
pub mod stream;
pub mod templates;
pub mod transport;
pub mod types;

#[cfg(test)]
mod fixtures;

pub use classifier::{GestureClassifier, Label};
pub use command::{CommandMachine, CommandState, Outcome, Stage};
pub use descriptor::GestureDescriptor;
pub use error::{GestureError, GestureResult};
pub use stream::FrameExtractor;
pub use templates::TemplateLibrary;

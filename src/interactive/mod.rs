//! Interactive visualization module for walking through the fog in real time

mod viewer;

pub use viewer::{InteractiveViewer, ViewerConfig};

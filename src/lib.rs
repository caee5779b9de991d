pub mod autolink;
pub mod config;
pub mod dispatcher;
pub mod preview;
pub mod recognizer;
pub mod render;
pub mod segmenter;
pub mod truncate;

// Re-export main types for convenient access
pub use autolink::Autolink;
pub use config::{Configuration, HashtagPlatform};
pub use dispatcher::{Activation, Dispatcher, LinkAction, Opened, Platform, PressHandler, ProbeFuture};
pub use recognizer::{BuiltinRecognizer, EnabledKinds, EntityKind, Match, RecognizeOptions, Recognizer, RewriteEngine};
pub use render::{LinkNode, LinkRenderer, Node};
pub use segmenter::{reconstruct, segment, segment_rewritten, Part};
pub use truncate::truncate_smart;

pub mod backend;
pub mod builtins;
pub mod capabilities;
pub mod completion;
pub mod diagnostics;
pub mod documents;
pub mod hover;
pub mod lg;
pub mod line_index;
pub mod resource;
pub mod scheduler;

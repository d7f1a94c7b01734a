pub mod completion;
pub mod db;

pub use completion::OpenAiCompletionAdapter;
pub use db::DbAdapter;

// 文件树数据模型

pub mod path;
pub mod types;

pub use path::{is_dot_entry, join_path};
pub use types::{EntryKind, RemoteEntry};

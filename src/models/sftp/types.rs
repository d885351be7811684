// 文件树基础数据类型

/// 条目类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EntryKind {
    /// 普通文件
    #[default]
    File,
    /// 目录
    Directory,
}

impl EntryKind {
    /// 是否是目录
    pub fn is_dir(&self) -> bool {
        *self == EntryKind::Directory
    }
}

/// 目录列表中的一个条目
///
/// 只在同步过程中临时存在，列出后立即消费。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteEntry {
    /// 文件名（不含路径）
    pub name: String,
    /// 条目类型
    pub kind: EntryKind,
}

impl RemoteEntry {
    pub fn new(name: impl Into<String>, kind: EntryKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    pub fn file(name: impl Into<String>) -> Self {
        Self::new(name, EntryKind::File)
    }

    pub fn dir(name: impl Into<String>) -> Self {
        Self::new(name, EntryKind::Directory)
    }

    /// 是否是目录
    pub fn is_dir(&self) -> bool {
        self.kind.is_dir()
    }
}

// 文件系统能力接口与本地实现
//
// 同步引擎只通过 FileSystem 访问源和目标，
// 本地文件系统与远程 SFTP 通道各实现一份。

use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;

use crate::models::{EntryKind, RemoteEntry};

/// 同步引擎使用的文件系统操作
pub trait FileSystem {
    type Reader: Read;
    type Writer: Write;

    /// 日志中用来区分本地/远程的名称
    fn name(&self) -> &str;

    /// 获取路径类型（跟随符号链接）
    fn stat(&self, path: &str) -> io::Result<EntryKind>;

    /// 列出目录的直接子条目，顺序由底层决定
    fn read_dir(&self, path: &str) -> io::Result<Vec<RemoteEntry>>;

    /// 以只读方式打开文件
    fn open_read(&self, path: &str) -> io::Result<Self::Reader>;

    /// 创建文件，已存在时截断
    fn create(&self, path: &str) -> io::Result<Self::Writer>;

    /// 写完后关闭文件，关闭失败（远程 CLOSE 被拒绝等）作为错误返回
    fn finish(&self, writer: Self::Writer) -> io::Result<()> {
        drop(writer);
        Ok(())
    }

    /// 创建单级目录；目录已存在时返回 `ErrorKind::AlreadyExists`
    fn mkdir(&self, path: &str) -> io::Result<()>;

    /// 把条目名拼接到目录路径后
    fn join(&self, base: &str, name: &str) -> String;
}

/// 本地文件系统
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalFs;

impl FileSystem for LocalFs {
    type Reader = fs::File;
    type Writer = fs::File;

    fn name(&self) -> &str {
        "local"
    }

    fn stat(&self, path: &str) -> io::Result<EntryKind> {
        Ok(kind_of(&fs::metadata(path)?))
    }

    fn read_dir(&self, path: &str) -> io::Result<Vec<RemoteEntry>> {
        let mut entries = Vec::new();
        for entry in fs::read_dir(path)? {
            let entry = entry?;
            let name = entry.file_name().into_string().map_err(|name| {
                io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("file name is not valid UTF-8: {:?}", name),
                )
            })?;
            // 跟随符号链接判断类型
            let metadata = fs::metadata(entry.path())?;
            entries.push(RemoteEntry::new(name, kind_of(&metadata)));
        }
        Ok(entries)
    }

    fn open_read(&self, path: &str) -> io::Result<fs::File> {
        fs::File::open(path)
    }

    fn create(&self, path: &str) -> io::Result<fs::File> {
        fs::File::create(path)
    }

    fn mkdir(&self, path: &str) -> io::Result<()> {
        fs::create_dir(path)
    }

    fn join(&self, base: &str, name: &str) -> String {
        Path::new(base).join(name).to_string_lossy().into_owned()
    }
}

fn kind_of(metadata: &fs::Metadata) -> EntryKind {
    if metadata.is_dir() {
        EntryKind::Directory
    } else {
        EntryKind::File
    }
}

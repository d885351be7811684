// 目录同步引擎
//
// 上传和下载共用同一套递归逻辑，只是源和目标的 FileSystem 互换：
// - 源是文件：直接复制到目标路径
// - 源是目录：逐层列出条目，目标路径 = 目标目录 + 条目名，目录先创建再递归
// 第一个错误即中止，已完成的文件保留，不回滚。

use std::io::{self, Write};

use tracing::debug;

use super::fs::FileSystem;
use crate::error::{SyncError, TransferStage};
use crate::models::{EntryKind, ExistingDirPolicy, TransferSettings};

/// 同步选项
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncOptions {
    /// 递归中创建子目录遇到"已存在"时的处理方式
    pub existing_dirs: ExistingDirPolicy,
}

impl From<&TransferSettings> for SyncOptions {
    fn from(settings: &TransferSettings) -> Self {
        Self {
            existing_dirs: settings.existing_dirs,
        }
    }
}

/// 同步完成后的统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncSummary {
    /// 复制的文件数
    pub files: usize,
    /// 新建的目录数
    pub dirs: usize,
    /// 复制的字节数
    pub bytes: u64,
}

/// 把 `src` 上的 `src_path` 镜像到 `dst` 上的 `dst_path`
///
/// 源为目录时，目标根目录不存在则创建；根目录已存在总是允许，
/// `existing_dirs` 只作用于递归中创建的子目录。
pub fn mirror<S, D>(
    src: &S,
    src_path: &str,
    dst: &D,
    dst_path: &str,
    options: &SyncOptions,
) -> Result<SyncSummary, SyncError>
where
    S: FileSystem,
    D: FileSystem,
{
    let kind = src.stat(src_path).map_err(|source| SyncError::Stat {
        side: src.name().to_string(),
        path: src_path.to_string(),
        source,
    })?;

    let mut walker = Walker {
        src,
        dst,
        options,
        summary: SyncSummary::default(),
    };

    match kind {
        EntryKind::File => walker.copy_file(src_path, dst_path)?,
        EntryKind::Directory => {
            walker.make_dir(dst_path, ExistingDirPolicy::Tolerate)?;
            walker.mirror_dir(src_path, dst_path)?;
        }
    }

    Ok(walker.summary)
}

struct Walker<'a, S, D> {
    src: &'a S,
    dst: &'a D,
    options: &'a SyncOptions,
    summary: SyncSummary,
}

impl<S: FileSystem, D: FileSystem> Walker<'_, S, D> {
    fn mirror_dir(&mut self, from: &str, to: &str) -> Result<(), SyncError> {
        let entries = self.src.read_dir(from).map_err(|source| SyncError::ReadDir {
            side: self.src.name().to_string(),
            path: from.to_string(),
            source,
        })?;

        for entry in entries {
            let src_child = self.src.join(from, &entry.name);
            let dst_child = self.dst.join(to, &entry.name);

            if entry.is_dir() {
                self.make_dir(&dst_child, self.options.existing_dirs)?;
                self.mirror_dir(&src_child, &dst_child)?;
            } else {
                self.copy_file(&src_child, &dst_child)?;
            }
        }
        Ok(())
    }

    fn make_dir(&mut self, path: &str, policy: ExistingDirPolicy) -> Result<(), SyncError> {
        match self.dst.mkdir(path) {
            Ok(()) => {
                debug!("[Sync] Created {} directory {}", self.dst.name(), path);
                self.summary.dirs += 1;
                Ok(())
            }
            Err(e)
                if e.kind() == io::ErrorKind::AlreadyExists
                    && policy == ExistingDirPolicy::Tolerate =>
            {
                Ok(())
            }
            Err(source) => Err(SyncError::Mkdir {
                side: self.dst.name().to_string(),
                path: path.to_string(),
                source,
            }),
        }
    }

    fn copy_file(&mut self, from: &str, to: &str) -> Result<(), SyncError> {
        let fail = |stage, source| SyncError::Transfer {
            from: from.to_string(),
            to: to.to_string(),
            stage,
            source,
        };

        let mut reader = self
            .src
            .open_read(from)
            .map_err(|e| fail(TransferStage::OpenSource, e))?;
        let mut writer = self
            .dst
            .create(to)
            .map_err(|e| fail(TransferStage::CreateDestination, e))?;

        let bytes = io::copy(&mut reader, &mut writer)
            .and_then(|n| writer.flush().map(|_| n))
            .map_err(|e| fail(TransferStage::Copy, e))?;
        // 目标文件关闭成功才算传输完成
        self.dst
            .finish(writer)
            .map_err(|e| fail(TransferStage::Copy, e))?;

        debug!(
            "[Sync] Copied {} ({}) -> {} ({}), {} bytes",
            from,
            self.src.name(),
            to,
            self.dst.name(),
            bytes
        );
        self.summary.files += 1;
        self.summary.bytes += bytes;
        Ok(())
    }
}

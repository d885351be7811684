// 本地文件辅助操作

use std::fs::{self, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::Path;

/// 在文件末尾追加内容，文件不存在时创建
pub fn append_to_file(path: impl AsRef<Path>, content: &str) -> io::Result<()> {
    let mut file = OpenOptions::new()
        .append(true)
        .create(true)
        .open(path)?;
    file.write_all(content.as_bytes())
}

/// 覆盖写文件
pub fn write_file(path: impl AsRef<Path>, content: &str) -> io::Result<()> {
    fs::write(path, content)
}

/// 删除文件或整个目录；路径不存在视为成功
pub fn remove_path(path: impl AsRef<Path>) -> io::Result<()> {
    let path = path.as_ref();
    let metadata = match fs::symlink_metadata(path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e),
    };

    if metadata.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    }
}

/// 文件中是否有任意一行包含任意一个字段
pub fn contains_any(path: impl AsRef<Path>, fields: &[&str]) -> io::Result<bool> {
    let reader = BufReader::new(fs::File::open(path)?);
    for line in reader.lines() {
        let line = line?;
        if fields.iter().any(|field| line.contains(field)) {
            return Ok(true);
        }
    }
    Ok(false)
}

// 测试用内存传输层：模拟一台远程主机的 SSH 执行与 SFTP 文件系统

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fs;
use std::io::{self, Cursor, Read, Write};
use std::path::Path;
use std::rc::Rc;

use sshdeploy::models::sftp::join_path;
use sshdeploy::ssh::{
    CommandOutput, ConnectError, Connection, ConnectionStage, ExecContext, SshConfig, SshError,
    Transport,
};
use sshdeploy::{EntryKind, FileSystem, RemoteEntry};

/// 远程主机状态
#[derive(Default)]
pub struct RemoteState {
    pub files: BTreeMap<String, Vec<u8>>,
    pub dirs: BTreeSet<String>,

    /// 拨号次数
    pub dials: usize,
    /// 会话关闭次数
    pub session_closes: usize,
    pub exec_opened: usize,
    pub exec_closed: usize,
    pub commands: Vec<String>,
    pub responses: HashMap<String, CommandOutput>,

    /// 按调用顺序记录的 create 路径（包括失败的）
    pub create_attempts: Vec<String>,
    /// 当前打开的文件句柄数
    pub open_handles: usize,

    /// 当前连接已在传输层断开
    pub connection_lost: bool,
    /// 下一次打开执行通道时连接断开
    pub drop_on_next_exec: bool,

    pub fail_dial: bool,
    pub fail_sftp: bool,
    pub fail_create: HashSet<String>,
    pub fail_open: HashSet<String>,
    /// 关闭（finish）时失败的写入路径
    pub fail_finish: HashSet<String>,
}

/// 共享同一份状态的内存主机，同时作为 Transport 使用
#[derive(Clone)]
pub struct MemoryRemote(pub Rc<RefCell<RemoteState>>);

impl MemoryRemote {
    pub fn new() -> Self {
        let mut state = RemoteState::default();
        state.dirs.insert("/".to_string());
        Self(Rc::new(RefCell::new(state)))
    }

    pub fn state(&self) -> std::cell::RefMut<'_, RemoteState> {
        self.0.borrow_mut()
    }

    /// 创建目录及其所有父目录
    pub fn add_dir(&self, path: &str) {
        let mut state = self.state();
        let mut current = String::new();
        for part in path.split('/').filter(|p| !p.is_empty()) {
            current = join_path(if current.is_empty() { "/" } else { &current }, part);
            state.dirs.insert(current.clone());
        }
    }

    /// 写入文件，自动创建父目录
    pub fn put_file(&self, path: &str, content: &[u8]) {
        self.add_dir(parent_of(path));
        self.state().files.insert(path.to_string(), content.to_vec());
    }

    pub fn file(&self, path: &str) -> Option<Vec<u8>> {
        self.0.borrow().files.get(path).cloned()
    }

    pub fn has_dir(&self, path: &str) -> bool {
        self.0.borrow().dirs.contains(path)
    }

    /// 为命令设置返回值
    pub fn respond(&self, command: &str, output: &str, exit_status: Option<u32>) {
        self.state().responses.insert(
            command.to_string(),
            CommandOutput {
                output: output.as_bytes().to_vec(),
                exit_status,
            },
        );
    }

    /// root 下所有文件，键为相对路径
    pub fn tree(&self, root: &str) -> BTreeMap<String, Vec<u8>> {
        let prefix = format!("{}/", root.trim_end_matches('/'));
        self.0
            .borrow()
            .files
            .iter()
            .filter_map(|(path, content)| {
                path.strip_prefix(&prefix)
                    .map(|rel| (rel.to_string(), content.clone()))
            })
            .collect()
    }

    /// 作为文件系统直接使用（不经过 Client）
    pub fn fs(&self) -> MemoryFs {
        MemoryFs(self.clone())
    }
}

fn parent_of(path: &str) -> &str {
    match path.rfind('/') {
        Some(0) | None => "/",
        Some(pos) => &path[..pos],
    }
}

impl Transport for MemoryRemote {
    type Conn = MemoryConnection;

    fn dial(&self, config: &SshConfig) -> Result<MemoryConnection, ConnectError> {
        let mut state = self.state();
        if state.fail_dial {
            return Err(ConnectError::new(
                config.address(),
                ConnectionStage::Authenticating,
                SshError::Auth("Password authentication failed".to_string()),
            ));
        }
        state.dials += 1;
        state.connection_lost = false;
        Ok(MemoryConnection(self.clone()))
    }
}

pub struct MemoryConnection(MemoryRemote);

impl Connection for MemoryConnection {
    type Exec = MemoryExec;
    type Files = MemoryFs;

    fn open_exec(&self) -> Result<MemoryExec, SshError> {
        let mut state = self.0.state();
        if state.drop_on_next_exec {
            state.drop_on_next_exec = false;
            state.connection_lost = true;
        }
        if state.connection_lost {
            return Err(SshError::Disconnected("connection reset by peer".to_string()));
        }
        state.exec_opened += 1;
        drop(state);
        Ok(MemoryExec {
            remote: self.0.clone(),
            closed: false,
        })
    }

    fn open_file_channel(&self) -> Result<MemoryFs, SshError> {
        if self.0.state().fail_sftp {
            return Err(SshError::Sftp("subsystem request failed".to_string()));
        }
        Ok(MemoryFs(self.0.clone()))
    }

    fn close(&mut self) -> Result<(), SshError> {
        self.0.state().session_closes += 1;
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.0.state().connection_lost
    }
}

pub struct MemoryExec {
    remote: MemoryRemote,
    closed: bool,
}

impl ExecContext for MemoryExec {
    fn combined_output(&mut self, command: &str) -> Result<CommandOutput, SshError> {
        let mut state = self.remote.state();
        state.commands.push(command.to_string());
        Ok(state
            .responses
            .get(command)
            .cloned()
            .unwrap_or(CommandOutput {
                output: Vec::new(),
                exit_status: Some(0),
            }))
    }

    fn close(&mut self) -> Result<(), SshError> {
        if !self.closed {
            self.closed = true;
            self.remote.state().exec_closed += 1;
        }
        Ok(())
    }
}

impl Drop for MemoryExec {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

/// 内存文件系统，列表按名称排序返回
pub struct MemoryFs(MemoryRemote);

impl FileSystem for MemoryFs {
    type Reader = MemoryReader;
    type Writer = MemoryWriter;

    fn name(&self) -> &str {
        "memory"
    }

    fn stat(&self, path: &str) -> io::Result<EntryKind> {
        let state = self.0 .0.borrow();
        if state.dirs.contains(path) {
            Ok(EntryKind::Directory)
        } else if state.files.contains_key(path) {
            Ok(EntryKind::File)
        } else {
            Err(not_found(path))
        }
    }

    fn read_dir(&self, path: &str) -> io::Result<Vec<RemoteEntry>> {
        let state = self.0 .0.borrow();
        if !state.dirs.contains(path) {
            return Err(not_found(path));
        }

        let mut children = BTreeMap::new();
        for dir in state.dirs.iter().filter(|d| d.as_str() != "/") {
            if parent_of(dir) == path {
                children.insert(base_name(dir), EntryKind::Directory);
            }
        }
        for file in state.files.keys() {
            if parent_of(file) == path {
                children.insert(base_name(file), EntryKind::File);
            }
        }
        Ok(children
            .into_iter()
            .map(|(name, kind)| RemoteEntry::new(name, kind))
            .collect())
    }

    fn open_read(&self, path: &str) -> io::Result<MemoryReader> {
        let mut state = self.0.state();
        if state.fail_open.contains(path) {
            return Err(io::Error::new(io::ErrorKind::PermissionDenied, "open denied"));
        }
        let content = state.files.get(path).cloned().ok_or_else(|| not_found(path))?;
        state.open_handles += 1;
        Ok(MemoryReader {
            inner: Cursor::new(content),
            remote: self.0.clone(),
        })
    }

    fn create(&self, path: &str) -> io::Result<MemoryWriter> {
        let mut state = self.0.state();
        state.create_attempts.push(path.to_string());
        if state.fail_create.contains(path) {
            return Err(io::Error::new(io::ErrorKind::PermissionDenied, "create denied"));
        }
        if !state.dirs.contains(parent_of(path)) {
            return Err(not_found(parent_of(path)));
        }
        // 截断
        state.files.insert(path.to_string(), Vec::new());
        state.open_handles += 1;
        Ok(MemoryWriter {
            path: path.to_string(),
            remote: self.0.clone(),
        })
    }

    fn finish(&self, writer: MemoryWriter) -> io::Result<()> {
        let failed = self.0.state().fail_finish.contains(&writer.path);
        drop(writer);
        if failed {
            return Err(io::Error::new(io::ErrorKind::Other, "close rejected"));
        }
        Ok(())
    }

    fn mkdir(&self, path: &str) -> io::Result<()> {
        let mut state = self.0.state();
        if state.dirs.contains(path) {
            return Err(io::Error::new(io::ErrorKind::AlreadyExists, "exists"));
        }
        if state.files.contains_key(path) || !state.dirs.contains(parent_of(path)) {
            return Err(io::Error::new(io::ErrorKind::Other, "Failure"));
        }
        state.dirs.insert(path.to_string());
        Ok(())
    }

    fn join(&self, base: &str, name: &str) -> String {
        join_path(base, name)
    }
}

fn base_name(path: &str) -> String {
    path.rsplit('/').next().unwrap_or(path).to_string()
}

fn not_found(path: &str) -> io::Error {
    io::Error::new(io::ErrorKind::NotFound, format!("no such file: {}", path))
}

pub struct MemoryReader {
    inner: Cursor<Vec<u8>>,
    remote: MemoryRemote,
}

impl Read for MemoryReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

impl Drop for MemoryReader {
    fn drop(&mut self) {
        self.remote.state().open_handles -= 1;
    }
}

pub struct MemoryWriter {
    path: String,
    remote: MemoryRemote,
}

impl Write for MemoryWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.remote
            .state()
            .files
            .entry(self.path.clone())
            .or_default()
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for MemoryWriter {
    fn drop(&mut self) {
        self.remote.state().open_handles -= 1;
    }
}

pub fn test_config() -> SshConfig {
    SshConfig::password("deploy", "secret", "10.0.0.1", 22)
}

/// 在目录下按 (相对路径, 内容) 创建文件
pub fn write_local_tree(root: &Path, files: &[(&str, &str)]) {
    for (rel, content) in files {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }
}

/// 读取本地目录下所有文件，键为 '/' 分隔的相对路径
pub fn local_tree(root: &Path) -> BTreeMap<String, Vec<u8>> {
    fn walk(root: &Path, dir: &Path, out: &mut BTreeMap<String, Vec<u8>>) {
        for entry in fs::read_dir(dir).unwrap() {
            let path = entry.unwrap().path();
            if path.is_dir() {
                walk(root, &path, out);
            } else {
                let rel = path.strip_prefix(root).unwrap().to_string_lossy().replace('\\', "/");
                out.insert(rel, fs::read(&path).unwrap());
            }
        }
    }

    let mut out = BTreeMap::new();
    walk(root, root, &mut out);
    out
}

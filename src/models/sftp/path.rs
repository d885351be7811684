// 远程路径工具函数（远程路径始终使用 '/' 分隔）

/// 连接路径
pub fn join_path(base: &str, name: &str) -> String {
    if base == "/" {
        format!("/{}", name)
    } else if base.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", base.trim_end_matches('/'), name)
    }
}

/// 是否是目录列表中需要跳过的条目
pub fn is_dot_entry(name: &str) -> bool {
    name == "." || name == ".."
}

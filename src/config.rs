//! 应用配置：从 config/default.toml 与环境变量加载
//!
//! 加载顺序：先读 TOML 文件，再用环境变量 `SCOUT__*` 覆盖（双下划线表示嵌套，如 `SCOUT__MCP__URL=http://...`）。

use std::path::PathBuf;

use serde::Deserialize;

use crate::workflow::FailurePolicy;

/// 应用配置根（对应 config/default.toml 的顶层）
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub mcp: McpSection,
    pub llm: LlmSection,
    pub graph: GraphSection,
    pub extract: ExtractSection,
}

/// [mcp] 段：工具服务端点与握手身份
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct McpSection {
    pub url: String,
    pub protocol_version: String,
    pub client_name: String,
    pub client_version: String,
    /// 单次请求超时（秒），未设置则不限时
    pub request_timeout_secs: Option<u64>,
}

impl Default for McpSection {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:8001/mitre-mcp".to_string(),
            protocol_version: crate::mcp::session::DEFAULT_PROTOCOL_VERSION.to_string(),
            client_name: "simple-client".to_string(),
            client_version: "0.1.0".to_string(),
            request_timeout_secs: None,
        }
    }
}

/// [llm] 段：OpenAI 兼容端点；API Key 未配置时读 OPENAI_API_KEY
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmSection {
    pub model: String,
    pub base_url: Option<String>,
    pub api_key: Option<String>,
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            base_url: None,
            api_key: None,
        }
    }
}

/// [graph] 段：编排流水线
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GraphSection {
    /// 工作单元（战术名）；为空时使用空规划器
    pub tactics: Vec<String>,
    /// 每个单元调用的远端工具
    pub tool: String,
    pub include_description: bool,
    /// 每个单元最多贡献的条目数
    pub per_unit_limit: usize,
    pub separator: String,
    pub failure_policy: FailurePolicy,
}

impl Default for GraphSection {
    fn default() -> Self {
        Self {
            tactics: Vec::new(),
            tool: "get_techniques_by_tactic".to_string(),
            include_description: true,
            per_unit_limit: 5,
            separator: crate::workflow::DEFAULT_SEPARATOR.to_string(),
            failure_policy: FailurePolicy::default(),
        }
    }
}

/// [extract] 段：STIX 数据抽取
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExtractSection {
    pub input: PathBuf,
    pub output: PathBuf,
    /// 保留的 STIX 对象类型
    pub object_type: String,
}

impl Default for ExtractSection {
    fn default() -> Self {
        Self {
            input: PathBuf::from("data/enterprise-attack.json"),
            output: PathBuf::from("results.json"),
            object_type: "attack-pattern".to_string(),
        }
    }
}

/// 从 config 目录加载配置，环境变量 SCOUT__* 可覆盖
///
/// 1. 按顺序查找 config/default.toml、../config/default.toml、default.toml，找到则作为第一源
/// 2. 若传入 config_path 且文件存在，则追加该文件（可覆盖前面的键）
/// 3. 最后叠加环境变量 SCOUT__*（双下划线表示嵌套键，战术列表用逗号分隔）
pub fn load_config(config_path: Option<PathBuf>) -> Result<AppConfig, config::ConfigError> {
    let mut builder = config::Config::builder();

    let default_names = ["config/default", "../config/default", "default"];
    for name in default_names {
        let path = format!("{}.toml", name);
        if std::path::Path::new(&path).exists() {
            builder = builder.add_source(config::File::with_name(name).required(false));
            break;
        }
    }

    if let Some(ref path) = config_path {
        if path.exists() {
            builder = builder.add_source(config::File::from(path.clone()).required(false));
        }
    }

    builder = builder.add_source(env_source());

    let c = builder.build()?;
    c.try_deserialize()
}

/// SCOUT__* 环境变量；`SCOUT__GRAPH__TACTICS` 以逗号分隔
fn env_source() -> config::Environment {
    config::Environment::with_prefix("SCOUT")
        .separator("__")
        .try_parsing(true)
        .list_separator(",")
        .with_list_parse_key("graph.tactics")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_match_reference_client() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.mcp.url, "http://127.0.0.1:8001/mitre-mcp");
        assert_eq!(cfg.mcp.protocol_version, "2025-03-26");
        assert_eq!(cfg.mcp.request_timeout_secs, None);
        assert_eq!(cfg.graph.per_unit_limit, 5);
        assert_eq!(cfg.graph.separator, "\n\n---\n\n");
        assert!(cfg.graph.tactics.is_empty());
        assert_eq!(cfg.graph.failure_policy, FailurePolicy::AbortAll);
        assert_eq!(cfg.extract.object_type, "attack-pattern");
    }

    #[test]
    fn test_partial_file_keeps_section_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[mcp]\nurl = \"http://localhost:9000/mcp\"\n\n[graph]\ntactics = [\"persistence\", \"execution\"]\nfailure_policy = \"best_effort\""
        )
        .unwrap();

        let cfg = load_config(Some(file.path().to_path_buf())).unwrap();
        assert_eq!(cfg.mcp.url, "http://localhost:9000/mcp");
        assert_eq!(cfg.mcp.client_name, "simple-client");
        assert_eq!(cfg.graph.tactics, vec!["persistence", "execution"]);
        assert_eq!(cfg.graph.failure_policy, FailurePolicy::BestEffort);
        assert_eq!(cfg.graph.per_unit_limit, 5);
    }

    #[test]
    fn test_env_tactics_split_on_comma() {
        let mut vars = config::Map::new();
        vars.insert("SCOUT__GRAPH__TACTICS".to_string(), "persistence,execution".to_string());
        vars.insert("SCOUT__GRAPH__PER_UNIT_LIMIT".to_string(), "3".to_string());

        let cfg: AppConfig = config::Config::builder()
            .add_source(env_source().source(Some(vars)))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();
        assert_eq!(cfg.graph.tactics, vec!["persistence", "execution"]);
        assert_eq!(cfg.graph.per_unit_limit, 3);
        assert_eq!(cfg.graph.tool, "get_techniques_by_tactic");
    }
}

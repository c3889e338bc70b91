//! STIX 数据抽取
//!
//! 读 ATT&CK STIX bundle（`{"objects": [...]}`），按 `type` 过滤，
//! 每条保留 name / description / mitre-id（`external_references[0].external_id`），写成 JSON 数组。

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Object {object} has no {field}")]
    MissingField { object: String, field: &'static str },
}

#[derive(Debug, Deserialize)]
pub struct StixBundle {
    #[serde(default)]
    pub objects: Vec<StixObject>,
}

#[derive(Debug, Deserialize)]
pub struct StixObject {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub external_references: Vec<ExternalReference>,
}

#[derive(Debug, Deserialize)]
pub struct ExternalReference {
    #[serde(default)]
    pub external_id: Option<String>,
}

/// 输出行
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackRecord {
    pub name: String,
    pub description: String,
    #[serde(rename = "mitre-id")]
    pub mitre_id: String,
}

/// 一次抽取的统计
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractSummary {
    pub total: usize,
    pub kinds: BTreeSet<String>,
    pub kept: usize,
}

impl StixObject {
    fn label(&self) -> String {
        self.id
            .clone()
            .or_else(|| self.name.clone())
            .unwrap_or_else(|| "<unnamed>".to_string())
    }

    fn to_record(&self) -> Result<AttackRecord, ExtractError> {
        let name = self.name.clone().ok_or_else(|| ExtractError::MissingField {
            object: self.label(),
            field: "name",
        })?;
        let mitre_id = self
            .external_references
            .first()
            .and_then(|r| r.external_id.clone())
            .ok_or_else(|| ExtractError::MissingField {
                object: self.label(),
                field: "external_id",
            })?;
        Ok(AttackRecord {
            name,
            description: self.description.clone().unwrap_or_default(),
            mitre_id,
        })
    }
}

/// 过滤并转换；返回记录与统计
pub fn filter_records(
    bundle: &StixBundle,
    object_type: &str,
) -> Result<(Vec<AttackRecord>, ExtractSummary), ExtractError> {
    let kinds: BTreeSet<String> = bundle.objects.iter().map(|o| o.kind.clone()).collect();
    let records = bundle
        .objects
        .iter()
        .filter(|o| o.kind == object_type)
        .map(StixObject::to_record)
        .collect::<Result<Vec<_>, _>>()?;
    let summary = ExtractSummary {
        total: bundle.objects.len(),
        kinds,
        kept: records.len(),
    };
    Ok((records, summary))
}

/// 输出与参考数据一致的 4 空格缩进 JSON
pub fn to_pretty_json(records: &[AttackRecord]) -> Result<String, ExtractError> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    records.serialize(&mut ser)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// 读 input → 过滤 → 写 output
pub fn run_extract(input: &Path, output: &Path, object_type: &str) -> Result<ExtractSummary, ExtractError> {
    let raw = std::fs::read_to_string(input).map_err(|source| ExtractError::Io {
        path: input.to_path_buf(),
        source,
    })?;
    let bundle: StixBundle = serde_json::from_str(&raw)?;

    let (records, summary) = filter_records(&bundle, object_type)?;
    tracing::info!(total = summary.total, "objects loaded");
    tracing::info!(kinds = ?summary.kinds, "object types");
    tracing::info!(kept = summary.kept, object_type, "objects kept");

    std::fs::write(output, to_pretty_json(&records)?).map_err(|source| ExtractError::Io {
        path: output.to_path_buf(),
        source,
    })?;
    Ok(summary)
}

/*
 * @Author       : 老董
 * @Date         : 2026-10-17
 * @Description  : 卷积引擎的配置（可序列化为 JSON）
 *
 * 例：
 * {
 *   "padding": 1,
 *   "stride": 2,
 *   "backend": "direct"
 * }
 * 缺省字段取默认值：padding=0，stride=1，backend="fast"。
 * padding/stride 为无符号整数，负数在解析阶段即被拒绝。
 */

use serde::{Deserialize, Serialize};

use super::backend::ConvBackend;
use super::direct::DirectConv;
use super::fast::FastConv;
use crate::errors::ConvError;

/// 选用哪种卷积实现
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    Direct,
    #[default]
    Fast,
}

impl From<BackendKind> for ConvBackend {
    fn from(kind: BackendKind) -> Self {
        match kind {
            BackendKind::Direct => DirectConv.into(),
            BackendKind::Fast => FastConv.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvConfig {
    /// 两侧对称的零填充宽度
    pub padding: usize,
    /// 滑动步长（≥1）
    pub stride: usize,
    pub backend: BackendKind,
}

impl Default for ConvConfig {
    fn default() -> Self {
        Self {
            padding: 0,
            stride: 1,
            backend: BackendKind::default(),
        }
    }
}

impl ConvConfig {
    pub fn new(padding: usize, stride: usize, backend: BackendKind) -> Self {
        Self {
            padding,
            stride,
            backend,
        }
    }

    /// 序列化为格式化的 JSON 字符串
    pub fn to_json(&self) -> Result<String, ConvError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// 从 JSON 字符串解析，并拒绝步长为0的配置
    pub fn from_json(json: &str) -> Result<Self, ConvError> {
        let config: Self = serde_json::from_str(json)?;
        if config.stride == 0 {
            return Err(ConvError::InvalidConfig("stride须≥1".to_string()));
        }
        Ok(config)
    }
}

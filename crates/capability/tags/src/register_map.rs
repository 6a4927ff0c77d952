//! 寄存器映射表
//!
//! 标签名 -> (区域, 地址, 字数, 值类型, 缩放)。启动时构建一次，之后只读。

use crate::error::RegisterMapError;
use domain::{RegisterKind, ValueKind};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// 映射表中的一个标签
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "EntryRecord")]
pub struct RegisterMapEntry {
    pub name: String,
    pub address: u16,
    /// 16 位类型为 1，32 位类型为 2
    pub word_count: u16,
    pub register_kind: RegisterKind,
    pub value_kind: ValueKind,
    /// 仅对 float32 生效：读时相乘，写时相除
    pub scale: f64,
}

impl RegisterMapEntry {
    /// 字数按值类型推导，缩放为 1.0
    pub fn new(
        name: impl Into<String>,
        address: u16,
        register_kind: RegisterKind,
        value_kind: ValueKind,
    ) -> Self {
        Self {
            name: name.into(),
            address,
            word_count: value_kind.word_count(),
            register_kind,
            value_kind,
            scale: 1.0,
        }
    }

    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_word_count(mut self, word_count: u16) -> Self {
        self.word_count = word_count;
        self
    }

    /// 占用的地址区间 `[address, address + word_count)`
    fn span(&self) -> (u32, u32) {
        let start = u32::from(self.address);
        (start, start + u32::from(self.word_count))
    }

    fn validate(&self) -> Result<(), RegisterMapError> {
        if self.name.trim().is_empty() {
            return Err(invalid(format!(
                "tag at {} {} has an empty name",
                self.register_kind, self.address
            )));
        }
        if self.word_count != self.value_kind.word_count() {
            return Err(invalid(format!(
                "tag {}: {} needs word_count {}, got {}",
                self.name,
                self.value_kind,
                self.value_kind.word_count(),
                self.word_count
            )));
        }
        if self.register_kind.is_bit() && self.value_kind != ValueKind::Bool {
            return Err(invalid(format!(
                "tag {}: {} tags must be bool, got {}",
                self.name, self.register_kind, self.value_kind
            )));
        }
        if self.span().1 > 0x1_0000 {
            return Err(invalid(format!(
                "tag {}: address {} + {} exceeds address space",
                self.name, self.address, self.word_count
            )));
        }
        if !self.scale.is_finite() || self.scale == 0.0 {
            return Err(invalid(format!(
                "tag {}: scale must be finite and non-zero, got {}",
                self.name, self.scale
            )));
        }
        Ok(())
    }
}

/// JSON 中的原始记录（word_count / scale 可省略）
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct EntryRecord {
    name: String,
    address: u16,
    #[serde(default)]
    word_count: Option<u16>,
    register_kind: RegisterKind,
    value_kind: ValueKind,
    #[serde(default)]
    scale: Option<f64>,
}

impl From<EntryRecord> for RegisterMapEntry {
    fn from(record: EntryRecord) -> Self {
        Self {
            word_count: record
                .word_count
                .unwrap_or_else(|| record.value_kind.word_count()),
            scale: record.scale.unwrap_or(1.0),
            name: record.name,
            address: record.address,
            register_kind: record.register_kind,
            value_kind: record.value_kind,
        }
    }
}

/// 已校验的寄存器映射表
#[derive(Debug, Clone, PartialEq)]
pub struct RegisterMap {
    entries: Vec<RegisterMapEntry>,
    index: HashMap<String, usize>,
}

impl RegisterMap {
    /// 构建并一次性校验全部条目
    pub fn new(entries: Vec<RegisterMapEntry>) -> Result<Self, RegisterMapError> {
        let mut index = HashMap::with_capacity(entries.len());
        for (position, entry) in entries.iter().enumerate() {
            entry.validate()?;
            if index.insert(entry.name.clone(), position).is_some() {
                return Err(invalid(format!("duplicate tag name: {}", entry.name)));
            }
        }
        check_overlaps(&entries)?;
        Ok(Self { entries, index })
    }

    /// 解析 JSON 数组形式的映射表
    ///
    /// ```json
    /// [{"name": "speed", "address": 10, "register_kind": "holding", "value_kind": "float32", "scale": 0.1}]
    /// ```
    pub fn from_json(json: &str) -> Result<Self, RegisterMapError> {
        let entries: Vec<RegisterMapEntry> =
            serde_json::from_str(json).map_err(|e| RegisterMapError::Parse(e.to_string()))?;
        Self::new(entries)
    }

    pub fn get(&self, name: &str) -> Option<&RegisterMapEntry> {
        self.index.get(name).map(|position| &self.entries[*position])
    }

    /// 按插入顺序遍历
    pub fn iter(&self) -> impl Iterator<Item = &RegisterMapEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// 同一区域内按地址排序后检查相邻区间
fn check_overlaps(entries: &[RegisterMapEntry]) -> Result<(), RegisterMapError> {
    let mut by_kind: BTreeMap<RegisterKind, Vec<&RegisterMapEntry>> = BTreeMap::new();
    for entry in entries {
        by_kind.entry(entry.register_kind).or_default().push(entry);
    }

    for (kind, mut group) in by_kind {
        group.sort_by_key(|entry| entry.address);
        for pair in group.windows(2) {
            let (previous, next) = (pair[0], pair[1]);
            if previous.span().1 > next.span().0 {
                return Err(invalid(format!(
                    "tags {} and {} overlap in {} registers",
                    previous.name, next.name, kind
                )));
            }
        }
    }
    Ok(())
}

fn invalid(message: String) -> RegisterMapError {
    RegisterMapError::Invalid(message)
}

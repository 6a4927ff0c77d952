use domain::{RegisterKind, ValueKind};
use tagbridge_tags::RegisterMapEntry;

/// 内置映射：取料机构的四个保持寄存器
pub fn builtin_entries() -> Vec<RegisterMapEntry> {
    vec![
        RegisterMapEntry::new("activate", 0, RegisterKind::Holding, ValueKind::Bool),
        RegisterMapEntry::new("deliver", 1, RegisterKind::Holding, ValueKind::Bool),
        RegisterMapEntry::new("drawer", 2, RegisterKind::Holding, ValueKind::UInt16),
        RegisterMapEntry::new("drawer_position", 3, RegisterKind::Holding, ValueKind::UInt16),
    ]
}

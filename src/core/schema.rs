use crate::core::error::StoreError;
use crate::core::types::{Column, ColumnKind, Fields, KeyPolicy, Table};

/// 表的声明：默认列、主键列、主键策略、必填字段
#[derive(Debug, Clone)]
pub struct TableSchema {
    pub columns: Vec<Column>,
    pub key: String,
    pub key_policy: KeyPolicy,
    pub required: Vec<String>,
}

impl TableSchema {
    /// 通用 CRUD 表：ID 自增
    pub fn people() -> Self {
        TableSchema {
            columns: vec![
                Column::new("ID", ColumnKind::Integer),
                Column::new("Name", ColumnKind::Text),
                Column::new("Age", ColumnKind::Integer),
            ],
            key: "ID".to_string(),
            key_policy: KeyPolicy::AutoIncrement,
            required: vec!["Name".to_string(), "Age".to_string()],
        }
    }

    /// 股票表：종목코드 由调用方提供，按文本保存以保留前导零
    pub fn stocks() -> Self {
        let columns = vec![
            Column::new("종목코드", ColumnKind::Text),
            Column::new("회사명", ColumnKind::Text),
            Column::new("현재가", ColumnKind::Inferred),
            Column::new("거래량", ColumnKind::Inferred),
            Column::new("예측", ColumnKind::Inferred),
        ];
        let required = columns.iter().map(|c| c.name.clone()).collect();
        TableSchema {
            columns,
            key: "종목코드".to_string(),
            key_policy: KeyPolicy::CallerSupplied,
            required,
        }
    }

    /// 文件不存在时使用的空表
    pub fn empty_table(&self) -> Result<Table, StoreError> {
        Table::new(self.columns.clone(), &self.key, self.key_policy)
    }

    /// 文件表头中出现的列：已声明的用声明类型，其余按推断处理
    pub fn column_for(&self, name: &str) -> Column {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .cloned()
            .unwrap_or_else(|| Column::new(name, ColumnKind::Inferred))
    }

    pub fn check_required(&self, fields: &Fields) -> Result<(), StoreError> {
        let missing: Vec<&str> = self
            .required
            .iter()
            .filter(|name| {
                !fields
                    .iter()
                    .any(|(field, _)| field == *name || field.eq_ignore_ascii_case(name))
            })
            .map(|name| name.as_str())
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(StoreError::Validation(format!("缺少必填字段: {}", missing.join(", "))))
        }
    }
}

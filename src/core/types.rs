use std::cmp::Ordering;
use std::fmt;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::core::error::StoreError;

/// 单元格的值
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Empty,
    Int(i64),
    Float(f64),
    Text(String),
}

/// 列的类型声明，决定单元格如何从文本解码
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Integer,
    Float,
    Text,
    /// 依次尝试整数、浮点数，最后退回文本
    Inferred,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub kind: ColumnKind,
}

/// 调用方提供的字段：列名 -> 值
pub type Fields = Vec<(String, Value)>;

/// 主键的生成方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyPolicy {
    /// 新主键 = 当前最大主键 + 1，空表为 1
    AutoIncrement,
    /// 主键由调用方提供，重复时报错
    CallerSupplied,
}

impl Value {
    pub fn is_empty(&self) -> bool {
        matches!(self, Value::Empty)
    }

    fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(n) => Some(*n as f64),
            Value::Float(x) => Some(*x),
            _ => None,
        }
    }

    /// 排序用的比较：数字按数值比较且排在文本之前，空值最大
    pub fn sort_cmp(&self, other: &Value) -> Ordering {
        match (self, other) {
            (Value::Empty, Value::Empty) => Ordering::Equal,
            (Value::Empty, _) => Ordering::Greater,
            (_, Value::Empty) => Ordering::Less,
            (Value::Int(a), Value::Int(b)) => a.cmp(b),
            (Value::Text(a), Value::Text(b)) => a.cmp(b),
            (Value::Text(_), _) => Ordering::Greater,
            (_, Value::Text(_)) => Ordering::Less,
            (a, b) => match (a.as_f64(), b.as_f64()) {
                (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
                _ => Ordering::Equal,
            },
        }
    }

    /// 无类型推断：整数 > 浮点数 > 文本
    pub fn infer(raw: &str) -> Value {
        if raw.is_empty() {
            return Value::Empty;
        }
        if let Ok(n) = raw.parse::<i64>() {
            return Value::Int(n);
        }
        // "nan" / "inf" / "1e400" 之类的文本不当作数字
        if raw.bytes().any(|b| b.is_ascii_digit()) {
            if let Ok(x) = raw.parse::<f64>() {
                if x.is_finite() {
                    return Value::Float(x);
                }
            }
        }
        Value::Text(raw.to_string())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Empty => Ok(()),
            Value::Int(n) => write!(f, "{}", n),
            // 整数值的浮点数保留 ".0"，更大的用指数形式，重新加载时才不会变成整数
            Value::Float(x) if x.fract() == 0.0 && x.abs() < 1e16 => write!(f, "{:.1}", x),
            Value::Float(x) => write!(f, "{:?}", x),
            Value::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(n as i64)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl ColumnKind {
    /// 从文件中的文本解码
    pub fn decode(&self, raw: &str) -> Result<Value, String> {
        if raw.is_empty() {
            return Ok(Value::Empty);
        }
        match self {
            ColumnKind::Text => Ok(Value::Text(raw.to_string())),
            ColumnKind::Inferred => Ok(Value::infer(raw)),
            ColumnKind::Integer => raw
                .trim()
                .parse::<i64>()
                .map(Value::Int)
                .map_err(|_| format!("'{}' 不是整数", raw)),
            ColumnKind::Float => match raw.trim().parse::<f64>() {
                Ok(x) if x.is_finite() => Ok(Value::Float(x)),
                _ => Err(format!("'{}' 不是有限的数字", raw)),
            },
        }
    }

    /// 把调用方给的值转换成本列的类型
    pub fn accept(&self, value: Value) -> Result<Value, String> {
        match (self, value) {
            (_, Value::Empty) => Ok(Value::Empty),
            (_, Value::Float(x)) if !x.is_finite() => Err(format!("'{}' 不是有限的数字", x)),
            (ColumnKind::Text, Value::Text(s)) => ColumnKind::Text.decode(&s),
            (ColumnKind::Text, other) => Ok(Value::Text(other.to_string())),
            (kind, Value::Text(s)) => kind.decode(s.trim()),
            (ColumnKind::Float, Value::Int(n)) => Ok(Value::Float(n as f64)),
            (ColumnKind::Integer, Value::Float(x)) => {
                if x.fract() == 0.0 && x.abs() < 9.0e15 {
                    Ok(Value::Int(x as i64))
                } else {
                    Err(format!("'{}' 不是整数", x))
                }
            }
            (_, other) => Ok(other),
        }
    }
}

impl Column {
    pub fn new(name: impl Into<String>, kind: ColumnKind) -> Self {
        Column {
            name: name.into(),
            kind,
        }
    }
}

/// 一条记录：按列顺序排列的 列名 -> 值
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    fields: Vec<(String, Value)>,
}

impl Record {
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.fields.iter().map(|(_, value)| value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    columns: Vec<Column>,
    key_index: usize,
    key_policy: KeyPolicy,
    rows: Vec<Vec<Value>>,
}

impl Table {
    pub fn new(columns: Vec<Column>, key: &str, key_policy: KeyPolicy) -> Result<Self, StoreError> {
        Self::from_rows(columns, key, key_policy, Vec::new())
    }

    pub fn from_rows(
        columns: Vec<Column>,
        key: &str,
        key_policy: KeyPolicy,
        rows: Vec<Vec<Value>>,
    ) -> Result<Self, StoreError> {
        if columns.is_empty() {
            return Err(StoreError::Parse("表没有任何列".to_string()));
        }
        for (i, column) in columns.iter().enumerate() {
            if columns[..i].iter().any(|c| c.name == column.name) {
                return Err(StoreError::Parse(format!("列名重复: {}", column.name)));
            }
        }
        let key_index = columns
            .iter()
            .position(|c| c.name == key)
            .ok_or_else(|| StoreError::Parse(format!("缺少主键列 {}", key)))?;
        for (i, row) in rows.iter().enumerate() {
            if row.len() != columns.len() {
                return Err(StoreError::Parse(format!(
                    "第 {} 行有 {} 个字段，期望 {} 个",
                    i + 1,
                    row.len(),
                    columns.len()
                )));
            }
            // 写回文件后 inf/NaN 无法再读成数字
            if row
                .iter()
                .any(|v| matches!(v, Value::Float(x) if !x.is_finite()))
            {
                return Err(StoreError::Parse(format!("第 {} 行含有非有限的浮点数", i + 1)));
            }
        }

        Ok(Table {
            columns,
            key_index,
            key_policy,
            rows,
        })
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn key_column(&self) -> &Column {
        &self.columns[self.key_index]
    }

    pub fn key_policy(&self) -> KeyPolicy {
        self.key_policy
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    // 表单字段名通常是小写，精确匹配失败后再忽略大小写
    fn resolve_column(&self, name: &str) -> Option<usize> {
        self.column_index(name).or_else(|| {
            self.columns
                .iter()
                .position(|c| c.name.eq_ignore_ascii_case(name))
        })
    }

    pub(crate) fn record_from_row(&self, row: &[Value]) -> Record {
        Record {
            fields: self
                .columns
                .iter()
                .zip(row)
                .map(|(c, v)| (c.name.clone(), v.clone()))
                .collect(),
        }
    }

    pub fn record(&self, index: usize) -> Option<Record> {
        self.rows.get(index).map(|row| self.record_from_row(row))
    }

    pub fn records(&self) -> Vec<Record> {
        self.rows.iter().map(|row| self.record_from_row(row)).collect()
    }

    /// 把文本解析成主键列的类型，供 URL 路径参数使用
    pub fn parse_key(&self, raw: &str) -> Result<Value, StoreError> {
        let column = self.key_column();
        column
            .kind
            .decode(raw)
            .map_err(|e| StoreError::Validation(format!("主键 {}: {}", column.name, e)))
    }

    pub fn position(&self, key: &Value) -> Option<usize> {
        self.rows.iter().position(|row| &row[self.key_index] == key)
    }

    pub fn contains_key(&self, key: &Value) -> bool {
        self.position(key).is_some()
    }

    pub fn get_by_key(&self, key: &Value) -> Result<Record, StoreError> {
        self.position(key)
            .map(|i| self.record_from_row(&self.rows[i]))
            .ok_or_else(|| StoreError::not_found(&self.key_column().name, key))
    }

    /// 下一个自增主键
    pub fn next_key(&self) -> Result<i64, StoreError> {
        let mut max: Option<i64> = None;
        for row in &self.rows {
            let n = match &row[self.key_index] {
                Value::Int(n) => *n,
                Value::Float(x) if x.fract() == 0.0 => *x as i64,
                other => {
                    return Err(StoreError::Validation(format!(
                        "主键列 {} 含有非整数值 '{}'",
                        self.key_column().name,
                        other
                    )))
                }
            };
            max = Some(max.map_or(n, |m| m.max(n)));
        }
        match max {
            None => Ok(1),
            Some(m) => m.checked_add(1).ok_or_else(|| {
                StoreError::Validation(format!(
                    "主键列 {} 已达到最大值 {}，无法再自增",
                    self.key_column().name,
                    m
                ))
            }),
        }
    }

    /// 去掉表中没有的列，其余原样保留
    pub fn known_fields(&self, fields: Fields) -> Fields {
        fields
            .into_iter()
            .filter(|(name, _)| self.resolve_column(name).is_some())
            .collect()
    }

    // 校验并转换调用方字段，未知列直接拒绝
    fn resolve_fields(&self, fields: Fields) -> Result<Vec<(usize, Value)>, StoreError> {
        let mut resolved = Vec::with_capacity(fields.len());
        for (name, value) in fields {
            let index = self
                .resolve_column(&name)
                .ok_or_else(|| StoreError::Validation(format!("未知列: {}", name)))?;
            let column = &self.columns[index];
            let value = column
                .kind
                .accept(value)
                .map_err(|e| StoreError::Validation(format!("{}: {}", column.name, e)))?;
            resolved.push((index, value));
        }
        Ok(resolved)
    }

    /// 追加一条记录，返回它的主键
    pub fn insert(&mut self, fields: Fields) -> Result<Value, StoreError> {
        let resolved = self.resolve_fields(fields)?;
        let mut row = vec![Value::Empty; self.columns.len()];
        let mut key_supplied = false;
        for (index, value) in resolved {
            key_supplied |= index == self.key_index;
            row[index] = value;
        }

        let key_name = &self.columns[self.key_index].name;
        let key = match self.key_policy {
            KeyPolicy::AutoIncrement => {
                if key_supplied {
                    return Err(StoreError::Validation(format!(
                        "主键列 {} 由系统生成，不能手动指定",
                        key_name
                    )));
                }
                Value::Int(self.next_key()?)
            }
            KeyPolicy::CallerSupplied => {
                let key = row[self.key_index].clone();
                if key.is_empty() {
                    return Err(StoreError::Validation(format!("缺少主键列 {}", key_name)));
                }
                if self.contains_key(&key) {
                    return Err(StoreError::DuplicateKey {
                        column: key_name.clone(),
                        key,
                    });
                }
                key
            }
        };

        row[self.key_index] = key.clone();
        self.rows.push(row);
        Ok(key)
    }

    fn update_row(&mut self, index: usize, fields: Fields) -> Result<Record, StoreError> {
        let resolved = self.resolve_fields(fields)?;
        if let Some((_, value)) = resolved
            .iter()
            .find(|(i, v)| *i == self.key_index && v != &self.rows[index][self.key_index])
        {
            return Err(StoreError::Validation(format!(
                "主键列 {} 不能修改为 '{}'",
                self.key_column().name,
                value
            )));
        }
        for (i, value) in resolved {
            self.rows[index][i] = value;
        }
        Ok(self.record_from_row(&self.rows[index]))
    }

    /// 按主键更新，只覆盖提供的字段
    pub fn update_by_key(&mut self, key: &Value, fields: Fields) -> Result<Record, StoreError> {
        let index = self
            .position(key)
            .ok_or_else(|| StoreError::not_found(&self.key_column().name, key))?;
        self.update_row(index, fields)
    }

    /// 按行号更新。删除之后行号会移动
    pub fn update_at(&mut self, index: usize, fields: Fields) -> Result<Record, StoreError> {
        if index >= self.rows.len() {
            return Err(StoreError::not_found("#row", index));
        }
        self.update_row(index, fields)
    }

    /// 删除所有主键相等的记录，返回删除的条数
    pub fn delete_by_key(&mut self, key: &Value) -> usize {
        let before = self.rows.len();
        let key_index = self.key_index;
        self.rows.retain(|row| &row[key_index] != key);
        before - self.rows.len()
    }

    pub fn delete_at(&mut self, index: usize) -> Result<Record, StoreError> {
        if index >= self.rows.len() {
            return Err(StoreError::not_found("#row", index));
        }
        let row = self.rows.remove(index);
        Ok(self.record_from_row(&row))
    }
}

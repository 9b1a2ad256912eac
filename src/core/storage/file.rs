use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use log::debug;

use super::Storage;
use crate::core::error::StoreError;
use crate::core::schema::TableSchema;
use crate::core::types::{Column, Table};

/// CSV 文件存储：第一行是表头，每行一条记录
pub struct CsvFileStorage {
    path: PathBuf,
}

impl CsvFileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        CsvFileStorage { path: path.into() }
    }

    // 同目录下的临时文件，rename 才是原子的
    fn temp_path(&self) -> PathBuf {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "table".to_string());
        self.path.with_file_name(format!(".{}.tmp", name))
    }

    fn write_to(path: &Path, table: &Table) -> Result<(), StoreError> {
        let file = File::create(path)?;
        let mut writer = csv::Writer::from_writer(file);
        writer.write_record(table.columns().iter().map(|c| c.name.as_str()))?;
        for row in table.rows() {
            writer.write_record(row.iter().map(|v| v.to_string()))?;
        }
        let file = writer
            .into_inner()
            .map_err(|e| StoreError::Io(e.into_error()))?;
        file.sync_all()?;
        Ok(())
    }
}

impl Storage for CsvFileStorage {
    fn load(&self, schema: &TableSchema) -> Result<Table, StoreError> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("{} 不存在，使用默认列", self.path.display());
                return schema.empty_table();
            }
            Err(e) => return Err(StoreError::Io(e)),
        };

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(file);
        let columns: Vec<Column> = reader
            .headers()?
            .iter()
            .map(|name| schema.column_for(name))
            .collect();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            let line = record.position().map_or(0, |p| p.line());
            let row = record
                .iter()
                .zip(&columns)
                .map(|(raw, column)| {
                    column.kind.decode(raw).map_err(|e| {
                        StoreError::Parse(format!("第 {} 行 {} 列: {}", line, column.name, e))
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            rows.push(row);
        }

        let table = Table::from_rows(columns, &schema.key, schema.key_policy, rows)?;
        debug!("从 {} 加载了 {} 条记录", self.path.display(), table.len());
        Ok(table)
    }

    fn save(&self, table: &Table) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let temp = self.temp_path();
        if let Err(e) = Self::write_to(&temp, table) {
            let _ = fs::remove_file(&temp);
            return Err(e);
        }
        if let Err(e) = fs::rename(&temp, &self.path) {
            let _ = fs::remove_file(&temp);
            return Err(StoreError::Io(e));
        }

        debug!("已保存 {} 条记录到 {}", table.len(), self.path.display());
        Ok(())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

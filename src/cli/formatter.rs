pub struct TableFormatter;

impl TableFormatter {
    /// 格式化表格输出
    /// 每列宽度取表头和单元格中最长者，至少 3 个字符，左右各留 1 个空格，内容左对齐
    pub fn format_table(headers: &[String], rows: &[Vec<String>]) -> String {
        let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count().max(3)).collect();
        for row in rows {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(cell.chars().count());
            }
        }

        let mut result = Self::format_row(headers, &widths);
        result.push('\n');

        // 分隔线
        result.push('|');
        for width in &widths {
            result.push(' ');
            result.push_str(&"-".repeat(*width));
            result.push_str(" |");
        }
        result.push('\n');

        for row in rows {
            result.push_str(&Self::format_row(row, &widths));
            result.push('\n');
        }
        result
    }

    fn format_row(cells: &[String], widths: &[usize]) -> String {
        let mut line = String::from("|");
        for (cell, width) in cells.iter().zip(widths) {
            let padding = width - cell.chars().count();
            line.push(' ');
            line.push_str(cell);
            line.push_str(&" ".repeat(padding + 1));
            line.push('|');
        }
        line
    }
}

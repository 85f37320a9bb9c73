//! Positional placeholder rendering
//!
//! Statements are assembled as a list of fragments where every bound value
//! is a slot rather than a marker embedded in the text. Rendering walks the
//! fragments once and numbers the slots `$1`, `$2`, ... in order, so the
//! placeholder numbering always lines up with the values vector no matter
//! what the values contain.

#[derive(Debug, Clone, PartialEq)]
enum Fragment {
    Text(String),
    Param,
}

/// Statement text under construction plus its pending values
#[derive(Debug, Clone, Default)]
pub struct SqlWriter {
    fragments: Vec<Fragment>,
    values: Vec<serde_json::Value>,
    value_columns: Vec<String>,
}

/// Output of [`SqlWriter::render`]
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedSql {
    pub text: String,
    pub values: Vec<serde_json::Value>,
    /// Column each value is bound against, parallel to `values`
    pub value_columns: Vec<String>,
}

impl SqlWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append literal SQL
    pub fn push_str(&mut self, sql: &str) -> &mut Self {
        match self.fragments.last_mut() {
            Some(Fragment::Text(text)) => text.push_str(sql),
            _ => self.fragments.push(Fragment::Text(sql.to_string())),
        }
        self
    }

    /// Append a value slot bound against `column`
    pub fn push_param(&mut self, column: &str, value: serde_json::Value) -> &mut Self {
        self.fragments.push(Fragment::Param);
        self.values.push(value);
        self.value_columns.push(column.to_string());
        self
    }

    /// Number every slot left to right and produce the final text
    pub fn render(self) -> RenderedSql {
        let mut text = String::new();
        let mut index = 0;

        for fragment in &self.fragments {
            match fragment {
                Fragment::Text(sql) => text.push_str(sql),
                Fragment::Param => {
                    index += 1;
                    text.push('$');
                    text.push_str(&index.to_string());
                }
            }
        }

        debug_assert_eq!(index, self.values.len());

        RenderedSql {
            text,
            values: self.values,
            value_columns: self.value_columns,
        }
    }
}

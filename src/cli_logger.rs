use anyhow::Result;
use pprofiler::InspectOutput;
use serde::Serialize;
use serde_json::Value;

pub struct CliLogger {
    json: bool,
    no_color: bool,
}

impl CliLogger {
    pub fn new(json: bool, no_color: bool) -> Self {
        Self { json, no_color }
    }

    pub fn print_serialized<T: Serialize>(&self, value: &T) -> Result<()> {
        if self.json {
            println!("{}", serde_json::to_string(value)?);
            return Ok(());
        }

        let rendered = self.render_value(&serde_json::to_value(value)?, 0);
        println!("{rendered}");
        Ok(())
    }

    pub fn print_inspect(&self, output: &InspectOutput) -> Result<()> {
        match output {
            InspectOutput::Value(value) => self.print_serialized(value),
            InspectOutput::Text(text) if self.json => {
                println!("{}", serde_json::json!({ "content": text }));
                Ok(())
            }
            InspectOutput::Text(text) => {
                print!("{text}");
                Ok(())
            }
        }
    }

    pub fn print_error(&self, msg: &str) {
        if self.json {
            let out = serde_json::json!({
                "status": "error",
                "message": msg,
            });
            println!("{out}");
            return;
        }
        eprintln!("{} {msg}", self.style("error", "31;1"));
    }

    fn style(&self, text: &str, ansi: &str) -> String {
        if self.no_color {
            return text.to_string();
        }
        format!("\x1b[{ansi}m{text}\x1b[0m")
    }

    fn render_value(&self, value: &Value, indent: usize) -> String {
        match value {
            Value::Null => "null".to_string(),
            Value::Bool(v) => v.to_string(),
            Value::Number(v) => v.to_string(),
            Value::String(v) => v.clone(),
            Value::Array(items) => self.render_array(items, indent),
            Value::Object(map) => self.render_object(map, indent),
        }
    }

    fn render_array(&self, items: &[Value], indent: usize) -> String {
        if items.is_empty() {
            return "[]".to_string();
        }

        let pad = " ".repeat(indent);
        let mut out = String::new();
        for item in items {
            match item {
                Value::Object(_) | Value::Array(_) => {
                    out.push_str(&format!("{pad}-\n{}\n", self.render_value(item, indent + 2)));
                }
                _ => out.push_str(&format!("{pad}- {}\n", self.render_value(item, indent + 2))),
            }
        }
        out.trim_end().to_string()
    }

    fn render_object(&self, map: &serde_json::Map<String, Value>, indent: usize) -> String {
        if map.is_empty() {
            return "{}".to_string();
        }

        let pad = " ".repeat(indent);
        let mut out = String::new();
        for (key, value) in map {
            let key = self.style(key, "90");
            match value {
                Value::Object(_) | Value::Array(_) => {
                    out.push_str(&format!(
                        "{pad}{key}:\n{}\n",
                        self.render_value(value, indent + 2)
                    ));
                }
                _ => out.push_str(&format!(
                    "{pad}{key}: {}\n",
                    self.render_value(value, indent + 2)
                )),
            }
        }
        out.trim_end().to_string()
    }
}

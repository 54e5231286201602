use std::io::{IsTerminal, Write};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use fifoprims_transport::FifoStatus;
use serde::Serialize;

use crate::hex;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct ElementOutput<'a> {
    path: &'a str,
    index: usize,
    size: usize,
    hex: String,
    text: Option<&'a str>,
    timestamp: String,
}

pub fn print_element(path: &Path, index: usize, element: &[u8], format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let path = path.to_string_lossy();
            let out = ElementOutput {
                path: &path,
                index,
                size: element.len(),
                hex: hex::encode(element),
                text: std::str::from_utf8(element).ok(),
                timestamp: now_unix_seconds(),
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["INDEX", "SIZE", "HEX", "TEXT"])
                .add_row(vec![
                    index.to_string(),
                    element.len().to_string(),
                    hex::encode(element),
                    text_preview(element),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "element={} size={} hex={} text={}",
                index,
                element.len(),
                hex::encode(element),
                text_preview(element)
            );
        }
        OutputFormat::Raw => {
            print_raw(element);
        }
    }
}

#[derive(Serialize)]
struct StatusOutput<'a> {
    path: &'a str,
    exists: bool,
    is_fifo: bool,
    mode: Option<String>,
}

pub fn print_status(status: &FifoStatus, format: OutputFormat) {
    let path = status.path.to_string_lossy();
    let mode = status.mode.map(|mode| format!("{mode:04o}"));
    match format {
        OutputFormat::Json => {
            let out = StatusOutput {
                path: &path,
                exists: status.exists,
                is_fifo: status.is_fifo,
                mode,
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["PATH", "EXISTS", "FIFO", "MODE"])
                .add_row(vec![
                    path.to_string(),
                    status.exists.to_string(),
                    status.is_fifo.to_string(),
                    mode.unwrap_or_else(|| "-".to_string()),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!("Pipe Info:");
            println!("  Path:   {path}");
            println!("  Exists: {}", status.exists);
            println!("  FIFO:   {}", status.is_fifo);
            println!("  Mode:   {}", mode.unwrap_or_else(|| "-".to_string()));
        }
        OutputFormat::Raw => {
            println!("{path}");
        }
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

fn text_preview(element: &[u8]) -> String {
    match std::str::from_utf8(element) {
        Ok(text) => text.to_string(),
        Err(_) => format!("<binary {} bytes>", element.len()),
    }
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binary_elements_get_a_placeholder() {
        assert_eq!(text_preview(b"abcd"), "abcd");
        assert_eq!(text_preview(&[0xff, 0xfe]), "<binary 2 bytes>");
    }
}

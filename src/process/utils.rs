use std::path::Path;

/// Spellings treated as a missing value, compared after trimming.
const NULL_TOKENS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// 1) Does this cell stand for "no value"?
pub fn is_null_token(raw: &str) -> bool {
    NULL_TOKENS.contains(&raw.trim())
}

/// 2) Field delimiter for a source file, chosen by extension.
pub fn delimiter_for(path: &Path) -> u8 {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("tsv") | Some("tab") => b'\t',
        _ => b',',
    }
}

/// 3) Table name for a source file: its base name without extension.
pub fn table_name_for(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "default_table".into())
}

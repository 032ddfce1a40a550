//! Deterministic dependency pre-processing for LLM-generated code: normalize
//! every dependency declaration into a single leading directive block, and
//! inject the tool-proxy import when the code references `Tools.` without
//! importing it.

use regex::Regex;
use std::collections::BTreeSet;
use std::sync::OnceLock;

/// A mapping of common import names to their corresponding package names,
/// used to infer undeclared third-party dependencies from plain `import`
/// statements.
pub const IMPORT_TO_PACKAGE_MAP: &[(&str, &str)] = &[
    ("bs4", "beautifulsoup4"),
    ("cv2", "opencv-python"),
    ("dotenv", "python-dotenv"),
    ("fake", "faker"),
    ("fitz", "pymupdf"),
    ("google.cloud", "google-cloud"),
    ("google.oauth2", "google-auth"),
    ("matplotlib", "matplotlib"),
    ("numpy", "numpy"),
    ("pandas", "pandas"),
    ("PIL", "pillow"),
    ("pyarrow", "pyarrow"),
    ("pydantic", "pydantic"),
    ("pygame", "pygame"),
    ("pytest", "pytest"),
    ("requests", "requests"),
    ("scipy", "scipy"),
    ("sklearn", "scikit-learn"),
    ("seaborn", "seaborn"),
    ("sqlalchemy", "sqlalchemy"),
    ("torch", "torch"),
    ("yaml", "pyyaml"),
];

fn import_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(?:from|import)\s+([a-zA-Z0-9_]+)").unwrap())
}

fn script_block_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)# /// script\s*\n\s*#\s*dependencies\s*=\s*(\[.*?\])\s*\n\s*# ///\s*\n?").unwrap()
    })
}

fn dep_line_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*(#\s*)?dependencies\s*=\s*(\[.*\])").unwrap())
}

fn tools_usage_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\bTools\.").unwrap())
}

fn import_tools_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*(from|import)\s+tools\b").unwrap())
}

/// Scans code lines for `import X` / `from X ...` and maps the top-level
/// module name through `IMPORT_TO_PACKAGE_MAP`.
fn infer_dependencies(lines: &[String]) -> BTreeSet<String> {
    let mut found = BTreeSet::new();
    for line in lines {
        if let Some(caps) = import_regex().captures(line.trim()) {
            let module = caps.get(1).unwrap().as_str();
            let top_level = module.split('.').next().unwrap_or(module);
            if let Some((_, package)) = IMPORT_TO_PACKAGE_MAP.iter().find(|(name, _)| *name == top_level) {
                found.insert(package.to_string());
            }
        }
    }
    found
}

/// Normalizes dependency declarations in LLM-generated code into a single
/// canonical `# /// script` block, and injects the `Tools` proxy import if
/// the body uses `Tools.` without already importing it. Deterministic and
/// idempotent: running it twice on its own output is a no-op.
pub fn process_tool_code(code: &str) -> String {
    let mut packages: BTreeSet<String> = BTreeSet::new();
    let mut working = code.to_string();

    // Last fenced `# /// script` block wins; all such blocks are stripped.
    let script_re = script_block_regex();
    let matches: Vec<_> = script_re.captures_iter(&working).collect();
    if let Some(last) = matches.last() {
        if let Some(arr) = last.get(1) {
            if let Ok(parsed) = serde_json::from_str::<Vec<String>>(arr.as_str()) {
                packages.extend(parsed);
            }
        }
        working = script_re.replace_all(&working, "").to_string();
    }

    let lines: Vec<String> = working.lines().map(|l| l.to_string()).collect();

    // Single-line `dependencies = [...]` comments.
    let mut cleaned_lines = Vec::new();
    for line in &lines {
        if let Some(caps) = dep_line_regex().captures(line) {
            if let Some(arr) = caps.get(2) {
                if let Ok(parsed) = serde_json::from_str::<Vec<String>>(arr.as_str()) {
                    packages.extend(parsed);
                }
            }
        } else {
            cleaned_lines.push(line.clone());
        }
    }

    // Correct the common LLM error of using `Tools.` without importing it.
    let body_for_check = cleaned_lines.join("\n");
    if tools_usage_regex().is_match(&body_for_check) {
        packages.insert("requests".to_string());
        packages.remove("tools");

        let already_imported = cleaned_lines.iter().any(|l| import_tools_regex().is_match(l));
        if !already_imported {
            let import_statement = "from tools import Tools, MCPToolError".to_string();
            let last_import_index = cleaned_lines
                .iter()
                .rposition(|l| l.trim_start().starts_with("import ") || l.trim_start().starts_with("from "));
            match last_import_index {
                Some(idx) => cleaned_lines.insert(idx + 1, import_statement),
                None => {
                    let insert_pos = if cleaned_lines.first().is_some_and(|l| l.starts_with("#!")) { 1 } else { 0 };
                    cleaned_lines.insert(insert_pos, import_statement);
                }
            }
        }
    }

    packages.extend(infer_dependencies(&cleaned_lines));
    let final_body = cleaned_lines.join("\n");

    if packages.is_empty() {
        final_body.trim().to_string()
    } else {
        let dep_json = serde_json::to_string(&packages.iter().collect::<Vec<_>>()).unwrap_or_default();
        format!("# /// script\n# dependencies = {}\n# ///\n{}", dep_json, final_body).trim().to_string()
    }
}

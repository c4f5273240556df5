// src/classify.rs

use std::path::Path;

/// Lowercased extensions, without the dot
const CODE_EXTENSIONS: &[&str] = &[
    "py", "js", "ts", "jsx", "tsx", "java", "c", "cpp", "cc", "cxx", "h", "hpp", "cs", "php",
    "rb", "go", "rs", "kt", "swift", "m", "mm", "scala", "clj", "hs", "ml", "fs", "vb", "pas",
    "d", "nim", "cr", "jl", "elm", "dart", "v", "sv", "vhd", "vhdl", "tcl", "r", "sh", "bash",
    "zsh", "fish", "ps1", "bat", "cmd", "pl", "pm", "lua", "sql", "html", "htm", "css", "scss",
    "sass", "less", "xml", "json", "yaml", "yml", "toml", "ini", "cfg", "conf", "md", "tex",
    "makefile", "cmake", "gradle", "maven", "ant", "sbt", "mix", "ex", "exs", "erl", "hrl",
    "proto", "thrift", "avro", "capnp", "fbs",
];

/// Base names (up to the first dot) of conventional build and config files.
/// `go.mod` and `go.sum` can never match since they contain a dot themselves.
const CODE_FILENAMES: &[&str] = &[
    "makefile", "dockerfile", "vagrantfile", "gemfile", "rakefile", "gruntfile", "gulpfile",
    "webpack", "rollup", "vite", "jest", "babel", "eslint", "prettier", "tsconfig", "package",
    "composer", "requirements", "pipfile", "poetry", "cargo", "go.mod", "go.sum",
];

pub fn is_code_file(path: &str) -> bool {
    let lower = path.to_lowercase();
    let path = Path::new(&lower);

    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        if CODE_EXTENSIONS.contains(&ext) {
            return true;
        }
    }

    let file_name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    let base_name = file_name.split('.').next().unwrap_or("");
    CODE_FILENAMES.contains(&base_name)
}

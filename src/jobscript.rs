//! Submit-ready job scripts that run a command under `jobwrap run`.

use std::path::PathBuf;

/// Inputs of a job script. `properties` is the workflow engine's job
/// description (usually JSON), kept as a comment for whoever reads the
/// scheduler's copy of the script.
#[derive(Debug, Clone)]
pub struct JobScript {
    pub properties: String,
    pub exec_job: String,
    pub cluster_dir: PathBuf,
    pub program: String,
}

impl JobScript {
    pub fn render(&self) -> String {
        // Line breaks would end the comment; other whitespace is kept verbatim.
        let properties = self.properties.replace("\r\n", " ").replace(['\n', '\r'], " ");
        let cluster_dir = self.cluster_dir.to_string_lossy();
        format!(
            "#!/bin/sh\n# properties = {properties}\nexec {} run --cluster-dir {} -- {}\n",
            shell_quote(&self.program),
            shell_quote(&cluster_dir),
            shell_quote(&self.exec_job),
        )
    }
}

/// POSIX single-quote quoting: `it's` becomes `'it'\''s'`.
pub fn shell_quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for c in s.chars() {
        if c == '\'' {
            out.push_str("'\\''");
        } else {
            out.push(c);
        }
    }
    out.push('\'');
    out
}

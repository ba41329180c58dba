// src/template.rs

//! Launcher template injection
//!
//! `main.c` carries a configuration block delimited by two marker lines:
//!
//! ```c
//! // CONFIG START
//! static const char APP_NAME[] = "JARNative";
//! static const unsigned int MIN_JAVA_VERSION = 8;
//! // CONFIG END
//! ```
//!
//! Lines before the start marker are copied untouched. Inside the block every
//! declaration has its value replaced from [`TemplateValues`]; other lines
//! pass through. Everything after the end marker is copied as raw bytes.
//! Line endings are preserved per line.

use std::io::{self, BufRead, Write};
use std::sync::LazyLock;

pub const CONFIG_START: &str = "// CONFIG START";
pub const CONFIG_END: &str = "// CONFIG END";

static DECLARATION: LazyLock<regex::Regex> = LazyLock::new(|| {
    regex::Regex::new(r"^static const (char|unsigned int|bool) ([A-Z_]+(?:\[\])?)\s*=\s*[^;]+;$")
        .unwrap()
});

/// Values substituted into the configuration block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateValues {
    pub app_name: String,
    pub min_java_version: u32,
    pub preferred_java_version: u32,
    pub install_prompt: String,
    pub launch_flags: String,
    pub attribution: bool,
}

impl TemplateValues {
    /// The C literal for `key`.
    ///
    /// # Panics
    ///
    /// Panics on a key with no producer. The template and this table ship
    /// together, so an unknown key means they are out of sync.
    pub fn produce(&self, key: &str) -> String {
        match key {
            "APP_NAME[]" => c_quote(&self.app_name),
            "MIN_JAVA_VERSION" => self.min_java_version.to_string(),
            "PREFERRED_JAVA_VERSION" => self.preferred_java_version.to_string(),
            "INSTALL_PROMPT[]" => c_quote(&self.install_prompt),
            "LAUNCH_FLAGS[]" => c_quote(&self.launch_flags),
            "ATTRIBUTION" => self.attribution.to_string(),
            _ => panic!("No rule to populate key \"{}\"", key),
        }
    }

    /// Rewrite one line from inside the configuration block
    pub fn transform_declaration(&self, line: &str) -> Option<String> {
        let caps = DECLARATION.captures(line)?;
        let (ty, key) = (&caps[1], &caps[2]);
        Some(format!("static const {} {} = {};", ty, key, self.produce(key)))
    }
}

/// Quote `input` as a C string literal, escaping `\` and `"`
pub fn c_quote(input: &str) -> String {
    let mut out = String::with_capacity(input.len() + 2);
    out.push('"');
    for c in input.chars() {
        if c == '\\' || c == '"' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}

/// Copy `reader` to `writer`, substituting declarations in the config block
pub fn inject<R: BufRead, W: Write>(values: &TemplateValues, reader: &mut R, writer: &mut W) -> io::Result<()> {
    let mut in_config = false;
    let mut line = Vec::with_capacity(512);

    loop {
        line.clear();
        if reader.read_until(b'\n', &mut line)? == 0 {
            break;
        }

        let (body, ending) = split_ending(&line);
        let mut end = false;

        if in_config {
            end = body == CONFIG_END.as_bytes();
            let replaced = if end {
                None
            } else {
                std::str::from_utf8(body)
                    .ok()
                    .and_then(|text| values.transform_declaration(text))
            };
            match replaced {
                Some(text) => writer.write_all(text.as_bytes())?,
                None => writer.write_all(body)?,
            }
        } else {
            if body == CONFIG_START.as_bytes() {
                in_config = true;
            }
            writer.write_all(body)?;
        }
        writer.write_all(ending)?;

        if end {
            io::copy(reader, writer)?;
            break;
        }
    }

    writer.flush()
}

/// Split a line into its content and its `\n` / `\r\n` terminator
fn split_ending(line: &[u8]) -> (&[u8], &[u8]) {
    if line.ends_with(b"\r\n") {
        line.split_at(line.len() - 2)
    } else if line.ends_with(b"\n") {
        line.split_at(line.len() - 1)
    } else {
        (line, &[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn values() -> TemplateValues {
        TemplateValues {
            app_name: "Demo \"App\"".to_string(),
            min_java_version: 11,
            preferred_java_version: 17,
            install_prompt: "Needs Java %d".to_string(),
            launch_flags: "-Xmx1G".to_string(),
            attribution: true,
        }
    }

    fn run(values: &TemplateValues, input: &str) -> String {
        let mut out = Vec::new();
        inject(values, &mut Cursor::new(input.as_bytes()), &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_attribution_only_line_changes() {
        let input = "#include <stdio.h>\r\n// CONFIG START\r\nstatic const bool ATTRIBUTION = true;\r\n// CONFIG END\r\nint main() {}\r\n";
        let mut v = values();
        v.attribution = false;
        assert_eq!(
            run(&v, input),
            "#include <stdio.h>\r\n// CONFIG START\r\nstatic const bool ATTRIBUTION = false;\r\n// CONFIG END\r\nint main() {}\r\n"
        );
    }

    #[test]
    fn test_mixed_line_endings_preserved() {
        let input = "// CONFIG START\nstatic const unsigned int MIN_JAVA_VERSION = 8;\r\nstatic const unsigned int PREFERRED_JAVA_VERSION = 21;\n// CONFIG END\n";
        assert_eq!(
            run(&values(), input),
            "// CONFIG START\nstatic const unsigned int MIN_JAVA_VERSION = 11;\r\nstatic const unsigned int PREFERRED_JAVA_VERSION = 17;\n// CONFIG END\n"
        );
    }

    #[test]
    fn test_strings_are_quoted() {
        let input = "// CONFIG START\nstatic const char APP_NAME[] = \"x\";\nstatic const char LAUNCH_FLAGS[] = \"\";\n// CONFIG END\n";
        assert_eq!(
            run(&values(), input),
            "// CONFIG START\nstatic const char APP_NAME[] = \"Demo \\\"App\\\"\";\nstatic const char LAUNCH_FLAGS[] = \"-Xmx1G\";\n// CONFIG END\n"
        );
    }

    #[test]
    fn test_outside_block_untouched() {
        let input = "static const bool ATTRIBUTION = true;\n// CONFIG START\n// CONFIG END\nstatic const bool ATTRIBUTION = true;\n";
        assert_eq!(run(&values(), input), input);
    }

    #[test]
    fn test_non_declarations_pass_through() {
        let input = "// CONFIG START\n\n/* comment */\nstatic int COUNTER = 1;\n// CONFIG END";
        assert_eq!(run(&values(), input), input);
    }

    #[test]
    fn test_final_line_without_newline() {
        let input = "// CONFIG START\nstatic const bool ATTRIBUTION = true;";
        let mut v = values();
        v.attribution = false;
        assert_eq!(
            run(&v, input),
            "// CONFIG START\nstatic const bool ATTRIBUTION = false;"
        );
    }

    #[test]
    #[should_panic(expected = "No rule to populate key")]
    fn test_unknown_key_panics() {
        run(&values(), "// CONFIG START\nstatic const bool MYSTERY = true;\n// CONFIG END\n");
    }

    #[test]
    fn test_c_quote() {
        assert_eq!(c_quote(r#"a\b"c"#), r#""a\\b\"c""#);
        assert_eq!(c_quote(""), "\"\"");
    }
}

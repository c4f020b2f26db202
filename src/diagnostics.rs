use std::fmt::Write as _;

use crate::error::Error;

/// Render an error as a structured markdown diagnostic.
///
/// Each variant produces a block with what happened and, where the caller can
/// act on it, how to fix it. Hosts show this text in their own error surface.
pub fn render_error(e: &Error) -> String {
    return match e {
        Error::CyclicReference { chain } => render_cyclic_reference(chain),
        Error::Decode { path, reason } => render_decode(path, reason),
        Error::GroupNotFound { components } => render_group_not_found(components),
        Error::MissingMainFile { searched } => render_missing_main_file(searched),
        _ => render_generic(e),
    };
}

/// Render the variants that need no more than one fixed block.
fn render_generic(e: &Error) -> String {
    return match e {
        Error::DuplicatePath { path } => format!("\
# Error: Duplicate Path

`{path}` is already defined in the document.

## Fix

Pick a different route, or edit the existing one.
"),

        Error::Encode { path, reason } => format!("\
# Error: Encode Failed

Could not encode `{path}`: {reason}

Nothing was written.
"),

        Error::FileExists { path } => format!("\
# Error: File Exists

`{path}` already backs another path.

## Fix

Rename the route or choose another group.
"),

        Error::InvalidGroup { reason } => format!("\
# Error: Invalid Group

{reason}
"),

        Error::InvalidMove { path, reason } => format!("\
# Error: Invalid Move

Cannot move `{path}`: {reason}
"),

        Error::Io(e) => format!("\
# Error: I/O

{e}
"),

        Error::MalformedReference { reference } => format!("\
# Error: Malformed Reference

`{reference}` is not a file path or a `#/components/<category>/<name>` pointer.
"),

        Error::PathNotFound { path } => format!("\
# Error: Path Not Found

`{path}` is not defined in the document.
"),

        Error::TargetMismatch { path, reason } => format!("\
# Error: Save Target Mismatch

Refusing to save to `{path}`: {reason}

## Fix

Save to a new location, or remove the existing entry first.
"),

        Error::TomlDe(e) => format!("\
# Error: Invalid TOML

{e}

## Fix

Check `.oasdir.toml`. Supported keys are `format` and `exclude`.
"),

        Error::UnresolvedReference { reference } => format!("\
# Error: Unresolved Reference

`{reference}` does not point at anything in the document.
"),

        Error::UnsupportedEntry { path } => format!("\
# Error: Unsupported Entry

`{path}` is a symlink or special file. Saving replaces the whole directory and would drop it.

## Fix

Replace it with a regular file, or move it outside the document directory.
"),

        Error::Walk(e) => format!("\
# Error: Directory Walk

{e}
"),

        // Handled in render_error, but the match must be exhaustive.
        _ => format!("\
# Error

{e}
"),
    };
}

/// Render a reference loop with one line per hop.
fn render_cyclic_reference(chain: &[String]) -> String {
    let mut out = "\
# Error: Cyclic Reference

A reference chain loops back on itself:

"
    .to_string();
    for (hop, reference) in chain.iter().enumerate() {
        let _ = writeln!(out, "{}. `{reference}`", hop.saturating_add(1));
    }
    out.push_str("\n## Fix\n\nPoint one of these at a value instead of another reference.\n");
    return out;
}

/// Render a file that parses as neither format.
fn render_decode(path: &str, reason: &str) -> String {
    return format!("\
# Error: Decode Failed

Could not decode `{path}` as YAML or JSON:

    {reason}

## Fix

Correct the syntax, or rename the file so it is kept as an opaque file.
");
}

/// Render a missing path group.
fn render_group_not_found(components: &[String]) -> String {
    let group = components.join("/");
    return format!("\
# Error: Group Not Found

`paths/{group}` is not a group in this document.
");
}

/// Render a directory without a main file, listing the names tried.
fn render_missing_main_file(searched: &[String]) -> String {
    let mut out = "\
# Error: Main File Not Found

The directory has no main document file. Looked for, in order:

"
    .to_string();
    for name in searched {
        let _ = writeln!(out, "- `{name}`");
    }
    out.push_str("\n## Fix\n\nAdd one of these files at the top of the directory.\n");
    return out;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_main_file_lists_candidates() {
        let md = render_error(&Error::MissingMainFile {
            searched: vec!["openapi.yaml".to_string(), "swagger.json".to_string()],
        });
        assert!(md.starts_with("# Error: Main File Not Found"));
        assert!(md.contains("- `openapi.yaml`\n- `swagger.json`\n"));
    }

    #[test]
    fn cycle_numbers_each_hop() {
        let md = render_error(&Error::CyclicReference { chain: vec!["a.yaml".to_string(), "a.yaml".to_string()] });
        assert!(md.contains("1. `a.yaml`\n2. `a.yaml`\n"));
    }

    #[test]
    fn every_diagnostic_has_a_heading() {
        let errors = [
            Error::DuplicatePath { path: "/a".to_string() },
            Error::GroupNotFound { components: vec!["v1".to_string()] },
            Error::MalformedReference { reference: "#/x".to_string() },
            Error::Decode { path: "paths/a.yaml".to_string(), reason: "bad".to_string() },
        ];
        for error in &errors {
            assert!(render_error(error).starts_with("# Error"));
        }
    }
}

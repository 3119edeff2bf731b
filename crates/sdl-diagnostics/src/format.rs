use sdl_common::SourceFile;

use crate::Diagnostic;

/// Renders a diagnostic in the gutter form from spec.md §4.1:
///
/// ```text
/// E300: Undefined entity 'gearB'
///  --> scene.dsl:42:12
///   |
/// 42|   driven: gearB
///   |           ^^^^^ entity not found in scope
/// help: define 'gearB' before referencing it
/// ```
pub fn format_terminal(diagnostic: &Diagnostic, source: &SourceFile) -> String {
    let span = diagnostic.span;
    let line_text = source.line_text(span.line);
    let gutter_width = span.line.to_string().len();
    let blank_gutter = format!("{}|", " ".repeat(gutter_width));

    let underline_len = span.len.max(1);
    let caret_indent = " ".repeat(span.column.saturating_sub(1));
    let carets = "^".repeat(underline_len);
    let caret_line = match &diagnostic.label {
        Some(label) => format!("{} {}{} {}", blank_gutter, caret_indent, carets, label),
        None => format!("{} {}{}", blank_gutter, caret_indent, carets),
    };

    let mut out = String::new();
    out.push_str(&format!("{}: {}\n", diagnostic.code, diagnostic.message));
    out.push_str(&format!(" --> {}:{}:{}\n", diagnostic.file, span.line, span.column));
    out.push_str(&blank_gutter);
    out.push('\n');
    out.push_str(&format!("{}| {}\n", span.line, line_text));
    out.push_str(&caret_line);

    if let Some(help) = &diagnostic.help {
        out.push('\n');
        out.push_str(&format!("help: {}", help));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorCode;
    use sdl_common::SourceSpan;

    #[test]
    fn renders_the_documented_shape() {
        let source = SourceFile::new(
            "scene.dsl",
            "scene {}\nlibrary_imports {}\nconstraint c1 { type: gear_relation driver: a driven: gearB }\n",
        );
        let diag = Diagnostic::new(
            ErrorCode::E300,
            "Undefined entity 'gearB'",
            SourceSpan::new(0, 5, 3, 57),
            "scene.dsl",
        )
        .with_label("entity not found in scope")
        .with_help("define 'gearB' before referencing it");

        let rendered = format_terminal(&diag, &source);
        assert!(rendered.starts_with("E300: Undefined entity 'gearB'\n"));
        assert!(rendered.contains(" --> scene.dsl:3:57\n"));
        assert!(rendered.contains("help: define 'gearB' before referencing it"));
    }
}

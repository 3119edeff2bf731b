//! Recursive-descent parser for the SDL grammar (spec.md §4.3).
//!
//! No backtracking, no lookahead beyond one token. The mandatory section
//! order `scene library_imports entity* constraint* motion* timeline* eof`
//! falls out of the control flow directly: each section is a `while` loop
//! gated on the next keyword, so a stray or out-of-order block simply fails
//! the final "expected eof" check. The parser constructs the AST only; it
//! never decides whether a field value is semantically valid beyond the
//! handful of fields whose AST node bakes in a concrete Rust type (scene's
//! four fields, an entity's `kind`, a motion's `target`/`type`, a
//! constraint's `type`, an event's `motion`/`start`/`duration`).
//!
//! On the first error, parsing halts immediately and returns that one
//! diagnostic — there is no error recovery (spec.md §4.3, §9).

use indexmap::IndexMap;
use sdl_common::SourceSpan;
use sdl_diagnostics::{Diagnostic, ErrorCode};

use crate::ast::*;
use crate::lex::{Keyword, Spanned, Token};

pub fn parse(tokens: Vec<Spanned<Token>>, file: &str) -> Result<AstFile, Diagnostic> {
    log::debug!("parsing '{}' ({} tokens)", file, tokens.len());
    let result = Parser::new(tokens, file).parse_file();
    match &result {
        Ok(ast) => log::debug!(
            "'{}' parsed: {} entities, {} constraints, {} motions, {} timelines",
            file,
            ast.entities.len(),
            ast.constraints.len(),
            ast.motions.len(),
            ast.timelines.len()
        ),
        Err(diag) => log::debug!("'{}' failed to parse: {}", file, diag.code),
    }
    result
}

struct Parser<'a> {
    tokens: Vec<Spanned<Token>>,
    pos: usize,
    file: &'a str,
}

impl<'a> Parser<'a> {
    fn new(tokens: Vec<Spanned<Token>>, file: &'a str) -> Self {
        Parser {
            tokens,
            pos: 0,
            file,
        }
    }

    fn current(&self) -> &Spanned<Token> {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek(&self) -> &Token {
        &self.current().value
    }

    fn span(&self) -> SourceSpan {
        self.current().span
    }

    fn bump(&mut self) -> Spanned<Token> {
        let tok = self.current().clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    fn unexpected(&self, expected: &str) -> Diagnostic {
        Diagnostic::new(
            ErrorCode::E100,
            format!("unexpected token {}, expected {}", self.peek(), expected),
            self.span(),
            self.file,
        )
    }

    fn missing_section(&self, what: &str) -> Diagnostic {
        Diagnostic::new(
            ErrorCode::E101,
            format!("missing required section: {}", what),
            self.span(),
            self.file,
        )
    }

    fn expect_keyword(&mut self, kw: Keyword) -> Result<SourceSpan, Diagnostic> {
        match self.peek() {
            Token::Keyword(k) if *k == kw => {
                let span = self.span();
                self.bump();
                Ok(span)
            }
            _ => Err(self.unexpected(&format!("keyword '{}'", kw.text()))),
        }
    }

    fn expect_colon(&mut self) -> Result<(), Diagnostic> {
        match self.peek() {
            Token::Colon => {
                self.bump();
                Ok(())
            }
            _ => Err(self.unexpected("':'")),
        }
    }

    fn expect_lbrace(&mut self) -> Result<SourceSpan, Diagnostic> {
        match self.peek() {
            Token::LBrace => {
                let span = self.span();
                self.bump();
                Ok(span)
            }
            _ => Err(self.unexpected("'{'")),
        }
    }

    fn expect_rbrace(&mut self) -> Result<SourceSpan, Diagnostic> {
        match self.peek() {
            Token::RBrace => {
                let span = self.span();
                self.bump();
                Ok(span)
            }
            _ => Err(self.unexpected("'}'")),
        }
    }

    fn expect_identifier(&mut self) -> Result<Spanned<String>, Diagnostic> {
        match self.peek().clone() {
            Token::Identifier(name) => {
                let span = self.span();
                self.bump();
                Ok(Spanned::new(name, span))
            }
            _ => Err(self.unexpected("an identifier")),
        }
    }

    fn expect_string(&mut self) -> Result<Spanned<String>, Diagnostic> {
        match self.peek().clone() {
            Token::String(s) => {
                let span = self.span();
                self.bump();
                Ok(Spanned::new(s, span))
            }
            _ => Err(self.unexpected("a string literal")),
        }
    }

    fn expect_integer(&mut self) -> Result<Spanned<i64>, Diagnostic> {
        match self.peek().clone() {
            Token::Integer(i) => {
                let span = self.span();
                self.bump();
                Ok(Spanned::new(i, span))
            }
            _ => Err(self.unexpected("an integer")),
        }
    }

    /// A field name is either a plain identifier or one of the reserved
    /// words (`kind`, `motion`, …) used contextually as a key, e.g. an
    /// event's `motion:` field versus the top-level `motion` block keyword.
    fn expect_field_name(&mut self) -> Result<Spanned<String>, Diagnostic> {
        match self.peek().clone() {
            Token::Identifier(name) => {
                let span = self.span();
                self.bump();
                Ok(Spanned::new(name, span))
            }
            Token::Keyword(kw) => {
                let span = self.span();
                self.bump();
                Ok(Spanned::new(kw.text().to_string(), span))
            }
            _ => Err(self.unexpected("a field name")),
        }
    }

    fn parse_number_literal(&mut self) -> Result<Spanned<f64>, Diagnostic> {
        match self.peek().clone() {
            Token::Integer(i) => {
                let span = self.span();
                self.bump();
                Ok(Spanned::new(i as f64, span))
            }
            Token::Number(n) => {
                let span = self.span();
                self.bump();
                Ok(Spanned::new(n, span))
            }
            _ => Err(self.unexpected("a number")),
        }
    }

    fn parse_value(&mut self) -> Result<Spanned<AstValue>, Diagnostic> {
        match self.peek().clone() {
            Token::Integer(i) => {
                let span = self.span();
                self.bump();
                Ok(Spanned::new(AstValue::Number(i as f64), span))
            }
            Token::Number(n) => {
                let span = self.span();
                self.bump();
                Ok(Spanned::new(AstValue::Number(n), span))
            }
            Token::String(s) => {
                let span = self.span();
                self.bump();
                Ok(Spanned::new(AstValue::String(s), span))
            }
            Token::Identifier(ident) => {
                let span = self.span();
                self.bump();
                Ok(Spanned::new(AstValue::Identifier(ident), span))
            }
            Token::LBracket => self.parse_vector(),
            _ => Err(self.unexpected("a value")),
        }
    }

    fn parse_vector(&mut self) -> Result<Spanned<AstValue>, Diagnostic> {
        let start = self.span();
        self.bump(); // '['
        let mut values = Vec::new();
        if !matches!(self.peek(), Token::RBracket) {
            loop {
                values.push(self.parse_number_literal()?.value);
                if matches!(self.peek(), Token::Comma) {
                    self.bump();
                } else {
                    break;
                }
            }
        }
        let end = self.expect_rbracket()?;
        let span = SourceSpan::new(
            start.offset,
            end.end_offset() - start.offset,
            start.line,
            start.column,
        );
        if values.len() != 3 {
            return Err(Diagnostic::new(
                ErrorCode::E110,
                format!("malformed vector: expected 3 components, found {}", values.len()),
                span,
                self.file,
            ));
        }
        Ok(Spanned::new(
            AstValue::Vector3([values[0], values[1], values[2]]),
            span,
        ))
    }

    fn expect_rbracket(&mut self) -> Result<SourceSpan, Diagnostic> {
        match self.peek() {
            Token::RBracket => {
                let span = self.span();
                self.bump();
                Ok(span)
            }
            _ => Err(self.unexpected("']'")),
        }
    }

    /// Parses `name: value` pairs until `}`, in the order they appear.
    fn parse_generic_fields(&mut self) -> Result<Fields, Diagnostic> {
        let mut fields = IndexMap::new();
        while !matches!(self.peek(), Token::RBrace) {
            let name = self.expect_field_name()?;
            self.expect_colon()?;
            let value = self.parse_value()?;
            fields.insert(name.value, value);
        }
        Ok(fields)
    }

    fn parse_file(&mut self) -> Result<AstFile, Diagnostic> {
        if !matches!(self.peek(), Token::Keyword(Keyword::Scene)) {
            return Err(self.missing_section("scene"));
        }
        let scene = self.parse_scene()?;

        if !matches!(self.peek(), Token::Keyword(Keyword::LibraryImports)) {
            return Err(self.missing_section("library_imports"));
        }
        let library_imports = self.parse_library_imports()?;

        let mut entities = Vec::new();
        while matches!(self.peek(), Token::Keyword(Keyword::Entity)) {
            entities.push(self.parse_entity()?);
        }

        let mut constraints = Vec::new();
        while matches!(self.peek(), Token::Keyword(Keyword::Constraint)) {
            constraints.push(self.parse_constraint()?);
        }

        let mut motions = Vec::new();
        while matches!(self.peek(), Token::Keyword(Keyword::Motion)) {
            motions.push(self.parse_motion()?);
        }

        let mut timelines = Vec::new();
        while matches!(self.peek(), Token::Keyword(Keyword::Timeline)) {
            timelines.push(self.parse_timeline()?);
        }

        if !matches!(self.peek(), Token::Eof) {
            return Err(self.unexpected("end of file"));
        }

        Ok(AstFile {
            scene,
            library_imports,
            entities,
            constraints,
            motions,
            timelines,
        })
    }

    fn parse_scene(&mut self) -> Result<AstScene, Diagnostic> {
        let start = self.expect_keyword(Keyword::Scene)?;
        self.expect_lbrace()?;

        let mut name: Option<Spanned<String>> = None;
        let mut version: Option<Spanned<i64>> = None;
        let mut ir_version: Option<Spanned<String>> = None;
        let mut unit_system: Option<Spanned<String>> = None;

        while !matches!(self.peek(), Token::RBrace) {
            let field_name = self.expect_identifier()?;
            self.expect_colon()?;
            match field_name.value.as_str() {
                "name" => name = Some(self.expect_string()?),
                "version" => version = Some(self.expect_integer()?),
                "ir_version" => ir_version = Some(self.expect_string()?),
                "unit_system" => unit_system = Some(self.expect_string()?),
                other => {
                    return Err(Diagnostic::new(
                        ErrorCode::E100,
                        format!("unknown scene field '{}'", other),
                        field_name.span,
                        self.file,
                    ))
                }
            }
        }
        let end = self.expect_rbrace()?;

        let name = name.ok_or_else(|| self.missing_section("scene.name"))?;
        let version = version.ok_or_else(|| self.missing_section("scene.version"))?;
        let ir_version = ir_version.ok_or_else(|| self.missing_section("scene.ir_version"))?;
        let unit_system = unit_system.ok_or_else(|| self.missing_section("scene.unit_system"))?;

        Ok(AstScene {
            name: name.value,
            name_span: name.span,
            version: version.value,
            version_span: version.span,
            ir_version: ir_version.value,
            ir_version_span: ir_version.span,
            unit_system: unit_system.value,
            unit_system_span: unit_system.span,
            span: span_between(start, end),
        })
    }

    fn parse_library_imports(&mut self) -> Result<AstLibraryImports, Diagnostic> {
        let start = self.expect_keyword(Keyword::LibraryImports)?;
        self.expect_lbrace()?;

        let mut imports = IndexMap::new();
        while !matches!(self.peek(), Token::RBrace) {
            let alias = self.expect_identifier()?;
            self.expect_colon()?;
            let library = self.expect_string()?;
            imports.insert(alias.value, library);
        }
        let end = self.expect_rbrace()?;

        Ok(AstLibraryImports {
            imports,
            span: span_between(start, end),
        })
    }

    fn parse_entity(&mut self) -> Result<AstEntity, Diagnostic> {
        let start = self.expect_keyword(Keyword::Entity)?;
        let id = self.expect_identifier()?;
        self.expect_lbrace()?;

        self.expect_keyword(Keyword::Kind)?;
        self.expect_colon()?;
        let kind = self.expect_identifier()?;

        self.expect_keyword(Keyword::Components)?;
        self.expect_lbrace()?;
        let mut components = Vec::new();
        while !matches!(self.peek(), Token::RBrace) {
            let comp_name = self.expect_identifier()?;
            let comp_start = self.expect_lbrace()?;
            let fields = self.parse_generic_fields()?;
            let comp_end = self.expect_rbrace()?;
            components.push(AstComponent {
                name: comp_name.value,
                name_span: comp_name.span,
                fields,
                span: span_between(comp_start, comp_end),
            });
        }
        self.expect_rbrace()?; // end components block

        let end = self.expect_rbrace()?; // end entity block

        Ok(AstEntity {
            id: id.value,
            id_span: id.span,
            kind: kind.value,
            kind_span: kind.span,
            components,
            span: span_between(start, end),
        })
    }

    fn parse_constraint(&mut self) -> Result<AstConstraint, Diagnostic> {
        let start = self.expect_keyword(Keyword::Constraint)?;
        let id = self.expect_identifier()?;
        self.expect_lbrace()?;

        let type_field = self.expect_identifier()?;
        if type_field.value != "type" {
            return Err(Diagnostic::new(
                ErrorCode::E100,
                "constraint body must start with 'type:'".to_string(),
                type_field.span,
                self.file,
            ));
        }
        self.expect_colon()?;
        let constraint_type = self.expect_identifier()?;

        let fields = self.parse_generic_fields()?;
        let end = self.expect_rbrace()?;

        Ok(AstConstraint {
            id: id.value,
            id_span: id.span,
            constraint_type: constraint_type.value,
            type_span: constraint_type.span,
            fields,
            span: span_between(start, end),
        })
    }

    fn parse_motion(&mut self) -> Result<AstMotion, Diagnostic> {
        let start = self.expect_keyword(Keyword::Motion)?;
        let id = self.expect_identifier()?;
        self.expect_lbrace()?;
        let mut fields = self.parse_generic_fields()?;
        let end = self.expect_rbrace()?;

        let target = fields
            .shift_remove("target")
            .ok_or_else(|| self.missing_section("motion.target"))?;
        let motion_type = fields
            .shift_remove("type")
            .ok_or_else(|| self.missing_section("motion.type"))?;

        let target = match target.value {
            AstValue::Identifier(ident) => Spanned::new(ident, target.span),
            _ => {
                return Err(Diagnostic::new(
                    ErrorCode::E100,
                    "motion 'target' must be an identifier".to_string(),
                    target.span,
                    self.file,
                ))
            }
        };
        let motion_type = match motion_type.value {
            AstValue::Identifier(ident) => Spanned::new(ident, motion_type.span),
            _ => {
                return Err(Diagnostic::new(
                    ErrorCode::E100,
                    "motion 'type' must be an identifier".to_string(),
                    motion_type.span,
                    self.file,
                ))
            }
        };

        Ok(AstMotion {
            id: id.value,
            id_span: id.span,
            target: target.value,
            target_span: target.span,
            motion_type: motion_type.value,
            type_span: motion_type.span,
            fields,
            span: span_between(start, end),
        })
    }

    fn parse_timeline(&mut self) -> Result<AstTimeline, Diagnostic> {
        let start = self.expect_keyword(Keyword::Timeline)?;
        let id = self.expect_identifier()?;
        self.expect_lbrace()?;

        let mut events = Vec::new();
        while !matches!(self.peek(), Token::RBrace) {
            events.push(self.parse_event()?);
        }
        let end = self.expect_rbrace()?;

        Ok(AstTimeline {
            id: id.value,
            id_span: id.span,
            events,
            span: span_between(start, end),
        })
    }

    fn parse_event(&mut self) -> Result<AstEvent, Diagnostic> {
        let start = self.expect_keyword(Keyword::Event)?;
        self.expect_lbrace()?;
        let mut fields = self.parse_generic_fields()?;
        let end = self.expect_rbrace()?;

        let motion = fields
            .shift_remove("motion")
            .ok_or_else(|| self.missing_section("event.motion"))?;
        let start_field = fields
            .shift_remove("start")
            .ok_or_else(|| self.missing_section("event.start"))?;
        let duration = fields
            .shift_remove("duration")
            .ok_or_else(|| self.missing_section("event.duration"))?;

        let motion = match motion.value {
            AstValue::Identifier(ident) => Spanned::new(ident, motion.span),
            _ => {
                return Err(Diagnostic::new(
                    ErrorCode::E100,
                    "event 'motion' must be an identifier".to_string(),
                    motion.span,
                    self.file,
                ))
            }
        };
        let start_value = match start_field.value {
            AstValue::Number(n) => Spanned::new(n, start_field.span),
            _ => {
                return Err(Diagnostic::new(
                    ErrorCode::E100,
                    "event 'start' must be a number".to_string(),
                    start_field.span,
                    self.file,
                ))
            }
        };
        let duration_value = match duration.value {
            AstValue::Number(n) => Spanned::new(n, duration.span),
            _ => {
                return Err(Diagnostic::new(
                    ErrorCode::E100,
                    "event 'duration' must be a number".to_string(),
                    duration.span,
                    self.file,
                ))
            }
        };

        Ok(AstEvent {
            motion: motion.value,
            motion_span: motion.span,
            start: start_value.value,
            start_span: start_value.span,
            duration: duration_value.value,
            duration_span: duration_value.span,
            span: span_between(start, end),
        })
    }
}

fn span_between(start: SourceSpan, end: SourceSpan) -> SourceSpan {
    SourceSpan::new(
        start.offset,
        end.end_offset() - start.offset,
        start.line,
        start.column,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lex::lex;

    fn parse_src(src: &str) -> Result<AstFile, Diagnostic> {
        let tokens = lex(src, "t.dsl").expect("lex should succeed");
        parse(tokens, "t.dsl")
    }

    const MIN: &str = r#"scene{name:"T" version:1 ir_version:"0.1.0" unit_system:"SI"} library_imports{math:"core_mechanics"}"#;

    #[test]
    fn parses_minimal_scene() {
        let ast = parse_src(MIN).unwrap();
        assert_eq!(ast.scene.name, "T");
        assert_eq!(ast.scene.version, 1);
        assert_eq!(ast.scene.ir_version, "0.1.0");
        assert_eq!(ast.scene.unit_system, "SI");
        assert_eq!(ast.library_imports.imports.get("math").unwrap().value, "core_mechanics");
        assert!(ast.entities.is_empty());
    }

    #[test]
    fn parses_entity_with_components() {
        let src = format!(
            r#"{} entity cube1 {{ kind: solid components {{ transform {{ position: [0,0,0] rotation: [0,0,0] scale: [1,1,1] }} geometry {{ primitive: cube }} }} }}"#,
            MIN
        );
        let ast = parse_src(&src).unwrap();
        assert_eq!(ast.entities.len(), 1);
        let entity = &ast.entities[0];
        assert_eq!(entity.id, "cube1");
        assert_eq!(entity.kind, "solid");
        assert_eq!(entity.components.len(), 2);
        assert_eq!(entity.components[0].name, "transform");
        assert_eq!(entity.components[1].name, "geometry");
    }

    #[test]
    fn parses_motion_with_flat_fields_in_either_order() {
        let src = format!(
            r#"{} motion spin {{ axis: [0,1,0] target: cube1 speed: 1.5708 type: rotation }}"#,
            MIN
        );
        let ast = parse_src(&src).unwrap();
        let motion = &ast.motions[0];
        assert_eq!(motion.target, "cube1");
        assert_eq!(motion.motion_type, "rotation");
        assert!(motion.fields.contains_key("axis"));
        assert!(motion.fields.contains_key("speed"));
        assert!(!motion.fields.contains_key("target"));
        assert!(!motion.fields.contains_key("type"));
    }

    #[test]
    fn malformed_vector_is_e110() {
        let src = format!(
            r#"{} entity a {{ kind: solid components {{ transform {{ position: [0,0] rotation: [0,0,0] scale: [1,1,1] }} }} }}"#,
            MIN
        );
        let err = parse_src(&src).unwrap_err();
        assert_eq!(err.code, ErrorCode::E110);
    }

    #[test]
    fn vector_of_length_four_is_e110() {
        let src = format!(
            r#"{} entity a {{ kind: solid components {{ transform {{ position: [0,0,0,0] rotation: [0,0,0] scale: [1,1,1] }} }} }}"#,
            MIN
        );
        let err = parse_src(&src).unwrap_err();
        assert_eq!(err.code, ErrorCode::E110);
    }

    #[test]
    fn missing_library_imports_is_e101() {
        let err = parse_src(r#"scene{name:"T" version:1 ir_version:"0.1.0" unit_system:"SI"}"#).unwrap_err();
        assert_eq!(err.code, ErrorCode::E101);
    }

    #[test]
    fn motion_before_constraint_order_is_enforced_by_grammar() {
        // constraints must come before motions; a stray motion-shaped block
        // before any constraint block is simply a constraint block missing
        // its `type:` field, since the constraint loop consumes it first.
        let src = format!(r#"{} constraint c1 {{ type: fixed_joint parent: a child: b }} motion m {{ target: a type: rotation }}"#, MIN);
        let ast = parse_src(&src).unwrap();
        assert_eq!(ast.constraints.len(), 1);
        assert_eq!(ast.motions.len(), 1);
    }

    #[test]
    fn timeline_events_parse_three_required_fields() {
        let src = format!(
            r#"{} motion spin {{ target: cube1 type: rotation }} timeline t1 {{ event {{ motion: spin start: 0 duration: 10 }} }}"#,
            MIN
        );
        let ast = parse_src(&src).unwrap();
        let event = &ast.timelines[0].events[0];
        assert_eq!(event.motion, "spin");
        assert_eq!(event.start, 0.0);
        assert_eq!(event.duration, 10.0);
    }
}
